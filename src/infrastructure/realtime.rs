use crate::domain::identity::UserId;
use crate::domain::notification::SocketMessage;
use crate::domain::ports::RealtimeChannel;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Default)]
struct HubInner {
    users: HashMap<UserId, UnboundedSender<SocketMessage>>,
    topics: HashMap<String, Vec<UnboundedSender<SocketMessage>>>,
}

/// In-process realtime hub.
///
/// One private channel per connected user plus named broadcast topics.
/// Delivery is at-most-once: sends to users without a live subscription are
/// dropped silently, and closed subscriptions are pruned on the next send.
#[derive(Default, Clone)]
pub struct InMemoryRealtimeHub {
    inner: Arc<RwLock<HubInner>>,
}

impl InMemoryRealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the private channel for `user`, replacing any previous
    /// connection.
    pub async fn subscribe_user(&self, user: UserId) -> UnboundedReceiver<SocketMessage> {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.users.insert(user, tx);
        rx
    }

    /// Joins a broadcast topic.
    pub async fn subscribe_topic(&self, topic: &str) -> UnboundedReceiver<SocketMessage> {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.inner.write().await;
        inner.topics.entry(topic.to_string()).or_default().push(tx);
        rx
    }
}

#[async_trait]
impl RealtimeChannel for InMemoryRealtimeHub {
    async fn send_to_user(&self, user: UserId, message: SocketMessage) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(tx) = inner.users.get(&user)
            && tx.send(message).is_err()
        {
            inner.users.remove(&user);
        }
        Ok(())
    }

    async fn broadcast(&self, topic: &str, message: SocketMessage) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(subscribers) = inner.topics.get_mut(topic) {
            subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        }
        Ok(())
    }
}
