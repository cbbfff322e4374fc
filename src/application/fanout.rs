use crate::domain::notification::{
    ADMIN_TOPIC, EventType, NewNotification, SocketMessage,
};
use crate::domain::order::Order;
use crate::domain::ports::{NotificationStoreRef, RealtimeChannelRef};
use crate::error::Result;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

/// A state change worth telling somebody about, captured after its
/// transaction committed.
#[derive(Debug, Clone)]
pub enum FanoutEvent {
    OrderCreated { order: Order, buyer_name: String },
    OrderCancelled { order: Order },
    StatusChanged { order: Order },
}

/// Post-commit notification dispatcher.
///
/// Events are queued onto an unbounded channel and drained by a spawned
/// worker, so a slow or failing notification channel can never block or fail
/// the settlement operation that produced the event. Dispatch errors are
/// logged and swallowed.
#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<FanoutEvent>,
}

impl Notifier {
    /// Spawns the worker that owns the persisted store and the realtime
    /// channel. The worker drains outstanding events after every `Notifier`
    /// clone has been dropped, then exits; awaiting the handle flushes the
    /// queue.
    pub fn spawn(
        notifications: NotificationStoreRef,
        realtime: RealtimeChannelRef,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = unbounded_channel();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = dispatch(&notifications, &realtime, event).await {
                    tracing::warn!(error = %e, "notification dispatch failed");
                }
            }
        });
        (Self { tx }, handle)
    }

    /// Enqueues an event. Never blocks and never surfaces a failure to the
    /// caller.
    pub fn publish(&self, event: FanoutEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("fan-out worker is gone; dropping event");
        }
    }
}

async fn dispatch(
    notifications: &NotificationStoreRef,
    realtime: &RealtimeChannelRef,
    event: FanoutEvent,
) -> Result<()> {
    match event {
        FanoutEvent::OrderCreated { order, buyer_name } => {
            notifications
                .append(NewNotification {
                    recipient: order.seller,
                    message: format!(
                        "You have a new order #{} from {buyer_name}",
                        order.external_id
                    ),
                    link: format!("/seller/orders/{}", order.external_id),
                })
                .await?;
            realtime
                .send_to_user(order.seller, SocketMessage::of(EventType::SellerNewOrder, &order))
                .await?;
            realtime
                .broadcast(ADMIN_TOPIC, SocketMessage::of(EventType::AdminNewOrder, &order))
                .await?;
        }
        FanoutEvent::OrderCancelled { order } => {
            notifications
                .append(NewNotification {
                    recipient: order.seller,
                    message: format!("The buyer cancelled order #{}", order.external_id),
                    link: format!("/seller/orders/{}", order.external_id),
                })
                .await?;
            realtime
                .send_to_user(
                    order.seller,
                    SocketMessage::of(EventType::SellerOrderCancelled, &order),
                )
                .await?;
            realtime
                .broadcast(
                    ADMIN_TOPIC,
                    SocketMessage::of(EventType::AdminOrderCancelled, &order),
                )
                .await?;
        }
        FanoutEvent::StatusChanged { order } => {
            realtime
                .send_to_user(
                    order.buyer,
                    SocketMessage::of(EventType::BuyerOrderUpdate, &order),
                )
                .await?;
            // The seller gets a persisted notice even when an admin drove the
            // change.
            notifications
                .append(NewNotification {
                    recipient: order.seller,
                    message: format!(
                        "Order #{} moved to status {}",
                        order.external_id, order.status
                    ),
                    link: format!("/seller/orders/{}", order.external_id),
                })
                .await?;
            realtime
                .broadcast(
                    ADMIN_TOPIC,
                    SocketMessage::of(EventType::AdminOrderUpdate, &order),
                )
                .await?;
        }
    }
    Ok(())
}
