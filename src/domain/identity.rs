pub type UserId = u64;

/// A seller is identified by their user id; the two id spaces are one.
pub type SellerId = u64;

/// The acting principal, threaded explicitly through every core operation.
///
/// There is deliberately no ambient "current user" lookup: whoever calls the
/// engine must say who is acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    /// Present when the user also runs a seller profile.
    pub seller_id: Option<SellerId>,
}

impl Actor {
    pub fn buyer(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: false,
            seller_id: None,
        }
    }

    pub fn seller(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: false,
            seller_id: Some(id),
        }
    }

    pub fn admin(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_admin: true,
            seller_id: None,
        }
    }
}
