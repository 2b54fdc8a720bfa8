//! The current user, with change notifications.
//!
//! Stands in for an external identity provider. Login and logout publish
//! through a [`tokio::sync::watch`] channel; the run loop subscribes and
//! tears sessions down and up as the value changes.

use std::sync::Arc;

use sprout_types::UserId;
use tokio::sync::watch;

/// Shared handle to the current identity.
#[derive(Debug, Clone)]
pub struct Identity {
    sender: Arc<watch::Sender<Option<UserId>>>,
}

impl Identity {
    /// Start logged out.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Start logged in as `user`.
    pub fn logged_in(user: UserId) -> Self {
        let identity = Self::new();
        identity.login(user);
        identity
    }

    /// Switch to `user`. Logging in as the current user is not a change.
    pub fn login(&self, user: UserId) {
        self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&user) {
                false
            } else {
                tracing::info!(user = %user, "login");
                *current = Some(user);
                true
            }
        });
    }

    /// Log out. Logging out while logged out is not a change.
    pub fn logout(&self) {
        self.sender.send_if_modified(|current| {
            current.take().is_some_and(|user| {
                tracing::info!(user = %user, "logout");
                true
            })
        });
    }

    /// The user currently logged in, if any.
    pub fn current(&self) -> Option<UserId> {
        self.sender.borrow().clone()
    }

    /// A receiver notified on every login or logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.sender.subscribe()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_logged_out() {
        assert!(Identity::new().current().is_none());
    }

    #[tokio::test]
    async fn login_and_logout_notify_subscribers() {
        let identity = Identity::new();
        let mut rx = identity.subscribe();

        identity.login(UserId::new("alice"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone(), Some(UserId::new("alice")));

        identity.logout();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn repeated_login_is_not_a_change() {
        let identity = Identity::logged_in(UserId::new("bob"));
        let rx = identity.subscribe();
        identity.login(UserId::new("bob"));
        assert!(!rx.has_changed().unwrap());

        identity.logout();
        assert!(rx.has_changed().unwrap());
    }
}
