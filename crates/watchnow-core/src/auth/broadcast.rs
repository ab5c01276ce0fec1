//! Process-wide authentication change notifications.
//!
//! The `AuthBroadcaster` lets any surface learn that the session changed
//! without holding a reference to whoever changed it. Subscribers hold an
//! `AuthSubscription`; dropping it unsubscribes.

use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Auth events are rare; a small buffer is plenty.
const DEFAULT_CAPACITY: usize = 64;

/// What changed about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    LoggedIn,
    LoggedOut,
    /// An authenticated call was rejected and the session was cleared.
    SessionExpired,
    /// The credential was changed outside the session store. Listeners
    /// should re-read durable storage.
    External,
}

pub struct AuthBroadcaster {
    sender: broadcast::Sender<AuthChange>,
}

impl AuthBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Notify all subscribers. Returns how many received the event.
    pub fn emit(&self, change: AuthChange) -> usize {
        let delivered = self.sender.send(change).unwrap_or(0);
        debug!(?change, delivered, "Auth change broadcast");
        delivered
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to auth changes.
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    /// Wait for the next change. Returns `None` once the broadcaster is gone.
    ///
    /// A subscriber that falls behind skips the missed events.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for UI event loops.
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_delivers_nothing() {
        let broadcaster = AuthBroadcaster::new();
        assert_eq!(broadcaster.emit(AuthChange::LoggedOut), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let broadcaster = AuthBroadcaster::new();
        let sub = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
        drop(sub);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_change() {
        let broadcaster = AuthBroadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        assert_eq!(broadcaster.emit(AuthChange::LoggedIn), 2);

        assert_eq!(a.recv().await, Some(AuthChange::LoggedIn));
        assert_eq!(b.recv().await, Some(AuthChange::LoggedIn));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn lagged_subscriber_skips_ahead() {
        let broadcaster = AuthBroadcaster::with_capacity(2);
        let mut sub = broadcaster.subscribe();

        broadcaster.emit(AuthChange::LoggedIn);
        broadcaster.emit(AuthChange::LoggedOut);
        broadcaster.emit(AuthChange::External);

        assert_eq!(sub.try_recv(), Some(AuthChange::LoggedOut));
        assert_eq!(sub.try_recv(), Some(AuthChange::External));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn recv_ends_when_broadcaster_dropped() {
        let broadcaster = AuthBroadcaster::new();
        let mut sub = broadcaster.subscribe();
        drop(broadcaster);
        assert_eq!(sub.recv().await, None);
    }
}
