//! Balance-change notification contract.
//!
//! After a ledger mutation commits, the engine pushes a
//! [`BalanceChange`] to the wallet owner's session through a
//! [`BalanceNotifier`]. Delivery is best effort and strictly outside the
//! transactional boundary: a closed socket or an offline user must never
//! roll back or delay a committed mutation, so `notify_balance_change`
//! is synchronous, non-blocking and infallible from the caller's point
//! of view.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Payload pushed to the wallet owner after a committed mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub wallet_id: Uuid,
    pub becoin_minor: i64,
    pub becoin_green_minor: i64,
    pub message: String,
    pub success: bool,
    /// Pending transaction cleared by this change, if any; lets clients
    /// reconcile an "awaiting payment" view.
    pub cleared_transaction_id: Option<Uuid>,
}

pub trait BalanceNotifier: Send + Sync {
    fn notify_balance_change(&self, user_id: &str, change: BalanceChange);
}

/// Notifier that drops every event. Default for tests and CLI tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl BalanceNotifier for NoopNotifier {
    fn notify_balance_change(&self, _user_id: &str, _change: BalanceChange) {}
}

/// Notifier backed by a tokio broadcast channel.
///
/// The transport (WebSocket session registry, push service, ...)
/// subscribes and fans events out to the right user; lagging or absent
/// subscribers lose events, which is the contract.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<(String, BalanceChange)>,
}

impl BroadcastNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<(String, BalanceChange)> {
        self.sender.subscribe()
    }
}

impl BalanceNotifier for BroadcastNotifier {
    fn notify_balance_change(&self, user_id: &str, change: BalanceChange) {
        // send() only fails when nobody is subscribed; that is fine.
        if self
            .sender
            .send((user_id.to_string(), change))
            .is_err()
        {
            tracing::debug!(user_id, "balance change dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change() -> BalanceChange {
        BalanceChange {
            wallet_id: Uuid::new_v4(),
            becoin_minor: 1000,
            becoin_green_minor: 0,
            message: "credited 10.00".to_string(),
            success: true,
            cleared_transaction_id: None,
        }
    }

    #[tokio::test]
    async fn broadcast_delivers_to_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.notify_balance_change("alice", change());

        let (user_id, received) = rx.recv().await.unwrap();
        assert_eq!(user_id, "alice");
        assert!(received.success);
    }

    #[test]
    fn send_without_subscribers_does_not_panic() {
        let notifier = BroadcastNotifier::new(8);
        notifier.notify_balance_change("alice", change());
    }
}
