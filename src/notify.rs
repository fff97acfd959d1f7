// Push notifications for committed state transitions.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// What changed, attached to every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    TeamJoined,
    DraftStarted,
    DraftPaused,
    DraftResumed,
    PickMade,
    DraftCompleted,
}

/// Fire-and-forget observer of committed state transitions.
///
/// Called after the storage commit, outside the engine's critical section.
/// A notifier failure must never roll back the committed change, so the
/// trait cannot fail.
pub trait Notifier: Send + Sync {
    fn notify(&self, league_id: &str, change: ChangeKind);
}

/// Fans notifications out over a tokio broadcast channel as JSON strings,
/// ready for WebSocket subscribers.
pub struct ChannelNotifier {
    tx: broadcast::Sender<String>,
}

/// The broadcast payload: league plus change kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub league_id: String,
    pub change: ChangeKind,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        ChannelNotifier { tx }
    }

    /// A new receiver for the notification feed.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, league_id: &str, change: ChangeKind) {
        let event = ChangeEvent {
            league_id: league_id.to_string(),
            change,
        };
        let payload = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                debug!("failed to serialize change event: {e}");
                return;
            }
        };
        // send only errors when no receiver is subscribed, which is fine.
        if self.tx.send(payload).is_err() {
            debug!("no subscribers for {league_id} {change:?}");
        }
    }
}

/// Discards every notification. Used by tests and one-shot tooling.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _league_id: &str, _change: ChangeKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_serialized_event() {
        let notifier = ChannelNotifier::new(16);
        let mut rx = notifier.subscribe();

        notifier.notify("league1", ChangeKind::PickMade);

        let payload = rx.recv().await.unwrap();
        let event: ChangeEvent = serde_json::from_str(&payload).unwrap();
        assert_eq!(event.league_id, "league1");
        assert_eq!(event.change, ChangeKind::PickMade);
    }

    #[tokio::test]
    async fn events_arrive_in_order() {
        let notifier = ChannelNotifier::new(16);
        let mut rx = notifier.subscribe();

        notifier.notify("league1", ChangeKind::DraftStarted);
        notifier.notify("league1", ChangeKind::PickMade);
        notifier.notify("league1", ChangeKind::DraftCompleted);

        let changes: Vec<ChangeKind> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .iter()
        .map(|p| serde_json::from_str::<ChangeEvent>(p).unwrap().change)
        .collect();
        assert_eq!(
            changes,
            vec![
                ChangeKind::DraftStarted,
                ChangeKind::PickMade,
                ChangeKind::DraftCompleted
            ]
        );
    }

    #[test]
    fn notify_without_subscribers_does_not_panic() {
        let notifier = ChannelNotifier::new(16);
        notifier.notify("league1", ChangeKind::TeamJoined);
    }
}
