//! Acceptance notifications.
//!
//! The registry calls every attached [`EventEmitter`] exactly once per accepted
//! commitment, after the record is stored. Emitters cannot fail the call; they
//! log and drop what they cannot deliver.

use std::sync::{PoisonError, RwLock};

use commit_registry_types::{AccountId, CommitEvent, Commitment, Timepoint};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receives acceptance notifications.
pub trait EventEmitter: Send + Sync {
    fn publish(&self, event: &CommitEvent);
}

/// Subscription identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub uuid::Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter over the indexed event fields. `None` matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub from: Option<AccountId>,
    pub commitment: Option<Commitment>,
    /// Inclusive lower bound on the timepoint
    pub since: Option<Timepoint>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from(mut self, from: AccountId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = Some(commitment);
        self
    }

    pub fn since(mut self, timepoint: Timepoint) -> Self {
        self.since = Some(timepoint);
        self
    }

    pub fn matches(&self, event: &CommitEvent) -> bool {
        let from_match = self.from.map_or(true, |from| from == event.from);
        let commitment_match = self.commitment.map_or(true, |c| c == event.commitment);
        let since_match = self.since.map_or(true, |since| event.timepoint >= since);
        from_match && commitment_match && since_match
    }
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    sender: mpsc::Sender<CommitEvent>,
}

/// Routes events to subscribers over bounded channels.
///
/// Delivery never blocks: a full channel drops the event with a warning and a
/// closed channel is pruned on the next publish.
pub struct EventRouter {
    subscriptions: RwLock<Vec<Subscription>>,
    capacity: usize,
}

impl EventRouter {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> (SubscriptionId, mpsc::Receiver<CommitEvent>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = SubscriptionId::new();

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id: id.clone(),
                filter,
                sender,
            });
        debug!(subscription_id = ?id.0, "New subscription registered");

        (id, receiver)
    }

    /// Deliver an event to all matching subscribers.
    /// Returns the number of subscribers that received it.
    pub fn route(&self, event: &CommitEvent) -> usize {
        let mut delivered = 0;
        let mut closed_ids = Vec::new();

        {
            let subs = self
                .subscriptions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for sub in subs.iter().filter(|s| s.filter.matches(event)) {
                match sub.sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            subscription_id = ?sub.id.0,
                            timepoint = %event.timepoint,
                            "Subscriber channel full, dropping event"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        closed_ids.push(sub.id.clone());
                    }
                }
            }
        }

        if !closed_ids.is_empty() {
            let mut subs = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            subs.retain(|s| !closed_ids.contains(&s.id));
            debug!(removed = closed_ids.len(), "Cleaned up closed subscriptions");
        }

        delivered
    }

    pub fn unsubscribe(&self, id: &SubscriptionId) {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|s| s.id != *id);
        debug!(subscription_id = ?id.0, "Subscription removed");
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventEmitter for EventRouter {
    fn publish(&self, event: &CommitEvent) {
        let delivered = self.route(event);
        debug!(timepoint = %event.timepoint, delivered, "Commit event routed");
    }
}

/// Append-only in-memory log of published events, queryable by filter.
#[derive(Default)]
pub struct EventJournal {
    events: RwLock<Vec<CommitEvent>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events matching `filter`, in publication order.
    pub fn query(&self, filter: &EventFilter) -> Vec<CommitEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn events(&self) -> Vec<CommitEvent> {
        self.query(&EventFilter::new())
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventEmitter for EventJournal {
    fn publish(&self, event: &CommitEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commit_registry_types::ExtraData;

    fn account(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 32])
    }

    fn event(from: u8, commitment: u8, tick: u64) -> CommitEvent {
        CommitEvent {
            timepoint: Timepoint::new(tick, 0),
            from: account(from),
            commitment: Commitment::from_bytes([commitment; 32]),
            extra_data: ExtraData::empty(),
        }
    }

    #[tokio::test]
    async fn subscribe_and_receive() {
        let router = EventRouter::new(16);
        let (_id, mut rx) = router.subscribe(EventFilter::new());

        let e = event(1, 1, 10);
        assert_eq!(router.route(&e), 1);
        assert_eq!(rx.recv().await.unwrap(), e);
    }

    #[tokio::test]
    async fn from_filter() {
        let router = EventRouter::new(16);
        let (_id, mut rx) = router.subscribe(EventFilter::new().with_from(account(1)));

        assert_eq!(router.route(&event(2, 1, 10)), 0);
        let e = event(1, 1, 11);
        assert_eq!(router.route(&e), 1);
        assert_eq!(rx.recv().await.unwrap(), e);
    }

    #[tokio::test]
    async fn commitment_and_since_filters() {
        let router = EventRouter::new(16);
        let c = Commitment::from_bytes([9; 32]);
        let (_id, mut rx) = router.subscribe(
            EventFilter::new()
                .with_commitment(c)
                .since(Timepoint::new(5, 0)),
        );

        assert_eq!(router.route(&event(1, 9, 4)), 0);
        assert_eq!(router.route(&event(1, 8, 6)), 0);
        let e = event(1, 9, 5);
        assert_eq!(router.route(&e), 1);
        assert_eq!(rx.recv().await.unwrap(), e);
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let router = EventRouter::new(16);
        let (_a, mut rx1) = router.subscribe(EventFilter::new());
        let (_b, mut rx2) = router.subscribe(EventFilter::new().with_from(account(1)));

        assert_eq!(router.route(&event(1, 1, 1)), 2);
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();
    }

    #[test]
    fn full_channel_drops_without_failing() {
        let router = EventRouter::new(1);
        let (_id, mut rx) = router.subscribe(EventFilter::new());

        assert_eq!(router.route(&event(1, 1, 1)), 1);
        assert_eq!(router.route(&event(1, 2, 2)), 0);
        assert_eq!(router.subscription_count(), 1);
        assert_eq!(rx.try_recv().unwrap().commitment, Commitment::from_bytes([1; 32]));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribe() {
        let router = EventRouter::new(16);
        let (id, _rx) = router.subscribe(EventFilter::new());
        assert_eq!(router.subscription_count(), 1);
        router.unsubscribe(&id);
        assert_eq!(router.subscription_count(), 0);
    }

    #[test]
    fn closed_subscriber_cleaned_up() {
        let router = EventRouter::new(16);
        let (_id, rx) = router.subscribe(EventFilter::new());
        drop(rx);

        router.publish(&event(1, 1, 1));
        assert_eq!(router.subscription_count(), 0);
    }

    #[test]
    fn journal_records_and_filters() {
        let journal = EventJournal::new();
        journal.publish(&event(1, 1, 1));
        journal.publish(&event(2, 2, 2));
        journal.publish(&event(1, 3, 3));

        assert_eq!(journal.len(), 3);
        let from_one = journal.query(&EventFilter::new().with_from(account(1)));
        assert_eq!(from_one.len(), 2);
        assert_eq!(from_one[1].timepoint, Timepoint::new(3, 0));
        assert_eq!(
            journal
                .query(&EventFilter::new().since(Timepoint::new(2, 0)))
                .len(),
            2
        );
    }
}
