use std::{collections::VecDeque, future::Future};

use tokio::sync::{mpsc, watch};

use crate::models::{Coordinate, PositionFix};

/// Push stream of location fixes, injected into the reactor.
///
/// `None` ends the stream: the provider stopped or the subscription was dropped.
pub trait PositionSource: Send {
    fn next_fix(&mut self) -> impl Future<Output = Option<PositionFix>> + Send;
}

/// Provider side of a location stream.
///
/// Keeps only the latest fix and stamps every fix with a strictly increasing
/// sequence number, so consumers can tell stale results from fresh ones.
#[derive(Debug)]
pub struct LocationFeed {
    sender: watch::Sender<Option<PositionFix>>,
}

impl Default for LocationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn publish(&self, position: Coordinate) -> PositionFix {
        let mut fix = PositionFix {
            position,
            sequence: 0,
        };
        // Sequence is assigned under the channel lock so concurrent publishers stay ordered.
        self.sender.send_modify(|latest| {
            fix.sequence = latest.map_or(1, |previous| previous.sequence + 1);
            *latest = Some(fix);
        });
        fix
    }

    pub fn latest(&self) -> Option<PositionFix> {
        *self.sender.borrow()
    }

    /// New subscriptions start from the latest fix, if any; dropping one unsubscribes.
    pub fn subscribe(&self) -> FeedSubscription {
        let receiver = self.sender.subscribe();
        let pending = *receiver.borrow();
        FeedSubscription { receiver, pending }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Consumer side of a [`LocationFeed`]. Fixes published while the consumer is
/// busy collapse into the most recent one.
#[derive(Debug)]
pub struct FeedSubscription {
    receiver: watch::Receiver<Option<PositionFix>>,
    pending: Option<PositionFix>,
}

impl PositionSource for FeedSubscription {
    async fn next_fix(&mut self) -> Option<PositionFix> {
        if let Some(fix) = self.pending.take() {
            return Some(fix);
        }
        loop {
            self.receiver.changed().await.ok()?;
            let latest = *self.receiver.borrow_and_update();
            if let Some(fix) = latest {
                return Some(fix);
            }
        }
    }
}

impl PositionSource for mpsc::Receiver<PositionFix> {
    fn next_fix(&mut self) -> impl Future<Output = Option<PositionFix>> + Send {
        self.recv()
    }
}

/// Finite, pre-recorded sequence of fixes.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    fixes: VecDeque<PositionFix>,
}

impl ReplaySource {
    pub fn new(fixes: impl IntoIterator<Item = PositionFix>) -> Self {
        Self {
            fixes: fixes.into_iter().collect(),
        }
    }

    /// Numbers positions 1, 2, 3... in order.
    pub fn from_positions(positions: impl IntoIterator<Item = Coordinate>) -> Self {
        Self::new(sequenced(positions))
    }

    pub fn remaining(&self) -> usize {
        self.fixes.len()
    }
}

impl PositionSource for ReplaySource {
    async fn next_fix(&mut self) -> Option<PositionFix> {
        self.fixes.pop_front()
    }
}

pub fn sequenced(positions: impl IntoIterator<Item = Coordinate>) -> Vec<PositionFix> {
    positions
        .into_iter()
        .zip(1u64..)
        .map(|(position, sequence)| PositionFix { position, sequence })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_assigns_increasing_sequences() {
        let feed = LocationFeed::new();
        let first = feed.publish(Coordinate::new(-73.58, 45.49));
        let second = feed.publish(Coordinate::new(-73.57, 45.50));
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(feed.latest(), Some(second));
    }

    #[tokio::test]
    async fn late_subscriber_starts_from_latest_fix() {
        let feed = LocationFeed::new();
        feed.publish(Coordinate::new(0.0, 0.0));
        let latest = feed.publish(Coordinate::new(0.0, 0.001));

        let mut subscription = feed.subscribe();
        assert_eq!(subscription.next_fix().await, Some(latest));
    }

    #[tokio::test]
    async fn busy_subscriber_only_sees_most_recent_fix() {
        let feed = LocationFeed::new();
        let mut subscription = feed.subscribe();
        feed.publish(Coordinate::new(0.0, 0.0));
        feed.publish(Coordinate::new(0.0, 0.001));
        let latest = feed.publish(Coordinate::new(0.0, 0.002));

        assert_eq!(subscription.next_fix().await, Some(latest));
    }

    #[tokio::test]
    async fn dropping_the_feed_ends_the_stream() {
        let feed = LocationFeed::new();
        let mut subscription = feed.subscribe();
        drop(feed);
        assert_eq!(subscription.next_fix().await, None);
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let feed = LocationFeed::new();
        let subscription = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn replay_source_yields_fixes_in_order() {
        let mut source = ReplaySource::from_positions([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
        ]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_fix().await.map(|f| f.sequence), Some(1));
        assert_eq!(source.next_fix().await.map(|f| f.sequence), Some(2));
        assert_eq!(source.next_fix().await, None);
    }

    #[tokio::test]
    async fn channel_receiver_is_a_position_source() {
        let (tx, mut rx) = mpsc::channel(4);
        let fix = PositionFix {
            position: Coordinate::new(1.0, 2.0),
            sequence: 7,
        };
        tx.send(fix).await.unwrap();
        drop(tx);
        assert_eq!(rx.next_fix().await, Some(fix));
        assert_eq!(rx.next_fix().await, None);
    }
}
