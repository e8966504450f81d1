//! Chain events and their publish/subscribe plumbing
//!
//! Each [`EventBus`] is owned by the chain instance that publishes on it;
//! there is no process-wide handler registry.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use beacon_core::ParticipantIndex;

/// Default number of events buffered per subscriber
pub const EVENT_BUFFER: usize = 64;

/// Emitted when a DKG result has been accepted by the chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkgResultSubmission {
    /// Member that submitted the result
    pub member_index: ParticipantIndex,
    /// Group public key carried by the result
    pub group_public_key: Vec<u8>,
    /// Members reported as misbehaving in the result
    pub misbehaved: Vec<ParticipantIndex>,
    /// Block at which the result was accepted
    pub block_number: u64,
}

/// Emitted when a new group is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRegistration {
    pub group_public_key: Vec<u8>,
    pub block_number: u64,
}

/// Broadcast bus for one event type
#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(EVENT_BUFFER)
    }
}

impl<E: Clone> EventBus<E> {
    /// Create a bus buffering up to `capacity` events per subscriber
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> Subscription<E> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish an event to all live subscribers
    ///
    /// Returns the number of subscribers that will observe the event.
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: E) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Handle to an event subscription
///
/// Dropping the handle, or calling [`Subscription::unsubscribe`], cancels it.
#[derive(Debug)]
pub struct Subscription<E> {
    rx: broadcast::Receiver<E>,
}

impl<E: Clone> Subscription<E> {
    /// Wait for the next event
    ///
    /// Returns `None` once the publishing side is gone.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already buffered
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Cancel the subscription
    pub fn unsubscribe(self) {
        drop(self.rx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(block_number: u64) -> GroupRegistration {
        GroupRegistration {
            group_public_key: vec![1, 2, 3],
            block_number,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus: EventBus<GroupRegistration> = EventBus::default();
        assert_eq!(bus.publish(registration(1)), 0);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();

        assert_eq!(bus.publish(registration(1)), 1);
        bus.publish(registration(2));

        assert_eq!(sub.try_recv().unwrap().block_number, 1);
        assert_eq!(sub.try_recv().unwrap().block_number, 2);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribe_cancels() {
        let bus = EventBus::default();
        let first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(registration(5)), 1);
        assert_eq!(second.try_recv().unwrap().block_number, 5);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let bus = EventBus::new(0);
        let mut sub = bus.subscribe();
        assert_eq!(bus.publish(registration(9)), 1);
        assert_eq!(sub.try_recv().unwrap().block_number, 9);
    }

    #[test]
    fn test_lagged_subscriber_keeps_latest() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();
        for block in 0..5 {
            bus.publish(registration(block));
        }

        assert_eq!(sub.try_recv().unwrap().block_number, 3);
        assert_eq!(sub.try_recv().unwrap().block_number, 4);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();
        bus.publish(registration(9));
        drop(bus);

        assert_eq!(sub.recv().await.unwrap().block_number, 9);
        assert!(sub.recv().await.is_none());
    }
}
