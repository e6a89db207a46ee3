//! Domain events and the event bus that distributes them.
//!
//! Uses [`tokio::sync::broadcast`] for fan-out delivery to multiple
//! subscribers. Events are fire-and-forget projections -- dropping them is
//! acceptable.

use std::sync::atomic::{AtomicU64, Ordering};

use rudder_core::{ApiVersion, ArtifactType, ResourceName, ResourceState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lifecycle event emitted by the orchestration engine.
///
/// Events are immutable once constructed; subscribers receive cloned
/// copies and hold no reference back into the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DomainEvent {
    /// A scheduled check of a resource completed with an outcome.
    ResourceCheckResult {
        /// The resource name.
        name: ResourceName,
        /// API version of the spec that declared the resource.
        api_version: ApiVersion,
        /// The resource kind.
        kind: String,
        /// The outcome of the check.
        state: ResourceState,
        /// The application the resource belongs to.
        application: String,
    },
    /// A scheduled check of a resource was skipped.
    ResourceCheckSkipped {
        /// The resource name.
        name: ResourceName,
        /// API version of the spec that declared the resource.
        api_version: ApiVersion,
        /// The resource kind.
        kind: String,
    },
    /// A new version of a deliverable artifact was registered.
    ArtifactVersionUpdated {
        /// The artifact name.
        name: String,
        /// The artifact packaging format.
        artifact_type: ArtifactType,
    },
    /// A scheduled check cycle is starting.
    ScheduledCheckStarting,
    /// Actuation was launched to converge a drifted resource.
    ResourceActuationLaunched {
        /// The resource name.
        name: ResourceName,
        /// API version of the spec that declared the resource.
        api_version: ApiVersion,
        /// The resource kind.
        kind: String,
        /// The application the resource belongs to.
        application: String,
    },
}

/// Broadcast-based event bus.
///
/// Delivers events to all active subscribers. If no subscribers are
/// listening, events are silently dropped (fire-and-forget).
///
/// # Examples
///
/// ```
/// use rudder_telemetry::event::{DomainEvent, EventBus};
///
/// let bus = EventBus::new(64);
/// let mut sub = bus.subscribe();
///
/// bus.emit(DomainEvent::ScheduledCheckStarting);
///
/// // In async context: let event = sub.recv().await;
/// assert_eq!(bus.total_emitted(), 1);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
    emitted: AtomicU64,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    ///
    /// When the channel is full, the oldest events are dropped (lagging
    /// subscribers will see a `RecvError::Lagged`).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers.
    ///
    /// This is non-blocking and returns silently if there are no active
    /// subscribers.
    pub fn emit(&self, event: DomainEvent) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        // Ignore send error (no active receivers).
        let _ = self.sender.send(event);
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Total number of events emitted since creation.
    #[must_use]
    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .field("total_emitted", &self.total_emitted())
            .finish()
    }
}

/// Subscription handle for receiving events from the [`EventBus`].
pub struct EventSubscriber {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventSubscriber {
    /// Receive the next event, waiting asynchronously.
    ///
    /// Lagged stretches (events missed due to buffer overflow) are skipped
    /// with a warning. Returns `None` once the sender has been dropped.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    ///
    /// Returns `None` if no event is immediately available.
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_skipped(name: &str) -> DomainEvent {
        DomainEvent::ResourceCheckSkipped {
            name: name.parse().unwrap(),
            api_version: "v1".parse().unwrap(),
            kind: "cluster".to_owned(),
        }
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        bus.emit(DomainEvent::ScheduledCheckStarting);
        assert_eq!(bus.total_emitted(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_receives_via_try_recv() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.emit(check_skipped("web"));

        let event = sub.try_recv().expect("should receive event");
        assert_eq!(event, check_skipped("web"));
    }

    #[tokio::test]
    async fn subscriber_receives_via_recv() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe();

        bus.emit(check_skipped("web"));

        let event = sub.recv().await.expect("should receive event");
        match event {
            DomainEvent::ResourceCheckSkipped { name, kind, .. } => {
                assert_eq!(name, "web");
                assert_eq!(kind, "cluster");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn multiple_subscribers_each_get_a_copy() {
        let bus = EventBus::new(16);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(DomainEvent::ScheduledCheckStarting);

        assert!(sub1.try_recv().is_some());
        assert!(sub2.try_recv().is_some());
    }

    #[test]
    fn subscriber_count_tracks_active_subscriptions() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);

        let sub1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
