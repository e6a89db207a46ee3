//! Event-to-metric translation.
//!
//! [`TelemetryListener`] subscribes to the [`EventBus`] and maps each
//! [`DomainEvent`] variant to exactly one registry side effect: a tagged
//! counter increment, or a timestamp update feeding the check drift gauge.
//!
//! Instrumentation is strictly best-effort. A failed increment is logged
//! and dropped at the call site; it never reaches the event producer and
//! never blocks later events.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::event::{DomainEvent, EventBus, EventSubscriber};
use crate::metrics::{MetricsRegistry, Tag};
use crate::staleness::{Clock, StalenessTracker};

/// Counter: a scheduled resource check completed.
pub const RESOURCE_CHECKED: &str = "resource.checked";
/// Counter: a scheduled resource check was skipped.
pub const RESOURCE_CHECK_SKIPPED: &str = "resource.check.skipped";
/// Counter: actuation was launched for a drifted resource.
pub const RESOURCE_ACTUATION_LAUNCHED: &str = "resource.actuation.launched";
/// Counter: a new artifact version was registered.
pub const ARTIFACT_UPDATED: &str = "artifact.updated";
/// Gauge: milliseconds since the last scheduled check cycle began.
pub const RESOURCE_CHECK_DRIFT: &str = "resource.check.drift";

/// Translates engine lifecycle events into metrics.
///
/// Construction registers the check drift gauge with the registry as a
/// polled gauge; the registry samples it on its own schedule, so the
/// reported age keeps growing between events with no re-registration.
pub struct TelemetryListener {
    registry: Arc<dyn MetricsRegistry>,
    clock: Arc<dyn Clock>,
    last_check: Arc<StalenessTracker>,
}

impl TelemetryListener {
    /// Create a listener and register the drift gauge.
    ///
    /// The staleness tracker starts at the construction timestamp, so the
    /// gauge reads elapsed-time-since-start until the first scheduled
    /// check begins.
    pub fn new(registry: Arc<dyn MetricsRegistry>, clock: Arc<dyn Clock>) -> Self {
        let last_check = Arc::new(StalenessTracker::new(clock.now()));

        let sample = {
            let tracker = Arc::clone(&last_check);
            let clock = Arc::clone(&clock);
            Box::new(move || tracker.sample(clock.now()))
        };
        registry.register_polled_gauge(RESOURCE_CHECK_DRIFT, sample);

        Self {
            registry,
            clock,
            last_check,
        }
    }

    /// Handle a single event: exactly one registry side effect per variant.
    pub fn handle_event(&self, event: &DomainEvent) {
        match event {
            DomainEvent::ResourceCheckResult {
                name,
                api_version,
                kind,
                state,
                application,
            } => {
                self.try_increment(
                    RESOURCE_CHECKED,
                    vec![
                        Tag::new("resourceName", name.as_str()),
                        Tag::new("apiVersion", api_version.to_string()),
                        Tag::new("resourceKind", kind.clone()),
                        Tag::new("resourceState", state.as_str()),
                        Tag::new("resourceApplication", application.clone()),
                    ],
                );
            }
            DomainEvent::ResourceCheckSkipped {
                name,
                api_version,
                kind,
            } => {
                self.try_increment(
                    RESOURCE_CHECK_SKIPPED,
                    vec![
                        Tag::new("resourceName", name.as_str()),
                        Tag::new("apiVersion", api_version.to_string()),
                        Tag::new("resourceKind", kind.clone()),
                    ],
                );
            }
            DomainEvent::ArtifactVersionUpdated {
                name,
                artifact_type,
            } => {
                self.try_increment(
                    ARTIFACT_UPDATED,
                    vec![
                        Tag::new("artifactName", name.clone()),
                        Tag::new("artifactType", artifact_type.as_str()),
                    ],
                );
            }
            DomainEvent::ScheduledCheckStarting => {
                self.last_check.record_check_started(self.clock.now());
            }
            DomainEvent::ResourceActuationLaunched {
                name,
                api_version,
                kind,
                application,
            } => {
                self.try_increment(
                    RESOURCE_ACTUATION_LAUNCHED,
                    vec![
                        Tag::new("resourceName", name.as_str()),
                        Tag::new("apiVersion", api_version.to_string()),
                        Tag::new("resourceKind", kind.clone()),
                        Tag::new("resourceApplication", application.clone()),
                    ],
                );
            }
        }
    }

    /// Best-effort counter increment: the failure boundary.
    ///
    /// On error, logs the metric name and message and reports `false`.
    /// Never panics, never retries, never propagates.
    fn try_increment(&self, name: &'static str, tags: Vec<Tag>) -> bool {
        let counter = self.registry.counter(name, tags);
        match counter.increment() {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(metric = name, %error, "failed to increment counter");
                false
            }
        }
    }

    /// Drain events until the bus closes or `cancel` fires.
    pub async fn run(self, mut subscriber: EventSubscriber, cancel: CancellationToken) {
        loop {
            tokio::select! {
                event = subscriber.recv() => match event {
                    Some(event) => self.handle_event(&event),
                    None => break,
                },
                () = cancel.cancelled() => break,
            }
        }
    }
}

impl std::fmt::Debug for TelemetryListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryListener")
            .field("last_check", &self.last_check)
            .finish()
    }
}

/// Subscribe `listener` to `bus` and spawn its run loop.
///
/// The task stops when `cancel` is cancelled or the bus is dropped.
/// Returns the `JoinHandle` so the caller can await or abort the task.
pub fn spawn_telemetry_listener(
    bus: &EventBus,
    listener: TelemetryListener,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let subscriber = bus.subscribe();
    tokio::spawn(listener.run(subscriber, cancel))
}
