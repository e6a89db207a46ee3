//! Telemetry wiring facade.
//!
//! [`Telemetry`] assembles the event bus, the listener, and the gauge
//! sampler from explicitly supplied dependencies. There is no hidden
//! wiring: the registry and clock are constructor parameters, which keeps
//! every piece independently testable.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::event::EventBus;
use crate::listener::{TelemetryListener, spawn_telemetry_listener};
use crate::metrics::{InMemoryRegistry, spawn_gauge_sampler};
use crate::staleness::Clock;

/// Configuration for the telemetry subsystem.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Event bus channel capacity.
    pub event_buffer: usize,
    /// How often the registry samples polled gauges.
    pub sample_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            event_buffer: 1024,
            sample_interval: Duration::from_secs(10),
        }
    }
}

/// Running telemetry subsystem: bus, listener task, and gauge sampler.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use rudder_telemetry::event::DomainEvent;
/// use rudder_telemetry::metrics::InMemoryRegistry;
/// use rudder_telemetry::service::{Telemetry, TelemetryConfig};
/// use rudder_telemetry::staleness::SystemClock;
///
/// # #[tokio::main] async fn main() {
/// let registry = Arc::new(InMemoryRegistry::new());
/// let telemetry = Telemetry::start(
///     TelemetryConfig::default(),
///     registry,
///     Arc::new(SystemClock::new()),
/// );
///
/// telemetry.event_bus().emit(DomainEvent::ScheduledCheckStarting);
/// telemetry.shutdown().await;
/// # }
/// ```
pub struct Telemetry {
    event_bus: Arc<EventBus>,
    registry: Arc<InMemoryRegistry>,
    cancel: CancellationToken,
    listener_task: tokio::task::JoinHandle<()>,
    sampler_task: tokio::task::JoinHandle<()>,
}

impl Telemetry {
    /// Wire up and start the telemetry subsystem.
    ///
    /// Spawns the listener task (subscribed before this call returns, so
    /// no event emitted afterwards is missed) and the registry-owned
    /// gauge sampler. Must be called within a tokio runtime.
    pub fn start(
        config: TelemetryConfig,
        registry: Arc<InMemoryRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer));
        let cancel = CancellationToken::new();

        let listener = TelemetryListener::new(registry.clone(), clock);
        let listener_task = spawn_telemetry_listener(&event_bus, listener, cancel.clone());
        let sampler_task = spawn_gauge_sampler(&registry, config.sample_interval, cancel.clone());

        Self {
            event_bus,
            registry,
            cancel,
            listener_task,
            sampler_task,
        }
    }

    /// The bus the engine emits events into.
    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// The registry holding the produced metrics.
    #[must_use]
    pub fn registry(&self) -> &Arc<InMemoryRegistry> {
        &self.registry
    }

    /// Stop the listener and sampler tasks and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.listener_task.await;
        let _ = self.sampler_task.await;
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("event_bus", &self.event_bus)
            .field("registry", &self.registry)
            .finish()
    }
}
