//! Integration test for the check drift gauge.
//!
//! Drives the full path: a `ScheduledCheckStarting` event through the bus
//! updates the staleness tracker, and the registry's sampling reports the
//! elapsed time. A manual clock makes the arithmetic deterministic.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use rudder_telemetry::event::DomainEvent;
use rudder_telemetry::listener::RESOURCE_CHECK_DRIFT;
use rudder_telemetry::metrics::InMemoryRegistry;
use rudder_telemetry::service::{Telemetry, TelemetryConfig};
use rudder_telemetry::staleness::ManualClock;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).expect("valid timestamp")
}

#[tokio::test]
async fn drift_gauge_reports_elapsed_time_since_last_check() {
    let registry = Arc::new(InMemoryRegistry::new());
    let clock = Arc::new(ManualClock::new(at(0)));
    let telemetry = Telemetry::start(TelemetryConfig::default(), registry.clone(), clock.clone());

    // Check cycle starts at T=1000ms.
    clock.set(at(1_000));
    telemetry.event_bus().emit(DomainEvent::ScheduledCheckStarting);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Sampling at T=2500ms reads an age of 1500ms.
    clock.set(at(2_500));
    registry.sample_gauges_once();
    assert_eq!(registry.gauge_value(RESOURCE_CHECK_DRIFT), Some(1_500.0));

    telemetry.shutdown().await;
}

#[tokio::test]
async fn sampler_task_keeps_the_gauge_current_between_events() {
    let registry = Arc::new(InMemoryRegistry::new());
    let clock = Arc::new(ManualClock::new(at(0)));
    let config = TelemetryConfig {
        sample_interval: Duration::from_millis(10),
        ..TelemetryConfig::default()
    };
    let telemetry = Telemetry::start(config, registry.clone(), clock.clone());

    // No check has started; the gauge reads elapsed time since
    // construction, refreshed by the sampler with no events at all.
    clock.set(at(5_000));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(registry.gauge_value(RESOURCE_CHECK_DRIFT), Some(5_000.0));

    telemetry.shutdown().await;
}
