//! Integration test for the full event-to-metric path.
//!
//! Verifies that a started telemetry subsystem subscribes to the bus,
//! translates every event variant, and terminates cleanly.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use rudder_telemetry::event::{DomainEvent, EventBus};
use rudder_telemetry::listener::{
    self, TelemetryListener, spawn_telemetry_listener,
};
use rudder_telemetry::metrics::{InMemoryRegistry, Tag};
use rudder_telemetry::service::{Telemetry, TelemetryConfig};
use rudder_telemetry::staleness::SystemClock;

#[tokio::test]
async fn every_event_variant_is_translated_end_to_end() {
    let registry = Arc::new(InMemoryRegistry::new());
    let telemetry = Telemetry::start(
        TelemetryConfig::default(),
        registry.clone(),
        Arc::new(SystemClock::new()),
    );

    let bus = telemetry.event_bus();
    bus.emit(DomainEvent::ResourceCheckResult {
        name: "web".parse().unwrap(),
        api_version: "v1".parse().unwrap(),
        kind: "cluster".to_owned(),
        state: "ACTIVE".parse().unwrap(),
        application: "myapp".to_owned(),
    });
    bus.emit(DomainEvent::ResourceCheckSkipped {
        name: "web".parse().unwrap(),
        api_version: "v1".parse().unwrap(),
        kind: "cluster".to_owned(),
    });
    bus.emit(DomainEvent::ArtifactVersionUpdated {
        name: "myapp-server".to_owned(),
        artifact_type: "DOCKER".parse().unwrap(),
    });
    bus.emit(DomainEvent::ScheduledCheckStarting);
    bus.emit(DomainEvent::ResourceActuationLaunched {
        name: "web".parse().unwrap(),
        api_version: "v1".parse().unwrap(),
        kind: "cluster".to_owned(),
        application: "myapp".to_owned(),
    });

    // Give the listener task a moment to drain the bus.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        registry.counter_value(
            listener::RESOURCE_CHECKED,
            &[
                Tag::new("resourceName", "web"),
                Tag::new("apiVersion", "v1"),
                Tag::new("resourceKind", "cluster"),
                Tag::new("resourceState", "ACTIVE"),
                Tag::new("resourceApplication", "myapp"),
            ],
        ),
        Some(1)
    );
    assert_eq!(
        registry.counter_value(
            listener::RESOURCE_CHECK_SKIPPED,
            &[
                Tag::new("resourceName", "web"),
                Tag::new("apiVersion", "v1"),
                Tag::new("resourceKind", "cluster"),
            ],
        ),
        Some(1)
    );
    assert_eq!(
        registry.counter_value(
            listener::ARTIFACT_UPDATED,
            &[
                Tag::new("artifactName", "myapp-server"),
                Tag::new("artifactType", "DOCKER"),
            ],
        ),
        Some(1)
    );
    assert_eq!(
        registry.counter_value(
            listener::RESOURCE_ACTUATION_LAUNCHED,
            &[
                Tag::new("resourceName", "web"),
                Tag::new("apiVersion", "v1"),
                Tag::new("resourceKind", "cluster"),
                Tag::new("resourceApplication", "myapp"),
            ],
        ),
        Some(1)
    );

    let shutdown = tokio::time::timeout(Duration::from_secs(2), telemetry.shutdown()).await;
    assert!(shutdown.is_ok(), "telemetry should shut down cleanly");
}

#[tokio::test]
async fn listener_terminates_when_bus_dropped() {
    let bus = EventBus::new(16);
    let registry = Arc::new(InMemoryRegistry::new());
    let listener = TelemetryListener::new(registry, Arc::new(SystemClock::new()));

    let handle = spawn_telemetry_listener(&bus, listener, CancellationToken::new());

    drop(bus);

    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(
        result.is_ok(),
        "listener should terminate after bus is dropped"
    );
}

#[tokio::test]
async fn listener_terminates_on_cancellation() {
    let bus = EventBus::new(16);
    let registry = Arc::new(InMemoryRegistry::new());
    let listener = TelemetryListener::new(registry, Arc::new(SystemClock::new()));

    let cancel = CancellationToken::new();
    let handle = spawn_telemetry_listener(&bus, listener, cancel.clone());

    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
    assert!(result.is_ok(), "listener should terminate on cancellation");
}
