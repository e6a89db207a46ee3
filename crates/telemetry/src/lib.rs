#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Rudder Telemetry
//!
//! Event bus, metrics, and observability for the Rudder orchestration engine.
//!
//! This crate provides:
//! - [`EventBus`] -- broadcast-based distribution of [`DomainEvent`]s
//! - [`MetricsRegistry`] -- tagged counters and polled gauges
//! - [`TelemetryListener`] -- translates domain events into metrics
//! - [`StalenessTracker`] -- elapsed time since the last scheduled check
//!
//! Metrics are **best-effort projections** of engine activity. A failed
//! increment is logged and dropped; it is never allowed to affect the
//! event producer.

pub mod event;
pub mod listener;
pub mod metrics;
pub mod service;
pub mod staleness;

pub use event::{DomainEvent, EventBus, EventSubscriber};
pub use listener::{TelemetryListener, spawn_telemetry_listener};
pub use metrics::{
    Counter, InMemoryRegistry, MetricId, MetricsError, MetricsRegistry, NoopRegistry, SampleFn,
    Tag, spawn_gauge_sampler,
};
pub use service::{Telemetry, TelemetryConfig};
pub use staleness::{Clock, ManualClock, StalenessTracker, SystemClock};
