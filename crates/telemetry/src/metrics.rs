//! Tagged metrics primitives and registry.
//!
//! Provides counters keyed by metric identity (name plus ordered tag set)
//! and gauges backed by a polling function. [`InMemoryRegistry`] stores
//! values with atomics and owns the gauge sampling cadence; no external
//! exporter is required.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default per-name cardinality budget for [`InMemoryRegistry`].
const DEFAULT_MAX_CARDINALITY: usize = 2000;

/// A dimensional key/value pair attached to a metric.
///
/// Keys are fixed per metric name; values are derived from the event that
/// triggered the measurement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    key: &'static str,
    value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// The tag key.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The tag value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Identity of a metric: a name plus an ordered tag set.
///
/// Equality and hashing respect tag order; the same tags in a different
/// order are a different identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricId {
    name: &'static str,
    tags: Vec<Tag>,
}

impl MetricId {
    /// Create a new metric identity.
    #[must_use]
    pub fn new(name: &'static str, tags: Vec<Tag>) -> Self {
        Self { name, tags }
    }

    /// The metric name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The ordered tag set.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if self.tags.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", tag.key, tag.value)?;
        }
        f.write_str("}")
    }
}

/// Errors raised by a metrics backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// The registry refused a new tag set for a name past its budget.
    #[error("metric '{name}' exceeded cardinality limit of {limit} tag sets")]
    CardinalityLimit {
        /// The metric name.
        name: &'static str,
        /// The per-name budget that was exceeded.
        limit: usize,
    },
    /// The backend rejected the write.
    #[error("metric '{name}' rejected by backend: {reason}")]
    Backend {
        /// The metric name.
        name: &'static str,
        /// Backend-supplied reason.
        reason: String,
    },
}

/// An incrementing counter handle.
pub trait Counter: Send + Sync {
    /// Increment by `n`.
    fn add(&self, n: u64) -> Result<(), MetricsError>;

    /// Increment by one.
    fn increment(&self) -> Result<(), MetricsError> {
        self.add(1)
    }
}

/// A side-effect-free gauge read function.
///
/// Invoked on a registry-controlled schedule; must return a value without
/// failing.
pub type SampleFn = Box<dyn Fn() -> f64 + Send + Sync>;

/// Registry accepting counter increments keyed by metric identity and
/// gauge registrations backed by a polling function.
pub trait MetricsRegistry: Send + Sync {
    /// Get or create a counter for the given name and ordered tag set.
    fn counter(&self, name: &'static str, tags: Vec<Tag>) -> Arc<dyn Counter>;

    /// Register a polled gauge.
    ///
    /// The registry invokes `sample` on its own schedule. Re-registering
    /// under the same name replaces the previous sample function.
    fn register_polled_gauge(&self, name: &'static str, sample: SampleFn);
}

// ---------------------------------------------------------------------------
// InMemoryRegistry
// ---------------------------------------------------------------------------

struct AtomicCounter {
    value: AtomicU64,
}

impl Counter for AtomicCounter {
    fn add(&self, n: u64) -> Result<(), MetricsError> {
        self.value.fetch_add(n, Ordering::Relaxed);
        Ok(())
    }
}

/// Handle returned once a name is over its cardinality budget; every
/// increment fails so the caller's failure boundary absorbs it.
struct RejectedCounter {
    name: &'static str,
    limit: usize,
}

impl Counter for RejectedCounter {
    fn add(&self, _n: u64) -> Result<(), MetricsError> {
        Err(MetricsError::CardinalityLimit {
            name: self.name,
            limit: self.limit,
        })
    }
}

struct PolledGauge {
    sample: SampleFn,
    /// f64 bits of the most recent sample.
    last: AtomicU64,
}

#[derive(Default)]
struct CounterStore {
    by_id: HashMap<MetricId, Arc<AtomicCounter>>,
    tag_sets_per_name: HashMap<&'static str, usize>,
}

/// In-memory metrics registry.
///
/// Counters live in a map keyed by [`MetricId`]; the same identity always
/// returns the same underlying counter. Each name has a cardinality
/// budget: once it has accumulated `max_cardinality` distinct tag sets,
/// further tag sets get a handle whose increments fail with
/// [`MetricsError::CardinalityLimit`].
///
/// Polled gauges hold their most recent sample; [`spawn_gauge_sampler`]
/// runs the registry-owned sampling loop.
///
/// # Examples
///
/// ```
/// use rudder_telemetry::metrics::{InMemoryRegistry, MetricsRegistry, Tag};
///
/// let registry = InMemoryRegistry::new();
/// let tags = vec![Tag::new("resourceName", "web")];
/// let counter = registry.counter("resource.checked", tags.clone());
/// counter.increment().unwrap();
/// assert_eq!(registry.counter_value("resource.checked", &tags), Some(1));
/// ```
pub struct InMemoryRegistry {
    counters: RwLock<CounterStore>,
    gauges: RwLock<HashMap<&'static str, PolledGauge>>,
    max_cardinality: usize,
}

impl InMemoryRegistry {
    /// Create a new empty registry with the default cardinality budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_cardinality(DEFAULT_MAX_CARDINALITY)
    }

    /// Create a registry with a custom per-name cardinality budget.
    #[must_use]
    pub fn with_max_cardinality(max_cardinality: usize) -> Self {
        Self {
            counters: RwLock::new(CounterStore::default()),
            gauges: RwLock::new(HashMap::new()),
            max_cardinality,
        }
    }

    /// Current value of the counter with the given identity, if any
    /// increment has created it.
    #[must_use]
    pub fn counter_value(&self, name: &'static str, tags: &[Tag]) -> Option<u64> {
        let id = MetricId::new(name, tags.to_vec());
        self.counters
            .read()
            .by_id
            .get(&id)
            .map(|c| c.value.load(Ordering::Relaxed))
    }

    /// Most recently sampled value of the named gauge, if registered and
    /// sampled at least once.
    #[must_use]
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.gauges
            .read()
            .get(name)
            .map(|g| f64::from_bits(g.last.load(Ordering::Relaxed)))
    }

    /// Run every registered gauge's sample function once and store the
    /// results.
    pub fn sample_gauges_once(&self) {
        let gauges = self.gauges.read();
        for gauge in gauges.values() {
            let value = (gauge.sample)();
            gauge.last.store(value.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Spawn the registry-owned gauge sampling loop.
///
/// Samples every `period` until `cancel` is cancelled. Returns the
/// `JoinHandle` so the caller can await or abort the task.
pub fn spawn_gauge_sampler(
    registry: &Arc<InMemoryRegistry>,
    period: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let registry = Arc::clone(registry);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => registry.sample_gauges_once(),
                () = cancel.cancelled() => break,
            }
        }
    })
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry for InMemoryRegistry {
    fn counter(&self, name: &'static str, tags: Vec<Tag>) -> Arc<dyn Counter> {
        let id = MetricId::new(name, tags);

        if let Some(counter) = self.counters.read().by_id.get(&id) {
            let counter = Arc::clone(counter);
            return counter;
        }

        let mut store = self.counters.write();
        // Re-check under the write lock: another thread may have won.
        if let Some(counter) = store.by_id.get(&id) {
            let counter = Arc::clone(counter);
            return counter;
        }

        let seen = store.tag_sets_per_name.entry(name).or_insert(0);
        if *seen >= self.max_cardinality {
            return Arc::new(RejectedCounter {
                name,
                limit: self.max_cardinality,
            });
        }
        *seen += 1;

        let counter = Arc::new(AtomicCounter {
            value: AtomicU64::new(0),
        });
        store.by_id.insert(id, Arc::clone(&counter));
        counter
    }

    fn register_polled_gauge(&self, name: &'static str, sample: SampleFn) {
        self.gauges.write().insert(
            name,
            PolledGauge {
                sample,
                last: AtomicU64::new(0f64.to_bits()),
            },
        );
    }
}

impl fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("counters", &self.counters.read().by_id.len())
            .field("gauges", &self.gauges.read().len())
            .field("max_cardinality", &self.max_cardinality)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// NoopRegistry
// ---------------------------------------------------------------------------

struct NoopCounter;

impl Counter for NoopCounter {
    fn add(&self, _n: u64) -> Result<(), MetricsError> {
        Ok(())
    }
}

/// A no-op registry that discards all observations and never fails.
///
/// Useful for testing and contexts where metrics are not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

impl NoopRegistry {
    /// Create a noop registry.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MetricsRegistry for NoopRegistry {
    fn counter(&self, _name: &'static str, _tags: Vec<Tag>) -> Arc<dyn Counter> {
        Arc::new(NoopCounter)
    }

    fn register_polled_gauge(&self, _name: &'static str, _sample: SampleFn) {}
}
