//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! The library never talks to a metrics backend itself. Every operation and
//! every policy reload is reported to a global [`MetricsSink`]; consumers
//! install one with [`set_sink`] and forward the numbers wherever they like.
//!
//! ```rust
//! use mediator_core::metrics::{MetricsSink, OperationStats, ReloadStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Counter {
//!     operations: AtomicU64,
//! }
//!
//! impl MetricsSink for Counter {
//!     fn on_operation(&self, _stats: &OperationStats) {
//!         self.operations.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn on_reload(&self, _stats: &ReloadStats) {}
//! }
//! ```

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};
use tracing::warn;

use crate::types::OperationKind;

/// Snapshot of one operation, passed to [`MetricsSink::on_operation`].
///
/// # Fields
///
/// * `operation` - Which operation ran, `GET_RESPONSE` for inbound reads.
/// * `duration` - Total wall-clock time of the call.
/// * `providers_involved` - Providers with names or criteria to act on.
/// * `resolved_names` - Names after wildcard expansion. Zero for inbound
///   follow-ups.
///
/// # Example
///
/// ```rust
/// use mediator_core::OperationKind;
/// use mediator_core::metrics::OperationStats;
/// use std::time::Duration;
///
/// let stats = OperationStats {
///     operation: OperationKind::Get,
///     duration: Duration::from_micros(250),
///     providers_involved: 2,
///     resolved_names: 3,
/// };
/// assert_eq!(stats.operation.to_string(), "GET");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub operation: OperationKind,
    /// Wall-clock time from entry to the last command being built
    pub duration: Duration,
    /// Providers that got a non-empty command
    pub providers_involved: usize,
    /// Names after wildcard expansion, before routing
    pub resolved_names: usize,
}

/// Per-phase timings of an outbound operation, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct OperationPhases {
    /// Qualification, wildcard resolution and routing
    pub resolve_ms: f64,
    /// Command assembly, including payload projection
    pub build_ms: f64,
    pub total_ms: f64,
}

impl OperationPhases {
    /// Time not accounted for by the measured phases.
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - (self.resolve_ms + self.build_ms)
    }
}

/// Emitted after a successful policy reload.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    pub reload_time: SystemTime,
    pub providers: usize,
    pub attributes: usize,
}

/// Consumer of operation and reload metrics.
///
/// Implement this to forward numbers to Prometheus, OpenTelemetry or any
/// other backend, then install it with [`set_sink`].
///
/// # Default Implementation
///
/// Until a sink is installed, a built-in no-op sink drops everything.
///
/// # Thread Safety
///
/// `DataOperations` is shared across threads, and the sink is called
/// synchronously from whichever thread runs the operation. Use atomics or
/// channels, and never block.
///
/// # Example
///
/// ```rust
/// use mediator_core::metrics::{MetricsSink, OperationStats, ReloadStats};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct InvolvementSink {
///     operations: AtomicU64,
///     providers: AtomicU64,
///     reloads: AtomicU64,
/// }
///
/// impl MetricsSink for InvolvementSink {
///     fn on_operation(&self, stats: &OperationStats) {
///         self.operations.fetch_add(1, Ordering::Relaxed);
///         self.providers
///             .fetch_add(stats.providers_involved as u64, Ordering::Relaxed);
///     }
///
///     fn on_reload(&self, _stats: &ReloadStats) {
///         self.reloads.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait MetricsSink: Send + Sync {
    /// Called after every operation, successful or answered with follow-ups.
    fn on_operation(&self, stats: &OperationStats);

    /// Called after a successful policy reload.
    fn on_reload(&self, stats: &ReloadStats);

    /// Phase breakdown for outbound operations. Ignored by default.
    fn on_operation_phases(&self, _stats: &OperationStats, _phases: &OperationPhases) {}
}

struct NoOpSink;

impl MetricsSink for NoOpSink {
    fn on_operation(&self, _stats: &OperationStats) {}
    fn on_reload(&self, _stats: &ReloadStats) {}
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

fn sink() -> Arc<dyn MetricsSink> {
    SINK.get_or_init(|| Arc::new(NoOpSink)).clone()
}

/// Install the global metrics sink.
///
/// The sink can be set once, before the first operation runs. Later calls
/// are ignored with a warning.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            event = "Metrics",
            phase = "SetSink",
            "Metrics sink was already initialized, ignoring set_sink. Install the sink before the first operation."
        );
    }
}

pub(crate) fn record_operation(stats: OperationStats) {
    sink().on_operation(&stats);
}

pub(crate) fn record_operation_phases(stats: OperationStats, phases: OperationPhases) {
    sink().on_operation_phases(&stats, &phases);
}

pub(crate) fn record_reload(providers: usize, attributes: usize) {
    sink().on_reload(&ReloadStats {
        reload_time: SystemTime::now(),
        providers,
        attributes,
    });
}
