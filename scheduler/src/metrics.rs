//! Metrics collection for refresh monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

/// Refresh metrics.
pub struct RefreshMetrics {
    /// Total cycles started, scheduled and manual.
    pub cycles_total: AtomicU64,
    /// Cycles aborted by a fetch or configuration error.
    pub cycles_failed: AtomicU64,
    /// Cycles started by a manual refresh.
    pub manual_refreshes: AtomicU64,
    /// Configuration loads that failed.
    pub config_failures: AtomicU64,
    /// Snapshots published.
    pub snapshots_published: AtomicU64,
    /// Alarm notifications sent.
    pub alarms_fired: AtomicU64,
}

impl RefreshMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            manual_refreshes: AtomicU64::new(0),
            config_failures: AtomicU64::new(0),
            snapshots_published: AtomicU64::new(0),
            alarms_fired: AtomicU64::new(0),
        }
    }

    /// Record a scheduled cycle starting.
    pub fn cycle_started(&self) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a manual cycle starting.
    pub fn manual_refresh(&self) {
        self.manual_refreshes.fetch_add(1, Ordering::Relaxed);
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed cycle.
    pub fn cycle_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed configuration load.
    pub fn config_failed(&self) {
        self.config_failures.fetch_add(1, Ordering::Relaxed);
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a published snapshot and the alarms it fired.
    pub fn snapshot_published(&self, alarms_fired: usize) {
        self.snapshots_published.fetch_add(1, Ordering::Relaxed);
        self.alarms_fired
            .fetch_add(alarms_fired as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            manual_refreshes: self.manual_refreshes.load(Ordering::Relaxed),
            config_failures: self.config_failures.load(Ordering::Relaxed),
            snapshots_published: self.snapshots_published.load(Ordering::Relaxed),
            alarms_fired: self.alarms_fired.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP fxwatch_cycles_total Total refresh cycles started
# TYPE fxwatch_cycles_total counter
fxwatch_cycles_total {}

# HELP fxwatch_cycles_failed Refresh cycles aborted by an error
# TYPE fxwatch_cycles_failed counter
fxwatch_cycles_failed {}

# HELP fxwatch_manual_refreshes Refresh cycles started manually
# TYPE fxwatch_manual_refreshes counter
fxwatch_manual_refreshes {}

# HELP fxwatch_config_failures Failed configuration loads
# TYPE fxwatch_config_failures counter
fxwatch_config_failures {}

# HELP fxwatch_snapshots_published Rate snapshots published
# TYPE fxwatch_snapshots_published counter
fxwatch_snapshots_published {}

# HELP fxwatch_alarms_fired Alarm notifications sent
# TYPE fxwatch_alarms_fired counter
fxwatch_alarms_fired {}
"#,
            snapshot.cycles_total,
            snapshot.cycles_failed,
            snapshot.manual_refreshes,
            snapshot.config_failures,
            snapshot.snapshots_published,
            snapshot.alarms_fired,
        )
    }
}

impl Default for RefreshMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub cycles_failed: u64,
    pub manual_refreshes: u64,
    pub config_failures: u64,
    pub snapshots_published: u64,
    pub alarms_fired: u64,
}
