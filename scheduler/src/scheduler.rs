//! Scheduling driver for refresh cycles.

use std::sync::Arc;
use std::time::Duration;

use fxwatch_common::{remaining_until, ConfigSource, Configuration, Timestamp};
use fxwatch_fx::{RateSnapshot, RefreshEngine, RefreshOutcome};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::metrics::RefreshMetrics;
use crate::state::SchedulerState;

/// Menu label prefix for the manual refresh action.
pub const REFRESH_LABEL: &str = "Refresh Rates";

/// Runs refresh cycles on a fixed interval and on demand.
///
/// The timer cycle reloads the configuration from its source each time.
/// Manual refreshes reuse the most recently loaded or applied configuration,
/// and never move the timer.
pub struct Scheduler {
    engine: Arc<RefreshEngine>,
    source: Arc<dyn ConfigSource>,
    interval: Duration,
    configuration: RwLock<Arc<Configuration>>,
    next_due: RwLock<Option<Timestamp>>,
    state: RwLock<SchedulerState>,
    metrics: Arc<RefreshMetrics>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    /// Create a new scheduler, seeding the manual-refresh configuration from
    /// `source`. A failed load starts with an empty configuration and is
    /// retried at the first tick.
    pub fn new(engine: Arc<RefreshEngine>, source: Arc<dyn ConfigSource>, interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let configuration = match source.load() {
            Ok(configuration) => configuration,
            Err(e) => {
                warn!(error = %e, "Initial configuration load failed");
                Configuration::default()
            }
        };

        Self {
            engine,
            source,
            interval,
            configuration: RwLock::new(Arc::new(configuration)),
            next_due: RwLock::new(None),
            state: RwLock::new(SchedulerState::Starting),
            metrics: Arc::new(RefreshMetrics::new()),
            shutdown_tx,
        }
    }

    /// Run the timer loop until [`Scheduler::shutdown`] is called.
    ///
    /// The first cycle runs immediately. Cycle errors are logged and the
    /// loop carries on at the next tick.
    #[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
    pub async fn run(&self) {
        let mut shutdown = self.shutdown_tx.subscribe();
        if *shutdown.borrow() {
            *self.state.write() = SchedulerState::Stopped;
            return;
        }

        *self.state.write() = SchedulerState::Running;
        info!("Scheduler started");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let tick = tokio::select! {
                tick = ticker.tick() => tick,
                _ = shutdown.changed() => break,
            };

            if let Err(e) = self.run_scheduled_cycle().await {
                error!(code = e.error_code(), error = %e, "Scheduled refresh failed");
            }
            self.record_next_due(tick + self.interval);
        }

        *self.state.write() = SchedulerState::Stopped;
        info!("Scheduler stopped");
    }

    /// Request the timer loop to stop after the current cycle.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.write();
            if !state.is_terminal() {
                *state = SchedulerState::ShuttingDown;
            }
        }
        self.shutdown_tx.send_replace(true);
    }

    /// Load the configuration and run one refresh cycle.
    pub async fn run_scheduled_cycle(&self) -> Result<RefreshOutcome> {
        self.metrics.cycle_started();

        let configuration = match self.source.load() {
            Ok(configuration) => Arc::new(configuration),
            Err(e) => {
                self.metrics.config_failed();
                return Err(e.into());
            }
        };
        *self.configuration.write() = configuration.clone();

        self.refresh(&configuration).await
    }

    /// Run one refresh cycle now, against the current configuration.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome> {
        self.metrics.manual_refresh();
        let configuration = self.configuration();
        let result = self.refresh(&configuration).await;
        if let Err(e) = &result {
            warn!(error = %e, "Manual refresh failed");
        }
        result
    }

    /// Replace the configuration used by manual refreshes, e.g. after the
    /// user saved new settings. The next timer cycle reloads from the source.
    pub fn apply_configuration(&self, configuration: Configuration) {
        *self.configuration.write() = Arc::new(configuration);
    }

    /// Configuration used by the latest cycle.
    pub fn configuration(&self) -> Arc<Configuration> {
        self.configuration.read().clone()
    }

    /// Latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<RateSnapshot> {
        self.engine.current_snapshot()
    }

    /// When the next timer cycle is expected, if the loop has run a cycle yet.
    pub fn next_due(&self) -> Option<Timestamp> {
        *self.next_due.read()
    }

    /// When a snapshot was last published.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.engine.current_snapshot().published_at()
    }

    /// Label for the manual refresh action, with a countdown to the next cycle.
    pub fn countdown_label(&self, now: Timestamp) -> String {
        countdown_label(self.next_due(), now)
    }

    /// Current scheduler state.
    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> Arc<RefreshMetrics> {
        self.metrics.clone()
    }

    async fn refresh(&self, configuration: &Configuration) -> Result<RefreshOutcome> {
        match self.engine.refresh(configuration).await {
            Ok(outcome) => {
                if outcome.published {
                    self.metrics.snapshot_published(outcome.alarms_fired.len());
                }
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.cycle_failed();
                Err(e.into())
            }
        }
    }

    /// Map the ticker's next deadline onto the wall clock.
    fn record_next_due(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let remaining = chrono::Duration::from_std(remaining).unwrap_or(chrono::Duration::zero());
        *self.next_due.write() = Some(fxwatch_common::now() + remaining);
    }
}

/// `Refresh Rates (next: 04:59)`, `Refresh Rates (next: soon)`, or the bare
/// label when no cycle is scheduled yet.
pub fn countdown_label(next_due: Option<Timestamp>, now: Timestamp) -> String {
    let Some(next_due) = next_due else {
        return REFRESH_LABEL.to_string();
    };

    let secs = remaining_until(next_due, now).num_seconds();
    if secs == 0 {
        format!("{} (next: soon)", REFRESH_LABEL)
    } else {
        format!("{} (next: {:02}:{:02})", REFRESH_LABEL, secs / 60, secs % 60)
    }
}
