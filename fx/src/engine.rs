//! Refresh orchestration: fetch, publish, evaluate.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use futures::future::try_join_all;
use fxwatch_common::{constants, Configuration, Currency, Timestamp};
use tracing::{debug, info, instrument, warn};

use crate::alarm::{AlarmEvaluator, AlarmFiring};
use crate::error::FxResult;
use crate::provider::{BaseRates, RateProvider};
use crate::sink::{Notifier, StatusSink};
use crate::snapshot::{RateSnapshot, RateSnapshotStore};
use crate::trigger::TriggerTracker;

/// Status shown when no pairs are configured.
pub const NO_PAIRS_STATUS: &str = "No currency pairs configured";

/// Status shown when a cycle resolved none of the configured pairs.
pub const NO_RATES_STATUS: &str = "No rates available";

/// Configuration for the refresh engine.
#[derive(Debug, Clone)]
pub struct RefreshEngineConfig {
    /// Minimum time between notifications for one trigger signature.
    pub alarm_cooldown: Duration,
}

impl Default for RefreshEngineConfig {
    fn default() -> Self {
        Self {
            alarm_cooldown: constants::alarm_cooldown(),
        }
    }
}

/// Summary of one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    /// Whether a new snapshot was published.
    pub published: bool,
    /// Number of distinct base currencies fetched.
    pub bases_fetched: usize,
    /// Number of pairs present in the published snapshot.
    pub pairs_resolved: usize,
    /// Alarms that fired during this cycle.
    pub alarms_fired: Vec<AlarmFiring>,
    /// Status text handed to the display.
    pub status_text: String,
}

/// The rate refresh engine.
pub struct RefreshEngine {
    provider: Arc<dyn RateProvider>,
    snapshots: Arc<RateSnapshotStore>,
    tracker: Arc<TriggerTracker>,
    evaluator: AlarmEvaluator,
    status: Arc<dyn StatusSink>,
}

impl RefreshEngine {
    /// Create a new engine with fresh snapshot and trigger stores.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        notifier: Arc<dyn Notifier>,
        status: Arc<dyn StatusSink>,
        config: RefreshEngineConfig,
    ) -> Self {
        let tracker = Arc::new(TriggerTracker::new());
        Self {
            provider,
            snapshots: Arc::new(RateSnapshotStore::new()),
            evaluator: AlarmEvaluator::new(tracker.clone(), notifier, config.alarm_cooldown),
            tracker,
            status,
        }
    }

    /// Latest published snapshot.
    pub fn current_snapshot(&self) -> Arc<RateSnapshot> {
        self.snapshots.current()
    }

    /// Shared handle to the trigger tracker.
    pub fn tracker(&self) -> Arc<TriggerTracker> {
        self.tracker.clone()
    }

    /// Run one refresh cycle for `cfg`.
    ///
    /// Any failed base fetch aborts the cycle before anything is published.
    pub async fn refresh(&self, cfg: &Configuration) -> FxResult<RefreshOutcome> {
        self.run(cfg, None).await
    }

    /// Run one refresh cycle with a fixed evaluation time.
    pub async fn refresh_at(&self, cfg: &Configuration, now: Timestamp) -> FxResult<RefreshOutcome> {
        self.run(cfg, Some(now)).await
    }

    #[instrument(skip(self, cfg, at), fields(pairs = cfg.pairs.len(), alarms = cfg.alarms.len()))]
    async fn run(&self, cfg: &Configuration, at: Option<Timestamp>) -> FxResult<RefreshOutcome> {
        if cfg.pairs.is_empty() {
            debug!("No pairs configured, skipping fetch");
            self.status.set_status_text(NO_PAIRS_STATUS);
            return Ok(RefreshOutcome {
                status_text: NO_PAIRS_STATUS.to_string(),
                ..Default::default()
            });
        }

        let bases = cfg.bases();
        let fetched = try_join_all(bases.iter().map(|base| self.provider.fetch_rates(base)))
            .await
            .map_err(|e| {
                warn!(
                    provider = self.provider.name(),
                    base = %e.base(),
                    code = e.error_code(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "Rate fetch failed, keeping previous snapshot"
                );
                e
            })?;

        let now = at.unwrap_or_else(fxwatch_common::now);
        let published = Arc::new(build_snapshot(cfg, &fetched, now));
        let pairs_resolved = published.len();

        // Single publish point; status and alarms below use this cycle's
        // snapshot even if a concurrent cycle publishes in between.
        self.snapshots.replace(published.clone());

        let status_text = format_status(cfg, &published);
        self.status.set_status_text(&status_text);

        let alarms_fired = self.evaluator.evaluate(&cfg.alarms, &published, now);

        info!(
            bases = fetched.len(),
            pairs_resolved,
            alarms_fired = alarms_fired.len(),
            "Refresh cycle completed"
        );

        Ok(RefreshOutcome {
            published: true,
            bases_fetched: fetched.len(),
            pairs_resolved,
            alarms_fired,
            status_text,
        })
    }
}

/// Resolve every configured pair against the fetched base tables.
fn build_snapshot(cfg: &Configuration, fetched: &[BaseRates], now: Timestamp) -> RateSnapshot {
    let by_base: HashMap<&Currency, &BaseRates> = fetched.iter().map(|r| (&r.base, r)).collect();

    let mut rates = HashMap::with_capacity(cfg.pairs.len());
    for pair in &cfg.pairs {
        let Some(table) = by_base.get(&pair.from) else {
            continue;
        };
        match table.rate_for(&pair.to) {
            Some(rate) => {
                rates.insert(pair.key(), rate);
            }
            None => debug!(pair = %pair, "Quote missing from provider response"),
        }
    }

    RateSnapshot::new(rates, now)
}

/// One `FROM/TO: rate` line per resolved pair, in configuration order.
pub fn format_status(cfg: &Configuration, snapshot: &RateSnapshot) -> String {
    let lines: Vec<String> = cfg
        .pairs
        .iter()
        .filter_map(|pair| {
            let key = pair.key();
            snapshot.get(&key).map(|rate| format!("{}: {:.4}", key, rate))
        })
        .collect();

    if lines.is_empty() {
        NO_RATES_STATUS.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::provider::MockRateProvider;
    use crate::sink::{RecordingNotifier, RecordingStatus};
    use fxwatch_common::{now, Alarm, CurrencyPair, PairKey};
    use tokio_test::assert_ok;

    struct Harness {
        provider: Arc<MockRateProvider>,
        notifier: Arc<RecordingNotifier>,
        status: Arc<RecordingStatus>,
        engine: RefreshEngine,
    }

    fn setup_engine() -> Harness {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rate("EUR", "CHF", 0.9512);
        provider.set_rate("EUR", "USD", 1.0843);
        provider.set_rate("CHF", "EUR", 1.0513);

        let notifier = Arc::new(RecordingNotifier::new());
        let status = Arc::new(RecordingStatus::new());
        let engine = RefreshEngine::new(
            provider.clone(),
            notifier.clone(),
            status.clone(),
            RefreshEngineConfig::default(),
        );

        Harness {
            provider,
            notifier,
            status,
            engine,
        }
    }

    fn config(pairs: &[(&str, &str)], alarms: Vec<Alarm>) -> Configuration {
        Configuration::new(
            pairs.iter().map(|(f, t)| CurrencyPair::new(*f, *t)).collect(),
            alarms,
        )
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let h = setup_engine();
        let cfg = config(&[("eur", "chf"), ("chf", "eur"), ("EUR", "usd")], vec![]);

        let outcome = assert_ok!(h.engine.refresh(&cfg).await);

        assert!(outcome.published);
        assert_eq!(outcome.bases_fetched, 2);
        assert_eq!(outcome.pairs_resolved, 3);

        let snapshot = h.engine.current_snapshot();
        assert_eq!(snapshot.get(&PairKey::from_parts("EUR", "CHF")), Some(0.9512));
        assert_eq!(snapshot.get(&PairKey::from_parts("CHF", "EUR")), Some(1.0513));
        assert!(snapshot.published_at().is_some());
    }

    #[tokio::test]
    async fn test_one_request_per_base() {
        let h = setup_engine();
        let cfg = config(&[("EUR", "CHF"), ("eur", "USD"), (" Eur ", "GBP")], vec![]);

        h.engine.refresh(&cfg).await.unwrap();

        assert_eq!(h.provider.calls_for("EUR"), 1);
        assert_eq!(h.provider.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_status_in_configuration_order() {
        let h = setup_engine();
        let cfg = config(&[("EUR", "USD"), ("CHF", "EUR"), ("EUR", "GBP"), ("EUR", "CHF")], vec![]);

        let outcome = h.engine.refresh(&cfg).await.unwrap();

        let expected = "EUR/USD: 1.0843\nCHF/EUR: 1.0513\nEUR/CHF: 0.9512";
        assert_eq!(outcome.status_text, expected);
        assert_eq!(h.status.text().as_deref(), Some(expected));
        assert_eq!(outcome.pairs_resolved, 3);
    }

    #[tokio::test]
    async fn test_empty_pairs_skips_fetch() {
        let h = setup_engine();
        h.engine.refresh(&config(&[("EUR", "CHF")], vec![])).await.unwrap();
        let before = h.engine.current_snapshot();

        let outcome = h.engine.refresh(&Configuration::default()).await.unwrap();

        assert!(!outcome.published);
        assert_eq!(h.provider.total_calls(), 1);
        assert_eq!(*h.engine.current_snapshot(), *before);
        assert_eq!(h.status.text().as_deref(), Some(NO_PAIRS_STATUS));
    }

    #[tokio::test]
    async fn test_no_rates_status() {
        let h = setup_engine();
        let outcome = h.engine.refresh(&config(&[("EUR", "XYZ")], vec![])).await.unwrap();

        assert!(outcome.published);
        assert_eq!(outcome.pairs_resolved, 0);
        assert_eq!(outcome.status_text, NO_RATES_STATUS);
        assert!(h.engine.current_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_failed_base_keeps_previous_snapshot() {
        let h = setup_engine();
        let cfg = config(&[("EUR", "CHF"), ("CHF", "EUR")], vec![Alarm::new("EURCHF", 0.5, "above")]);

        h.engine.refresh(&cfg).await.unwrap();
        let before = h.engine.current_snapshot();
        assert_eq!(h.notifier.count(), 1);

        h.provider.set_rate("EUR", "CHF", 0.99);
        h.provider.fail_base("CHF", 503);

        let result = h.engine.refresh(&cfg).await;

        assert!(matches!(result, Err(FxError::Remote { status: 503, .. })));
        assert_eq!(*h.engine.current_snapshot(), *before);
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_alarm_fires_after_publish() {
        let h = setup_engine();
        let cfg = config(
            &[("EUR", "CHF")],
            vec![
                Alarm::new("eur/chf", 0.90, "above"),
                Alarm::new("eur/chf", 0.90, "below"),
            ],
        );
        let t0 = now();

        let outcome = h.engine.refresh_at(&cfg, t0).await.unwrap();
        assert_eq!(outcome.alarms_fired.len(), 1);

        let outcome = h
            .engine
            .refresh_at(&cfg, t0 + Duration::minutes(1))
            .await
            .unwrap();
        assert!(outcome.alarms_fired.is_empty());

        let outcome = h
            .engine
            .refresh_at(&cfg, t0 + Duration::minutes(6))
            .await
            .unwrap();
        assert_eq!(outcome.alarms_fired.len(), 1);

        assert_eq!(h.notifier.count(), 2);
        assert_eq!(h.engine.tracker().len(), 1);
    }

    /// Status display that publishes a competing snapshot as soon as it is
    /// updated, standing in for a concurrent cycle finishing in between.
    #[derive(Default)]
    struct CompetingPublisher {
        store: parking_lot::Mutex<Option<Arc<RateSnapshotStore>>>,
    }

    impl StatusSink for CompetingPublisher {
        fn set_status_text(&self, _text: &str) {
            if let Some(store) = self.store.lock().as_ref() {
                store.replace(Arc::new(RateSnapshot::new(HashMap::new(), now())));
            }
        }
    }

    #[tokio::test]
    async fn test_alarms_use_own_cycle_snapshot() {
        let provider = Arc::new(MockRateProvider::new("test"));
        provider.set_rate("EUR", "CHF", 0.95);
        let notifier = Arc::new(RecordingNotifier::new());
        let status = Arc::new(CompetingPublisher::default());
        let engine = RefreshEngine::new(
            provider,
            notifier.clone(),
            status.clone(),
            RefreshEngineConfig::default(),
        );
        *status.store.lock() = Some(engine.snapshots.clone());

        let cfg = config(&[("EUR", "CHF")], vec![Alarm::new("EURCHF", 0.90, "above")]);
        let outcome = assert_ok!(engine.refresh(&cfg).await);

        assert_eq!(outcome.pairs_resolved, 1);
        assert_eq!(outcome.status_text, "EUR/CHF: 0.9500");
        assert_eq!(outcome.alarms_fired.len(), 1);
        assert_eq!(notifier.count(), 1);
        // The competing publish won the store
        assert!(engine.current_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_readers_not_blocked_by_slow_fetch() {
        let h = setup_engine();
        let cfg = config(&[("EUR", "CHF")], vec![]);
        h.engine.refresh(&cfg).await.unwrap();

        h.provider.set_delay(std::time::Duration::from_millis(200));
        let engine = Arc::new(h.engine);
        let background = {
            let engine = engine.clone();
            let cfg = cfg.clone();
            tokio::spawn(async move { engine.refresh(&cfg).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let started = std::time::Instant::now();
        let snapshot = engine.current_snapshot();
        assert!(started.elapsed() < std::time::Duration::from_millis(100));
        assert_eq!(snapshot.len(), 1);

        background.await.unwrap().unwrap();
    }
}
