//! Alarm evaluation against a rate snapshot.

use std::sync::Arc;

use chrono::Duration;
use fxwatch_common::{Alarm, Direction, PairKey, Timestamp, TriggerSignature};
use tracing::{debug, info};

use crate::sink::Notifier;
use crate::snapshot::RateSnapshot;
use crate::trigger::TriggerTracker;

/// Title used for every alarm notification.
pub const ALARM_TITLE: &str = "FX Alarm";

/// An alarm that passed both its rate condition and the cooldown check.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmFiring {
    pub signature: TriggerSignature,
    pub pair: PairKey,
    pub rate: f64,
    pub target: f64,
    pub direction: Direction,
}

impl AlarmFiring {
    /// Notification body, e.g. `EUR/CHF is now 0.9500 (target 0.9000 above)`.
    pub fn message(&self) -> String {
        format!(
            "{} is now {:.4} (target {:.4} {})",
            self.pair, self.rate, self.target, self.direction
        )
    }
}

/// Decides which alarms fire and hands them to the notifier.
pub struct AlarmEvaluator {
    tracker: Arc<TriggerTracker>,
    notifier: Arc<dyn Notifier>,
    cooldown: Duration,
}

impl AlarmEvaluator {
    /// Create an evaluator.
    pub fn new(tracker: Arc<TriggerTracker>, notifier: Arc<dyn Notifier>, cooldown: Duration) -> Self {
        Self {
            tracker,
            notifier,
            cooldown,
        }
    }

    /// Cooldown applied per trigger signature.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Evaluate every alarm independently against `snapshot`.
    pub fn evaluate(
        &self,
        alarms: &[Alarm],
        snapshot: &RateSnapshot,
        now: Timestamp,
    ) -> Vec<AlarmFiring> {
        let mut fired = Vec::new();

        for alarm in alarms {
            let pair = alarm.pair_key();
            let Some(rate) = snapshot.get(&pair) else {
                continue;
            };

            let direction = match alarm.parsed_direction() {
                Ok(direction) => direction,
                Err(e) => {
                    debug!(pair = %pair, error = %e, "Skipping alarm");
                    continue;
                }
            };

            if !direction.is_crossed(rate, alarm.target) {
                continue;
            }

            let signature = TriggerSignature::new(&pair, alarm.target, direction);
            if !self.tracker.should_fire(&signature, now, self.cooldown) {
                continue;
            }

            let firing = AlarmFiring {
                signature,
                pair,
                rate,
                target: alarm.target,
                direction,
            };

            info!(
                signature = %firing.signature,
                rate = firing.rate,
                "Alarm fired"
            );
            self.notifier.notify(ALARM_TITLE, &firing.message());
            fired.push(firing);
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingNotifier;
    use fxwatch_common::now;
    use std::collections::HashMap;

    fn setup() -> (AlarmEvaluator, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let evaluator = AlarmEvaluator::new(
            Arc::new(TriggerTracker::new()),
            notifier.clone(),
            Duration::minutes(5),
        );
        (evaluator, notifier)
    }

    fn snapshot(rate: f64) -> RateSnapshot {
        let mut rates = HashMap::new();
        rates.insert(PairKey::from_parts("EUR", "CHF"), rate);
        RateSnapshot::new(rates, now())
    }

    #[test]
    fn test_fires_once_per_cooldown() {
        let (evaluator, notifier) = setup();
        let alarms = vec![Alarm::new("eur/chf", 0.90, "above")];
        let snap = snapshot(0.95);
        let t0 = now();

        assert_eq!(evaluator.evaluate(&alarms, &snap, t0).len(), 1);
        assert!(evaluator
            .evaluate(&alarms, &snap, t0 + Duration::minutes(1))
            .is_empty());
        assert_eq!(
            evaluator
                .evaluate(&alarms, &snap, t0 + Duration::minutes(5) + Duration::seconds(1))
                .len(),
            1
        );
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_message_format() {
        let (evaluator, notifier) = setup();
        let alarms = vec![Alarm::new("EURCHF", 0.9, " Above ")];

        evaluator.evaluate(&alarms, &snapshot(0.95), now());

        let sent = notifier.sent();
        assert_eq!(sent[0].0, "FX Alarm");
        assert_eq!(sent[0].1, "EUR/CHF is now 0.9500 (target 0.9000 above)");
    }

    #[test]
    fn test_boundary_inclusive() {
        let (evaluator, _) = setup();
        let t0 = now();

        let below = vec![Alarm::new("EUR/CHF", 1.00, "below")];
        assert_eq!(evaluator.evaluate(&below, &snapshot(1.00), t0).len(), 1);

        let above = vec![Alarm::new("EUR/CHF", 1.00, "above")];
        assert_eq!(evaluator.evaluate(&above, &snapshot(1.00), t0).len(), 1);
    }

    #[test]
    fn test_condition_not_met_leaves_tracker_untouched() {
        let (evaluator, _) = setup();
        let alarms = vec![Alarm::new("EUR/CHF", 1.00, "above")];
        let t0 = now();

        assert!(evaluator.evaluate(&alarms, &snapshot(0.95), t0).is_empty());
        assert!(evaluator.tracker.is_empty());

        // Crossing a moment later fires immediately
        assert_eq!(
            evaluator
                .evaluate(&alarms, &snapshot(1.01), t0 + Duration::seconds(1))
                .len(),
            1
        );
    }

    #[test]
    fn test_unknown_direction_never_fires() {
        let (evaluator, notifier) = setup();
        let alarms = vec![Alarm::new("EUR/CHF", 0.5, "sideways")];

        for rate in [0.1, 0.5, 5.0] {
            assert!(evaluator.evaluate(&alarms, &snapshot(rate), now()).is_empty());
        }
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_missing_pair_skipped() {
        let (evaluator, notifier) = setup();
        let alarms = vec![
            Alarm::new("USD/JPY", 100.0, "above"),
            Alarm::new("eurch", 0.1, "above"),
            Alarm::new("EUR/CHF", 0.1, "above"),
        ];

        let fired = evaluator.evaluate(&alarms, &snapshot(0.95), now());

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].pair.as_str(), "EUR/CHF");
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_identical_alarms_share_cooldown() {
        let (evaluator, notifier) = setup();
        let alarms = vec![
            Alarm::new("EUR/CHF", 0.90, "above"),
            Alarm::new("eurchf", 0.9, "ABOVE"),
        ];
        let t0 = now();

        let fired = evaluator.evaluate(&alarms, &snapshot(0.95), t0);
        assert_eq!(fired.len(), 1);

        assert!(evaluator
            .evaluate(&alarms, &snapshot(0.96), t0 + Duration::minutes(2))
            .is_empty());
        assert_eq!(notifier.count(), 1);
    }
}
