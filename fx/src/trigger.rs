//! Cooldown tracking for fired alarms.

use std::collections::HashMap;

use chrono::Duration;
use fxwatch_common::{Timestamp, TriggerSignature};
use parking_lot::Mutex;
use tracing::debug;

/// Remembers when each trigger signature last fired.
///
/// Entries are never purged; the map is bounded by the number of distinct
/// signatures ever configured during the process lifetime.
pub struct TriggerTracker {
    last_fired: Mutex<HashMap<TriggerSignature, Timestamp>>,
}

impl TriggerTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Check-and-set: record `now` and return true if `signature` has never
    /// fired or last fired at least `cooldown` ago. Otherwise leave the
    /// record untouched and return false.
    pub fn should_fire(
        &self,
        signature: &TriggerSignature,
        now: Timestamp,
        cooldown: Duration,
    ) -> bool {
        let mut last_fired = self.last_fired.lock();

        if let Some(last) = last_fired.get(signature) {
            let elapsed = now.signed_duration_since(*last);
            if elapsed < cooldown {
                debug!(
                    signature = %signature,
                    elapsed_secs = elapsed.num_seconds(),
                    "Alarm suppressed by cooldown"
                );
                return false;
            }
        }

        last_fired.insert(signature.clone(), now);
        true
    }

    /// When `signature` last fired.
    pub fn last_fired(&self, signature: &TriggerSignature) -> Option<Timestamp> {
        self.last_fired.lock().get(signature).copied()
    }

    /// Get the number of signatures that have ever fired.
    pub fn len(&self) -> usize {
        self.last_fired.lock().len()
    }

    /// Check if nothing has fired yet.
    pub fn is_empty(&self) -> bool {
        self.last_fired.lock().is_empty()
    }
}

impl Default for TriggerTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxwatch_common::{now, Direction, PairKey};
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn signature() -> TriggerSignature {
        TriggerSignature::new(&PairKey::from_parts("EUR", "CHF"), 0.9, Direction::Above)
    }

    #[test]
    fn test_first_fire_records() {
        let tracker = TriggerTracker::new();
        let t0 = now();

        assert!(tracker.should_fire(&signature(), t0, Duration::minutes(5)));
        assert_eq!(tracker.last_fired(&signature()), Some(t0));
    }

    #[test]
    fn test_cooldown_window() {
        let tracker = TriggerTracker::new();
        let cooldown = Duration::minutes(5);
        let t0 = now();

        assert!(tracker.should_fire(&signature(), t0, cooldown));
        assert!(!tracker.should_fire(&signature(), t0 + Duration::minutes(4), cooldown));

        // Suppressed check must not move the window
        assert_eq!(tracker.last_fired(&signature()), Some(t0));

        // Boundary is inclusive
        assert!(tracker.should_fire(&signature(), t0 + cooldown, cooldown));
        assert_eq!(tracker.last_fired(&signature()), Some(t0 + cooldown));
    }

    #[test]
    fn test_signatures_independent() {
        let tracker = TriggerTracker::new();
        let cooldown = Duration::minutes(5);
        let t0 = now();
        let below = TriggerSignature::new(&PairKey::from_parts("EUR", "CHF"), 0.9, Direction::Below);

        assert!(tracker.should_fire(&signature(), t0, cooldown));
        assert!(tracker.should_fire(&below, t0, cooldown));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_concurrent_same_signature_fires_once() {
        let tracker = Arc::new(TriggerTracker::new());
        let fired = Arc::new(AtomicUsize::new(0));
        let t0 = now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                let fired = fired.clone();
                std::thread::spawn(move || {
                    if tracker.should_fire(&signature(), t0, Duration::minutes(5)) {
                        fired.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    proptest! {
        #[test]
        fn prop_refires_only_after_cooldown(offset_secs in 0i64..900, cooldown_secs in 1i64..600) {
            let tracker = TriggerTracker::new();
            let cooldown = Duration::seconds(cooldown_secs);
            let t0 = now();

            prop_assert!(tracker.should_fire(&signature(), t0, cooldown));
            let refired = tracker.should_fire(&signature(), t0 + Duration::seconds(offset_secs), cooldown);
            prop_assert_eq!(refired, offset_secs >= cooldown_secs);
        }
    }
}
