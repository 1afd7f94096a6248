//! Atomically published rate snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use fxwatch_common::{PairKey, Timestamp};
use parking_lot::RwLock;
use tracing::debug;

/// The complete set of pair rates computed by one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSnapshot {
    rates: HashMap<PairKey, f64>,
    published_at: Option<Timestamp>,
}

impl RateSnapshot {
    /// Create a snapshot from computed rates.
    pub fn new(rates: HashMap<PairKey, f64>, published_at: Timestamp) -> Self {
        Self {
            rates,
            published_at: Some(published_at),
        }
    }

    /// Empty snapshot that has never been published.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the rate for a pair.
    pub fn get(&self, key: &PairKey) -> Option<f64> {
        self.rates.get(key).copied()
    }

    /// Check whether a pair is present.
    pub fn contains(&self, key: &PairKey) -> bool {
        self.rates.contains_key(key)
    }

    /// Get the number of pairs.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Check if the snapshot holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// When the refresh cycle that produced this snapshot published it.
    pub fn published_at(&self) -> Option<Timestamp> {
        self.published_at
    }
}

/// Holder of the latest published snapshot.
///
/// Writers swap in a whole new snapshot; readers get a shared handle to an
/// immutable one, so a reader never sees a snapshot under construction.
pub struct RateSnapshotStore {
    current: RwLock<Arc<RateSnapshot>>,
}

impl RateSnapshotStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(RateSnapshot::empty())),
        }
    }

    /// Get the latest published snapshot.
    pub fn current(&self) -> Arc<RateSnapshot> {
        self.current.read().clone()
    }

    /// Publish a new snapshot, returning the one it replaced.
    ///
    /// The caller keeps its own handle to `snapshot`, which stays valid even
    /// if another writer publishes right after.
    pub fn replace(&self, snapshot: Arc<RateSnapshot>) -> Arc<RateSnapshot> {
        let pairs = snapshot.len();
        let previous = std::mem::replace(&mut *self.current.write(), snapshot);
        debug!(pairs, "Rate snapshot published");
        previous
    }
}

impl Default for RateSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
