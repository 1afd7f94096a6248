//! fxwatch FX Engine
//!
//! Fetches exchange rates, publishes consistent rate snapshots and evaluates
//! user alarms against them.
//!
//! # Features
//!
//! - One remote request per distinct base currency per cycle
//! - All-or-nothing snapshot publication
//! - Content-based alarm deduplication with a cooldown window
//! - Fire-and-forget notification and status seams
//!
//! # Example
//!
//! ```rust,ignore
//! use fxwatch_fx::{HttpRateProvider, RefreshEngine, RefreshEngineConfig};
//!
//! let provider = Arc::new(HttpRateProvider::new(HttpProviderConfig::default())?);
//! let engine = RefreshEngine::new(provider, notifier, status, RefreshEngineConfig::default());
//!
//! engine.refresh(&configuration).await?;
//! let snapshot = engine.current_snapshot();
//! ```

pub mod engine;
pub mod provider;
pub mod snapshot;
pub mod trigger;
pub mod alarm;
pub mod sink;
pub mod error;

pub use engine::{RefreshEngine, RefreshEngineConfig, RefreshOutcome};
pub use provider::{BaseRates, HttpProviderConfig, HttpRateProvider, RateProvider};
pub use snapshot::{RateSnapshot, RateSnapshotStore};
pub use trigger::TriggerTracker;
pub use alarm::{AlarmEvaluator, AlarmFiring};
pub use sink::{Notifier, StatusSink};
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use sink::{RecordingNotifier, RecordingStatus};
