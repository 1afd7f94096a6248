//! fxwatch Scheduler
//!
//! Drives the refresh engine on a fixed interval, serves manual refreshes,
//! and wires the engine to its configuration, notification and display
//! collaborators.

pub mod scheduler;
pub mod config;
pub mod store;
pub mod dispatch;
pub mod state;
pub mod metrics;
pub mod error;

pub use scheduler::Scheduler;
pub use config::ServiceConfig;
pub use store::JsonConfigStore;
pub use dispatch::{notification_channel, ChannelNotifier, CommandNotifier, LogNotifier, LogStatus};
pub use state::SchedulerState;
pub use metrics::RefreshMetrics;
pub use error::SchedulerError;
