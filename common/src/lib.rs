//! fxwatch Common Types
//!
//! This crate contains shared types used across fxwatch, including currency
//! codes, canonical pair keys, alarm definitions and the user configuration
//! record.

pub mod monetary;
pub mod alarm;
pub mod config;
pub mod error;
pub mod time;

pub use monetary::*;
pub use alarm::*;
pub use config::*;
pub use error::*;
pub use time::*;
