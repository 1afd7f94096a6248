//! User configuration record: watched pairs and alarms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::alarm::Alarm;
use crate::error::ConfigError;
use crate::monetary::{Currency, CurrencyPair};

/// Pairs and alarms as edited by the user.
///
/// The refresh engine only ever reads this; edits come from the settings
/// collaborator and the configuration store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Watched pairs, in display order.
    #[serde(default)]
    pub pairs: Vec<CurrencyPair>,
    /// Rate alarms, in display order.
    #[serde(default)]
    pub alarms: Vec<Alarm>,
}

impl Configuration {
    /// Create a configuration.
    pub fn new(pairs: Vec<CurrencyPair>, alarms: Vec<Alarm>) -> Self {
        Self { pairs, alarms }
    }

    /// Configuration written on first start.
    pub fn starter() -> Self {
        Self {
            pairs: vec![
                CurrencyPair::new(Currency::chf(), Currency::eur()),
                CurrencyPair::new(Currency::eur(), Currency::chf()),
            ],
            alarms: Vec::new(),
        }
    }

    /// Distinct base currencies across all pairs.
    pub fn bases(&self) -> BTreeSet<Currency> {
        self.pairs.iter().map(|p| p.from.clone()).collect()
    }

    /// Decode from JSON.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Encode as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Encode)
    }
}

/// Source of the current configuration.
///
/// Called at the start of every scheduled refresh cycle.
pub trait ConfigSource: Send + Sync {
    /// Load the current configuration.
    fn load(&self) -> Result<Configuration, ConfigError>;
}
