//! Currency codes, currency pairs and canonical pair keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two sides of a canonical pair key.
pub const PAIR_SEPARATOR: char = '/';

/// Currency code.
///
/// Codes are free-form short strings and are not validated against ISO 4217.
/// They are trimmed and uppercased on construction so that comparisons are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn chf() -> Self {
        Self::new("CHF")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

/// A configured currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency; fetches are grouped by this side.
    pub from: Currency,
    /// Quote currency looked up in the base's rate table.
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: impl Into<Currency>, to: impl Into<Currency>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Canonical key for this pair.
    pub fn key(&self) -> PairKey {
        PairKey::from_parts(self.from.code(), self.to.code())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from, PAIR_SEPARATOR, self.to)
    }
}

/// Canonical `FROM/TO` pair key.
///
/// Both configured pairs and free-text alarm pairs are reduced to this form
/// so they can be compared against snapshot entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String);

impl PairKey {
    /// Build a key from the two sides of a pair.
    pub fn from_parts(from: &str, to: &str) -> Self {
        Self(format!(
            "{}{}{}",
            from.trim().to_uppercase(),
            PAIR_SEPARATOR,
            to.trim().to_uppercase()
        ))
    }

    /// Normalize a free-text alarm pair such as `"eur/chf"` or `"EURCHF"`.
    ///
    /// Six contiguous characters without a separator get one inserted after
    /// the third character. Any other input is kept as-is after uppercasing
    /// and whitespace removal, which yields a key that will simply never
    /// match a snapshot entry.
    pub fn from_alarm_pair(raw: &str) -> Self {
        let compact: String = raw
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if !compact.contains(PAIR_SEPARATOR) && compact.chars().count() == 6 {
            let (from, to): (String, String) = {
                let mut chars = compact.chars();
                let from = chars.by_ref().take(3).collect();
                (from, chars.collect())
            };
            return Self(format!("{}{}{}", from, PAIR_SEPARATOR, to));
        }

        Self(compact)
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has exactly one separator with non-empty sides.
    ///
    /// Advisory only: malformed keys are still accepted everywhere.
    pub fn is_well_formed(&self) -> bool {
        let mut parts = self.0.split(PAIR_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), None) => !from.is_empty() && !to.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
