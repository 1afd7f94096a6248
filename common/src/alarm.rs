//! Alarm definitions and trigger signatures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownDirection;
use crate::monetary::PairKey;

/// Which side of the target an alarm watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Fires when the rate is at or above the target.
    Above,
    /// Fires when the rate is at or below the target.
    Below,
}

impl Direction {
    /// Lowercase name as used in configuration and signatures.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }

    /// Check whether `rate` crosses `target` in this direction.
    ///
    /// Both directions are inclusive of the target itself.
    pub fn is_crossed(&self, rate: f64, target: f64) -> bool {
        match self {
            Direction::Above => rate >= target,
            Direction::Below => rate <= target,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(Direction::Above),
            "below" => Ok(Direction::Below),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

/// A user-defined rate alarm.
///
/// `pair` and `direction` are kept as the user typed them and are only
/// interpreted at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Free-text pair, e.g. `"eur/chf"` or `"EURCHF"`.
    pub pair: String,
    /// Threshold rate.
    pub target: f64,
    /// Free-text direction, `"above"` or `"below"`.
    pub direction: String,
}

impl Alarm {
    /// Create a new alarm.
    pub fn new(pair: impl Into<String>, target: f64, direction: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            target,
            direction: direction.into(),
        }
    }

    /// Canonical key of the watched pair.
    pub fn pair_key(&self) -> PairKey {
        PairKey::from_alarm_pair(&self.pair)
    }

    /// Parse the configured direction.
    pub fn parsed_direction(&self) -> Result<Direction, UnknownDirection> {
        self.direction.parse()
    }

    /// Describe why this alarm can never fire, if anything is wrong with it.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if let Err(e) = self.parsed_direction() {
            problems.push(e.to_string());
        }
        let key = self.pair_key();
        if !key.is_well_formed() {
            problems.push(format!("pair {:?} does not normalize to FROM/TO", key.as_str()));
        }
        if !self.target.is_finite() {
            problems.push(format!("target {} is not a finite number", self.target));
        }
        problems
    }
}

/// Content-derived identity of an alarm, used for cooldown deduplication.
///
/// Two alarms with the same pair, target and direction share one signature
/// even if they were configured independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerSignature(String);

impl TriggerSignature {
    /// Build a signature. The target is rounded to 4 decimal places.
    pub fn new(key: &PairKey, target: f64, direction: Direction) -> Self {
        Self(format!("{}:{:.4}:{}", key, target, direction))
    }

    /// Get the signature as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TriggerSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(" Above ".parse::<Direction>().unwrap(), Direction::Above);
        assert_eq!("BELOW".parse::<Direction>().unwrap(), Direction::Below);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_inclusive() {
        assert!(Direction::Above.is_crossed(1.0, 1.0));
        assert!(Direction::Below.is_crossed(1.0, 1.0));
        assert!(!Direction::Above.is_crossed(0.99, 1.0));
        assert!(!Direction::Below.is_crossed(1.01, 1.0));
    }

    #[test]
    fn test_signature_format() {
        let key = PairKey::from_parts("eur", "chf");
        let sig = TriggerSignature::new(&key, 0.9, Direction::Above);
        assert_eq!(sig.as_str(), "EUR/CHF:0.9000:above");
    }

    #[test]
    fn test_signature_ignores_float_jitter() {
        let key = PairKey::from_parts("EUR", "CHF");
        let a = TriggerSignature::new(&key, 0.9, Direction::Below);
        let b = TriggerSignature::new(&key, 0.900000001, Direction::Below);
        assert_eq!(a, b);
    }

    #[test]
    fn test_alarm_problems() {
        assert!(Alarm::new("eurchf", 0.9, "above").problems().is_empty());

        let bad = Alarm::new("eurch", 0.9, "sideways");
        assert_eq!(bad.problems().len(), 2);
    }

    #[test]
    fn test_alarm_deserialize() {
        let alarm: Alarm =
            serde_json::from_str(r#"{"pair":"EURCHF","target":0.95,"direction":"below"}"#).unwrap();
        assert_eq!(alarm.pair_key().as_str(), "EUR/CHF");
        assert_eq!(alarm.parsed_direction().unwrap(), Direction::Below);
    }
}
