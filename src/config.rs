use serde::{Deserialize, Serialize};

use crate::accumulator::{Accumulator, DEFAULT_SIGFIG, LOWEST_DISCERNIBLE};
use crate::error::Error;

/// Precision and range shared by every accumulator a recorder allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RecorderConfig {
    /// Significant decimal digits kept, 0 through 5.
    pub significant_figures: u8,
    /// Smallest value distinguishable from zero.
    pub lowest_discernible_value: u64,
    /// Largest recordable value. `None` auto-resizes up to `u64::MAX`.
    pub highest_trackable_value: Option<u64>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            significant_figures: DEFAULT_SIGFIG,
            lowest_discernible_value: LOWEST_DISCERNIBLE,
            highest_trackable_value: None,
        }
    }
}

impl RecorderConfig {
    /// Auto-resizing configuration at the given precision.
    pub fn with_precision(significant_figures: u8) -> Self {
        Self {
            significant_figures,
            ..Self::default()
        }
    }

    /// Allocate an empty accumulator with these settings.
    pub fn accumulator(&self) -> Result<Accumulator, Error> {
        match self.highest_trackable_value {
            Some(high) => {
                Accumulator::with_bounds(self.lowest_discernible_value, high, self.significant_figures)
            }
            None if self.lowest_discernible_value == LOWEST_DISCERNIBLE => {
                Accumulator::new(self.significant_figures)
            }
            None => Accumulator::with_bounds(
                self.lowest_discernible_value,
                self.lowest_discernible_value.saturating_mul(2),
                self.significant_figures,
            )
            .map(Accumulator::auto_resizing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RecorderConfig::default();
        assert_eq!(config.significant_figures, 3);
        assert_eq!(config.lowest_discernible_value, 1);
        assert_eq!(config.highest_trackable_value, None);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: RecorderConfig =
            serde_json::from_str(r#"{"significant_figures": 2}"#).unwrap();
        assert_eq!(config, RecorderConfig::with_precision(2));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = serde_json::from_str::<RecorderConfig>(r#"{"sigfigs": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn bounded_config_rejects_large_values() {
        let config = RecorderConfig {
            highest_trackable_value: Some(1_000),
            ..RecorderConfig::default()
        };
        let mut acc = config.accumulator().unwrap();
        assert!(acc.record(10_000).is_err());
    }

    #[test]
    fn custom_low_still_auto_resizes() {
        let config = RecorderConfig {
            lowest_discernible_value: 1_000,
            ..RecorderConfig::default()
        };
        let mut acc = config.accumulator().unwrap();
        acc.record(1_000_000_000).unwrap();
        assert_eq!(acc.count(), 1);
    }
}
