use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::selection::UnmatchedWinnerPolicy;

use super::{easing::Easing, planner::ExtraTurns};

pub const DEFAULT_SPIN_MS: f64 = 5200.0;

/// Tunables for a single wheel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WheelConfig {
    /// Wall-clock length of one spin.
    pub spin_duration_ms: f64,
    pub easing: Easing,
    /// Full turns added before landing, drawn per spin.
    pub extra_turns: ExtraTurns,
    pub unmatched_winner: UnmatchedWinnerPolicy,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            spin_duration_ms: DEFAULT_SPIN_MS,
            easing: Easing::default(),
            extra_turns: ExtraTurns::default(),
            unmatched_winner: UnmatchedWinnerPolicy::default(),
        }
    }
}

impl WheelConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.spin_duration_ms.is_finite() || self.spin_duration_ms <= 0.0 {
            bail!(
                "spinDurationMs must be a positive number, got {}",
                self.spin_duration_ms
            );
        }
        if self.extra_turns.min == 0 {
            bail!("extraTurns.min must be at least 1");
        }
        if self.extra_turns.min > self.extra_turns.max {
            bail!(
                "extraTurns.min ({}) exceeds extraTurns.max ({})",
                self.extra_turns.min,
                self.extra_turns.max
            );
        }
        Ok(())
    }

    /// Copy with every out-of-range field pulled back to something usable.
    pub fn sanitized(&self) -> Self {
        let spin_duration_ms =
            if self.spin_duration_ms.is_finite() && self.spin_duration_ms > 0.0 {
                self.spin_duration_ms
            } else {
                DEFAULT_SPIN_MS
            };
        let min = self.extra_turns.min.max(1);
        let max = self.extra_turns.max.max(min);
        Self {
            spin_duration_ms,
            easing: self.easing,
            extra_turns: ExtraTurns { min, max },
            unmatched_winner: self.unmatched_winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WheelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = WheelConfig::default();
        config.spin_duration_ms = 0.0;
        assert!(config.validate().is_err());

        let mut config = WheelConfig::default();
        config.extra_turns = ExtraTurns { min: 0, max: 2 };
        assert!(config.validate().is_err());

        let mut config = WheelConfig::default();
        config.extra_turns = ExtraTurns { min: 5, max: 2 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sanitizing_repairs_bad_values() {
        let config = WheelConfig {
            spin_duration_ms: f64::NAN,
            extra_turns: ExtraTurns { min: 0, max: 0 },
            ..WheelConfig::default()
        }
        .sanitized();
        assert!(config.validate().is_ok());
        assert_eq!(config.spin_duration_ms, DEFAULT_SPIN_MS);
        assert_eq!(config.extra_turns, ExtraTurns { min: 1, max: 1 });
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: WheelConfig =
            serde_json::from_str(r#"{"spinDurationMs": 500, "easing": "easeOutQuart"}"#).unwrap();
        assert_eq!(config.spin_duration_ms, 500.0);
        assert_eq!(config.easing, Easing::EaseOutQuart);
        assert_eq!(config.extra_turns, ExtraTurns::default());
        assert_eq!(config.unmatched_winner, UnmatchedWinnerPolicy::Unresolved);
    }
}
