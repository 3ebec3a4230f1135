// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Safe-Set Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{SafeSetError, SafeSetResult};

fn default_include_initial() -> bool {
    true
}

/// Runtime configuration for one certification pass.
///
/// The dynamics, Lyapunov function and grid are supplied in code; this
/// is the numeric subset that a learning loop tunes between iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeSetConfig {
    /// Discretization constant: radius of the ball around each grid point
    /// that the decrease condition has to cover.
    /// Default: 0.01.
    pub epsilon: f64,

    /// Width of the final bisection interval for the level-set search.
    /// Default: 1e-3.
    pub accuracy: f64,

    /// Search interval for cmax. `None` means `[0, max(V) + accuracy]`.
    #[serde(default)]
    pub interval: Option<[f64; 2]>,

    /// Whether the a-priori safe set always counts as decreasing.
    /// Default: true.
    #[serde(default = "default_include_initial")]
    pub include_initial: bool,
}

impl Default for SafeSetConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            accuracy: 1e-3,
            interval: None,
            include_initial: true,
        }
    }
}

impl SafeSetConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> SafeSetResult<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SafeSetError::Config(format!(
                "epsilon must be finite and > 0, got {}",
                self.epsilon
            )));
        }
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(SafeSetError::Config(format!(
                "accuracy must be finite and > 0, got {}",
                self.accuracy
            )));
        }
        if let Some([lo, hi]) = self.interval {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SafeSetError::Config(format!(
                    "interval bounds must be finite, got [{lo}, {hi}]"
                )));
            }
            if lo > hi {
                return Err(SafeSetError::Config(format!(
                    "interval must satisfy lo <= hi, got [{lo}, {hi}]"
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> SafeSetResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SafeSetError::Config(format!("JSON parse error: {e}")))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> SafeSetResult<String> {
        serde_json::to_string(self)
            .map_err(|e| SafeSetError::Config(format!("JSON encode error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SafeSetConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_epsilon() {
        let cfg = SafeSetConfig {
            epsilon: 0.0,
            ..SafeSetConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SafeSetError::Config(_))));
    }

    #[test]
    fn test_rejects_nan_accuracy() {
        let cfg = SafeSetConfig {
            accuracy: f64::NAN,
            ..SafeSetConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_reversed_interval() {
        let cfg = SafeSetConfig {
            interval: Some([1.0, 0.5]),
            ..SafeSetConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let cfg = SafeSetConfig::from_json(r#"{"epsilon": 0.5, "accuracy": 0.1}"#).unwrap();
        assert_eq!(cfg.epsilon, 0.5);
        assert_eq!(cfg.accuracy, 0.1);
        assert_eq!(cfg.interval, None);
        assert!(cfg.include_initial);
    }

    #[test]
    fn test_from_json_with_interval() {
        let cfg = SafeSetConfig::from_json(
            r#"{"epsilon": 1.0, "accuracy": 0.01, "interval": [0.0, 4.0], "include_initial": false}"#,
        )
        .unwrap();
        assert_eq!(cfg.interval, Some([0.0, 4.0]));
        assert!(!cfg.include_initial);
    }

    #[test]
    fn test_from_json_garbage() {
        let err = SafeSetConfig::from_json("{not json").unwrap_err();
        assert!(err.to_string().starts_with("config error: JSON parse error"));
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = SafeSetConfig {
            interval: Some([0.0, 2.5]),
            ..SafeSetConfig::default()
        };
        let back = SafeSetConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
