// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Safe-Set Report Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Time model of the closed-loop system being certified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDomain {
    /// ẋ = f(x, u); decrease measured through ∇V · ẋ.
    Continuous,
    /// x⁺ = f(x, u); decrease measured through V(x⁺) − V(x).
    Discrete,
}

impl TimeDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
        }
    }
}

/// Snapshot of an engine's certified state after an update.
///
/// Handed to the outer learning loop, which uses it to decide where to
/// sample next and whether the policy may be expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeSetReport {
    pub time_domain: TimeDomain,
    /// Number of discretization points.
    pub n_points: usize,
    /// Certified level-set value.
    pub cmax: f64,
    /// Points inside the certified sub-level set.
    pub n_safe: usize,
    /// Points where the decrease condition holds.
    pub n_decreasing: usize,
    /// Points asserted safe a priori.
    pub n_initial: usize,
}

impl SafeSetReport {
    /// Fraction of the grid that is certified safe, in [0, 1].
    pub fn safe_fraction(&self) -> f64 {
        if self.n_points == 0 {
            return 0.0;
        }
        self.n_safe as f64 / self.n_points as f64
    }

    /// Whether the certified region grew beyond the a-priori seed.
    pub fn expanded_beyond_initial(&self) -> bool {
        self.n_safe > self.n_initial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(n_safe: usize, n_initial: usize) -> SafeSetReport {
        SafeSetReport {
            time_domain: TimeDomain::Discrete,
            n_points: 8,
            cmax: 1.5,
            n_safe,
            n_decreasing: 6,
            n_initial,
        }
    }

    #[test]
    fn test_safe_fraction() {
        assert!((report(2, 1).safe_fraction() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_safe_fraction_empty_grid() {
        let r = SafeSetReport {
            n_points: 0,
            n_safe: 0,
            ..report(0, 0)
        };
        assert_eq!(r.safe_fraction(), 0.0);
    }

    #[test]
    fn test_expanded_beyond_initial() {
        assert!(report(3, 1).expanded_beyond_initial());
        assert!(!report(1, 1).expanded_beyond_initial());
    }

    #[test]
    fn test_time_domain_serializes_snake_case() {
        let json = serde_json::to_string(&TimeDomain::Continuous).unwrap();
        assert_eq!(json, "\"continuous\"");
        assert_eq!(TimeDomain::Discrete.as_str(), "discrete");
    }
}
