// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Pointwise Bounds
// ─────────────────────────────────────────────────────────────────────
//! Scalars that are either global or local to each grid point.
//!
//! Lipschitz constants and decision thresholds can be given once for the
//! whole state space or per discretization point (valid within an
//! epsilon-ball around it). Arithmetic is elementwise; a uniform value
//! broadcasts against a per-point array.

use crate::error::{SafeSetError, SafeSetResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Pointwise {
    /// One value for every point.
    Uniform(f64),
    /// One value per discretization point.
    PerPoint(Vec<f64>),
}

impl Pointwise {
    /// Value at grid point `i`.
    ///
    /// Per-point arrays are indexed directly; callers validate the length
    /// against the discretization once with [`Pointwise::check_len`].
    #[inline]
    pub fn at(&self, i: usize) -> f64 {
        match self {
            Self::Uniform(v) => *v,
            Self::PerPoint(values) => values[i],
        }
    }

    /// Number of stored values, `None` for a uniform bound.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Uniform(_) => None,
            Self::PerPoint(values) => Some(values.len()),
        }
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, Self::Uniform(_))
    }

    /// Per-point arrays must cover exactly `n` points.
    pub fn check_len(&self, context: &str, n: usize) -> SafeSetResult<()> {
        match self.len() {
            Some(len) => SafeSetError::check_len(context, n, len),
            None => Ok(()),
        }
    }

    /// Expand to `n` explicit values.
    pub fn to_vec(&self, n: usize) -> Vec<f64> {
        match self {
            Self::Uniform(v) => vec![*v; n],
            Self::PerPoint(values) => values.clone(),
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Uniform(v) => Self::Uniform(f(*v)),
            Self::PerPoint(values) => Self::PerPoint(values.iter().map(|&v| f(v)).collect()),
        }
    }

    /// Combine two bounds elementwise, broadcasting uniform values.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> SafeSetResult<Self> {
        match (self, other) {
            (Self::Uniform(a), Self::Uniform(b)) => Ok(Self::Uniform(f(*a, *b))),
            (Self::Uniform(a), Self::PerPoint(bs)) => {
                Ok(Self::PerPoint(bs.iter().map(|&b| f(*a, b)).collect()))
            }
            (Self::PerPoint(as_), Self::Uniform(b)) => {
                Ok(Self::PerPoint(as_.iter().map(|&a| f(a, *b)).collect()))
            }
            (Self::PerPoint(as_), Self::PerPoint(bs)) => {
                SafeSetError::check_len("pointwise operands", as_.len(), bs.len())?;
                Ok(Self::PerPoint(
                    as_.iter().zip(bs.iter()).map(|(&a, &b)| f(a, b)).collect(),
                ))
            }
        }
    }

    pub fn add(&self, other: &Self) -> SafeSetResult<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn mul(&self, other: &Self) -> SafeSetResult<Self> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Self::Uniform(v) => v.is_finite(),
            Self::PerPoint(values) => values.iter().all(|v| v.is_finite()),
        }
    }
}

impl From<f64> for Pointwise {
    fn from(value: f64) -> Self {
        Self::Uniform(value)
    }
}

impl From<Vec<f64>> for Pointwise {
    fn from(values: Vec<f64>) -> Self {
        Self::PerPoint(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_broadcasts() {
        let a = Pointwise::Uniform(2.0);
        let b = Pointwise::PerPoint(vec![1.0, 2.0, 3.0]);
        let c = a.mul(&b).unwrap();
        assert_eq!(c, Pointwise::PerPoint(vec![2.0, 4.0, 6.0]));
        assert_eq!(c.at(1), 4.0);
    }

    #[test]
    fn test_uniform_with_uniform_stays_uniform() {
        let c = Pointwise::Uniform(0.3).add(&Pointwise::Uniform(0.4)).unwrap();
        assert!(c.is_uniform());
        assert!((c.at(7) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_per_point_length_mismatch() {
        let a = Pointwise::PerPoint(vec![1.0, 2.0]);
        let b = Pointwise::PerPoint(vec![1.0, 2.0, 3.0]);
        assert!(matches!(a.add(&b), Err(SafeSetError::Shape { .. })));
    }

    #[test]
    fn test_check_len() {
        assert!(Pointwise::Uniform(1.0).check_len("lipschitz", 10).is_ok());
        assert!(Pointwise::PerPoint(vec![1.0; 3]).check_len("lipschitz", 3).is_ok());
        assert!(Pointwise::PerPoint(vec![1.0; 3]).check_len("lipschitz", 4).is_err());
    }

    #[test]
    fn test_to_vec() {
        assert_eq!(Pointwise::Uniform(0.5).to_vec(3), vec![0.5; 3]);
    }

    #[test]
    fn test_from_scalar_and_vec() {
        assert_eq!(Pointwise::from(0.25), Pointwise::Uniform(0.25));
        assert_eq!(Pointwise::from(vec![1.0, 2.0]), Pointwise::PerPoint(vec![1.0, 2.0]));
    }

    #[test]
    fn test_is_finite() {
        assert!(Pointwise::Uniform(1.0).is_finite());
        assert!(!Pointwise::PerPoint(vec![1.0, f64::INFINITY]).is_finite());
    }
}
