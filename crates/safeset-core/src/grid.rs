// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — State-Space Discretization
// ─────────────────────────────────────────────────────────────────────
//! Discretization contract and the rectangular `GridWorld`.
//!
//! Points are stored as one flat N×D row-major array in `ij` meshgrid
//! order: the last axis varies fastest.

use safeset_types::{SafeSetError, SafeSetResult};

/// A finite, ordered sample of the state space.
///
/// The engine only needs the sample count, the dimensionality, the
/// per-axis coordinates (for boundary faces) and the enumerated points.
pub trait Discretization: Send + Sync {
    /// Number of sample points N.
    fn len(&self) -> usize;

    /// State dimension D.
    fn ndim(&self) -> usize;

    /// Coordinates along each axis, one array per dimension.
    fn discrete_points(&self) -> &[Vec<f64>];

    /// All N points, N×D row-major.
    fn all_points(&self) -> &[f64];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cartesian product of the given axes in `ij` order, flattened row-major.
pub(crate) fn meshgrid_ij(axes: &[&[f64]]) -> Vec<f64> {
    let ndim = axes.len();
    let total: usize = axes.iter().map(|a| a.len()).product();
    if ndim == 0 || total == 0 {
        return Vec::new();
    }

    let mut points = Vec::with_capacity(total * ndim);
    let mut index = vec![0usize; ndim];
    for _ in 0..total {
        for (d, axis) in axes.iter().enumerate() {
            points.push(axis[index[d]]);
        }
        // Odometer increment, last axis fastest
        for d in (0..ndim).rev() {
            index[d] += 1;
            if index[d] < axes[d].len() {
                break;
            }
            index[d] = 0;
        }
    }
    points
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    let mut axis: Vec<f64> = (0..n).map(|i| lo + i as f64 * step).collect();
    axis[n - 1] = hi;
    axis
}

/// Uniform rectangular grid over a box in state space.
#[derive(Debug, Clone)]
pub struct GridWorld {
    limits: Vec<(f64, f64)>,
    num_points: Vec<usize>,
    axes: Vec<Vec<f64>>,
    points: Vec<f64>,
}

impl GridWorld {
    /// Build a grid with `num_points[d]` samples on `[limits[d].0, limits[d].1]`.
    pub fn new(limits: &[(f64, f64)], num_points: &[usize]) -> SafeSetResult<Self> {
        if limits.is_empty() {
            return Err(SafeSetError::Validation(
                "grid needs at least one dimension".to_string(),
            ));
        }
        SafeSetError::check_len("grid point counts", limits.len(), num_points.len())?;

        for (d, (&(lo, hi), &n)) in limits.iter().zip(num_points.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(SafeSetError::Validation(format!(
                    "axis {d}: limits must be finite with lo <= hi, got ({lo}, {hi})"
                )));
            }
            if n == 0 {
                return Err(SafeSetError::Validation(format!(
                    "axis {d}: need at least one point"
                )));
            }
        }

        let axes: Vec<Vec<f64>> = limits
            .iter()
            .zip(num_points.iter())
            .map(|(&(lo, hi), &n)| linspace(lo, hi, n))
            .collect();
        let axis_refs: Vec<&[f64]> = axes.iter().map(|a| a.as_slice()).collect();
        let points = meshgrid_ij(&axis_refs);

        Ok(Self {
            limits: limits.to_vec(),
            num_points: num_points.to_vec(),
            axes,
            points,
        })
    }

    pub fn limits(&self) -> &[(f64, f64)] {
        &self.limits
    }

    pub fn num_points(&self) -> &[usize] {
        &self.num_points
    }

    /// Grid spacing along each axis (0 for single-point axes).
    pub fn unit_maxes(&self) -> Vec<f64> {
        self.limits
            .iter()
            .zip(self.num_points.iter())
            .map(|(&(lo, hi), &n)| if n > 1 { (hi - lo) / (n - 1) as f64 } else { 0.0 })
            .collect()
    }

    /// Coordinates of grid point `index`.
    pub fn index_to_state(&self, index: usize) -> SafeSetResult<&[f64]> {
        if index >= self.len() {
            return Err(SafeSetError::Validation(format!(
                "grid index {index} out of range for {} points",
                self.len()
            )));
        }
        let d = self.ndim();
        Ok(&self.points[index * d..(index + 1) * d])
    }

    /// Index of the grid point nearest to `state`; states outside the box
    /// are clipped onto it.
    pub fn state_to_index(&self, state: &[f64]) -> SafeSetResult<usize> {
        SafeSetError::check_len("state dimension", self.ndim(), state.len())?;
        let units = self.unit_maxes();
        let mut index = 0usize;
        for d in 0..self.ndim() {
            let n = self.num_points[d];
            let axis_index = if n > 1 {
                let raw = ((state[d] - self.limits[d].0) / units[d]).round();
                raw.clamp(0.0, (n - 1) as f64) as usize
            } else {
                0
            };
            index = index * n + axis_index;
        }
        Ok(index)
    }
}

impl Discretization for GridWorld {
    fn len(&self) -> usize {
        self.num_points.iter().product()
    }

    fn ndim(&self) -> usize {
        self.limits.len()
    }

    fn discrete_points(&self) -> &[Vec<f64>] {
        &self.axes
    }

    fn all_points(&self) -> &[f64] {
        &self.points
    }
}
