// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Boundary Extremum Evaluator
// ─────────────────────────────────────────────────────────────────────
//! Smallest value of a function on the boundary of a rectangular grid.
//!
//! Used to cap level sets: a sub-level set {V ≤ c} with c below the
//! boundary minimum of V cannot leave the discretized domain.
//!
//! The boundary is never materialised as one set. For each axis i we
//! evaluate the slab where axis i is pinned to its two extreme samples and
//! every other axis spans its full sample set; points on several faces are
//! visited more than once, which is harmless for a minimum.

use safeset_types::{SafeSetError, SafeSetResult};

use crate::grid::{meshgrid_ij, Discretization};

/// Minimum of `fun` over the boundary faces of `discretization`.
///
/// `fun` maps an N×D row-major point array to N values.
/// Returns `+∞` for a discretization without points.
pub fn smallest_boundary_value<F>(mut fun: F, discretization: &dyn Discretization) -> SafeSetResult<f64>
where
    F: FnMut(&[f64], usize) -> SafeSetResult<Vec<f64>>,
{
    smallest_boundary_value_with(|points, ndim, _: &()| fun(points, ndim), discretization, &())
}

/// Same as [`smallest_boundary_value`], passing `context` verbatim to every
/// evaluation (auxiliary data such as error bounds or model parameters).
pub fn smallest_boundary_value_with<C, F>(
    mut fun: F,
    discretization: &dyn Discretization,
    context: &C,
) -> SafeSetResult<f64>
where
    C: ?Sized,
    F: FnMut(&[f64], usize, &C) -> SafeSetResult<Vec<f64>>,
{
    let ndim = discretization.ndim();
    let axes = discretization.discrete_points();
    SafeSetError::check_len("discretization axes", ndim, axes.len())?;

    let mut min_value = f64::INFINITY;
    if axes.iter().any(|axis| axis.is_empty()) {
        return Ok(min_value);
    }

    for i in 0..ndim {
        let axis = &axes[i];
        let extremes = [axis[0], axis[axis.len() - 1]];

        let slab_axes: Vec<&[f64]> = axes
            .iter()
            .enumerate()
            .map(|(d, a)| if d == i { &extremes[..] } else { a.as_slice() })
            .collect();
        let points = meshgrid_ij(&slab_axes);
        let n = points.len() / ndim;

        let values = fun(&points, ndim, context)?;
        SafeSetError::check_len("boundary function values", n, values.len())?;

        let smallest = values.iter().copied().fold(f64::INFINITY, f64::min);
        log::trace!("boundary axis {i}: {n} points, min {smallest:.6}");
        min_value = min_value.min(smallest);
    }

    Ok(min_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridWorld;

    fn two_abs_sum(points: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        Ok(points
            .chunks_exact(ndim)
            .map(|x| 2.0 * x.iter().map(|v| v.abs()).sum::<f64>())
            .collect())
    }

    #[test]
    fn test_smallest_boundary_value() {
        let grid = GridWorld::new(&[(-1.5, 1.0), (-1.0, 1.5)], &[3, 3]).unwrap();
        let min_value = smallest_boundary_value(two_abs_sum, &grid).unwrap();
        assert_eq!(min_value, 2.5);
    }

    #[test]
    fn test_interior_minimum_ignored() {
        // Global minimum at the origin, which is an interior point.
        let grid = GridWorld::new(&[(-1.0, 1.0), (-1.0, 1.0)], &[5, 5]).unwrap();
        let min_value = smallest_boundary_value(two_abs_sum, &grid).unwrap();
        assert_eq!(min_value, 2.0);
    }

    #[test]
    fn test_one_dimensional() {
        let grid = GridWorld::new(&[(-2.0, 3.0)], &[6]).unwrap();
        let min_value = smallest_boundary_value(two_abs_sum, &grid).unwrap();
        assert_eq!(min_value, 4.0);
    }

    #[test]
    fn test_slab_sizes() {
        let grid = GridWorld::new(&[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)], &[4, 5, 6]).unwrap();
        let mut sizes = Vec::new();
        smallest_boundary_value(
            |points, ndim| {
                sizes.push(points.len() / ndim);
                Ok(vec![0.0; points.len() / ndim])
            },
            &grid,
        )
        .unwrap();
        assert_eq!(sizes, vec![2 * 5 * 6, 4 * 2 * 6, 4 * 5 * 2]);
    }

    #[test]
    fn test_context_passed_through() {
        let grid = GridWorld::new(&[(-1.5, 1.0), (-1.0, 1.5)], &[3, 3]).unwrap();
        let offset = 10.0_f64;
        let min_value = smallest_boundary_value_with(
            |points, ndim, offset: &f64| {
                Ok(two_abs_sum(points, ndim)?.into_iter().map(|v| v + offset).collect())
            },
            &grid,
            &offset,
        )
        .unwrap();
        assert_eq!(min_value, 12.5);
    }

    #[test]
    fn test_wrong_output_length() {
        let grid = GridWorld::new(&[(0.0, 1.0)], &[3]).unwrap();
        let result = smallest_boundary_value(|_, _| Ok(vec![1.0]), &grid);
        assert!(matches!(result, Err(SafeSetError::Shape { .. })));
    }

    #[test]
    fn test_function_error_propagates() {
        let grid = GridWorld::new(&[(0.0, 1.0)], &[3]).unwrap();
        let result = smallest_boundary_value(
            |_, _| Err(SafeSetError::Callback("boom".to_string())),
            &grid,
        );
        assert_eq!(result, Err(SafeSetError::Callback("boom".to_string())));
    }
}
