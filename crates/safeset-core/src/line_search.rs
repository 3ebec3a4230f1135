// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Bisection Line Search
// ─────────────────────────────────────────────────────────────────────
//! Maximise `c` such that a monotone constraint still holds.
//!
//! The predicate is assumed to be true below some unknown threshold and
//! false above it, which is the case for the nested sub-level sets of a
//! Lyapunov function. Monotonicity is not checked.

/// Refine `[lo, hi]` until `hi − lo ≤ accuracy` while keeping `f(lo)` true.
///
/// - `None` if `f(lo)` is already false (no feasible value).
/// - `Some([hi, hi])` if `f(hi)` holds: the search cannot certify beyond
///   the supplied upper bound.
///
/// Uses O(log((hi − lo) / accuracy)) predicate evaluations.
pub fn line_search_bisection(
    mut f: impl FnMut(f64) -> bool,
    bound: [f64; 2],
    accuracy: f64,
) -> Option<[f64; 2]> {
    let [mut lo, mut hi] = bound;

    if !f(lo) {
        return None;
    }

    if f(hi) {
        return Some([hi, hi]);
    }

    while hi - lo > accuracy {
        let mid = (lo + hi) / 2.0;
        // Interval exhausted in floating point (accuracy below one ulp)
        if mid <= lo || mid >= hi {
            break;
        }
        if f(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
        log::trace!("bisection: [{lo:.6}, {hi:.6}]");
    }

    Some([lo, hi])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective(x: f64) -> bool {
        x < 0.5
    }

    #[test]
    fn test_simple() {
        let atol = 1e-5;
        let [lo, hi] = line_search_bisection(objective, [0.0, 1.0], atol).unwrap();
        assert!((lo - 0.5).abs() <= atol, "lo={lo}");
        assert!(hi - lo <= atol);
        assert!(objective(lo));
        assert!(!objective(hi));
    }

    #[test]
    fn test_lower_infeasible() {
        assert!(line_search_bisection(objective, [1.0, 2.0], 1e-5).is_none());
    }

    #[test]
    fn test_upper_trivially_satisfied() {
        let bound = line_search_bisection(objective, [0.0, 0.4], 1e-5).unwrap();
        assert_eq!(bound, [0.4, 0.4]);
    }

    #[test]
    fn test_evaluation_count_is_logarithmic() {
        let mut calls = 0usize;
        let bound = line_search_bisection(
            |x| {
                calls += 1;
                x < 0.3
            },
            [0.0, 1.0],
            1e-3,
        );
        assert!(bound.is_some());
        // Two endpoint checks plus ceil(log2(1000)) = 10 bisections.
        assert_eq!(calls, 12);
    }

    #[test]
    fn test_zero_accuracy_terminates() {
        let [lo, hi] = line_search_bisection(objective, [0.0, 1.0], 0.0).unwrap();
        assert!(objective(lo));
        assert!(!objective(hi));
        assert!(hi - lo <= f64::EPSILON);
    }

    #[test]
    fn test_coarse_accuracy_returns_input() {
        let bound = line_search_bisection(objective, [0.0, 1.0], 2.0).unwrap();
        assert_eq!(bound, [0.0, 1.0]);
    }
}
