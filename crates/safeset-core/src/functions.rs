// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Dynamics and Lyapunov Function Contracts
// ─────────────────────────────────────────────────────────────────────
//! Call contracts for the external collaborators of the safe-set engine,
//! plus reference implementations.
//!
//! Every function is vectorized over the first axis: `states` is a flat
//! N×D row-major array, outputs keep the same leading dimension.
//!
//! In production the dynamics are a learned model (e.g. a GP with
//! confidence intervals) and V is a fitted function, both living behind
//! these traits; the closure adapters let the PyO3 layer delegate back to
//! Python. The quadratic/linear implementations are used for analysis
//! of linearised systems and for testing.

use safeset_types::{SafeSetError, SafeSetResult};

/// Number of rows in a flat state array, validating its shape.
pub fn state_rows(context: &str, states: &[f64], ndim: usize) -> SafeSetResult<usize> {
    if ndim == 0 {
        return Err(SafeSetError::Validation(format!(
            "{context}: state dimension must be >= 1"
        )));
    }
    if states.len() % ndim != 0 {
        return Err(SafeSetError::shape(
            context,
            (states.len() / ndim + 1) * ndim,
            states.len(),
        ));
    }
    Ok(states.len() / ndim)
}

// ─── Policy ─────────────────────────────────────────────────────────

/// Control actions at each discretization point, N×control_dim row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    actions: Vec<f64>,
    n: usize,
    control_dim: usize,
}

impl Policy {
    /// Policy for an autonomous system: N rows, no control input.
    pub fn empty(n: usize) -> Self {
        Self {
            actions: Vec::new(),
            n,
            control_dim: 0,
        }
    }

    pub fn new(actions: Vec<f64>, n: usize, control_dim: usize) -> SafeSetResult<Self> {
        SafeSetError::check_len("policy actions", n * control_dim, actions.len())?;
        Ok(Self {
            actions,
            n,
            control_dim,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn control_dim(&self) -> usize {
        self.control_dim
    }

    pub fn actions(&self) -> &[f64] {
        &self.actions
    }

    /// Action at point `i` (empty slice without control input).
    pub fn row(&self, i: usize) -> &[f64] {
        &self.actions[i * self.control_dim..(i + 1) * self.control_dim]
    }
}

// ─── Prediction ─────────────────────────────────────────────────────

/// Output of a dynamics model.
///
/// `Uncertain` carries a per-dimension error magnitude: the true next
/// state lies within `mean ± error` componentwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Deterministic(Vec<f64>),
    Uncertain { mean: Vec<f64>, error: Vec<f64> },
}

impl Prediction {
    /// Predicted next states (or state derivatives), N×D row-major.
    pub fn mean(&self) -> &[f64] {
        match self {
            Self::Deterministic(mean) | Self::Uncertain { mean, .. } => mean,
        }
    }

    /// Per-dimension error bounds, if the model is uncertain.
    pub fn error(&self) -> Option<&[f64]> {
        match self {
            Self::Deterministic(_) => None,
            Self::Uncertain { error, .. } => Some(error),
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, Self::Uncertain { .. })
    }

    /// Every array must be exactly n×ndim; error bounds are never broadcast.
    pub fn validate(&self, n: usize, ndim: usize) -> SafeSetResult<()> {
        SafeSetError::check_len("predicted states", n * ndim, self.mean().len())?;
        if let Some(error) = self.error() {
            SafeSetError::check_len("prediction error bounds", n * ndim, error.len())?;
        }
        Ok(())
    }
}

// ─── Contracts ──────────────────────────────────────────────────────

/// Closed-loop dynamics model.
pub trait Dynamics: Send + Sync {
    /// Predict the next state (discrete time) or state derivative
    /// (continuous time) for each row of `states` under `policy`.
    fn predict(&self, states: &[f64], ndim: usize, policy: &Policy) -> SafeSetResult<Prediction>;
}

/// Candidate Lyapunov function, one value per state.
pub trait LyapunovFunction: Send + Sync {
    fn values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>>;
}

/// Lyapunov function with a gradient, required for continuous time.
pub trait DifferentiableLyapunov: LyapunovFunction {
    /// ∇V at each state, N×D row-major.
    fn gradient(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>>;
}

// ─── QuadraticLyapunov ──────────────────────────────────────────────

/// V(x) = xᵀ P x.
#[derive(Debug, Clone)]
pub struct QuadraticLyapunov {
    matrix: Vec<f64>,
    ndim: usize,
}

impl QuadraticLyapunov {
    /// `matrix` is ndim×ndim row-major.
    pub fn new(matrix: Vec<f64>, ndim: usize) -> SafeSetResult<Self> {
        SafeSetError::check_len("quadratic form", ndim * ndim, matrix.len())?;
        Ok(Self { matrix, ndim })
    }

    /// V(x) = ‖x‖².
    pub fn identity(ndim: usize) -> Self {
        let mut matrix = vec![0.0; ndim * ndim];
        for i in 0..ndim {
            matrix[i * ndim + i] = 1.0;
        }
        Self { matrix, ndim }
    }

    pub fn matrix(&self) -> &[f64] {
        &self.matrix
    }

    fn check_dim(&self, ndim: usize) -> SafeSetResult<()> {
        SafeSetError::check_len("quadratic state dimension", self.ndim, ndim)
    }
}

impl LyapunovFunction for QuadraticLyapunov {
    fn values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        self.check_dim(ndim)?;
        state_rows("quadratic states", states, ndim)?;
        let p = &self.matrix;
        Ok(states
            .chunks_exact(ndim)
            .map(|x| {
                let mut v = 0.0;
                for i in 0..ndim {
                    for j in 0..ndim {
                        v += x[i] * p[i * ndim + j] * x[j];
                    }
                }
                v
            })
            .collect())
    }
}

impl DifferentiableLyapunov for QuadraticLyapunov {
    fn gradient(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        self.check_dim(ndim)?;
        state_rows("quadratic states", states, ndim)?;
        let p = &self.matrix;
        let mut grad = Vec::with_capacity(states.len());
        for x in states.chunks_exact(ndim) {
            // (P + Pᵀ) x
            for i in 0..ndim {
                let mut g = 0.0;
                for j in 0..ndim {
                    g += (p[i * ndim + j] + p[j * ndim + i]) * x[j];
                }
                grad.push(g);
            }
        }
        Ok(grad)
    }
}

// ─── LinearDynamics ─────────────────────────────────────────────────

/// f(x, u) = A x + B u.
#[derive(Debug, Clone)]
pub struct LinearDynamics {
    a: Vec<f64>,
    b: Vec<f64>,
    ndim: usize,
    control_dim: usize,
}

impl LinearDynamics {
    /// `a` is ndim×ndim, `b` is ndim×control_dim, both row-major.
    pub fn new(a: Vec<f64>, b: Vec<f64>, ndim: usize, control_dim: usize) -> SafeSetResult<Self> {
        SafeSetError::check_len("linear dynamics A", ndim * ndim, a.len())?;
        SafeSetError::check_len("linear dynamics B", ndim * control_dim, b.len())?;
        Ok(Self {
            a,
            b,
            ndim,
            control_dim,
        })
    }

    /// f(x) = A x.
    pub fn autonomous(a: Vec<f64>, ndim: usize) -> SafeSetResult<Self> {
        Self::new(a, Vec::new(), ndim, 0)
    }
}

impl Dynamics for LinearDynamics {
    fn predict(&self, states: &[f64], ndim: usize, policy: &Policy) -> SafeSetResult<Prediction> {
        SafeSetError::check_len("linear dynamics state dimension", self.ndim, ndim)?;
        let n = state_rows("linear dynamics states", states, ndim)?;
        SafeSetError::check_len("policy rows", n, policy.len())?;
        SafeSetError::check_len("policy control dimension", self.control_dim, policy.control_dim())?;

        let m = self.control_dim;
        let mut next = Vec::with_capacity(states.len());
        for (row, x) in states.chunks_exact(ndim).enumerate() {
            let u = policy.row(row);
            for i in 0..ndim {
                let mut v = 0.0;
                for j in 0..ndim {
                    v += self.a[i * ndim + j] * x[j];
                }
                for k in 0..m {
                    v += self.b[i * m + k] * u[k];
                }
                next.push(v);
            }
        }
        Ok(Prediction::Deterministic(next))
    }
}

// ─── BoundedError ───────────────────────────────────────────────────

/// Wraps a dynamics model and attaches a constant per-dimension error
/// bound to every prediction (adding to any bound the inner model has).
pub struct BoundedError<D> {
    inner: D,
    error: Vec<f64>,
}

impl<D: Dynamics> BoundedError<D> {
    pub fn new(inner: D, error: Vec<f64>) -> SafeSetResult<Self> {
        if error.iter().any(|e| !e.is_finite() || *e < 0.0) {
            return Err(SafeSetError::Validation(
                "error bounds must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self { inner, error })
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Dynamics> Dynamics for BoundedError<D> {
    fn predict(&self, states: &[f64], ndim: usize, policy: &Policy) -> SafeSetResult<Prediction> {
        SafeSetError::check_len("error bound dimension", ndim, self.error.len())?;
        let n = state_rows("bounded error states", states, ndim)?;
        let prediction = self.inner.predict(states, ndim, policy)?;
        prediction.validate(n, ndim)?;

        let (mean, error) = match prediction {
            Prediction::Deterministic(mean) => {
                let error = self.error.iter().copied().cycle().take(n * ndim).collect();
                (mean, error)
            }
            Prediction::Uncertain { mean, mut error } => {
                for row in error.chunks_exact_mut(ndim) {
                    for (e, extra) in row.iter_mut().zip(self.error.iter()) {
                        *e += extra;
                    }
                }
                (mean, error)
            }
        };
        Ok(Prediction::Uncertain { mean, error })
    }
}

// ─── Closure adapters ───────────────────────────────────────────────

type ValuesFn = Box<dyn Fn(&[f64], usize) -> SafeSetResult<Vec<f64>> + Send + Sync>;
type PredictFn = Box<dyn Fn(&[f64], usize, &Policy) -> SafeSetResult<Prediction> + Send + Sync>;

/// Lyapunov function backed by closures.
///
/// Used by the PyO3 layer to evaluate V (and ∇V) in Python.
pub struct FnLyapunov {
    values_fn: ValuesFn,
    gradient_fn: Option<ValuesFn>,
}

impl FnLyapunov {
    pub fn new(
        values_fn: impl Fn(&[f64], usize) -> SafeSetResult<Vec<f64>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            values_fn: Box::new(values_fn),
            gradient_fn: None,
        }
    }

    pub fn with_gradient(
        mut self,
        gradient_fn: impl Fn(&[f64], usize) -> SafeSetResult<Vec<f64>> + Send + Sync + 'static,
    ) -> Self {
        self.gradient_fn = Some(Box::new(gradient_fn));
        self
    }
}

impl LyapunovFunction for FnLyapunov {
    fn values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        (self.values_fn)(states, ndim)
    }
}

impl DifferentiableLyapunov for FnLyapunov {
    fn gradient(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        match &self.gradient_fn {
            Some(gradient_fn) => gradient_fn(states, ndim),
            None => Err(SafeSetError::Callback(
                "Lyapunov function has no gradient; continuous time needs one".to_string(),
            )),
        }
    }
}

/// Dynamics model backed by a closure.
pub struct FnDynamics {
    predict_fn: PredictFn,
}

impl FnDynamics {
    pub fn new(
        predict_fn: impl Fn(&[f64], usize, &Policy) -> SafeSetResult<Prediction> + Send + Sync + 'static,
    ) -> Self {
        Self {
            predict_fn: Box::new(predict_fn),
        }
    }
}

impl Dynamics for FnDynamics {
    fn predict(&self, states: &[f64], ndim: usize, policy: &Policy) -> SafeSetResult<Prediction> {
        (self.predict_fn)(states, ndim, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_shapes() {
        let p = Policy::empty(4);
        assert_eq!(p.len(), 4);
        assert_eq!(p.control_dim(), 0);
        assert!(p.row(3).is_empty());

        let p = Policy::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(p.row(1), &[3.0, 4.0]);
        assert!(Policy::new(vec![1.0; 3], 2, 2).is_err());
    }

    #[test]
    fn test_prediction_validate() {
        let det = Prediction::Deterministic(vec![0.0; 6]);
        assert!(det.validate(3, 2).is_ok());
        assert!(det.validate(2, 2).is_err());
        assert!(det.error().is_none());

        let unc = Prediction::Uncertain {
            mean: vec![0.0; 6],
            error: vec![0.1; 3],
        };
        assert!(matches!(unc.validate(3, 2), Err(SafeSetError::Shape { .. })));
    }

    #[test]
    fn test_empty_error_bounds_rejected() {
        let unc = Prediction::Uncertain {
            mean: vec![1.0, 2.0],
            error: vec![],
        };
        assert!(unc.validate(2, 1).is_err());
    }

    #[test]
    fn test_state_rows() {
        assert_eq!(state_rows("s", &[0.0; 6], 3).unwrap(), 2);
        assert!(state_rows("s", &[0.0; 5], 3).is_err());
        assert!(state_rows("s", &[0.0; 3], 0).is_err());
    }

    #[test]
    fn test_quadratic_values_and_gradient() {
        // P = [[2, 1], [0, 3]]
        let v = QuadraticLyapunov::new(vec![2.0, 1.0, 0.0, 3.0], 2).unwrap();
        let states = [1.0, 2.0, -1.0, 0.0];
        let values = v.values(&states, 2).unwrap();
        // x=(1,2): 2 + 2 + 12 = 16; x=(-1,0): 2
        assert_eq!(values, vec![16.0, 2.0]);
        let grad = v.gradient(&states, 2).unwrap();
        // (P+Pᵀ) = [[4,1],[1,6]]
        assert_eq!(grad, vec![6.0, 13.0, -4.0, -1.0]);
    }

    #[test]
    fn test_quadratic_rejects_wrong_dimension() {
        let v = QuadraticLyapunov::identity(2);
        assert!(v.values(&[1.0, 2.0, 3.0], 3).is_err());
    }

    #[test]
    fn test_linear_dynamics_with_control() {
        // x' = [[0,1],[-1,0]] x + [[0],[1]] u
        let f = LinearDynamics::new(vec![0.0, 1.0, -1.0, 0.0], vec![0.0, 1.0], 2, 1).unwrap();
        let policy = Policy::new(vec![0.5, -2.0], 2, 1).unwrap();
        let pred = f.predict(&[1.0, 2.0, 3.0, 4.0], 2, &policy).unwrap();
        assert_eq!(pred, Prediction::Deterministic(vec![2.0, -0.5, 4.0, -5.0]));
    }

    #[test]
    fn test_linear_dynamics_policy_mismatch() {
        let f = LinearDynamics::autonomous(vec![1.0], 1).unwrap();
        assert!(f.predict(&[1.0, 2.0], 1, &Policy::empty(3)).is_err());
    }

    #[test]
    fn test_bounded_error_wraps_deterministic() {
        let f = LinearDynamics::autonomous(vec![0.5, 0.0, 0.0, 0.5], 2).unwrap();
        let g = BoundedError::new(f, vec![0.1, 0.2]).unwrap();
        let pred = g.predict(&[2.0, 4.0, 0.0, 0.0], 2, &Policy::empty(2)).unwrap();
        assert_eq!(pred.mean(), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(pred.error().unwrap(), &[0.1, 0.2, 0.1, 0.2]);
    }

    #[test]
    fn test_bounded_error_accumulates() {
        let inner = FnDynamics::new(|states, _ndim, _policy| {
            Ok(Prediction::Uncertain {
                mean: states.to_vec(),
                error: vec![1.0; states.len()],
            })
        });
        let g = BoundedError::new(inner, vec![0.5]).unwrap();
        let pred = g.predict(&[1.0, 2.0], 1, &Policy::empty(2)).unwrap();
        assert_eq!(pred.error().unwrap(), &[1.5, 1.5]);
    }

    #[test]
    fn test_bounded_error_rejects_negative() {
        let f = LinearDynamics::autonomous(vec![1.0], 1).unwrap();
        assert!(BoundedError::new(f, vec![-0.1]).is_err());
    }

    #[test]
    fn test_fn_lyapunov_without_gradient() {
        let v = FnLyapunov::new(|states, _| Ok(states.iter().map(|x| x.abs()).collect()));
        assert_eq!(v.values(&[-2.0, 3.0], 1).unwrap(), vec![2.0, 3.0]);
        assert!(matches!(v.gradient(&[1.0], 1), Err(SafeSetError::Callback(_))));
    }

    #[test]
    fn test_fn_lyapunov_with_gradient() {
        let v = FnLyapunov::new(|states, _| Ok(states.iter().map(|x| x * x).collect()))
            .with_gradient(|states, _| Ok(states.iter().map(|x| 2.0 * x).collect()));
        assert_eq!(v.gradient(&[1.5], 1).unwrap(), vec![3.0]);
    }
}
