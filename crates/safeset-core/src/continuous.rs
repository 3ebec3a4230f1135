// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Continuous-Time Decrease Model
// ─────────────────────────────────────────────────────────────────────
//! V̇(x) = ∇V(x) · f(x, u) for ẋ = f(x, u).
//!
//! With an uncertain model ẋ ∈ μ ± σ (componentwise), the worst case is
//!
//!   V̇ ≤ ∇V · μ + Σ_d |∂V/∂x_d| σ_d
//!
//! and a grid point certifies its epsilon-ball when V̇ < −L ε, where L is
//! the Lipschitz constant of V̇.

use std::sync::Arc;

use safeset_types::{Pointwise, SafeSetError, SafeSetResult, TimeDomain};

use crate::engine::{Confidence, DecreaseModel, SafetyEngine};
use crate::functions::{state_rows, DifferentiableLyapunov, Dynamics, Prediction};
use crate::grid::Discretization;

pub type ContinuousEngine = SafetyEngine<ContinuousTime>;

/// Continuous-time decrease model.
pub struct ContinuousTime {
    lyapunov: Arc<dyn DifferentiableLyapunov>,
    lipschitz: Pointwise,
    grid_gradient: Vec<f64>,
}

impl ContinuousTime {
    /// `lipschitz` bounds the Lipschitz constant of V̇, globally or per
    /// grid point (see [`ContinuousTime::lipschitz_constant`]).
    pub fn new(
        lyapunov: Arc<dyn DifferentiableLyapunov>,
        lipschitz: impl Into<Pointwise>,
    ) -> SafeSetResult<Self> {
        let lipschitz = lipschitz.into();
        if !lipschitz.is_finite() {
            return Err(SafeSetError::Validation(
                "Lipschitz constant of V dot must be finite".to_string(),
            ));
        }
        Ok(Self {
            lyapunov,
            lipschitz,
            grid_gradient: Vec::new(),
        })
    }

    pub fn lipschitz(&self) -> &Pointwise {
        &self.lipschitz
    }

    /// ∇V over the discretization, N×D row-major, computed at engine
    /// construction and reused by every update.
    pub fn grid_gradient(&self) -> &[f64] {
        &self.grid_gradient
    }

    /// Lipschitz constant of V̇ from bounds on the dynamics and on V.
    ///
    /// By the product rule on ∇V · f:
    ///
    ///   L_V̇ = ‖f‖_max · L_∇V + L_V · L_f
    ///
    /// Arguments are global or local to each grid point (within an
    /// epsilon-ball); the result is elementwise.
    pub fn lipschitz_constant(
        dynamics_bound: impl Into<Pointwise>,
        lipschitz_dynamics: impl Into<Pointwise>,
        lipschitz_lyapunov: impl Into<Pointwise>,
        lipschitz_lyapunov_derivative: impl Into<Pointwise>,
    ) -> SafeSetResult<Pointwise> {
        let value_term = dynamics_bound
            .into()
            .mul(&lipschitz_lyapunov_derivative.into())?;
        let gradient_term = lipschitz_lyapunov.into().mul(&lipschitz_dynamics.into())?;
        value_term.add(&gradient_term)
    }
}

impl DecreaseModel for ContinuousTime {
    fn time_domain(&self) -> TimeDomain {
        TimeDomain::Continuous
    }

    fn lyapunov_values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        self.lyapunov.values(states, ndim)
    }

    fn prepare(&mut self, discretization: &dyn Discretization) -> SafeSetResult<()> {
        let n = discretization.len();
        let ndim = discretization.ndim();
        self.lipschitz.check_len("lipschitz constant of V dot", n)?;

        let gradient = self.lyapunov.gradient(discretization.all_points(), ndim)?;
        SafeSetError::check_len("Lyapunov gradient", n * ndim, gradient.len())?;
        self.grid_gradient = gradient;
        Ok(())
    }

    fn threshold(&self, epsilon: f64) -> Pointwise {
        self.lipschitz.scale(-epsilon)
    }

    fn v_decrease_confidence(
        &self,
        states: &[f64],
        ndim: usize,
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence> {
        let n = state_rows("continuous decrease states", states, ndim)?;
        prediction.validate(n, ndim)?;

        let dv = self.lyapunov.gradient(states, ndim)?;
        SafeSetError::check_len("Lyapunov gradient", n * ndim, dv.len())?;
        Ok(gradient_confidence(&dv, n, ndim, prediction))
    }

    fn grid_decrease_confidence(
        &self,
        discretization: &dyn Discretization,
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence> {
        let n = discretization.len();
        let ndim = discretization.ndim();
        prediction.validate(n, ndim)?;
        SafeSetError::check_len("cached Lyapunov gradient", n * ndim, self.grid_gradient.len())?;
        Ok(gradient_confidence(&self.grid_gradient, n, ndim, prediction))
    }
}

/// ∇V · ẋ per row, plus Σ_d |∂V/∂x_d| σ_d for uncertain predictions.
/// Shapes are validated by the caller.
fn gradient_confidence(dv: &[f64], n: usize, ndim: usize, prediction: &Prediction) -> Confidence {
    let mean: Vec<f64> = dv
        .chunks_exact(ndim)
        .zip(prediction.mean().chunks_exact(ndim))
        .map(|(g, xdot)| g.iter().zip(xdot.iter()).map(|(a, b)| a * b).sum())
        .collect();

    let error = match prediction.error() {
        Some(bounds) => dv
            .chunks_exact(ndim)
            .zip(bounds.chunks_exact(ndim))
            .map(|(g, sigma)| g.iter().zip(sigma.iter()).map(|(a, s)| a.abs() * s).sum())
            .collect(),
        None => vec![0.0; n],
    };

    Confidence { mean, error }
}

impl SafetyEngine<ContinuousTime> {
    /// Continuous-time engine for ẋ = f(x, π(x)).
    pub fn continuous(
        discretization: Arc<dyn Discretization>,
        lyapunov: Arc<dyn DifferentiableLyapunov>,
        dynamics: Arc<dyn Dynamics>,
        epsilon: f64,
        lipschitz: impl Into<Pointwise>,
    ) -> SafeSetResult<Self> {
        let model = ContinuousTime::new(lyapunov, lipschitz)?;
        Self::new(discretization, dynamics, model, epsilon)
    }
}
