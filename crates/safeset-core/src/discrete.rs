// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Discrete-Time Decrease Model
// ─────────────────────────────────────────────────────────────────────
//! ΔV(x) = V(f(x, u)) − V(x) for x⁺ = f(x, u).
//!
//! With an uncertain model x⁺ ∈ μ ± σ the error on ΔV is bounded through
//! the Lipschitz constant of V: |V(x⁺) − V(μ)| ≤ L_V Σ_d σ_d. A grid point
//! certifies its epsilon-ball when ΔV < −L_V (1 + L_f) ε.

use std::sync::Arc;

use safeset_types::{Pointwise, SafeSetError, SafeSetResult, TimeDomain};

use crate::engine::{Confidence, DecreaseModel, SafetyEngine};
use crate::functions::{state_rows, Dynamics, LyapunovFunction, Prediction};
use crate::grid::Discretization;

pub type DiscreteEngine = SafetyEngine<DiscreteTime>;

/// Discrete-time decrease model.
pub struct DiscreteTime {
    lyapunov: Arc<dyn LyapunovFunction>,
    lipschitz_dynamics: Pointwise,
    lipschitz_lyapunov: Pointwise,
    /// L_V (1 + L_f)
    threshold_factor: Pointwise,
}

impl DiscreteTime {
    pub fn new(
        lyapunov: Arc<dyn LyapunovFunction>,
        lipschitz_dynamics: impl Into<Pointwise>,
        lipschitz_lyapunov: impl Into<Pointwise>,
    ) -> SafeSetResult<Self> {
        let lipschitz_dynamics = lipschitz_dynamics.into();
        let lipschitz_lyapunov = lipschitz_lyapunov.into();
        if !lipschitz_dynamics.is_finite() || !lipschitz_lyapunov.is_finite() {
            return Err(SafeSetError::Validation(
                "Lipschitz constants must be finite".to_string(),
            ));
        }
        let threshold_factor =
            lipschitz_lyapunov.zip_with(&lipschitz_dynamics, |lv, lf| lv * (1.0 + lf))?;
        Ok(Self {
            lyapunov,
            lipschitz_dynamics,
            lipschitz_lyapunov,
            threshold_factor,
        })
    }

    pub fn lipschitz_dynamics(&self) -> &Pointwise {
        &self.lipschitz_dynamics
    }

    pub fn lipschitz_lyapunov(&self) -> &Pointwise {
        &self.lipschitz_lyapunov
    }
}

impl DecreaseModel for DiscreteTime {
    fn time_domain(&self) -> TimeDomain {
        TimeDomain::Discrete
    }

    fn lyapunov_values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
        self.lyapunov.values(states, ndim)
    }

    fn prepare(&mut self, discretization: &dyn Discretization) -> SafeSetResult<()> {
        let n = discretization.len();
        self.lipschitz_dynamics.check_len("Lipschitz constant of the dynamics", n)?;
        self.lipschitz_lyapunov.check_len("Lipschitz constant of V", n)
    }

    fn threshold(&self, epsilon: f64) -> Pointwise {
        self.threshold_factor.scale(-epsilon)
    }

    fn v_decrease_confidence(
        &self,
        states: &[f64],
        ndim: usize,
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence> {
        let n = state_rows("discrete decrease states", states, ndim)?;
        prediction.validate(n, ndim)?;

        let v_next = self.lyapunov.values(prediction.mean(), ndim)?;
        SafeSetError::check_len("Lyapunov values at next states", n, v_next.len())?;
        let v_now = self.lyapunov.values(states, ndim)?;
        SafeSetError::check_len("Lyapunov values", n, v_now.len())?;

        let mean: Vec<f64> = v_next.iter().zip(v_now.iter()).map(|(a, b)| a - b).collect();

        let error = match prediction.error() {
            Some(bounds) => {
                self.lipschitz_lyapunov.check_len("Lipschitz constant of V", n)?;
                bounds
                    .chunks_exact(ndim)
                    .enumerate()
                    .map(|(i, sigma)| self.lipschitz_lyapunov.at(i) * sigma.iter().sum::<f64>())
                    .collect()
            }
            None => vec![0.0; n],
        };

        Ok(Confidence { mean, error })
    }
}

impl SafetyEngine<DiscreteTime> {
    /// Discrete-time engine for x⁺ = f(x, π(x)).
    pub fn discrete(
        discretization: Arc<dyn Discretization>,
        lyapunov: Arc<dyn LyapunovFunction>,
        dynamics: Arc<dyn Dynamics>,
        epsilon: f64,
        lipschitz_dynamics: impl Into<Pointwise>,
        lipschitz_lyapunov: impl Into<Pointwise>,
    ) -> SafeSetResult<Self> {
        let model = DiscreteTime::new(lyapunov, lipschitz_dynamics, lipschitz_lyapunov)?;
        Self::new(discretization, dynamics, model, epsilon)
    }
}
