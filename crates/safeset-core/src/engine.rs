// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lyapunov Safe-Set Engine
// ─────────────────────────────────────────────────────────────────────
//! Certified region of attraction over a discretized state space.
//!
//! The engine owns the Lyapunov values on the grid and the safe-set
//! state. A [`DecreaseModel`] supplies the time-domain specific parts:
//! how the decrease of V is estimated from a dynamics prediction, and the
//! threshold that the worst-case decrease has to beat.
//!
//! One update cycle:
//!   1. Predict the dynamics at every grid point under the policy
//!   2. Upper-bound the decrease of V (mean + error)
//!   3. Mark points whose bound is below the threshold (v_dot_negative)
//!   4. Bisect for the largest level c with {V ≤ c} ⊆ v_dot_negative
//!   5. safe_set = {V ≤ cmax}, or empty if step 4 found no safe level

use std::sync::Arc;

use safeset_types::{
    Pointwise, SafeSetConfig, SafeSetError, SafeSetReport, SafeSetResult, TimeDomain,
};

use crate::functions::{state_rows, Dynamics, Policy, Prediction};
use crate::grid::Discretization;
use crate::line_search::line_search_bisection;

/// Estimated decrease of V with a symmetric error bound, per state.
///
/// The true decrease lies in `[mean − error, mean + error]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    pub mean: Vec<f64>,
    pub error: Vec<f64>,
}

impl Confidence {
    /// Exact estimate (deterministic dynamics).
    pub fn exact(mean: Vec<f64>) -> Self {
        let error = vec![0.0; mean.len()];
        Self { mean, error }
    }

    /// Worst case over the uncertainty set: mean + error.
    pub fn upper_bound(&self) -> Vec<f64> {
        self.mean
            .iter()
            .zip(self.error.iter())
            .map(|(m, e)| m + e)
            .collect()
    }
}

/// Time-domain specific half of the safety evaluation.
pub trait DecreaseModel {
    fn time_domain(&self) -> TimeDomain;

    /// V at each state.
    fn lyapunov_values(&self, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>>;

    /// Precompute grid-dependent data and validate per-point constants.
    /// Called once when the engine is built.
    fn prepare(&mut self, _discretization: &dyn Discretization) -> SafeSetResult<()> {
        Ok(())
    }

    /// Decision threshold below which the worst-case decrease certifies
    /// safety, given the discretization constant.
    fn threshold(&self, epsilon: f64) -> Pointwise;

    /// Mean decrease of V and its error bound at each state.
    fn v_decrease_confidence(
        &self,
        states: &[f64],
        ndim: usize,
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence>;

    /// Decrease estimate at every discretization point, in grid order.
    ///
    /// Models with grid-dependent data cached in [`prepare`](Self::prepare)
    /// override this to skip re-evaluating it.
    fn grid_decrease_confidence(
        &self,
        discretization: &dyn Discretization,
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence> {
        self.v_decrease_confidence(discretization.all_points(), discretization.ndim(), prediction)
    }
}

/// Safe-set engine over a fixed discretization, dynamics and policy.
pub struct SafetyEngine<M> {
    discretization: Arc<dyn Discretization>,
    dynamics: Arc<dyn Dynamics>,
    model: M,
    policy: Policy,
    epsilon: f64,
    values: Vec<f64>,
    safe_set: Vec<bool>,
    v_dot_negative: Vec<bool>,
    initial_safe_set: Option<Vec<bool>>,
    cmax: f64,
}

impl<M: DecreaseModel> SafetyEngine<M> {
    /// Build an engine and evaluate V once over the discretization.
    ///
    /// The policy defaults to an empty N×0 policy and no state is safe
    /// a priori; see [`with_policy`](Self::with_policy) and
    /// [`with_initial_set`](Self::with_initial_set).
    pub fn new(
        discretization: Arc<dyn Discretization>,
        dynamics: Arc<dyn Dynamics>,
        mut model: M,
        epsilon: f64,
    ) -> SafeSetResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SafeSetError::Validation(format!(
                "epsilon must be finite and > 0, got {epsilon}"
            )));
        }

        let n = discretization.len();
        let ndim = discretization.ndim();
        SafeSetError::check_len("discretization points", n * ndim, discretization.all_points().len())?;

        model.prepare(discretization.as_ref())?;

        let values = model.lyapunov_values(discretization.all_points(), ndim)?;
        SafeSetError::check_len("Lyapunov values", n, values.len())?;
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(SafeSetError::Numerical(format!(
                "Lyapunov value at grid point {i} is not finite"
            )));
        }

        log::debug!(
            "safety engine: {} time, {n} points, {ndim} dims, epsilon={epsilon}",
            model.time_domain().as_str()
        );

        Ok(Self {
            discretization,
            dynamics,
            model,
            policy: Policy::empty(n),
            epsilon,
            values,
            safe_set: vec![false; n],
            v_dot_negative: vec![false; n],
            initial_safe_set: None,
            cmax: 0.0,
        })
    }

    /// Build from a validated configuration (uses its `epsilon`).
    pub fn from_config(
        discretization: Arc<dyn Discretization>,
        dynamics: Arc<dyn Dynamics>,
        model: M,
        config: &SafeSetConfig,
    ) -> SafeSetResult<Self> {
        config.validate()?;
        Self::new(discretization, dynamics, model, config.epsilon)
    }

    /// Seed the engine with states known to be safe a priori.
    ///
    /// The seed becomes the initial safe set and always counts as
    /// satisfying the decrease condition.
    pub fn with_initial_set(mut self, initial_set: Vec<bool>) -> SafeSetResult<Self> {
        SafeSetError::check_len("initial safe set", self.len(), initial_set.len())?;
        self.safe_set = initial_set.clone();
        self.v_dot_negative = vec![false; self.len()];
        self.initial_safe_set = Some(initial_set);
        self.cmax = 0.0;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: Policy) -> SafeSetResult<Self> {
        self.set_policy(policy)?;
        Ok(self)
    }

    /// Replace the policy snapshot used by [`update_safe_set`](Self::update_safe_set).
    ///
    /// The certified state is left untouched until the next update.
    pub fn set_policy(&mut self, policy: Policy) -> SafeSetResult<()> {
        SafeSetError::check_len("policy rows", self.len(), policy.len())?;
        self.policy = policy;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Decrease estimates
    // ------------------------------------------------------------------

    /// Decision threshold for the decrease condition.
    pub fn threshold(&self) -> Pointwise {
        self.model.threshold(self.epsilon)
    }

    /// Mean decrease of V and its error bound at `states`.
    pub fn v_decrease_confidence(
        &self,
        states: &[f64],
        prediction: &Prediction,
    ) -> SafeSetResult<Confidence> {
        self.model
            .v_decrease_confidence(states, self.discretization.ndim(), prediction)
    }

    /// Upper bound on the decrease of V at `states` (mean + error).
    pub fn v_decrease_bound(&self, states: &[f64], prediction: &Prediction) -> SafeSetResult<Vec<f64>> {
        let n = state_rows("decrease states", states, self.discretization.ndim())?;
        let confidence = self.v_decrease_confidence(states, prediction)?;
        checked_upper_bound(n, &confidence)
    }

    /// Whether the decrease condition holds at every grid point for
    /// `policy`, optionally forcing the initial safe set to true.
    pub fn safety_constraint(&self, policy: &Policy, include_initial: bool) -> SafeSetResult<Vec<bool>> {
        let n = self.len();
        let ndim = self.discretization.ndim();
        SafeSetError::check_len("policy rows", n, policy.len())?;

        let prediction = self
            .dynamics
            .predict(self.discretization.all_points(), ndim, policy)?;
        let confidence = self
            .model
            .grid_decrease_confidence(self.discretization.as_ref(), &prediction)?;
        let bound = checked_upper_bound(n, &confidence)?;

        let threshold = self.threshold();
        threshold.check_len("decrease threshold", n)?;

        let mut v_dot_negative: Vec<bool> = bound
            .iter()
            .enumerate()
            .map(|(i, &b)| b < threshold.at(i))
            .collect();

        if include_initial {
            if let Some(initial) = &self.initial_safe_set {
                for (negative, &seed) in v_dot_negative.iter_mut().zip(initial.iter()) {
                    *negative |= seed;
                }
            }
        }

        Ok(v_dot_negative)
    }

    // ------------------------------------------------------------------
    // Level-set search
    // ------------------------------------------------------------------

    /// True iff every grid point with V ≤ c satisfies the decrease
    /// condition. Monotone in c for a fixed `v_dot_negative`.
    pub fn levelset_is_safe(&self, c: f64) -> bool {
        self.values
            .iter()
            .zip(self.v_dot_negative.iter())
            .all(|(&v, &negative)| v > c || negative)
    }

    /// Largest certified level value, 0 if no level set is certifiable.
    ///
    /// `interval` defaults to `[0, max(V) + accuracy]`. The result is the
    /// largest grid value of V at or below the lower end of the final
    /// bisection interval, never the interval bound itself: the grid only
    /// certifies up to the last point tested as safe.
    pub fn max_safe_levelset(&self, accuracy: f64, interval: Option<[f64; 2]>) -> SafeSetResult<f64> {
        Ok(self.search_levelset(accuracy, interval)?.unwrap_or(0.0))
    }

    /// `None` when even the lower end of the interval is unsafe.
    fn search_levelset(&self, accuracy: f64, interval: Option<[f64; 2]>) -> SafeSetResult<Option<f64>> {
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(SafeSetError::Validation(format!(
                "accuracy must be finite and > 0, got {accuracy}"
            )));
        }
        if self.values.is_empty() {
            return Ok(Some(0.0));
        }

        let interval = match interval {
            Some([lo, hi]) => {
                if !lo.is_finite() || !hi.is_finite() || lo > hi {
                    return Err(SafeSetError::Validation(format!(
                        "search interval must be finite with lo <= hi, got [{lo}, {hi}]"
                    )));
                }
                [lo, hi]
            }
            None => [0.0, self.max_value() + accuracy],
        };

        let bound = match line_search_bisection(|c| self.levelset_is_safe(c), interval, accuracy) {
            Some(bound) => bound,
            None => {
                log::warn!(
                    "no safe level set in [{:.6}, {:.6}]: lower bound already unsafe",
                    interval[0],
                    interval[1]
                );
                return Ok(None);
            }
        };

        if bound[0] == interval[1] {
            log::warn!(
                "level-set search saturated at the upper bound {:.6}; widen the interval",
                interval[1]
            );
        }

        // TODO: a second bisection between the last safe grid value and
        // bound[1] could recover part of the gap left by the midpoint test.
        let lo = bound[0];
        let cmax = self
            .values
            .iter()
            .copied()
            .filter(|&v| v <= lo)
            .fold(f64::NEG_INFINITY, f64::max);

        // No grid value at or below lo: {V ≤ lo} is empty, trivially safe.
        Ok(Some(if cmax.is_finite() { cmax } else { lo }))
    }

    // ------------------------------------------------------------------
    // Update cycle
    // ------------------------------------------------------------------

    /// Recompute the decrease condition, cmax and the safe set.
    ///
    /// This is the only mutator of the certified state. If no level set can
    /// be certified, cmax is 0 and the safe set is empty.
    pub fn update_safe_set(&mut self, accuracy: f64, interval: Option<[f64; 2]>) -> SafeSetResult<()> {
        self.update(accuracy, interval, true)
    }

    /// [`update_safe_set`](Self::update_safe_set) driven by a configuration.
    pub fn refresh(&mut self, config: &SafeSetConfig) -> SafeSetResult<()> {
        config.validate()?;
        self.update(config.accuracy, config.interval, config.include_initial)
    }

    fn update(&mut self, accuracy: f64, interval: Option<[f64; 2]>, include_initial: bool) -> SafeSetResult<()> {
        let v_dot_negative = self.safety_constraint(&self.policy, include_initial)?;
        let previous = std::mem::replace(&mut self.v_dot_negative, v_dot_negative);

        let level = match self.search_levelset(accuracy, interval) {
            Ok(level) => level,
            Err(e) => {
                self.v_dot_negative = previous;
                return Err(e);
            }
        };

        match level {
            Some(cmax) => {
                self.cmax = cmax;
                self.safe_set = self.values.iter().map(|&v| v <= cmax).collect();
            }
            None => {
                self.cmax = 0.0;
                self.safe_set = vec![false; self.len()];
            }
        }

        log::debug!(
            "safe set updated: cmax={:.6}, {} safe / {} decreasing / {} points",
            self.cmax,
            count(&self.safe_set),
            count(&self.v_dot_negative),
            self.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of discretization points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn time_domain(&self) -> TimeDomain {
        self.model.time_domain()
    }

    pub fn is_continuous(&self) -> bool {
        self.time_domain() == TimeDomain::Continuous
    }

    pub fn is_discrete(&self) -> bool {
        self.time_domain() == TimeDomain::Discrete
    }

    /// Lyapunov values V on the grid.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn safe_set(&self) -> &[bool] {
        &self.safe_set
    }

    pub fn v_dot_negative(&self) -> &[bool] {
        &self.v_dot_negative
    }

    pub fn initial_safe_set(&self) -> Option<&[bool]> {
        self.initial_safe_set.as_deref()
    }

    pub fn cmax(&self) -> f64 {
        self.cmax
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn discretization(&self) -> &dyn Discretization {
        self.discretization.as_ref()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Largest Lyapunov value on the grid.
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn report(&self) -> SafeSetReport {
        SafeSetReport {
            time_domain: self.time_domain(),
            n_points: self.len(),
            cmax: self.cmax,
            n_safe: count(&self.safe_set),
            n_decreasing: count(&self.v_dot_negative),
            n_initial: self.initial_safe_set.as_deref().map_or(0, count),
        }
    }
}

fn checked_upper_bound(n: usize, confidence: &Confidence) -> SafeSetResult<Vec<f64>> {
    SafeSetError::check_len("decrease mean", n, confidence.mean.len())?;
    SafeSetError::check_len("decrease error bound", n, confidence.error.len())?;
    Ok(confidence.upper_bound())
}

fn count(mask: &[bool]) -> usize {
    mask.iter().filter(|&&b| b).count()
}
