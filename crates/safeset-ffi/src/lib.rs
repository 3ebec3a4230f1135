// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lyapunov Safe-Set Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Rust safe-set kernel.
//!
//! Exposes `LyapunovDiscrete`, `LyapunovContinuous`, `GridWorld`,
//! `SafeSetConfig`, `SafeSetReport` and the `line_search_bisection` /
//! `smallest_boundary_value` primitives to Python via PyO3.
//!
//! # FFI Safety
//!
//! - GIL acquired via `Python::with_gil` before every Python callback.
//! - States cross the boundary as lists of rows (N×D); outputs are
//!   shape-checked before they reach the engine.
//! - Python exceptions in callbacks → `SafeSetError::Callback` → `ValueError`.
//!   A failed update leaves the certified safe set untouched.
//!
//! Install: `maturin develop -m crates/safeset-ffi/Cargo.toml --features extension-module`.
//!
//! Usage from Python:
//! ```python
//! from safeset_kernel import GridWorld, LyapunovDiscrete
//!
//! grid = GridWorld([(-1.0, 1.0)], [101])
//! lyap = LyapunovDiscrete(
//!     grid,
//!     lambda x: [r[0] ** 2 for r in x],
//!     lambda x, u: [[0.5 * r[0]] for r in x],
//!     lipschitz_dynamics=0.5, lipschitz_lyapunov=2.0, epsilon=0.01,
//!     initial_set=[abs(x[0]) < 0.1 for x in grid.all_points()],
//! )
//! lyap.update_safe_set(accuracy=1e-3)
//! print(lyap.cmax, sum(lyap.safe_set))
//! ```

use std::sync::Arc;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use safeset_core::{
    ContinuousEngine, ContinuousTime, DecreaseModel, Discretization, DiscreteEngine, Dynamics,
    FnDynamics, FnLyapunov, GridWorld, Policy, Prediction, SafetyEngine,
};
use safeset_types::{Pointwise, SafeSetConfig, SafeSetError, SafeSetReport, SafeSetResult};

// ─── Conversions ────────────────────────────────────────────────────

fn to_py_err(e: SafeSetError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn callback_error(e: PyErr) -> SafeSetError {
    log::warn!("python callback failed: {e}");
    SafeSetError::Callback(e.to_string())
}

fn to_rows(flat: &[f64], ndim: usize) -> Vec<Vec<f64>> {
    flat.chunks_exact(ndim).map(|row| row.to_vec()).collect()
}

fn flatten_rows(context: &str, rows: Vec<Vec<f64>>, ndim: usize) -> SafeSetResult<Vec<f64>> {
    let mut flat = Vec::with_capacity(rows.len() * ndim);
    for row in rows {
        SafeSetError::check_len(context, ndim, row.len())?;
        flat.extend(row);
    }
    Ok(flat)
}

fn policy_rows(policy: &Policy) -> Vec<Vec<f64>> {
    (0..policy.len()).map(|i| policy.row(i).to_vec()).collect()
}

fn policy_from_rows(rows: Vec<Vec<f64>>) -> SafeSetResult<Policy> {
    let n = rows.len();
    let control_dim = rows.first().map_or(0, |row| row.len());
    let actions = flatten_rows("policy row", rows, control_dim)?;
    Policy::new(actions, n, control_dim)
}

fn extract_pointwise(obj: &Bound<'_, PyAny>) -> PyResult<Pointwise> {
    if let Ok(value) = obj.extract::<f64>() {
        return Ok(Pointwise::Uniform(value));
    }
    Ok(Pointwise::PerPoint(obj.extract::<Vec<f64>>()?))
}

fn pointwise_to_py(py: Python<'_>, value: &Pointwise) -> PyResult<PyObject> {
    Ok(match value {
        Pointwise::Uniform(v) => v.into_pyobject(py)?.into_any().unbind(),
        Pointwise::PerPoint(values) => values.into_pyobject(py)?.into_any().unbind(),
    })
}

/// A dynamics result is either a list of rows or a `(mean, error)` pair.
fn extract_prediction(obj: &Bound<'_, PyAny>, ndim: usize) -> SafeSetResult<Prediction> {
    if let Ok((mean, error)) = obj.extract::<(Vec<Vec<f64>>, Vec<Vec<f64>>)>() {
        return Ok(Prediction::Uncertain {
            mean: flatten_rows("predicted state", mean, ndim)?,
            error: flatten_rows("prediction error bound", error, ndim)?,
        });
    }
    let mean = obj.extract::<Vec<Vec<f64>>>().map_err(callback_error)?;
    Ok(Prediction::Deterministic(flatten_rows("predicted state", mean, ndim)?))
}

// ─── Python callbacks ───────────────────────────────────────────────

/// `callback(states) -> list[float]`
fn call_values(callback: &PyObject, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
    Python::with_gil(|py| {
        let result = callback
            .call1(py, (to_rows(states, ndim),))
            .map_err(callback_error)?;
        result.extract::<Vec<f64>>(py).map_err(callback_error)
    })
}

/// `callback(states) -> list[list[float]]`, one row per state.
fn call_gradient(callback: &PyObject, states: &[f64], ndim: usize) -> SafeSetResult<Vec<f64>> {
    Python::with_gil(|py| {
        let result = callback
            .call1(py, (to_rows(states, ndim),))
            .map_err(callback_error)?;
        let rows = result.extract::<Vec<Vec<f64>>>(py).map_err(callback_error)?;
        flatten_rows("Lyapunov gradient row", rows, ndim)
    })
}

/// `callback(states, actions) -> rows | (mean, error)`
fn call_dynamics(
    callback: &PyObject,
    states: &[f64],
    ndim: usize,
    policy: &Policy,
) -> SafeSetResult<Prediction> {
    Python::with_gil(|py| {
        let result = callback
            .call1(py, (to_rows(states, ndim), policy_rows(policy)))
            .map_err(callback_error)?;
        extract_prediction(result.bind(py), ndim)
    })
}

fn python_dynamics(callback: PyObject) -> Arc<dyn Dynamics> {
    Arc::new(FnDynamics::new(move |states, ndim, policy| {
        call_dynamics(&callback, states, ndim, policy)
    }))
}

/// Apply the optional constructor arguments shared by both engines.
fn configure<M: DecreaseModel>(
    mut engine: SafetyEngine<M>,
    initial_set: Option<Vec<bool>>,
    policy: Option<Vec<Vec<f64>>>,
) -> SafeSetResult<SafetyEngine<M>> {
    if let Some(initial_set) = initial_set {
        engine = engine.with_initial_set(initial_set)?;
    }
    if let Some(rows) = policy {
        engine = engine.with_policy(policy_from_rows(rows)?)?;
    }
    Ok(engine)
}

fn decrease_args<M: DecreaseModel>(
    engine: &SafetyEngine<M>,
    states: Vec<Vec<f64>>,
    next_states: &Bound<'_, PyAny>,
) -> SafeSetResult<(Vec<f64>, Prediction)> {
    let ndim = engine.discretization().ndim();
    let states = flatten_rows("state", states, ndim)?;
    let prediction = extract_prediction(next_states, ndim)?;
    Ok((states, prediction))
}

// ─── PySafeSetConfig ────────────────────────────────────────────────

/// Python-visible configuration for a safe-set update.
#[pyclass(name = "SafeSetConfig")]
#[derive(Clone)]
struct PySafeSetConfig {
    inner: SafeSetConfig,
}

#[pymethods]
impl PySafeSetConfig {
    #[new]
    #[pyo3(signature = (epsilon = 0.01, accuracy = 1e-3, interval = None, include_initial = true))]
    fn new(
        epsilon: f64,
        accuracy: f64,
        interval: Option<(f64, f64)>,
        include_initial: bool,
    ) -> PyResult<Self> {
        let config = SafeSetConfig {
            epsilon,
            accuracy,
            interval: interval.map(|(lo, hi)| [lo, hi]),
            include_initial,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = SafeSetConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    #[getter]
    fn epsilon(&self) -> f64 {
        self.inner.epsilon
    }

    #[getter]
    fn accuracy(&self) -> f64 {
        self.inner.accuracy
    }

    #[getter]
    fn interval(&self) -> Option<(f64, f64)> {
        self.inner.interval.map(|[lo, hi]| (lo, hi))
    }

    #[getter]
    fn include_initial(&self) -> bool {
        self.inner.include_initial
    }

    fn __repr__(&self) -> String {
        format!(
            "SafeSetConfig(epsilon={}, accuracy={}, interval={:?}, include_initial={})",
            self.inner.epsilon, self.inner.accuracy, self.inner.interval, self.inner.include_initial
        )
    }
}

// ─── PySafeSetReport ────────────────────────────────────────────────

/// Summary of the certified state after an update.
#[pyclass(name = "SafeSetReport")]
#[derive(Clone)]
struct PySafeSetReport {
    inner: SafeSetReport,
}

#[pymethods]
impl PySafeSetReport {
    #[getter]
    fn time_domain(&self) -> &'static str {
        self.inner.time_domain.as_str()
    }

    #[getter]
    fn n_points(&self) -> usize {
        self.inner.n_points
    }

    #[getter]
    fn cmax(&self) -> f64 {
        self.inner.cmax
    }

    #[getter]
    fn n_safe(&self) -> usize {
        self.inner.n_safe
    }

    #[getter]
    fn n_decreasing(&self) -> usize {
        self.inner.n_decreasing
    }

    #[getter]
    fn n_initial(&self) -> usize {
        self.inner.n_initial
    }

    #[getter]
    fn safe_fraction(&self) -> f64 {
        self.inner.safe_fraction()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("time_domain", self.inner.time_domain.as_str())?;
        dict.set_item("n_points", self.inner.n_points)?;
        dict.set_item("cmax", self.inner.cmax)?;
        dict.set_item("n_safe", self.inner.n_safe)?;
        dict.set_item("n_decreasing", self.inner.n_decreasing)?;
        dict.set_item("n_initial", self.inner.n_initial)?;
        dict.set_item("safe_fraction", self.inner.safe_fraction())?;
        Ok(dict)
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "SafeSetReport(time_domain={}, cmax={:.6}, n_safe={}/{}, n_decreasing={})",
            self.inner.time_domain.as_str(),
            self.inner.cmax,
            self.inner.n_safe,
            self.inner.n_points,
            self.inner.n_decreasing
        )
    }
}

// ─── PyGridWorld ────────────────────────────────────────────────────

/// Uniform rectangular grid over a box in state space.
#[pyclass(name = "GridWorld")]
#[derive(Clone)]
struct PyGridWorld {
    inner: Arc<GridWorld>,
}

#[pymethods]
impl PyGridWorld {
    /// Args:
    ///     limits: List of (lo, hi) per dimension.
    ///     num_points: Samples per dimension.
    #[new]
    fn new(limits: Vec<(f64, f64)>, num_points: Vec<usize>) -> PyResult<Self> {
        let grid = GridWorld::new(&limits, &num_points).map_err(to_py_err)?;
        Ok(Self {
            inner: Arc::new(grid),
        })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    #[getter]
    fn ndim(&self) -> usize {
        self.inner.ndim()
    }

    #[getter]
    fn limits(&self) -> Vec<(f64, f64)> {
        self.inner.limits().to_vec()
    }

    #[getter]
    fn num_points(&self) -> Vec<usize> {
        self.inner.num_points().to_vec()
    }

    #[getter]
    fn unit_maxes(&self) -> Vec<f64> {
        self.inner.unit_maxes()
    }

    #[getter]
    fn discrete_points(&self) -> Vec<Vec<f64>> {
        self.inner.discrete_points().to_vec()
    }

    fn all_points(&self) -> Vec<Vec<f64>> {
        to_rows(self.inner.all_points(), self.inner.ndim())
    }

    fn index_to_state(&self, index: usize) -> PyResult<Vec<f64>> {
        Ok(self.inner.index_to_state(index).map_err(to_py_err)?.to_vec())
    }

    fn state_to_index(&self, state: Vec<f64>) -> PyResult<usize> {
        self.inner.state_to_index(&state).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "GridWorld(limits={:?}, num_points={:?})",
            self.inner.limits(),
            self.inner.num_points()
        )
    }
}

// ─── LyapunovDiscrete ───────────────────────────────────────────────

/// Safe-set engine for discrete-time dynamics x⁺ = f(x, u).
///
/// Callbacks:
///     lyapunov_function: Callable[[list[list[float]]], list[float]]
///     dynamics: Callable[[states, actions], rows | (mean, error)]
#[pyclass(name = "LyapunovDiscrete")]
struct PyLyapunovDiscrete {
    inner: DiscreteEngine,
}

#[pymethods]
impl PyLyapunovDiscrete {
    #[new]
    #[pyo3(signature = (
        discretization,
        lyapunov_function,
        dynamics,
        lipschitz_dynamics,
        lipschitz_lyapunov,
        epsilon,
        initial_set = None,
        policy = None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        discretization: PyRef<'_, PyGridWorld>,
        lyapunov_function: PyObject,
        dynamics: PyObject,
        lipschitz_dynamics: &Bound<'_, PyAny>,
        lipschitz_lyapunov: &Bound<'_, PyAny>,
        epsilon: f64,
        initial_set: Option<Vec<bool>>,
        policy: Option<Vec<Vec<f64>>>,
    ) -> PyResult<Self> {
        let grid: Arc<dyn Discretization> = discretization.inner.clone();
        let lyapunov = Arc::new(FnLyapunov::new(move |states, ndim| {
            call_values(&lyapunov_function, states, ndim)
        }));
        let engine = DiscreteEngine::discrete(
            grid,
            lyapunov,
            python_dynamics(dynamics),
            epsilon,
            extract_pointwise(lipschitz_dynamics)?,
            extract_pointwise(lipschitz_lyapunov)?,
        )
        .and_then(|engine| configure(engine, initial_set, policy))
        .map_err(to_py_err)?;
        Ok(Self { inner: engine })
    }

    /// Recompute the decrease condition, cmax and the safe set.
    #[pyo3(signature = (accuracy, interval = None))]
    fn update_safe_set(&mut self, accuracy: f64, interval: Option<(f64, f64)>) -> PyResult<()> {
        self.inner
            .update_safe_set(accuracy, interval.map(|(lo, hi)| [lo, hi]))
            .map_err(to_py_err)
    }

    /// `update_safe_set` driven by a `SafeSetConfig`.
    fn refresh(&mut self, config: PyRef<'_, PySafeSetConfig>) -> PyResult<()> {
        self.inner.refresh(&config.inner).map_err(to_py_err)
    }

    #[pyo3(signature = (accuracy, interval = None))]
    fn max_safe_levelset(&self, accuracy: f64, interval: Option<(f64, f64)>) -> PyResult<f64> {
        self.inner
            .max_safe_levelset(accuracy, interval.map(|(lo, hi)| [lo, hi]))
            .map_err(to_py_err)
    }

    #[pyo3(signature = (policy, include_initial = true))]
    fn safety_constraint(&self, policy: Vec<Vec<f64>>, include_initial: bool) -> PyResult<Vec<bool>> {
        let policy = policy_from_rows(policy).map_err(to_py_err)?;
        self.inner
            .safety_constraint(&policy, include_initial)
            .map_err(to_py_err)
    }

    fn v_decrease_confidence(
        &self,
        states: Vec<Vec<f64>>,
        next_states: &Bound<'_, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let (states, prediction) = decrease_args(&self.inner, states, next_states).map_err(to_py_err)?;
        let c = self
            .inner
            .v_decrease_confidence(&states, &prediction)
            .map_err(to_py_err)?;
        Ok((c.mean, c.error))
    }

    fn v_decrease_bound(&self, states: Vec<Vec<f64>>, next_states: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
        let (states, prediction) = decrease_args(&self.inner, states, next_states).map_err(to_py_err)?;
        self.inner
            .v_decrease_bound(&states, &prediction)
            .map_err(to_py_err)
    }

    fn set_policy(&mut self, policy: Vec<Vec<f64>>) -> PyResult<()> {
        let policy = policy_from_rows(policy).map_err(to_py_err)?;
        self.inner.set_policy(policy).map_err(to_py_err)
    }

    fn report(&self) -> PySafeSetReport {
        PySafeSetReport {
            inner: self.inner.report(),
        }
    }

    #[getter]
    fn threshold(&self, py: Python<'_>) -> PyResult<PyObject> {
        pointwise_to_py(py, &self.inner.threshold())
    }

    #[getter]
    fn lipschitz_dynamics(&self, py: Python<'_>) -> PyResult<PyObject> {
        pointwise_to_py(py, self.inner.model().lipschitz_dynamics())
    }

    #[getter]
    fn lipschitz_lyapunov(&self, py: Python<'_>) -> PyResult<PyObject> {
        pointwise_to_py(py, self.inner.model().lipschitz_lyapunov())
    }

    #[getter]
    fn values(&self) -> Vec<f64> {
        self.inner.values().to_vec()
    }

    #[getter]
    fn safe_set(&self) -> Vec<bool> {
        self.inner.safe_set().to_vec()
    }

    #[getter]
    fn v_dot_negative(&self) -> Vec<bool> {
        self.inner.v_dot_negative().to_vec()
    }

    #[getter]
    fn initial_safe_set(&self) -> Option<Vec<bool>> {
        self.inner.initial_safe_set().map(|s| s.to_vec())
    }

    #[getter]
    fn cmax(&self) -> f64 {
        self.inner.cmax()
    }

    #[getter]
    fn epsilon(&self) -> f64 {
        self.inner.epsilon()
    }

    #[getter]
    fn is_discrete(&self) -> bool {
        self.inner.is_discrete()
    }

    #[getter]
    fn is_continuous(&self) -> bool {
        self.inner.is_continuous()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

// ─── LyapunovContinuous ─────────────────────────────────────────────

/// Safe-set engine for continuous-time dynamics ẋ = f(x, u).
///
/// Callbacks:
///     lyapunov_function: Callable[[list[list[float]]], list[float]]
///     lyapunov_gradient: Callable[[list[list[float]]], list[list[float]]]
///     dynamics: Callable[[states, actions], rows | (mean, error)]
#[pyclass(name = "LyapunovContinuous")]
struct PyLyapunovContinuous {
    inner: ContinuousEngine,
}

#[pymethods]
impl PyLyapunovContinuous {
    #[new]
    #[pyo3(signature = (
        discretization,
        lyapunov_function,
        lyapunov_gradient,
        dynamics,
        epsilon,
        lipschitz,
        initial_set = None,
        policy = None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        discretization: PyRef<'_, PyGridWorld>,
        lyapunov_function: PyObject,
        lyapunov_gradient: PyObject,
        dynamics: PyObject,
        epsilon: f64,
        lipschitz: &Bound<'_, PyAny>,
        initial_set: Option<Vec<bool>>,
        policy: Option<Vec<Vec<f64>>>,
    ) -> PyResult<Self> {
        let grid: Arc<dyn Discretization> = discretization.inner.clone();
        let lyapunov = Arc::new(
            FnLyapunov::new(move |states, ndim| call_values(&lyapunov_function, states, ndim))
                .with_gradient(move |states, ndim| call_gradient(&lyapunov_gradient, states, ndim)),
        );
        let engine = ContinuousEngine::continuous(
            grid,
            lyapunov,
            python_dynamics(dynamics),
            epsilon,
            extract_pointwise(lipschitz)?,
        )
        .and_then(|engine| configure(engine, initial_set, policy))
        .map_err(to_py_err)?;
        Ok(Self { inner: engine })
    }

    /// L_V̇ = dynamics_bound · lipschitz_lyapunov_derivative
    ///       + lipschitz_lyapunov · lipschitz_dynamics
    #[staticmethod]
    fn lipschitz_constant(
        py: Python<'_>,
        dynamics_bound: &Bound<'_, PyAny>,
        lipschitz_dynamics: &Bound<'_, PyAny>,
        lipschitz_lyapunov: &Bound<'_, PyAny>,
        lipschitz_lyapunov_derivative: &Bound<'_, PyAny>,
    ) -> PyResult<PyObject> {
        let constant = ContinuousTime::lipschitz_constant(
            extract_pointwise(dynamics_bound)?,
            extract_pointwise(lipschitz_dynamics)?,
            extract_pointwise(lipschitz_lyapunov)?,
            extract_pointwise(lipschitz_lyapunov_derivative)?,
        )
        .map_err(to_py_err)?;
        pointwise_to_py(py, &constant)
    }

    #[pyo3(signature = (accuracy, interval = None))]
    fn update_safe_set(&mut self, accuracy: f64, interval: Option<(f64, f64)>) -> PyResult<()> {
        self.inner
            .update_safe_set(accuracy, interval.map(|(lo, hi)| [lo, hi]))
            .map_err(to_py_err)
    }

    fn refresh(&mut self, config: PyRef<'_, PySafeSetConfig>) -> PyResult<()> {
        self.inner.refresh(&config.inner).map_err(to_py_err)
    }

    #[pyo3(signature = (accuracy, interval = None))]
    fn max_safe_levelset(&self, accuracy: f64, interval: Option<(f64, f64)>) -> PyResult<f64> {
        self.inner
            .max_safe_levelset(accuracy, interval.map(|(lo, hi)| [lo, hi]))
            .map_err(to_py_err)
    }

    #[pyo3(signature = (policy, include_initial = true))]
    fn safety_constraint(&self, policy: Vec<Vec<f64>>, include_initial: bool) -> PyResult<Vec<bool>> {
        let policy = policy_from_rows(policy).map_err(to_py_err)?;
        self.inner
            .safety_constraint(&policy, include_initial)
            .map_err(to_py_err)
    }

    fn v_decrease_confidence(
        &self,
        states: Vec<Vec<f64>>,
        next_states: &Bound<'_, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let (states, prediction) = decrease_args(&self.inner, states, next_states).map_err(to_py_err)?;
        let c = self
            .inner
            .v_decrease_confidence(&states, &prediction)
            .map_err(to_py_err)?;
        Ok((c.mean, c.error))
    }

    fn v_decrease_bound(&self, states: Vec<Vec<f64>>, next_states: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
        let (states, prediction) = decrease_args(&self.inner, states, next_states).map_err(to_py_err)?;
        self.inner
            .v_decrease_bound(&states, &prediction)
            .map_err(to_py_err)
    }

    fn set_policy(&mut self, policy: Vec<Vec<f64>>) -> PyResult<()> {
        let policy = policy_from_rows(policy).map_err(to_py_err)?;
        self.inner.set_policy(policy).map_err(to_py_err)
    }

    fn report(&self) -> PySafeSetReport {
        PySafeSetReport {
            inner: self.inner.report(),
        }
    }

    #[getter]
    fn threshold(&self, py: Python<'_>) -> PyResult<PyObject> {
        pointwise_to_py(py, &self.inner.threshold())
    }

    #[getter]
    fn lipschitz(&self, py: Python<'_>) -> PyResult<PyObject> {
        pointwise_to_py(py, self.inner.model().lipschitz())
    }

    #[getter]
    fn values(&self) -> Vec<f64> {
        self.inner.values().to_vec()
    }

    #[getter]
    fn safe_set(&self) -> Vec<bool> {
        self.inner.safe_set().to_vec()
    }

    #[getter]
    fn v_dot_negative(&self) -> Vec<bool> {
        self.inner.v_dot_negative().to_vec()
    }

    #[getter]
    fn initial_safe_set(&self) -> Option<Vec<bool>> {
        self.inner.initial_safe_set().map(|s| s.to_vec())
    }

    #[getter]
    fn cmax(&self) -> f64 {
        self.inner.cmax()
    }

    #[getter]
    fn epsilon(&self) -> f64 {
        self.inner.epsilon()
    }

    #[getter]
    fn is_discrete(&self) -> bool {
        self.inner.is_discrete()
    }

    #[getter]
    fn is_continuous(&self) -> bool {
        self.inner.is_continuous()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

// ─── Free functions ─────────────────────────────────────────────────

/// Bisection for the largest value where a monotone predicate holds.
///
/// Args:
///     f: Callable[[float], bool], true below an unknown threshold.
///     bound: (lo, hi) search interval.
///     accuracy: Stop once hi - lo <= accuracy.
///
/// Returns:
///     (lo, hi) with f(lo) true, or None if f(lo) is false for the input.
#[pyfunction(name = "line_search_bisection")]
fn py_line_search_bisection(
    py: Python<'_>,
    f: PyObject,
    bound: (f64, f64),
    accuracy: f64,
) -> PyResult<Option<(f64, f64)>> {
    let mut failure: Option<PyErr> = None;
    let result = safeset_core::line_search_bisection(
        |c| {
            if failure.is_some() {
                return false;
            }
            match f.call1(py, (c,)).and_then(|r| r.bind(py).is_truthy()) {
                Ok(ok) => ok,
                Err(e) => {
                    failure = Some(e);
                    false
                }
            }
        },
        [bound.0, bound.1],
        accuracy,
    );
    if let Some(e) = failure {
        return Err(e);
    }
    Ok(result.map(|[lo, hi]| (lo, hi)))
}

/// Minimum of `fun(states) -> list[float]` over the boundary of a grid.
#[pyfunction(name = "smallest_boundary_value")]
fn py_smallest_boundary_value(fun: PyObject, discretization: PyRef<'_, PyGridWorld>) -> PyResult<f64> {
    safeset_core::smallest_boundary_value(
        |states, ndim| call_values(&fun, states, ndim),
        discretization.inner.as_ref(),
    )
    .map_err(to_py_err)
}

// ─── Module Registration ────────────────────────────────────────────

/// Lyapunov safe-set kernel: certified regions of attraction on a grid.
///
/// - `SafeSetConfig` — update configuration
/// - `GridWorld` — rectangular discretization
/// - `LyapunovDiscrete` / `LyapunovContinuous` — safe-set engines
/// - `SafeSetReport` — summary of the certified state
/// - `line_search_bisection`, `smallest_boundary_value` — primitives
#[pymodule]
fn safeset_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySafeSetConfig>()?;
    m.add_class::<PySafeSetReport>()?;
    m.add_class::<PyGridWorld>()?;
    m.add_class::<PyLyapunovDiscrete>()?;
    m.add_class::<PyLyapunovContinuous>()?;
    m.add_function(wrap_pyfunction!(py_line_search_bisection, m)?)?;
    m.add_function(wrap_pyfunction!(py_smallest_boundary_value, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_rows_checks_width() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(flatten_rows("r", rows, 2).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            flatten_rows("r", ragged, 2),
            Err(SafeSetError::Shape { .. })
        ));
    }

    #[test]
    fn test_policy_rows_round_trip() {
        let policy = policy_from_rows(vec![vec![0.5], vec![-1.0], vec![2.0]]).unwrap();
        assert_eq!(policy.len(), 3);
        assert_eq!(policy.control_dim(), 1);
        assert_eq!(policy_rows(&policy), vec![vec![0.5], vec![-1.0], vec![2.0]]);

        let empty = Policy::empty(2);
        assert_eq!(policy_rows(&empty), vec![Vec::<f64>::new(), Vec::new()]);
    }

    #[test]
    fn test_to_rows() {
        assert_eq!(to_rows(&[1.0, 2.0, 3.0, 4.0], 2), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }
}
