// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lyapunov Safe-Set Kernel Core
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Certified safe sets (regions of attraction) for dynamical systems
//! from a Lyapunov function evaluated on a discretized state space.
//!
//! # Safety Invariants
//!
//! 1. **The safe set is a sub-level set**: after every update,
//!    `safe_set[i] == (V[i] <= cmax)` for all grid points. The one exception
//!    is an infeasible search (even the lowest level fails the decrease
//!    condition): cmax is reported as 0 and the safe set is empty, even if
//!    some grid points have V ≤ 0.
//!
//! 2. **Every safe point decreases**: each point in the safe set satisfies
//!    the decrease condition (or belongs to the initial safe set when it is
//!    included), so trajectories starting inside cannot leave it.
//!
//! 3. **cmax is a realized grid value**: a feasible level search reports
//!    the largest V tested as safe, never the bisection bound itself, unless
//!    no grid value lies below that bound (then the bound is returned and
//!    the sub-level set is empty).
//!
//! 4. **Failed updates change nothing**: a callback or shape error leaves
//!    the previous certified state in place.

pub mod boundary;
pub mod continuous;
pub mod discrete;
pub mod engine;
pub mod functions;
pub mod grid;
pub mod line_search;

pub use boundary::{smallest_boundary_value, smallest_boundary_value_with};
pub use continuous::{ContinuousEngine, ContinuousTime};
pub use discrete::{DiscreteEngine, DiscreteTime};
pub use engine::{Confidence, DecreaseModel, SafetyEngine};
pub use functions::{
    BoundedError, DifferentiableLyapunov, Dynamics, FnDynamics, FnLyapunov, LinearDynamics,
    LyapunovFunction, Policy, Prediction, QuadraticLyapunov,
};
pub use grid::{Discretization, GridWorld};
pub use line_search::line_search_bisection;
