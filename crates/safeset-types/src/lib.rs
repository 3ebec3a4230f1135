// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lyapunov Safe-Set Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Lyapunov safe-set kernel.

pub mod config;
pub mod error;
pub mod pointwise;
pub mod report;

pub use config::SafeSetConfig;
pub use error::{SafeSetError, SafeSetResult};
pub use pointwise::Pointwise;
pub use report::{SafeSetReport, TimeDomain};
