// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Safe-Set Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all safe-set kernel failures.
///
/// Infeasible level sets are not errors: the search reports them as
/// `cmax = 0` and the caller treats the safe set as empty.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SafeSetError {
    /// An array did not have the length its consumer requires.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    Shape {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid input (grid limits, point counts, discretization constant).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// An externally supplied function (e.g. a Python callable) failed.
    #[error("callback error: {0}")]
    Callback(String),
}

impl SafeSetError {
    pub fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::Shape {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Return `Ok(())` when `actual == expected`, a `Shape` error otherwise.
    pub fn check_len(context: &str, expected: usize, actual: usize) -> SafeSetResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::shape(context, expected, actual))
        }
    }
}

pub type SafeSetResult<T> = Result<T, SafeSetError>;
