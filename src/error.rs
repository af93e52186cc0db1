//! Errors reported by integrators, transforms, and continuous output.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::Float;

/// Every failure the engine can report.
///
/// Configuration variants are only produced at construction time; the
/// remaining variants come out of `integrate`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("order {order} is not supported (expected 1..={max})")]
    InvalidOrder { order: usize, max: usize },

    #[error("inconsistent history offsets p={p}, q={q}, r={r}, s={s}")]
    InvalidOffsets { p: i32, q: i32, r: i32, s: i32 },

    #[error("history offsets p={p}, q={q}, r={r}, s={s} define a singular transform")]
    SingularTransform { p: i32, q: i32, r: i32, s: i32 },

    #[error("tolerances must be non-negative and not both zero (rtol={rtol}, atol={atol})")]
    InvalidTolerance { rtol: Float, atol: Float },

    #[error("step bounds are inconsistent (min_step={min_step}, max_step={max_step})")]
    InvalidStepBounds { min_step: Float, max_step: Float },

    #[error("step size {0} is not a finite non-zero value")]
    InvalidStepSize(Float),

    #[error("invalid setting: {reason}")]
    InvalidSetting { reason: &'static str },

    #[error("{method} has no embedded error estimator and only supports fixed steps")]
    MissingErrorEstimator { method: &'static str },

    #[error("state dimension mismatch: model has {expected} components, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("integration interval [{t0}, {t_end}] is too small")]
    EmptyInterval { t0: Float, t_end: Float },

    #[error("step size underflow at t = {t}: required step {h} is below minimum {min_step}")]
    StepSizeUnderflow { t: Float, h: Float, min_step: Float },

    #[error("maximal number of derivative evaluations ({max}) exceeded")]
    MaxEvaluationsExceeded { max: usize },

    #[error("event root finding did not converge in [{t_lo}, {t_hi}] after {iterations} iterations")]
    EventNotConverged {
        t_lo: Float,
        t_hi: Float,
        iterations: usize,
    },

    #[error("cannot append continuous output: {reason}")]
    IncompatibleOutput { reason: &'static str },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a caller-supplied model.
///
/// The wrapped value is the caller's own error; it is displayed and sourced
/// unchanged and can be recovered with [`ModelError::downcast_ref`] or
/// [`ModelError::into_inner`].
#[derive(Debug)]
pub struct ModelError(Box<dyn StdError + Send + Sync>);

impl ModelError {
    /// Wrap any error (or message) raised while evaluating the model.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self(err.into())
    }

    /// Borrow the original error if it has type `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Recover the original boxed error.
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.0
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for ModelError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}
