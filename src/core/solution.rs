//! A struct representing the outputted result of a numerical integrator.

use crate::{Float, core::status::Status};

/// The output of a numerical integrator. The final state is written into the
/// caller's buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationResult {
    /// The time actually reached
    pub t: Float,
    /// The step size proposed for the next step
    pub h: Float,
    /// The number of function evaluations
    pub nfev: usize,
    /// The number of steps attempted
    pub nstep: usize,
    /// The number of accepted steps
    pub naccpt: usize,
    /// The number of rejected steps
    pub nrejct: usize,
    /// The status of the integration process
    pub status: Status,
}

/// Step counters accumulated by the drivers.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Steps {
    pub(crate) total: usize,
    pub(crate) accepted: usize,
    pub(crate) rejected: usize,
}

impl Steps {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn finish(self, t: Float, h: Float, nfev: usize, status: Status) -> IntegrationResult {
        IntegrationResult {
            t,
            h,
            nfev,
            nstep: self.total,
            naccpt: self.accepted,
            nrejct: self.rejected,
            status,
        }
    }
}
