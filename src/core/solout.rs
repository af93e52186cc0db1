//! User defined callback hook executed after each accepted step.

use crate::core::interpolate::StepInterpolator;

/// Return flags for [`SolOut`].
///
/// - `Continue`: proceed with integration as normal.
/// - `Interrupt`: stop integration at the end of the current step and return
///   control to the caller with [`crate::core::status::Status::Interrupted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlag {
    Continue,
    Interrupt,
}

/// Step handler notified once per accepted step.
///
/// The interpolator is only valid for the duration of the call; handlers that
/// need it later must clone it (the integrator reuses it for the next step).
/// When events split a step, the handler is called once per piece with the
/// interpolator restricted to that piece.
///
/// # Example
///
/// ```
/// use ivp_engine::prelude::*;
///
/// struct Printer {
///     next: f64,
///     dt: f64,
/// }
///
/// impl SolOut for Printer {
///     fn solout(&mut self, interpolator: &StepInterpolator, _last: bool) -> ControlFlag {
///         let mut y = vec![0.0; interpolator.dimension()];
///         while self.next <= interpolator.current_time() {
///             interpolator.interpolate(self.next, &mut y);
///             println!("t = {}, y = {:?}", self.next, y);
///             self.next += self.dt;
///         }
///         ControlFlag::Continue
///     }
/// }
/// ```
pub trait SolOut {
    /// Called once before the first step of every integration run.
    fn reset(&mut self) {}

    /// Whether this handler queries the interpolator inside the step. When no
    /// handler (and no event) needs it, dense output is not built.
    fn requires_dense_output(&self) -> bool {
        true
    }

    fn solout(&mut self, interpolator: &StepInterpolator, last: bool) -> ControlFlag;
}
