//! Switching functions: event handlers, their per-run state, and the manager
//! that locates and dispatches events inside accepted steps.

mod manager;
mod root;
mod state;

pub(crate) use manager::EventManager;

use bon::Builder;

use crate::{
    Float,
    error::{Error, Result},
};

/// What the integrator should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Ignore the event and keep integrating.
    Continue,
    /// Call [`EventHandler::reset_state`] and restart from the event time.
    ResetState,
    /// The model changes at the event time; restart with fresh derivatives.
    ResetDerivatives,
    /// End integration at the event time.
    Stop,
}

/// Switching function watched during integration.
///
/// `g` must change sign at each event and be continuous around it.
///
/// # Example
///
/// ```
/// use ivp_engine::prelude::*;
///
/// /// Stops when the first component reaches zero from above.
/// struct Touchdown;
///
/// impl EventHandler for Touchdown {
///     fn g(&self, _t: f64, y: &[f64]) -> f64 {
///         y[0]
///     }
///
///     fn event_occurred(&mut self, _t: f64, _y: &[f64], increasing: bool) -> Action {
///         if increasing { Action::Continue } else { Action::Stop }
///     }
/// }
/// ```
pub trait EventHandler {
    fn g(&self, t: Float, y: &[Float]) -> Float;

    /// Called once per located event. `increasing` tells whether `g` goes
    /// from negative to positive as time increases.
    fn event_occurred(&mut self, t: Float, y: &[Float], increasing: bool) -> Action;

    /// Mutate the state in place; only called after [`Action::ResetState`].
    fn reset_state(&mut self, _t: Float, _y: &mut [Float]) {}
}

/// Detection settings for one event.
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
pub struct EventConfig {
    /// Longest span scanned without sampling `g`. Sign changes that happen and
    /// revert inside one span are missed.
    #[builder(default = Float::INFINITY)]
    pub max_check_interval: Float,
    /// Time tolerance of the located event.
    #[builder(default = 1e-10)]
    pub convergence: Float,
    /// Root-finding iteration budget.
    #[builder(default = 100)]
    pub max_iterations: usize,
}

impl EventConfig {
    /// Reject settings under which a scan or a root search cannot finish.
    pub fn validate(&self) -> Result<()> {
        if !(self.max_check_interval > 0.0) {
            return Err(Error::InvalidSetting {
                reason: "event max check interval must be positive",
            });
        }
        if !(self.convergence.is_finite() && self.convergence > 0.0) {
            return Err(Error::InvalidSetting {
                reason: "event convergence must be finite and positive",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidSetting {
                reason: "event root finding needs at least one iteration",
            });
        }
        Ok(())
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
