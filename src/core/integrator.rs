//! The integrator interface and the handlers attached to one run.

use crate::{
    Float,
    core::{ode::ODE, solout::SolOut, solution::IntegrationResult},
    error::{Error, Result},
    events::{EventConfig, EventHandler, EventManager},
};

/// A numerical integrator for initial value problems.
///
/// Integrators are configured at construction and can be run any number of
/// times; each call to [`Integrator::integrate`] starts from scratch.
pub trait Integrator {
    /// Human readable method name.
    fn name(&self) -> &'static str;

    /// Integrate `f` from `(t0, y0)` towards `t_end`, writing the reached
    /// state into `y`.
    ///
    /// `t_end < t0` integrates backward. The run ends early with
    /// [`crate::core::status::Status::Stopped`] when an event stops it and
    /// with [`crate::core::status::Status::Interrupted`] when a step handler
    /// interrupts it; [`IntegrationResult::t`] is then the time reached.
    fn integrate<F>(
        &mut self,
        f: &F,
        t0: Float,
        y0: &[Float],
        t_end: Float,
        y: &mut [Float],
        handlers: &mut Handlers<'_>,
    ) -> Result<IntegrationResult>
    where
        F: ODE + ?Sized;
}

/// Step handlers and events watched during one run.
///
/// ```
/// use ivp_engine::prelude::*;
///
/// let mut output = ContinuousOutput::new();
/// let handlers = Handlers::new().with_solout(&mut output);
/// # drop(handlers);
/// ```
#[derive(Default)]
pub struct Handlers<'a> {
    solouts: Vec<&'a mut dyn SolOut>,
    events: Vec<(&'a mut dyn EventHandler, EventConfig)>,
}

impl<'a> Handlers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solout(mut self, solout: &'a mut dyn SolOut) -> Self {
        self.solouts.push(solout);
        self
    }

    pub fn with_event(mut self, event: &'a mut dyn EventHandler, config: EventConfig) -> Self {
        self.events.push((event, config));
        self
    }

    pub fn add_solout(&mut self, solout: &'a mut dyn SolOut) {
        self.solouts.push(solout);
    }

    pub fn add_event(&mut self, event: &'a mut dyn EventHandler, config: EventConfig) {
        self.events.push((event, config));
    }

    /// Whether anything attached needs dense output.
    pub(crate) fn requires_dense_output(&self) -> bool {
        !self.events.is_empty() || self.solouts.iter().any(|s| s.requires_dense_output())
    }

    /// Check the event settings, reset the step handlers and hand out the
    /// pieces a driver works with.
    pub(crate) fn prepare(&mut self) -> Result<(&mut [&'a mut dyn SolOut], EventManager<'_>)> {
        for (_, config) in &self.events {
            config.validate()?;
        }
        for solout in self.solouts.iter_mut() {
            solout.reset();
        }
        let events = EventManager::new(
            self.events
                .iter_mut()
                .map(|(handler, config)| (&mut **handler as &mut dyn EventHandler, *config)),
        );
        Ok((&mut self.solouts, events))
    }
}

/// Reject intervals too short to integrate over.
pub(crate) fn check_interval(t0: Float, t_end: Float) -> Result<()> {
    if interval_exhausted(t0, t_end) {
        return Err(Error::EmptyInterval { t0, t_end });
    }
    Ok(())
}

/// Whether `t` and `t_end` coincide up to rounding.
pub(crate) fn interval_exhausted(t: Float, t_end: Float) -> bool {
    (t_end - t).abs() <= 1.0e-12 * t.abs().max(t_end.abs())
}
