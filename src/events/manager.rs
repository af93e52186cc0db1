//! Event dispatch inside accepted steps.

use log::debug;

use super::{EventConfig, EventHandler, state::EventState};
use crate::{
    Float,
    core::{
        interpolate::StepInterpolator,
        solout::{ControlFlag, SolOut},
    },
    error::Result,
};

/// Outcome of [`EventManager::accept_step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Accepted {
    /// Time the integration actually reached; earlier than the step end when
    /// an event stopped or reset it.
    pub(crate) t: Float,
    /// An event asked to stop.
    pub(crate) stopped: bool,
    /// An event asked to restart from `t`; the caller must re-evaluate the
    /// derivatives.
    pub(crate) reset: bool,
    /// A step handler returned [`ControlFlag::Interrupt`].
    pub(crate) interrupted: bool,
}

/// All switching functions of one integration run.
pub(crate) struct EventManager<'h> {
    states: Vec<EventState<'h>>,
}

impl<'h> EventManager<'h> {
    pub(crate) fn new<I>(events: I) -> Self
    where
        I: IntoIterator<Item = (&'h mut dyn EventHandler, EventConfig)>,
    {
        Self {
            states: events
                .into_iter()
                .map(|(handler, config)| EventState::new(handler, config))
                .collect(),
        }
    }

    /// Manager without any switching function.
    pub(crate) fn none() -> Self {
        Self { states: Vec::new() }
    }

    /// Sample every switching function at the start of integration.
    pub(crate) fn initialize(&mut self, interpolator: &StepInterpolator) {
        for state in &mut self.states {
            state.reinitialize_begin(interpolator);
        }
    }

    /// Report the step held by `interpolator` to events and step handlers.
    ///
    /// Events inside the step are handled earliest first in integration
    /// direction, ties in declaration order. Handlers see the step split at
    /// each event. A stop or reset truncates the step: `y` then holds the
    /// state at the event (after any reset) and the returned time is the
    /// event time.
    pub(crate) fn accept_step(
        &mut self,
        interpolator: &mut StepInterpolator,
        solouts: &mut [&mut dyn SolOut],
        y: &mut [Float],
        reached_end: bool,
    ) -> Result<Accepted> {
        let forward = interpolator.is_forward();
        let step_end = interpolator.global_current_time();
        let mut previous_t = interpolator.global_previous_time();

        let mut occurring = Vec::new();
        for (i, state) in self.states.iter_mut().enumerate() {
            if state.evaluate_step(interpolator)? {
                occurring.push(i);
            }
        }

        while let Some(position) = self.earliest(&occurring, forward) {
            let index = occurring.remove(position);
            let event_t = self.states[index].event_time();

            interpolator.restrict(previous_t, event_t);
            y.copy_from_slice(interpolator.current_state());

            let state = &mut self.states[index];
            state.step_accepted(event_t, y);
            let stop = state.stop();
            let interrupted = notify(solouts, interpolator, stop);

            if stop {
                debug!("integration stopped by event at t = {event_t}");
                return Ok(Accepted {
                    t: event_t,
                    stopped: true,
                    reset: false,
                    interrupted,
                });
            }

            if state.reset(event_t, y) {
                debug!("integration reset by event at t = {event_t}");
                for (i, other) in self.states.iter_mut().enumerate() {
                    if i != index {
                        other.resynchronize(event_t, y);
                    }
                }
                return Ok(Accepted {
                    t: event_t,
                    stopped: false,
                    reset: true,
                    interrupted,
                });
            }

            if interrupted {
                return Ok(Accepted {
                    t: event_t,
                    stopped: false,
                    reset: false,
                    interrupted: true,
                });
            }

            // the same function may cross again later in the step
            previous_t = event_t;
            interpolator.restrict(event_t, step_end);
            if self.states[index].evaluate_step(interpolator)? {
                occurring.push(index);
            }
        }

        interpolator.restrict(previous_t, step_end);
        y.copy_from_slice(interpolator.current_state());
        let mut stopped = false;
        for state in &mut self.states {
            state.step_accepted(step_end, y);
            stopped |= state.stop();
        }
        let interrupted = notify(solouts, interpolator, reached_end || stopped);

        Ok(Accepted {
            t: step_end,
            stopped,
            reset: false,
            interrupted,
        })
    }

    /// Position in `occurring` of the earliest pending event.
    fn earliest(&self, occurring: &[usize], forward: bool) -> Option<usize> {
        let mut best: Option<(usize, Float, usize)> = None;
        for (position, &index) in occurring.iter().enumerate() {
            let t = self.states[index].event_time();
            let better = match best {
                None => true,
                Some((_, best_t, best_index)) => {
                    let earlier = if forward { t < best_t } else { t > best_t };
                    earlier || (t == best_t && index < best_index)
                }
            };
            if better {
                best = Some((position, t, index));
            }
        }
        best.map(|(position, _, _)| position)
    }
}

/// Call every step handler; `true` when any asks to interrupt.
pub(crate) fn notify(solouts: &mut [&mut dyn SolOut], interpolator: &StepInterpolator, last: bool) -> bool {
    let mut interrupted = false;
    for solout in solouts.iter_mut() {
        if solout.solout(interpolator, last) == ControlFlag::Interrupt {
            interrupted = true;
        }
    }
    interrupted
}
