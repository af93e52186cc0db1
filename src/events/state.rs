//! Per-run state of one switching function.

use log::{debug, trace};

use super::{Action, EventConfig, EventHandler, root};
use crate::{
    Float,
    core::interpolate::{Interpolate, StepInterpolator},
    error::Result,
};

/// Tracks the sign of one switching function across steps and remembers the
/// event located in the step under examination.
pub(crate) struct EventState<'h> {
    handler: &'h mut dyn EventHandler,
    config: EventConfig,
    /// Time and value of `g` at the start of the step under examination.
    t0: Float,
    g0: Float,
    g0_positive: bool,
    pending_event: bool,
    pending_event_time: Float,
    previous_event_time: Option<Float>,
    forward: bool,
    increasing: bool,
    next_action: Action,
}

impl<'h> EventState<'h> {
    pub(crate) fn new(handler: &'h mut dyn EventHandler, config: EventConfig) -> Self {
        Self {
            handler,
            config,
            t0: Float::NAN,
            g0: Float::NAN,
            g0_positive: true,
            pending_event: false,
            pending_event_time: Float::NAN,
            previous_event_time: None,
            forward: true,
            increasing: true,
            next_action: Action::Continue,
        }
    }

    /// Sample `g` at the start of the first step.
    pub(crate) fn reinitialize_begin(&mut self, interpolator: &StepInterpolator) {
        self.forward = interpolator.is_forward();
        self.t0 = interpolator.previous_time();
        let mut y = interpolator.previous_state().to_vec();
        self.g0 = self.handler.g(self.t0, &y);
        if self.g0 == 0.0 {
            // starting exactly on a root: take the sign just ahead of it
            let offset = 0.5 * self.config.convergence;
            let t = if self.forward { self.t0 + offset } else { self.t0 - offset };
            interpolator.interpolate(t, &mut y);
            self.g0 = self.handler.g(t, &y);
        }
        self.g0_positive = self.g0 >= 0.0;
        self.pending_event = false;
        self.pending_event_time = Float::NAN;
        self.next_action = Action::Continue;
    }

    /// Rebase after another event reset the integration at `(t, y)`. Keeps
    /// the event history but forgets any pending root.
    pub(crate) fn resynchronize(&mut self, t: Float, y: &[Float]) {
        self.t0 = t;
        self.g0 = self.handler.g(t, y);
        self.g0_positive = self.g0 >= 0.0;
        self.pending_event = false;
        self.pending_event_time = Float::NAN;
        self.next_action = Action::Continue;
    }

    /// Scan the interpolator's reported interval for a sign change of `g`.
    /// Returns `true` when an event has been located; its time is then
    /// available from [`Self::event_time`].
    pub(crate) fn evaluate_step(&mut self, interpolator: &StepInterpolator) -> Result<bool> {
        let convergence = self.config.convergence;
        let t1 = interpolator.current_time();
        let dt = t1 - self.t0;
        if dt.abs() < convergence {
            // too short to say anything about the sign
            return Ok(false);
        }

        // max_check_interval is positive (validated), so the ratio is finite
        // and non-negative; an infinite interval gives zero and scans the
        // step in one piece
        let n = ((dt.abs() / self.config.max_check_interval).ceil() as usize).max(1);
        let h = dt / n as Float;
        let handler: &dyn EventHandler = &*self.handler;
        let mut y = vec![0.0; interpolator.dimension()];
        let mut probe = y.clone();

        let mut ta = self.t0;
        let mut ga = self.g0;
        for i in 0..n {
            let tb = if i + 1 == n {
                t1
            } else {
                self.t0 + (i + 1) as Float * h
            };
            interpolator.interpolate(tb, &mut y);
            let gb = handler.g(tb, &y);

            if self.g0_positive ^ (gb >= 0.0) && (ga >= 0.0) != (gb >= 0.0) {
                self.increasing = gb >= ga;
                let root = root::locate(
                    |t| {
                        interpolator.interpolate(t, &mut probe);
                        handler.g(t, &probe)
                    },
                    ta,
                    ga,
                    tb,
                    gb,
                    convergence,
                    self.config.max_iterations,
                )?;

                let repeats_previous = self
                    .previous_event_time
                    .is_some_and(|previous| (root - previous).abs() <= convergence);
                if !repeats_previous {
                    trace!("event root located at t = {root}");
                    self.pending_event_time = root;
                    self.pending_event = true;
                    return Ok(true);
                }
                // the root is the event just handled, seen again from the
                // other side of the crossing; keep scanning
            }
            ta = tb;
            ga = gb;
        }

        self.pending_event = false;
        self.pending_event_time = Float::NAN;
        Ok(false)
    }

    pub(crate) fn event_time(&self) -> Float {
        self.pending_event_time
    }

    /// Commit the step up to `t`. Fires the pending event when `t` is its
    /// time, which records the handler's requested action.
    pub(crate) fn step_accepted(&mut self, t: Float, y: &[Float]) {
        self.t0 = t;
        self.g0 = self.handler.g(t, y);
        if self.pending_event && (self.pending_event_time - t).abs() <= self.config.convergence {
            self.previous_event_time = Some(t);
            self.g0_positive = self.increasing;
            let increasing_in_time = !(self.increasing ^ self.forward);
            self.next_action = self.handler.event_occurred(t, y, increasing_in_time);
            debug!("event at t = {t}: {:?}", self.next_action);
        } else {
            self.g0_positive = self.g0 >= 0.0;
            self.next_action = Action::Continue;
        }
    }

    pub(crate) fn stop(&self) -> bool {
        self.next_action == Action::Stop
    }

    /// Apply the reset requested by the event fired at `t`, if any. Returns
    /// `true` when integration has to restart from `(t, y)`.
    pub(crate) fn reset(&mut self, t: Float, y: &mut [Float]) -> bool {
        if !(self.pending_event && (self.pending_event_time - t).abs() <= self.config.convergence) {
            return false;
        }
        if self.next_action == Action::ResetState {
            self.handler.reset_state(t, y);
        }
        self.pending_event = false;
        self.pending_event_time = Float::NAN;
        matches!(self.next_action, Action::ResetState | Action::ResetDerivatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interpolate::DenseModel;

    struct Crossing {
        level: Float,
        fired: Vec<(Float, bool)>,
        action: Action,
    }

    impl EventHandler for Crossing {
        fn g(&self, _t: Float, y: &[Float]) -> Float {
            y[0] - self.level
        }

        fn event_occurred(&mut self, t: Float, _y: &[Float], increasing: bool) -> Action {
            self.fired.push((t, increasing));
            self.action
        }
    }

    fn linear_step(t0: Float, t1: Float) -> StepInterpolator {
        // y = t, exact under linear interpolation
        let mut interp = StepInterpolator::new(t0, &[t0], t1 > t0);
        interp.store(t1, &[t1]);
        interp.set_dense(DenseModel::Linear);
        interp
    }

    #[test]
    fn fires_once_at_the_crossing() {
        let mut handler = Crossing {
            level: 0.4,
            fired: vec![],
            action: Action::Continue,
        };
        let interp = linear_step(0.0, 1.0);
        let mut state = EventState::new(&mut handler, EventConfig::default());
        state.reinitialize_begin(&StepInterpolator::new(0.0, &[0.0], true));
        assert!(state.evaluate_step(&interp).unwrap());
        let t = state.event_time();
        assert!((t - 0.4).abs() <= 1e-10);
        state.step_accepted(t, &[t]);
        assert!(!state.stop());
        assert!(!state.reset(t, &mut [t]));
        drop(state);
        assert_eq!(handler.fired.len(), 1);
        assert!(handler.fired[0].1);
    }

    #[test]
    fn backward_crossing_reports_time_direction() {
        let mut handler = Crossing {
            level: 0.4,
            fired: vec![],
            action: Action::Stop,
        };
        let interp = linear_step(1.0, 0.0);
        let mut state = EventState::new(&mut handler, EventConfig::default());
        state.reinitialize_begin(&StepInterpolator::new(1.0, &[1.0], false));
        assert!(state.evaluate_step(&interp).unwrap());
        let t = state.event_time();
        state.step_accepted(t, &[t]);
        assert!(state.stop());
        drop(state);
        // g decreases along the integration but increases with time
        assert!(handler.fired[0].1);
    }

    #[test]
    fn coarse_checks_miss_double_crossings() {
        struct Bump;
        impl EventHandler for Bump {
            fn g(&self, _t: Float, y: &[Float]) -> Float {
                (y[0] - 0.5).abs() - 0.1
            }
            fn event_occurred(&mut self, _t: Float, _y: &[Float], _increasing: bool) -> Action {
                Action::Stop
            }
        }
        let interp = linear_step(0.0, 1.0);

        let mut coarse = Bump;
        let mut state = EventState::new(&mut coarse, EventConfig::default());
        state.reinitialize_begin(&StepInterpolator::new(0.0, &[0.0], true));
        assert!(!state.evaluate_step(&interp).unwrap());

        let mut fine = Bump;
        let config = EventConfig::builder().max_check_interval(0.1).build();
        let mut state = EventState::new(&mut fine, config);
        state.reinitialize_begin(&StepInterpolator::new(0.0, &[0.0], true));
        assert!(state.evaluate_step(&interp).unwrap());
        assert!((state.event_time() - 0.4).abs() <= 1e-10);
    }
}
