//! Default SolOut that implements t_eval sampling and endpoint recording.

use crate::{
    Float,
    core::{
        interpolate::{Interpolate, StepInterpolator},
        solout::{ControlFlag, SolOut},
    },
};

/// Records the solution at step endpoints and/or at requested times.
///
/// Requested times must be ordered in integration direction; those outside
/// the integrated range are skipped.
pub struct DefaultSolOut {
    t_eval: Option<Vec<Float>>,
    save_endpoints: bool,
    started: bool,
    next_idx: usize,
    tol: Float,
    t: Vec<Float>,
    y: Vec<Vec<Float>>,
}

impl DefaultSolOut {
    pub fn new(t_eval: Option<Vec<Float>>, save_endpoints: bool) -> Self {
        Self {
            t_eval,
            save_endpoints,
            started: false,
            next_idx: 0,
            tol: 1e-12,
            t: Vec::new(),
            y: Vec::new(),
        }
    }

    pub fn into_data(self) -> (Vec<Float>, Vec<Vec<Float>>) {
        (self.t, self.y)
    }

    fn push(&mut self, t: Float, y: Vec<Float>) {
        self.t.push(t);
        self.y.push(y);
    }
}

impl SolOut for DefaultSolOut {
    fn reset(&mut self) {
        self.started = false;
        self.next_idx = 0;
        self.t.clear();
        self.y.clear();
    }

    fn requires_dense_output(&self) -> bool {
        self.t_eval.is_some()
    }

    fn solout(&mut self, interpolator: &StepInterpolator, _last: bool) -> ControlFlag {
        let t_start = interpolator.previous_time();
        let t_end = interpolator.current_time();
        let sign = if interpolator.is_forward() { 1.0 } else { -1.0 };
        let first = !self.started;
        self.started = true;

        // Record endpoints, the initial point included
        if self.save_endpoints {
            if first {
                self.push(t_start, interpolator.previous_state().to_vec());
            }
            self.push(t_end, interpolator.current_state().to_vec());
        }

        // Interpolate requested times within [t_start, t_end]
        let Some(te) = self.t_eval.take() else {
            return ControlFlag::Continue;
        };
        let mut i = self.next_idx;
        while i < te.len() && sign * (te[i] - t_end) <= self.tol {
            if sign * (te[i] - t_start) >= -self.tol {
                let mut yi = vec![0.0; interpolator.dimension()];
                interpolator.interpolate(te[i], &mut yi);
                self.push(te[i], yi);
            }
            i += 1;
        }
        self.next_idx = i;
        self.t_eval = Some(te);

        ControlFlag::Continue
    }
}
