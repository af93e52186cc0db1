//! Interpolation trait and the per-step interpolator handed to step handlers.

use serde::{Deserialize, Serialize};

use crate::Float;

/// Trait for interpolating the solution.
///
/// Queries outside the covered range extrapolate; accuracy is only
/// guaranteed inside it.
pub trait Interpolate {
    /// Interpolate the solution at time `t` into `y`.
    fn interpolate(&self, t: Float, y: &mut [Float]);

    /// Interpolate the solution derivative at time `t` into `dydt`.
    fn interpolate_derivative(&self, t: Float, dydt: &mut [Float]);
}

/// Dense output data attached to one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DenseModel {
    /// No dense output was built: straight line between the step ends.
    Linear,
    /// Cubic Hermite through the step ends and their derivatives.
    Hermite { f0: Vec<Float>, f1: Vec<Float> },
    /// Dormand–Prince continuous extension with `rows` coefficient vectors
    /// stored row-major: `y = c0 + θ(c1 + (1-θ)(c2 + θ(c3 + ...)))` with
    /// `θ = (t - t_start) / h`.
    DormandPrince {
        t_start: Float,
        h: Float,
        rows: usize,
        cont: Vec<Float>,
    },
    /// Nordsieck vector `[y, h y', h²/2 y'', ...]` expanded at `reference_time`.
    Nordsieck {
        reference_time: Float,
        scaling_h: Float,
        reference_state: Vec<Float>,
        scaled: Vec<Float>,
        rows: Vec<Vec<Float>>,
    },
}

/// Interpolator for one accepted step.
///
/// The global bounds delimit the step as computed by the integrator; the
/// soft bounds delimit the part of it currently reported (they only differ
/// when events split a step). Querying exactly at a bound returns the stored
/// boundary state bit for bit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepInterpolator {
    forward: bool,
    global_previous_time: Float,
    global_current_time: Float,
    global_previous_state: Vec<Float>,
    global_current_state: Vec<Float>,
    previous_time: Float,
    current_time: Float,
    previous_state: Vec<Float>,
    current_state: Vec<Float>,
    dense: DenseModel,
}

impl StepInterpolator {
    /// Zero-length interpolator sitting at `(t0, y0)`.
    pub(crate) fn new(t0: Float, y0: &[Float], forward: bool) -> Self {
        Self {
            forward,
            global_previous_time: t0,
            global_current_time: t0,
            global_previous_state: y0.to_vec(),
            global_current_state: y0.to_vec(),
            previous_time: t0,
            current_time: t0,
            previous_state: y0.to_vec(),
            current_state: y0.to_vec(),
            dense: DenseModel::Linear,
        }
    }

    /// Start of the reported (soft) interval.
    pub fn previous_time(&self) -> Float {
        self.previous_time
    }

    /// End of the reported (soft) interval.
    pub fn current_time(&self) -> Float {
        self.current_time
    }

    pub fn global_previous_time(&self) -> Float {
        self.global_previous_time
    }

    pub fn global_current_time(&self) -> Float {
        self.global_current_time
    }

    /// State at [`Self::previous_time`].
    pub fn previous_state(&self) -> &[Float] {
        &self.previous_state
    }

    /// State at [`Self::current_time`].
    pub fn current_state(&self) -> &[Float] {
        &self.current_state
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn dimension(&self) -> usize {
        self.current_state.len()
    }

    pub fn dense_model(&self) -> &DenseModel {
        &self.dense
    }

    /// Rebase so the last stored end becomes the start of the next step.
    /// Reuses the existing buffers.
    pub(crate) fn shift(&mut self) {
        self.global_previous_time = self.global_current_time;
        self.global_previous_state
            .copy_from_slice(&self.global_current_state);
        self.previous_time = self.global_previous_time;
        self.previous_state.copy_from_slice(&self.global_previous_state);
    }

    /// Record the raw end of the step and reset the soft bounds to it.
    pub(crate) fn store(&mut self, t: Float, y: &[Float]) {
        self.global_current_time = t;
        self.global_current_state.copy_from_slice(y);
        self.previous_time = self.global_previous_time;
        self.current_time = t;
        self.previous_state.copy_from_slice(&self.global_previous_state);
        self.current_state.copy_from_slice(y);
    }

    /// Rebase the whole interpolator at `(t, y)`, dropping dense data. Used
    /// when integration restarts after a reset.
    pub(crate) fn reinitialize(&mut self, t: Float, y: &[Float]) {
        self.global_current_time = t;
        self.global_current_state.copy_from_slice(y);
        self.shift();
        self.current_time = t;
        self.current_state.copy_from_slice(y);
        self.dense = DenseModel::Linear;
    }

    pub(crate) fn set_dense(&mut self, dense: DenseModel) {
        self.dense = dense;
    }

    /// Take back the coefficient buffer of a Dormand–Prince model so the next
    /// step can refill it without allocating.
    pub(crate) fn recycle(&mut self) -> Vec<Float> {
        match std::mem::replace(&mut self.dense, DenseModel::Linear) {
            DenseModel::DormandPrince { cont, .. } => cont,
            _ => Vec::new(),
        }
    }

    /// Restrict the reported interval to `[from, to]` inside the global step.
    pub(crate) fn restrict(&mut self, from: Float, to: Float) {
        let mut start = std::mem::take(&mut self.previous_state);
        let mut end = std::mem::take(&mut self.current_state);
        self.raw_state(from, &mut start);
        self.raw_state(to, &mut end);
        self.previous_state = start;
        self.current_state = end;
        self.previous_time = from;
        self.current_time = to;
    }

    fn raw_state(&self, t: Float, y: &mut [Float]) {
        if t == self.global_current_time {
            y.copy_from_slice(&self.global_current_state);
            return;
        }
        if t == self.global_previous_time {
            y.copy_from_slice(&self.global_previous_state);
            return;
        }
        match &self.dense {
            DenseModel::Linear => {
                let span = self.global_current_time - self.global_previous_time;
                let theta = if span == 0.0 {
                    1.0
                } else {
                    (t - self.global_previous_time) / span
                };
                for (i, yi) in y.iter_mut().enumerate() {
                    let y0 = self.global_previous_state[i];
                    *yi = y0 + theta * (self.global_current_state[i] - y0);
                }
            }
            DenseModel::Hermite { f0, f1 } => {
                let h = self.global_current_time - self.global_previous_time;
                let s = (t - self.global_previous_time) / h;
                let s2 = s * s;
                let s3 = s2 * s;
                let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
                let h10 = s3 - 2.0 * s2 + s;
                let h01 = -2.0 * s3 + 3.0 * s2;
                let h11 = s3 - s2;
                for (i, yi) in y.iter_mut().enumerate() {
                    *yi = h00 * self.global_previous_state[i]
                        + h10 * h * f0[i]
                        + h01 * self.global_current_state[i]
                        + h11 * h * f1[i];
                }
            }
            DenseModel::DormandPrince {
                t_start,
                h,
                rows,
                cont,
            } => {
                let n = y.len();
                let theta = (t - t_start) / h;
                for (i, yi) in y.iter_mut().enumerate() {
                    *yi = alternating_horner(cont, n, *rows, theta, i).0;
                }
            }
            DenseModel::Nordsieck {
                reference_time,
                scaling_h,
                reference_state,
                scaled,
                rows,
            } => {
                let s = (t - reference_time) / scaling_h;
                for (i, yi) in y.iter_mut().enumerate() {
                    let mut variation = 0.0;
                    for row in rows.iter().rev() {
                        variation = (variation + row[i]) * s;
                    }
                    *yi = reference_state[i] + (variation + scaled[i]) * s;
                }
            }
        }
    }
}

impl Interpolate for StepInterpolator {
    fn interpolate(&self, t: Float, y: &mut [Float]) {
        if t == self.current_time {
            y.copy_from_slice(&self.current_state);
        } else if t == self.previous_time {
            y.copy_from_slice(&self.previous_state);
        } else {
            self.raw_state(t, y);
        }
    }

    fn interpolate_derivative(&self, t: Float, dydt: &mut [Float]) {
        match &self.dense {
            DenseModel::Linear => {
                let span = self.global_current_time - self.global_previous_time;
                for (i, di) in dydt.iter_mut().enumerate() {
                    *di = if span == 0.0 {
                        0.0
                    } else {
                        (self.global_current_state[i] - self.global_previous_state[i]) / span
                    };
                }
            }
            DenseModel::Hermite { f0, f1 } => {
                let h = self.global_current_time - self.global_previous_time;
                let s = (t - self.global_previous_time) / h;
                let s2 = s * s;
                let d00 = 6.0 * s2 - 6.0 * s;
                let d10 = 3.0 * s2 - 4.0 * s + 1.0;
                let d11 = 3.0 * s2 - 2.0 * s;
                for (i, di) in dydt.iter_mut().enumerate() {
                    let dy = self.global_current_state[i] - self.global_previous_state[i];
                    *di = (-d00 * dy) / h + d10 * f0[i] + d11 * f1[i];
                }
            }
            DenseModel::DormandPrince {
                t_start,
                h,
                rows,
                cont,
            } => {
                let n = dydt.len();
                let theta = (t - t_start) / h;
                for (i, di) in dydt.iter_mut().enumerate() {
                    *di = alternating_horner(cont, n, *rows, theta, i).1 / h;
                }
            }
            DenseModel::Nordsieck {
                reference_time,
                scaling_h,
                scaled,
                rows,
                ..
            } => {
                let s = (t - reference_time) / scaling_h;
                for (i, di) in dydt.iter_mut().enumerate() {
                    let mut variation = 0.0;
                    for (j, row) in rows.iter().enumerate().rev() {
                        variation = variation * s + (j + 2) as Float * row[i];
                    }
                    *di = (scaled[i] + variation * s) / scaling_h;
                }
            }
        }
    }
}

/// Evaluate `c0 + θ(c1 + (1-θ)(c2 + θ(c3 + ...)))` and its θ-derivative for
/// component `i`.
fn alternating_horner(cont: &[Float], n: usize, rows: usize, theta: Float, i: usize) -> (Float, Float) {
    let theta1 = 1.0 - theta;
    let mut value = cont[(rows - 1) * n + i];
    let mut slope = 0.0;
    for k in (0..rows - 1).rev() {
        let (factor, dfactor) = if k % 2 == 0 { (theta, 1.0) } else { (theta1, -1.0) };
        slope = dfactor * value + factor * slope;
        value = cont[k * n + i] + factor * value;
    }
    (value, slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic_step() -> StepInterpolator {
        // y = t^3 on [1, 2], exact Hermite data
        let mut interp = StepInterpolator::new(1.0, &[1.0], true);
        interp.store(2.0, &[8.0]);
        interp.set_dense(DenseModel::Hermite {
            f0: vec![3.0],
            f1: vec![12.0],
        });
        interp
    }

    #[test]
    fn hermite_reproduces_cubic() {
        let interp = cubic_step();
        let mut y = [0.0];
        let mut dy = [0.0];
        for t in [1.1, 1.5, 1.9, 2.5] {
            interp.interpolate(t, &mut y);
            interp.interpolate_derivative(t, &mut dy);
            assert_relative_eq!(y[0], t * t * t, max_relative = 1e-13);
            assert_relative_eq!(dy[0], 3.0 * t * t, max_relative = 1e-13);
        }
    }

    #[test]
    fn restrict_keeps_boundary_identity() {
        let mut interp = cubic_step();
        interp.restrict(1.25, 2.0);
        let mut y = [0.0];
        interp.interpolate(2.0, &mut y);
        assert_eq!(y[0], 8.0);
        interp.interpolate(1.25, &mut y);
        assert_eq!(y[0], interp.previous_state()[0]);
        assert_relative_eq!(y[0], 1.25f64.powi(3), max_relative = 1e-13);
    }

    #[test]
    fn nordsieck_matches_taylor_polynomial() {
        // y(t) = 1 + 2(t-1) + 3(t-1)^2 + 4(t-1)^3 expanded at t = 1 with h = 0.5
        let h = 0.5;
        let mut interp = StepInterpolator::new(0.5, &[1.0 - 1.0 + 0.75 - 0.5], true);
        interp.store(1.0, &[1.0]);
        interp.set_dense(DenseModel::Nordsieck {
            reference_time: 1.0,
            scaling_h: h,
            reference_state: vec![1.0],
            scaled: vec![2.0 * h],
            rows: vec![vec![3.0 * h * h], vec![4.0 * h * h * h]],
        });
        let exact = |t: Float| 1.0 + 2.0 * (t - 1.0) + 3.0 * (t - 1.0).powi(2) + 4.0 * (t - 1.0).powi(3);
        let slope = |t: Float| 2.0 + 6.0 * (t - 1.0) + 12.0 * (t - 1.0).powi(2);
        let mut y = [0.0];
        let mut dy = [0.0];
        for t in [0.6, 0.75, 0.9] {
            interp.interpolate(t, &mut y);
            interp.interpolate_derivative(t, &mut dy);
            assert_relative_eq!(y[0], exact(t), max_relative = 1e-13);
            assert_relative_eq!(dy[0], slope(t), max_relative = 1e-13);
        }
    }

    #[test]
    fn shift_rebases_without_reallocating() {
        let mut interp = cubic_step();
        let ptr = interp.global_previous_state.as_ptr();
        interp.shift();
        assert_eq!(interp.global_previous_time(), 2.0);
        assert_eq!(interp.previous_state(), &[8.0]);
        assert_eq!(ptr, interp.global_previous_state.as_ptr());
    }

    #[test]
    fn alternating_horner_slope_matches_finite_difference() {
        let cont = [0.3, -1.2, 0.7, 2.0, -0.4];
        let (v0, d0) = alternating_horner(&cont, 1, 5, 0.37, 0);
        let eps = 1e-6;
        let (vp, _) = alternating_horner(&cont, 1, 5, 0.37 + eps, 0);
        let (vm, _) = alternating_horner(&cont, 1, 5, 0.37 - eps, 0);
        assert_relative_eq!(d0, (vp - vm) / (2.0 * eps), max_relative = 1e-8);
        assert!(v0.is_finite());
    }
}
