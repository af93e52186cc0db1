//! Step proposal strategies.

use log::warn;

use crate::{
    Float,
    error::{Error, Result},
    methods::settings::Settings,
};

/// How an integrator picks its steps.
#[derive(Clone, Debug)]
pub enum StepControl {
    /// Constant step; the last one is shortened to land on the end time.
    Fixed(Float),
    /// Error-controlled steps.
    Adaptive(StepSizeController),
}

/// Method defaults for the controller factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerDefaults {
    pub safety_factor: Float,
    pub min_reduction: Float,
    pub max_growth: Float,
    pub beta: Float,
    /// Weight of `beta` in the error exponent.
    pub beta_weight: Float,
}

/// Adaptive step size controller with Lund stabilisation.
///
/// The next step is `h · clamp(safety · err^(-e) · err_old^β, min_reduction,
/// max_growth)` where `e = 1/order - beta_weight·β`. After a rejection the
/// step may not grow.
#[derive(Clone, Debug)]
pub struct StepSizeController {
    safety_factor: Float,
    min_reduction: Float,
    max_growth: Float,
    beta: Float,
    exponent: Float,
    min_step: Float,
    max_step: Option<Float>,
    facold: Float,
}

impl StepSizeController {
    pub fn new(order: usize, defaults: ControllerDefaults, settings: &Settings) -> Self {
        let beta = settings.beta.unwrap_or(defaults.beta);
        Self {
            safety_factor: settings.safety_factor.unwrap_or(defaults.safety_factor),
            min_reduction: settings.min_reduction.unwrap_or(defaults.min_reduction),
            max_growth: settings.max_growth.unwrap_or(defaults.max_growth),
            beta,
            exponent: 1.0 / order as Float - defaults.beta_weight * beta,
            min_step: settings.min_step,
            max_step: settings.max_step,
            facold: 1.0e-4,
        }
    }

    /// Forget the error history; used when integration (re)starts.
    pub fn reset(&mut self) {
        self.facold = 1.0e-4;
    }

    pub fn min_step(&self) -> Float {
        self.min_step
    }

    pub fn max_step(&self, span: Float) -> Float {
        self.max_step.unwrap_or(span.abs()).abs()
    }

    /// Whether a step with scaled error norm `err` is accepted.
    pub fn accepts(&self, err: Float) -> bool {
        err <= 1.0
    }

    /// Next step after an accepted step with error norm `err <= 1`.
    pub fn accepted(&mut self, t: Float, h: Float, err: Float, after_reject: bool, span: Float) -> Float {
        let fac11 = err.powf(self.exponent);
        let fac = fac11 / self.facold.powf(self.beta);
        let fac = (fac / self.safety_factor).clamp(1.0 / self.max_growth, 1.0 / self.min_reduction);
        self.facold = err.max(1.0e-4);

        let mut hnew = h / fac;
        if after_reject {
            hnew = h.signum() * hnew.abs().min(h.abs());
        }
        self.filter(t, hnew, span)
    }

    /// Smaller step after a rejected step with error norm `err > 1`.
    pub fn rejected(&self, t: Float, h: Float, err: Float) -> Result<Float> {
        let fac11 = err.powf(self.exponent);
        // a NaN norm shrinks by the largest factor
        let shrink = (self.safety_factor / fac11).max(self.min_reduction).min(1.0);
        let hnew = h * shrink;
        if hnew.abs() < self.min_step {
            return Err(Error::StepSizeUnderflow {
                t,
                h: hnew,
                min_step: self.min_step,
            });
        }
        Ok(hnew)
    }

    /// Clamp a proposed step to the configured bounds.
    pub fn filter(&self, t: Float, h: Float, span: Float) -> Float {
        let max_step = self.max_step(span);
        let magnitude = h.abs();
        if magnitude > max_step {
            return h.signum() * max_step;
        }
        if magnitude < self.min_step {
            warn!("step {h} at t = {t} raised to the minimum step {}", self.min_step);
            return h.signum() * self.min_step;
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: ControllerDefaults = ControllerDefaults {
        safety_factor: 0.9,
        min_reduction: 0.2,
        max_growth: 10.0,
        beta: 0.0,
        beta_weight: 0.75,
    };

    fn controller(settings: &Settings) -> StepSizeController {
        StepSizeController::new(5, DEFAULTS, settings)
    }

    #[test]
    fn growth_and_reduction_are_bounded() {
        let mut c = controller(&Settings::default());
        assert_eq!(c.accepted(0.0, 0.1, 1e-30, false, 10.0), 0.1 * 10.0);
        let h = c.rejected(0.0, 0.1, 1e30).unwrap();
        assert!((h - 0.02).abs() < 1e-15);
    }

    #[test]
    fn nominal_proposal() {
        let mut c = controller(&Settings::default());
        let err: Float = 0.5;
        let expected = 0.1 * 0.9 * err.powf(-0.2);
        assert!((c.accepted(0.0, 0.1, err, false, 10.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn no_growth_right_after_rejection() {
        let mut c = controller(&Settings::default());
        assert_eq!(c.accepted(0.0, -0.1, 1e-6, true, 10.0), -0.1);
    }

    #[test]
    fn unit_error_is_accepted() {
        let c = controller(&Settings::default());
        assert!(c.accepts(0.0));
        assert!(c.accepts(1.0));
        assert!(!c.accepts(1.0 + Float::EPSILON));
        assert!(!c.accepts(Float::NAN));
        let h = c.rejected(0.0, 0.1, Float::NAN).unwrap();
        assert!((h - 0.02).abs() < 1e-15);
    }

    #[test]
    fn rejection_below_min_step_underflows() {
        let settings = Settings::builder().min_step(0.05).build();
        let c = controller(&settings);
        match c.rejected(1.0, 0.1, 1e10) {
            Err(Error::StepSizeUnderflow { t, min_step, .. }) => {
                assert_eq!(t, 1.0);
                assert_eq!(min_step, 0.05);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn proposals_respect_bounds() {
        let settings = Settings::builder().min_step(0.01).max_step(0.5).build();
        let c = controller(&settings);
        assert_eq!(c.filter(0.0, 2.0, 10.0), 0.5);
        assert_eq!(c.filter(0.0, -1e-5, 10.0), -0.01);
        assert_eq!(c.filter(0.0, 0.2, 10.0), 0.2);
    }
}
