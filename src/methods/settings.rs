//! Settings for numerical integrators

use bon::Builder;

use crate::{
    Float,
    core::tolerance::Tolerance,
    error::{Error, Result},
};

/// Settings shared by every integrator.
///
/// Step-control factors left as `None` take the method's own defaults.
///
/// ```
/// use ivp_engine::prelude::*;
///
/// let settings = Settings::builder()
///     .rtol(1e-9)
///     .atol([1e-12, 1e-10])
///     .max_step(0.5)
///     .max_evaluations(100_000)
///     .build();
/// assert_eq!(settings.min_step, 0.0);
/// ```
#[derive(Builder, Clone, Debug)]
pub struct Settings {
    /// Relative tolerance, scalar or per component.
    #[builder(default = Tolerance::Scalar(1e-6), into)]
    pub rtol: Tolerance,
    /// Absolute tolerance, scalar or per component.
    #[builder(default = Tolerance::Scalar(1e-6), into)]
    pub atol: Tolerance,
    /// Smallest step the controller may use. A step that has to shrink below
    /// it is a step-size underflow.
    #[builder(default = 0.0)]
    pub min_step: Float,
    /// Largest step. Default: the length of the integration interval.
    pub max_step: Option<Float>,
    /// Initial step size. None will result in an initial guess
    /// provided by the [`crate::methods::hinit::hinit`] heuristic.
    pub h0: Option<Float>,
    /// Safety factor in step-size prediction.
    pub safety_factor: Option<Float>,
    /// Smallest allowed ratio `h_new / h`.
    pub min_reduction: Option<Float>,
    /// Largest allowed ratio `h_new / h`.
    pub max_growth: Option<Float>,
    /// Beta factor for stabilized step size control. Positive values of Beta
    /// ( <= 0.04 ) make the step size control more stable. Negative values
    /// are not accepted.
    pub beta: Option<Float>,
    /// Budget of model evaluations for one run, starter included.
    #[builder(default = usize::MAX)]
    pub max_evaluations: usize,
    /// The rounding unit, typically machine epsilon.
    #[builder(default = 2.3e-16)]
    pub uround: Float,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Settings {
    /// Reject inconsistent settings before any integration runs.
    pub(crate) fn validate(&self) -> Result<()> {
        let (rtol_min, rtol_max) = self.rtol.bounds();
        let (atol_min, atol_max) = self.atol.bounds();
        let finite = rtol_max.is_finite() && atol_max.is_finite();
        if !finite || rtol_min < 0.0 || atol_min < 0.0 || (rtol_max == 0.0 && atol_max == 0.0) {
            return Err(Error::InvalidTolerance {
                rtol: rtol_min,
                atol: atol_min,
            });
        }

        let max_step = self.max_step.unwrap_or(Float::INFINITY);
        if !(self.min_step >= 0.0) || !(max_step > 0.0) || self.min_step > max_step {
            return Err(Error::InvalidStepBounds {
                min_step: self.min_step,
                max_step,
            });
        }

        if let Some(h0) = self.h0 {
            if !h0.is_finite() || h0 == 0.0 {
                return Err(Error::InvalidStepSize(h0));
            }
        }
        if let Some(safety) = self.safety_factor {
            if !(safety > 1e-4 && safety < 1.0) {
                return Err(Error::InvalidSetting {
                    reason: "safety factor must lie in (1e-4, 1)",
                });
            }
        }
        if let Some(reduction) = self.min_reduction {
            if !(reduction > 0.0 && reduction <= 1.0) {
                return Err(Error::InvalidSetting {
                    reason: "minimum reduction must lie in (0, 1]",
                });
            }
        }
        if let Some(growth) = self.max_growth {
            if !(growth >= 1.0) {
                return Err(Error::InvalidSetting {
                    reason: "maximum growth must be at least 1",
                });
            }
        }
        if let Some(beta) = self.beta {
            if !(0.0..=0.2).contains(&beta) {
                return Err(Error::InvalidSetting {
                    reason: "beta must lie in [0, 0.2]",
                });
            }
        }
        if self.max_evaluations == 0 {
            return Err(Error::InvalidSetting {
                reason: "evaluation budget must be positive",
            });
        }
        if !(self.uround > 1e-35 && self.uround < 1.0) {
            return Err(Error::InvalidSetting {
                reason: "rounding unit must lie in (1e-35, 1)",
            });
        }
        Ok(())
    }

    /// Check per-component tolerances against the state dimension.
    pub(crate) fn check_tolerances(&self, n: usize) -> Result<()> {
        for tol in [&self.rtol, &self.atol] {
            if !tol.fits(n) {
                let found = match tol {
                    Tolerance::Vector(v) => v.len(),
                    Tolerance::Scalar(_) => n,
                };
                return Err(Error::DimensionMismatch { expected: n, found });
            }
        }
        Ok(())
    }

    /// Weighted RMS norm of `delta` scaled by `atol + rtol·max(|a|, |b|)`.
    pub(crate) fn error_norm(&self, delta: &[Float], a: &[Float], b: &[Float]) -> Float {
        let n = delta.len();
        let mut sum = 0.0;
        for i in 0..n {
            let sk = self.atol[i] + self.rtol[i] * a[i].abs().max(b[i].abs());
            sum += (delta[i] / sk) * (delta[i] / sk);
        }
        (sum / n as Float).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_tolerances() {
        let s = Settings::builder().rtol(0.0).atol(0.0).build();
        assert!(matches!(s.validate(), Err(Error::InvalidTolerance { .. })));
        let s = Settings::builder().atol([1e-6, -1.0]).build();
        assert!(matches!(s.validate(), Err(Error::InvalidTolerance { .. })));
    }

    #[test]
    fn rejects_bad_bounds_and_factors() {
        let s = Settings::builder().min_step(1.0).max_step(0.5).build();
        assert!(matches!(s.validate(), Err(Error::InvalidStepBounds { .. })));
        let s = Settings::builder().h0(0.0).build();
        assert!(matches!(s.validate(), Err(Error::InvalidStepSize(_))));
        let s = Settings::builder().safety_factor(1.5).build();
        assert!(matches!(s.validate(), Err(Error::InvalidSetting { .. })));
        let s = Settings::builder().max_evaluations(0).build();
        assert!(matches!(s.validate(), Err(Error::InvalidSetting { .. })));
    }

    #[test]
    fn tolerance_length_must_match() {
        let s = Settings::builder().atol([1e-6, 1e-6, 1e-6]).build();
        assert!(s.check_tolerances(3).is_ok());
        assert!(matches!(
            s.check_tolerances(2),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn error_norm_is_weighted_rms() {
        let s = Settings::builder().rtol(0.0).atol(0.5).build();
        let norm = s.error_norm(&[0.5, 0.5], &[1.0, 1.0], &[1.0, 1.0]);
        assert_eq!(norm, 1.0);
    }
}
