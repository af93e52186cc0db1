//! User-supplied ODE system.

use crate::{
    Float,
    error::{Error, ModelError, Result},
};

/// User-supplied ODE system.
///
/// Implement this trait for your problem to provide the right-hand side
/// function y' = f(t, y). The integrator repeatedly calls `ode` with the
/// current time `t` and state `y` and expects you to fill `dydt` with the
/// derivative values. Any error returned is handed back to the caller of
/// `integrate` unchanged.
///
/// # Example
///
/// ```
/// use ivp_engine::prelude::*;
///
/// struct VanDerPol {
///     eps: f64,
/// }
///
/// impl ODE for VanDerPol {
///     fn dimension(&self) -> usize {
///         2
///     }
///
///     fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
///         dydt[0] = y[1];
///         dydt[1] = ((1.0 - y[0] * y[0]) * y[1] - y[0]) / self.eps;
///         Ok(())
///     }
/// }
/// ```
pub trait ODE {
    /// Number of state components.
    fn dimension(&self) -> usize;

    /// Evaluate the derivative at `(t, y)` into `dydt`.
    fn ode(&self, t: Float, y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError>;
}

/// Counts model evaluations and enforces the evaluation budget.
///
/// The budget is checked before every call, so a run that needs exactly
/// `max_evaluations` calls succeeds.
pub(crate) struct Evaluator<'a, F: ?Sized> {
    f: &'a F,
    evaluations: usize,
    max_evaluations: usize,
}

impl<'a, F> Evaluator<'a, F>
where
    F: ODE + ?Sized,
{
    pub(crate) fn new(f: &'a F, max_evaluations: usize) -> Self {
        Self {
            f,
            evaluations: 0,
            max_evaluations,
        }
    }

    /// Check the state lengths against the model dimension.
    pub(crate) fn check_dimension(&self, y0: &[Float], y: &[Float]) -> Result<usize> {
        let expected = self.f.dimension();
        for found in [y0.len(), y.len()] {
            if found != expected {
                return Err(Error::DimensionMismatch { expected, found });
            }
        }
        Ok(expected)
    }

    pub(crate) fn call(&mut self, t: Float, y: &[Float], dydt: &mut [Float]) -> Result<()> {
        if self.evaluations >= self.max_evaluations {
            return Err(Error::MaxEvaluationsExceeded {
                max: self.max_evaluations,
            });
        }
        self.evaluations += 1;
        self.f.ode(t, y, dydt)?;
        Ok(())
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Linear;

    impl ODE for Linear {
        fn dimension(&self) -> usize {
            1
        }

        fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError> {
            if y[0] < 0.0 {
                return Err(ModelError::new("negative state"));
            }
            dydt[0] = y[0];
            Ok(())
        }
    }

    #[test]
    fn budget_is_checked_before_each_call() {
        let mut ev = Evaluator::new(&Linear, 2);
        let mut dy = [0.0];
        ev.call(0.0, &[1.0], &mut dy).unwrap();
        ev.call(0.0, &[1.0], &mut dy).unwrap();
        assert!(matches!(
            ev.call(0.0, &[1.0], &mut dy),
            Err(Error::MaxEvaluationsExceeded { max: 2 })
        ));
        assert_eq!(ev.evaluations(), 2);
    }

    #[test]
    fn model_errors_pass_through() {
        let mut ev = Evaluator::new(&Linear, usize::MAX);
        let mut dy = [0.0];
        let err = ev.call(0.0, &[-1.0], &mut dy).unwrap_err();
        assert_eq!(err.to_string(), "negative state");
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let ev = Evaluator::new(&Linear, usize::MAX);
        assert!(matches!(
            ev.check_dimension(&[1.0, 2.0], &[0.0]),
            Err(Error::DimensionMismatch { expected: 1, found: 2 })
        ));
    }
}
