//! Explicit Runge-Kutta integrators: one step driver shared by every
//! formula, with fixed or adaptive step control.

mod dop853;
mod dopri5;
mod rk4;

pub use dop853::Dop853;
pub use dopri5::Dopri5;
pub use rk4::Rk4;

use std::marker::PhantomData;

use log::{debug, trace};

use crate::{
    Float,
    core::{
        integrator::{Handlers, Integrator, check_interval, interval_exhausted},
        interpolate::{DenseModel, StepInterpolator},
        ode::{Evaluator, ODE},
        solout::SolOut,
        solution::{IntegrationResult, Steps},
        status::Status,
    },
    error::{Error, Result},
    events::EventManager,
    methods::{
        controller::{ControllerDefaults, StepControl, StepSizeController},
        hinit::hinit,
        settings::Settings,
    },
};

/// Dormand–Prince 5(4) with adaptive steps.
pub type DormandPrince54 = RungeKutta<Dopri5>;
/// Dormand–Prince 8(5,3) with adaptive steps.
pub type DormandPrince853 = RungeKutta<Dop853>;
/// Classical fourth order Runge-Kutta with fixed steps.
pub type ClassicalRungeKutta = RungeKutta<Rk4>;

/// Butcher tableau plus the per-step bookkeeping of one explicit formula.
///
/// Implementors own their stage buffers so a step attempt never allocates.
pub trait RungeKuttaFormula {
    const NAME: &'static str;
    /// Order used in the step size exponent.
    const ORDER: usize;
    /// Whether an embedded error estimate is available.
    const EMBEDDED: bool;
    const DEFAULTS: ControllerDefaults;

    /// Workspace for a system of dimension `n`.
    fn new(n: usize) -> Self;

    /// Trial step of size `h` from `(t, y)` with `f0 = f(t, y)`. Writes the
    /// candidate into `y1` and returns the scaled error norm (zero for
    /// formulas without an estimate).
    fn attempt<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        f0: &[Float],
        h: Float,
        y1: &mut [Float],
        settings: &Settings,
    ) -> Result<Float>
    where
        F: ODE + ?Sized;

    /// Finish an accepted step: write `f(t + h, y1)` into `f1` and, when
    /// `cont` is given, build the dense output model reusing that buffer.
    fn complete<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        f0: &[Float],
        h: Float,
        y1: &[Float],
        f1: &mut [Float],
        cont: Option<Vec<Float>>,
    ) -> Result<DenseModel>
    where
        F: ODE + ?Sized;
}

/// Explicit Runge-Kutta integrator for formula `M`.
///
/// ```
/// use ivp_engine::prelude::*;
///
/// struct Oscillator;
///
/// impl ODE for Oscillator {
///     fn dimension(&self) -> usize {
///         2
///     }
///
///     fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
///         dydt[0] = y[1];
///         dydt[1] = -y[0];
///         Ok(())
///     }
/// }
///
/// let mut rk4 = ClassicalRungeKutta::fixed(0.01, Settings::default())?;
/// let mut y = [0.0; 2];
/// rk4.integrate(&Oscillator, 0.0, &[1.0, 0.0], 1.0, &mut y, &mut Handlers::new())?;
/// assert!((y[0] - 1f64.cos()).abs() < 1e-9);
/// # Ok::<(), ivp_engine::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct RungeKutta<M> {
    settings: Settings,
    control: StepControl,
    formula: PhantomData<M>,
}

impl<M: RungeKuttaFormula> RungeKutta<M> {
    /// Adaptive integrator. Fails for formulas without an error estimate.
    pub fn new(settings: Settings) -> Result<Self> {
        if !M::EMBEDDED {
            return Err(Error::MissingErrorEstimator { method: M::NAME });
        }
        settings.validate()?;
        let controller = StepSizeController::new(M::ORDER, M::DEFAULTS, &settings);
        Ok(Self {
            settings,
            control: StepControl::Adaptive(controller),
            formula: PhantomData,
        })
    }

    /// Fixed step integrator; the sign of `h` is taken from the interval.
    pub fn fixed(h: Float, settings: Settings) -> Result<Self> {
        if !h.is_finite() || h == 0.0 {
            return Err(Error::InvalidStepSize(h));
        }
        settings.validate()?;
        Ok(Self {
            settings,
            control: StepControl::Fixed(h.abs()),
            formula: PhantomData,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Step size used at `(t, y)` after a start or restart.
    fn initial_step<F>(
        &self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        f0: &[Float],
        direction: Float,
        span: Float,
    ) -> Result<Float>
    where
        F: ODE + ?Sized,
    {
        match &self.control {
            StepControl::Fixed(h) => Ok(h * direction),
            StepControl::Adaptive(controller) => {
                let hmax = controller.max_step(span);
                let h = match self.settings.h0 {
                    Some(h0) => h0.abs() * direction,
                    None => hinit(ev, t, y, f0, direction, M::ORDER, hmax, &self.settings)?,
                };
                Ok(controller.filter(t, h, span))
            }
        }
    }

    /// Integration loop on an already prepared run. `y` holds the initial
    /// state on entry and the reached state on exit.
    pub(crate) fn run<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t0: Float,
        t_end: Float,
        y: &mut [Float],
        solouts: &mut [&mut dyn SolOut],
        events: &mut EventManager<'_>,
        dense: bool,
    ) -> Result<IntegrationResult>
    where
        F: ODE + ?Sized,
    {
        let n = y.len();
        let span = t_end - t0;
        let direction = span.signum();
        let mut formula = M::new(n);
        let mut f0 = vec![0.0; n];
        let mut f1 = vec![0.0; n];
        let mut y1 = vec![0.0; n];
        let mut steps = Steps::new();
        let mut t = t0;
        let mut reject = false;

        let mut interpolator = StepInterpolator::new(t0, y, direction > 0.0);
        events.initialize(&interpolator);

        ev.call(t, y, &mut f0)?;
        let mut h = self.initial_step(ev, t, y, &f0, direction, span)?;
        if let StepControl::Adaptive(controller) = &mut self.control {
            controller.reset();
        }
        debug!("{} from t = {t0} to {t_end}, initial step {h}", M::NAME);

        let status = loop {
            // Check for underflow due to machine rounding
            if 0.1 * h.abs() <= t.abs() * self.settings.uround {
                return Err(Error::StepSizeUnderflow {
                    t,
                    h,
                    min_step: self.settings.min_step,
                });
            }

            // Adjust last step to land on t_end
            let mut last = false;
            if (t + 1.01 * h - t_end) * direction > 0.0 {
                h = t_end - t;
                last = true;
            }

            steps.total += 1;
            let err = formula.attempt(ev, t, y, &f0, h, &mut y1, &self.settings)?;

            let hnew = match &mut self.control {
                StepControl::Fixed(fixed) => *fixed * direction,
                StepControl::Adaptive(controller) => {
                    if !controller.accepts(err) {
                        steps.rejected += 1;
                        let hnew = controller.rejected(t, h, err)?;
                        trace!("rejected t = {t}, h = {h}, err = {err:.3e}");
                        h = hnew;
                        reject = true;
                        continue;
                    }
                    controller.accepted(t, h, err, reject, span)
                }
            };
            reject = false;
            steps.accepted += 1;
            trace!("accepted t = {t}, h = {h}, err = {err:.3e}");

            let cont = dense.then(|| interpolator.recycle());
            let model = formula.complete(ev, t, y, &f0, h, &y1, &mut f1, cont)?;
            let t_new = if last { t_end } else { t + h };
            interpolator.shift();
            interpolator.store(t_new, &y1);
            interpolator.set_dense(model);

            let accepted = events.accept_step(&mut interpolator, solouts, y, last)?;
            t = accepted.t;
            if accepted.stopped {
                h = hnew;
                break Status::Stopped;
            }
            if accepted.interrupted {
                h = hnew;
                break Status::Interrupted;
            }
            if accepted.reset {
                if interval_exhausted(t, t_end) {
                    h = hnew;
                    break Status::Success;
                }
                ev.call(t, y, &mut f0)?;
                interpolator.reinitialize(t, y);
                h = self.initial_step(ev, t, y, &f0, direction, t_end - t)?;
                if let StepControl::Adaptive(controller) = &mut self.control {
                    controller.reset();
                }
                continue;
            }
            if last {
                h = hnew;
                break Status::Success;
            }

            f0.copy_from_slice(&f1);
            h = hnew;
        };

        let result = steps.finish(t, h, ev.evaluations(), status);
        debug!(
            "{} finished at t = {} ({:?}): {} evaluations, {} accepted, {} rejected",
            M::NAME,
            result.t,
            result.status,
            result.nfev,
            result.naccpt,
            result.nrejct
        );
        Ok(result)
    }
}

impl<M: RungeKuttaFormula> Integrator for RungeKutta<M> {
    fn name(&self) -> &'static str {
        M::NAME
    }

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
        F: ODE + ?Sized,
    {
        check_interval(t0, t_end)?;
        let mut ev = Evaluator::new(f, self.settings.max_evaluations);
        let n = ev.check_dimension(y0, y)?;
        self.settings.check_tolerances(n)?;
        y.copy_from_slice(y0);

        let dense = handlers.requires_dense_output();
        let (solouts, mut events) = handlers.prepare()?;
        self.run(&mut ev, t0, t_end, y, solouts, &mut events, dense)
    }
}
