//! Adams-Bashforth and Adams-Moulton integrators in Nordsieck form.
//!
//! The state carried between steps is the Nordsieck vector
//! `[y, h y', r_2 .. r_k]` at the current point. Changing the step only
//! rescales it, so steps adapt without re-deriving a history.

mod coefficients;
mod starter;

pub use coefficients::{AdamsCoefficients, MAX_ORDER};

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
        controller::{ControllerDefaults, StepSizeController},
        hinit::hinit,
        settings::Settings,
    },
    nordsieck::NordsieckTransformer,
};

/// Which member of the Adams family to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Explicit: the predicted state is the step result.
    Bashforth,
    /// Predict, evaluate, correct once, evaluate again (PECE).
    Moulton,
}

/// Adams integrator with `order` steps.
///
/// The first derivatives are supplied by a Dormand–Prince 8(5,3) start
/// phase, repeated after every event reset. Local error is estimated from
/// the difference between the predicted and corrected states.
///
/// ```
/// use ivp_engine::prelude::*;
///
/// struct Decay;
///
/// impl ODE for Decay {
///     fn dimension(&self) -> usize {
///         1
///     }
///
///     fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
///         dydt[0] = -y[0];
///         Ok(())
///     }
/// }
///
/// let settings = Settings::builder().rtol(1e-10).atol(1e-10).build();
/// let mut adams = Adams::moulton(4, settings)?;
/// let mut y = [0.0];
/// adams.integrate(&Decay, 0.0, &[1.0], 2.0, &mut y, &mut Handlers::new())?;
/// assert!((y[0] - (-2f64).exp()).abs() < 1e-7);
/// # Ok::<(), ivp_engine::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Adams {
    variant: Variant,
    order: usize,
    settings: Settings,
    coefficients: AdamsCoefficients,
    transformer: Option<NordsieckTransformer>,
    controller: StepSizeController,
}

impl Adams {
    pub fn new(variant: Variant, order: usize, settings: Settings) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(Error::InvalidOrder {
                order,
                max: MAX_ORDER,
            });
        }
        settings.validate()?;
        let coefficients = AdamsCoefficients::new(order)?;
        let transformer = if order > 1 {
            Some(NordsieckTransformer::new(0, 1, 1 - order as i32, 1)?)
        } else {
            None
        };
        let defaults = ControllerDefaults {
            safety_factor: 0.9,
            min_reduction: 0.2,
            max_growth: (2.0 as Float).powf(1.0 / order as Float),
            beta: 0.0,
            beta_weight: 0.0,
        };
        let controller = StepSizeController::new(order, defaults, &settings);
        Ok(Self {
            variant,
            order,
            settings,
            coefficients,
            transformer,
            controller,
        })
    }

    pub fn bashforth(order: usize, settings: Settings) -> Result<Self> {
        Self::new(Variant::Bashforth, order, settings)
    }

    pub fn moulton(order: usize, settings: Settings) -> Result<Self> {
        Self::new(Variant::Moulton, order, settings)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Number of steps, which is also the order of the method.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &AdamsCoefficients {
        &self.coefficients
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Nordsieck vector at `(t, y)`: the step size, `h y'` and the high
    /// order rows. `f` receives `y'(t)`.
    fn start<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        f: &mut [Float],
        direction: Float,
        t_end: Float,
    ) -> Result<(Float, Vec<Float>, Vec<Vec<Float>>)>
    where
        F: ODE + ?Sized,
    {
        ev.call(t, y, f)?;
        let span = t_end - t;
        let hmax = self.controller.max_step(span);
        let h = match self.settings.h0 {
            Some(h0) => h0.abs() * direction,
            None => hinit(ev, t, y, f, direction, self.order, hmax, &self.settings)?,
        };
        let mut h = self.controller.filter(t, h, span);
        if self.order > 1 {
            // keep the start phase inside the interval
            let cap = span.abs() / (self.order - 1) as Float;
            if h.abs() > cap {
                h = cap * direction;
            }
        }
        self.controller.reset();
        debug!("{} start phase at t = {t} with h = {h}", self.name());

        let scaled: Vec<Float> = f.iter().map(|fi| h * fi).collect();
        let rows = match &self.transformer {
            Some(transformer) => starter::high_order_rows(ev, transformer, &self.settings, t, y, &scaled, h)?,
            None => Vec::new(),
        };
        Ok((h, scaled, rows))
    }

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
        let mut steps = Steps::new();
        let mut t = t0;
        let mut reject = false;
        let mut f = vec![0.0; n];
        let mut y_pred = vec![0.0; n];
        let mut corrected = vec![0.0; n];
        let mut delta = vec![0.0; n];
        let mut predicted_scaled = vec![0.0; n];

        let mut interpolator = StepInterpolator::new(t0, y, direction > 0.0);
        events.initialize(&interpolator);

        let (mut h, mut scaled, mut rows) = self.start(ev, t, y, &mut f, direction, t_end)?;
        debug!("{} from t = {t0} to {t_end}, initial step {h}", self.name());

        let status = loop {
            if 0.1 * h.abs() <= t.abs() * self.settings.uround {
                return Err(Error::StepSizeUnderflow {
                    t,
                    h,
                    min_step: self.settings.min_step,
                });
            }

            let mut last = false;
            if (t + 1.01 * h - t_end) * direction > 0.0 {
                let h_end = t_end - t;
                rescale(&mut scaled, &mut rows, h_end / h);
                h = h_end;
                last = true;
            }
            steps.total += 1;

            // predict by Taylor expansion of the Nordsieck vector
            for i in 0..n {
                let high: Float = rows.iter().map(|row| row[i]).sum();
                y_pred[i] = y[i] + scaled[i] + high;
            }
            let t_new = if last { t_end } else { t + h };
            ev.call(t_new, &y_pred, &mut f)?;
            for i in 0..n {
                predicted_scaled[i] = h * f[i];
            }

            // update the high order rows and correct the state
            let mut rows_new = self.coefficients.advance(&rows, &scaled, &predicted_scaled);
            for i in 0..n {
                let mut high = 0.0;
                for (j, row) in rows_new.iter().enumerate() {
                    if j % 2 == 0 {
                        high -= row[i];
                    } else {
                        high += row[i];
                    }
                }
                corrected[i] = y[i] + predicted_scaled[i] + high;
                delta[i] = corrected[i] - y_pred[i];
            }
            let err = self.settings.error_norm(&delta, y, &corrected);

            if !self.controller.accepts(err) {
                steps.rejected += 1;
                let hnew = self.controller.rejected(t, h, err)?;
                trace!("rejected t = {t}, h = {h}, err = {err:.3e}");
                rescale(&mut scaled, &mut rows, hnew / h);
                h = hnew;
                reject = true;
                continue;
            }
            let hnew = self.controller.accepted(t, h, err, reject, span);
            reject = false;
            steps.accepted += 1;
            trace!("accepted t = {t}, h = {h}, err = {err:.3e}");

            let scaled_new = match self.variant {
                Variant::Bashforth => {
                    corrected.copy_from_slice(&y_pred);
                    predicted_scaled.clone()
                }
                Variant::Moulton => {
                    ev.call(t_new, &corrected, &mut f)?;
                    let corrected_scaled: Vec<Float> = f.iter().map(|fi| h * fi).collect();
                    self.coefficients
                        .correct(&mut rows_new, &predicted_scaled, &corrected_scaled);
                    corrected_scaled
                }
            };

            interpolator.shift();
            interpolator.store(t_new, &corrected);
            interpolator.set_dense(if dense {
                DenseModel::Nordsieck {
                    reference_time: t_new,
                    scaling_h: h,
                    reference_state: corrected.clone(),
                    scaled: scaled_new.clone(),
                    rows: rows_new.clone(),
                }
            } else {
                DenseModel::Linear
            });

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
                interpolator.reinitialize(t, y);
                (h, scaled, rows) = self.start(ev, t, y, &mut f, direction, t_end)?;
                continue;
            }
            if last {
                h = hnew;
                break Status::Success;
            }

            scaled = scaled_new;
            rows = rows_new;
            rescale(&mut scaled, &mut rows, hnew / h);
            h = hnew;
        };

        let result = steps.finish(t, h, ev.evaluations(), status);
        debug!(
            "{} finished at t = {} ({:?}): {} evaluations, {} accepted, {} rejected",
            self.name(),
            result.t,
            result.status,
            result.nfev,
            result.naccpt,
            result.nrejct
        );
        Ok(result)
    }
}

/// Rescale a Nordsieck vector for a step multiplied by `ratio`.
fn rescale(scaled: &mut [Float], rows: &mut [Vec<Float>], ratio: Float) {
    for s in scaled.iter_mut() {
        *s *= ratio;
    }
    let mut power = ratio;
    for row in rows.iter_mut() {
        power *= ratio;
        for r in row.iter_mut() {
            *r *= power;
        }
    }
}

impl Integrator for Adams {
    fn name(&self) -> &'static str {
        match self.variant {
            Variant::Bashforth => "Adams-Bashforth",
            Variant::Moulton => "Adams-Moulton",
        }
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
