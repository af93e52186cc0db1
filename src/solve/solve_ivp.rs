//! SciPy-like solve_ivp entry point implementation

use crate::{
    Float,
    core::{
        integrator::{Handlers, Integrator},
        ode::ODE,
    },
    error::Result,
    methods::{
        adams::Adams,
        rk::{ClassicalRungeKutta, DormandPrince54, DormandPrince853},
        settings::Settings,
    },
};

use super::{
    cont::ContinuousOutput,
    options::{IVPOptions, Method},
    solout::DefaultSolOut,
    solution::IVPSolution,
};

/// Solve an initial value problem with SciPy-like options.
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
/// let options = IVPOptions::builder()
///     .method(Method::DOP853)
///     .rtol(1e-10)
///     .atol(1e-12)
///     .t_eval(vec![0.0, 1.0, 2.0])
///     .dense_output(true)
///     .build();
/// let sol = solve_ivp(&Oscillator, 0.0, 2.0, &[1.0, 0.0], options)?;
/// assert_eq!(sol.t, vec![0.0, 1.0, 2.0]);
/// assert!((sol.y[1][0] - 1f64.cos()).abs() < 1e-9);
/// assert!(sol.sol(0.5).is_some());
/// # Ok::<(), ivp_engine::Error>(())
/// ```
pub fn solve_ivp<F>(f: &F, t0: Float, t_end: Float, y0: &[Float], options: IVPOptions<'_>) -> Result<IVPSolution>
where
    F: ODE + ?Sized,
{
    // Build Settings (rtol/atol are passed to methods)
    let settings = Settings::builder()
        .rtol(options.rtol)
        .atol(options.atol)
        .min_step(options.min_step.unwrap_or(0.0))
        .maybe_max_step(options.max_step)
        .maybe_h0(options.first_step)
        .maybe_max_evaluations(options.max_evaluations)
        .build();

    let mut default_solout = DefaultSolOut::new(options.t_eval, options.save_step_endpoints);
    let mut continuous = options.dense_output.then(ContinuousOutput::new);
    let mut y = vec![0.0; y0.len()];

    let result = {
        let mut handlers = Handlers::new().with_solout(&mut default_solout);
        if let Some(continuous) = continuous.as_mut() {
            handlers.add_solout(continuous);
        }
        if let Some(user) = options.solout {
            handlers.add_solout(user);
        }
        for (event, config) in options.events {
            handlers.add_event(event, config);
        }

        // Dispatch by method
        match options.method {
            Method::DOPRI5 => DormandPrince54::new(settings)?.integrate(f, t0, y0, t_end, &mut y, &mut handlers)?,
            Method::DOP853 => DormandPrince853::new(settings)?.integrate(f, t0, y0, t_end, &mut y, &mut handlers)?,
            Method::RK4 => {
                let h = options.first_step.unwrap_or((t_end - t0) / 100.0);
                ClassicalRungeKutta::fixed(h, settings)?.integrate(f, t0, y0, t_end, &mut y, &mut handlers)?
            }
            Method::AdamsBashforth(order) => {
                Adams::bashforth(order, settings)?.integrate(f, t0, y0, t_end, &mut y, &mut handlers)?
            }
            Method::AdamsMoulton(order) => {
                Adams::moulton(order, settings)?.integrate(f, t0, y0, t_end, &mut y, &mut handlers)?
            }
        }
    };

    let (t, y) = default_solout.into_data();
    Ok(IVPSolution {
        t,
        y,
        t_final: result.t,
        nfev: result.nfev,
        nstep: result.nstep,
        naccpt: result.naccpt,
        nrejct: result.nrejct,
        status: result.status,
        dense_output: continuous,
    })
}
