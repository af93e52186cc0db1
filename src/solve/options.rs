//! Options and method selection for solve_ivp

use bon::Builder;

use crate::{
    Float,
    core::{solout::SolOut, tolerance::Tolerance},
    events::{EventConfig, EventHandler},
};

use i_v_p_options_builder::{IsUnset, SetSaveStepEndpoints, SetTEval, State};

/// Solver method selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Dormand–Prince 5(4) adaptive RK
    DOPRI5,
    /// Dormand–Prince 8(5,3) high-order adaptive RK
    DOP853,
    /// Classic fixed-step RK4
    RK4,
    /// Adams-Bashforth with the given number of steps (1..=8)
    AdamsBashforth(usize),
    /// Adams-Moulton with the given number of steps (1..=8)
    AdamsMoulton(usize),
}

#[derive(Builder)]
/// Options for solve_ivp similar to SciPy
pub struct IVPOptions<'a> {
    /// Method to use. Default: DOPRI5 (Dormand–Prince 5(4)).
    #[builder(default = Method::DOPRI5)]
    pub method: Method,
    /// Relative tolerance for error estimation.
    #[builder(default = Tolerance::Scalar(1e-6), into)]
    pub rtol: Tolerance,
    /// Absolute tolerance for error estimation.
    #[builder(default = Tolerance::Scalar(1e-6), into)]
    pub atol: Tolerance,
    /// Budget of model evaluations.
    pub max_evaluations: Option<usize>,
    /// Points where the solution is requested, ordered in integration
    /// direction. Sampling uses dense output and replaces step endpoint
    /// recording ([`save_step_endpoints`](Self::save_step_endpoints) is set
    /// to false and cannot be combined with it).
    #[builder(setters(vis = "", name = t_eval_internal))]
    pub t_eval: Option<Vec<Float>>,
    /// Optional user callback invoked after each accepted step, after the
    /// internal sampling.
    pub solout: Option<&'a mut dyn SolOut>,
    /// Events watched during integration, in declaration order.
    #[builder(default)]
    pub events: Vec<(&'a mut dyn EventHandler, EventConfig)>,
    /// Initial step suggestion (maps to `settings.h0`); the fixed step for RK4.
    pub first_step: Option<Float>,
    /// Maximum step size (maps to `settings.max_step`).
    pub max_step: Option<Float>,
    /// Minimum step size constraint (maps to `settings.min_step`).
    pub min_step: Option<Float>,
    /// Save step endpoints (initial point and each accepted step). Default: true.
    #[builder(default = true)]
    pub save_step_endpoints: bool,
    /// Keep the continuous output of the whole run, see
    /// [`IVPSolution::sol`](super::IVPSolution::sol). Default: false.
    #[builder(default = false)]
    pub dense_output: bool,
}

impl<'a, STATE: State> IVPOptionsBuilder<'a, STATE> {
    pub fn t_eval(self, t_eval: Vec<Float>) -> IVPOptionsBuilder<'a, SetTEval<SetSaveStepEndpoints<STATE>>>
    where
        STATE::TEval: IsUnset,
        STATE::SaveStepEndpoints: IsUnset,
    {
        self.save_step_endpoints(false).t_eval_internal(t_eval)
    }
}
