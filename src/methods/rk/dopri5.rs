//! DOPRI5 - Dormand–Prince 5(4) explicit Runge–Kutta formula
//!
//! Reference
//! - E. Hairer, S. P. Nørsett, and G. Wanner, "Solving Ordinary Differential
//!   Equations I. Nonstiff Problems", 2nd ed., Springer (1993).

use super::RungeKuttaFormula;
use crate::{
    Float,
    core::{
        interpolate::DenseModel,
        ode::{Evaluator, ODE},
    },
    error::Result,
    methods::{controller::ControllerDefaults, settings::Settings},
};

/// Dormand–Prince 5(4): seven stages, first same as last, fifth order
/// solution with fourth order error estimate and a fourth order continuous
/// extension.
#[derive(Clone, Debug)]
pub struct Dopri5 {
    k2: Vec<Float>,
    k3: Vec<Float>,
    k4: Vec<Float>,
    k5: Vec<Float>,
    k6: Vec<Float>,
    k7: Vec<Float>,
    stage: Vec<Float>,
}

impl RungeKuttaFormula for Dopri5 {
    const NAME: &'static str = "DOPRI5";
    const ORDER: usize = 5;
    const EMBEDDED: bool = true;
    const DEFAULTS: ControllerDefaults = ControllerDefaults {
        safety_factor: 0.9,
        min_reduction: 0.2,
        max_growth: 10.0,
        beta: 0.04,
        beta_weight: 0.75,
    };

    fn new(n: usize) -> Self {
        Self {
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            k5: vec![0.0; n],
            k6: vec![0.0; n],
            k7: vec![0.0; n],
            stage: vec![0.0; n],
        }
    }

    fn attempt<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        k1: &[Float],
        h: Float,
        y1: &mut [Float],
        settings: &Settings,
    ) -> Result<Float>
    where
        F: ODE + ?Sized,
    {
        let n = y.len();
        let Self {
            k2,
            k3,
            k4,
            k5,
            k6,
            k7,
            stage,
        } = self;

        // Stage 2
        for i in 0..n {
            stage[i] = y[i] + h * A21 * k1[i];
        }
        ev.call(t + C2 * h, stage, k2)?;

        // Stage 3
        for i in 0..n {
            stage[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        ev.call(t + C3 * h, stage, k3)?;

        // Stage 4
        for i in 0..n {
            stage[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        ev.call(t + C4 * h, stage, k4)?;

        // Stage 5
        for i in 0..n {
            stage[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        ev.call(t + C5 * h, stage, k5)?;

        // Stage 6
        for i in 0..n {
            stage[i] =
                y[i] + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        let tph = t + h;
        ev.call(tph, stage, k6)?;

        // Final stage, evaluated at the solution itself
        for i in 0..n {
            y1[i] =
                y[i] + h * (A71 * k1[i] + A73 * k3[i] + A74 * k4[i] + A75 * k5[i] + A76 * k6[i]);
        }
        ev.call(tph, y1, k7)?;

        // Error estimation
        for i in 0..n {
            stage[i] =
                (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]) * h;
        }
        Ok(settings.error_norm(stage, y, y1))
    }

    fn complete<F>(
        &mut self,
        _ev: &mut Evaluator<'_, F>,
        t: Float,
        y: &[Float],
        k1: &[Float],
        h: Float,
        y1: &[Float],
        f1: &mut [Float],
        cont: Option<Vec<Float>>,
    ) -> Result<DenseModel>
    where
        F: ODE + ?Sized,
    {
        // first same as last
        f1.copy_from_slice(&self.k7);

        let Some(mut cont) = cont else {
            return Ok(DenseModel::Linear);
        };
        let n = y.len();
        cont.resize(5 * n, 0.0);
        let Self {
            k3, k4, k5, k6, k7, ..
        } = self;
        for i in 0..n {
            let ydiff = y1[i] - y[i];
            let bspl = h * k1[i] - ydiff;
            cont[i] = y[i];
            cont[n + i] = ydiff;
            cont[2 * n + i] = bspl;
            cont[3 * n + i] = -h * k7[i] + ydiff - bspl;
            cont[4 * n + i] =
                h * (D1 * k1[i] + D3 * k3[i] + D4 * k4[i] + D5 * k5[i] + D6 * k6[i] + D7 * k7[i]);
        }
        Ok(DenseModel::DormandPrince {
            t_start: t,
            h,
            rows: 5,
            cont,
        })
    }
}

// DOPRI5 Butcher tableau coefficients
const C2: Float = 0.2;
const C3: Float = 0.3;
const C4: Float = 0.8;
const C5: Float = 8.0 / 9.0;

const A21: Float = 0.2;
const A31: Float = 3.0 / 40.0;
const A32: Float = 9.0 / 40.0;
const A41: Float = 44.0 / 45.0;
const A42: Float = -56.0 / 15.0;
const A43: Float = 32.0 / 9.0;
const A51: Float = 19372.0 / 6561.0;
const A52: Float = -25360.0 / 2187.0;
const A53: Float = 64448.0 / 6561.0;
const A54: Float = -212.0 / 729.0;
const A61: Float = 9017.0 / 3168.0;
const A62: Float = -355.0 / 33.0;
const A63: Float = 46732.0 / 5247.0;
const A64: Float = 49.0 / 176.0;
const A65: Float = -5103.0 / 18656.0;
const A71: Float = 35.0 / 384.0;
const A73: Float = 500.0 / 1113.0;
const A74: Float = 125.0 / 192.0;
const A75: Float = -2187.0 / 6784.0;
const A76: Float = 11.0 / 84.0;

const E1: Float = 71.0 / 57600.0;
const E3: Float = -71.0 / 16695.0;
const E4: Float = 71.0 / 1920.0;
const E5: Float = -17253.0 / 339200.0;
const E6: Float = 22.0 / 525.0;
const E7: Float = -1.0 / 40.0;

const D1: Float = -12715105075.0 / 11282082432.0;
const D3: Float = 87487479700.0 / 32700410799.0;
const D4: Float = -10690763975.0 / 1880347072.0;
const D5: Float = 701980252875.0 / 199316789632.0;
const D6: Float = -1453857185.0 / 822651844.0;
const D7: Float = 69997945.0 / 29380423.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::interpolate::{Interpolate, StepInterpolator},
        error::ModelError,
    };
    use approx::assert_relative_eq;

    struct Exp;

    impl ODE for Exp {
        fn dimension(&self) -> usize {
            1
        }

        fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError> {
            dydt[0] = y[0];
            Ok(())
        }
    }

    #[test]
    fn one_step_is_fifth_order_with_dense_output() {
        let settings = Settings::default();
        let mut ev = Evaluator::new(&Exp, usize::MAX);
        let mut formula = Dopri5::new(1);
        let h: Float = 0.1;
        let mut y1 = [0.0];
        let mut f1 = [0.0];
        let err = formula.attempt(&mut ev, 0.0, &[1.0], &[1.0], h, &mut y1, &settings).unwrap();
        assert_relative_eq!(y1[0], h.exp(), max_relative = 1e-8);
        assert!(err > 0.0 && err < 1.0);
        assert_eq!(ev.evaluations(), 6);

        let model = formula
            .complete(&mut ev, 0.0, &[1.0], &[1.0], h, &y1, &mut f1, Some(Vec::new()))
            .unwrap();
        assert_eq!(ev.evaluations(), 6);
        assert_eq!(f1[0], formula.k7[0]);

        let mut interp = StepInterpolator::new(0.0, &[1.0], true);
        interp.store(h, &y1);
        interp.set_dense(model);
        let mut y = [0.0];
        interp.interpolate(0.05, &mut y);
        assert_relative_eq!(y[0], 0.05f64.exp(), max_relative = 1e-6);
    }
}
