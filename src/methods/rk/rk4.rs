//! Classic explicit Runge-Kutta 4 (RK4) formula.

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

/// Classical explicit Runge-Kutta 4 formula.
/// Provides a dense output via cubic Hermite interpolation.
///
/// There is no embedded error estimate, so only fixed steps are possible.
#[derive(Clone, Debug)]
pub struct Rk4 {
    k2: Vec<Float>,
    k3: Vec<Float>,
    k4: Vec<Float>,
    stage: Vec<Float>,
}

impl RungeKuttaFormula for Rk4 {
    const NAME: &'static str = "RK4";
    const ORDER: usize = 4;
    const EMBEDDED: bool = false;
    const DEFAULTS: ControllerDefaults = ControllerDefaults {
        safety_factor: 0.9,
        min_reduction: 0.2,
        max_growth: 10.0,
        beta: 0.0,
        beta_weight: 0.0,
    };

    fn new(n: usize) -> Self {
        Self {
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
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
        _settings: &Settings,
    ) -> Result<Float>
    where
        F: ODE + ?Sized,
    {
        let n = y.len();
        let Self { k2, k3, k4, stage } = self;

        for i in 0..n {
            stage[i] = y[i] + h * A21 * k1[i];
        }
        ev.call(t + C2 * h, stage, k2)?;

        for i in 0..n {
            stage[i] = y[i] + h * A32 * k2[i];
        }
        ev.call(t + C3 * h, stage, k3)?;

        for i in 0..n {
            stage[i] = y[i] + h * A43 * k3[i];
        }
        ev.call(t + C4 * h, stage, k4)?;

        for i in 0..n {
            y1[i] = y[i] + h * (B1 * k1[i] + B2 * k2[i] + B3 * k3[i] + B4 * k4[i]);
        }
        Ok(0.0)
    }

    fn complete<F>(
        &mut self,
        ev: &mut Evaluator<'_, F>,
        t: Float,
        _y: &[Float],
        f0: &[Float],
        h: Float,
        y1: &[Float],
        f1: &mut [Float],
        cont: Option<Vec<Float>>,
    ) -> Result<DenseModel>
    where
        F: ODE + ?Sized,
    {
        ev.call(t + h, y1, f1)?;
        Ok(match cont {
            Some(_) => DenseModel::Hermite {
                f0: f0.to_vec(),
                f1: f1.to_vec(),
            },
            None => DenseModel::Linear,
        })
    }
}

const C2: Float = 0.5;
const C3: Float = 0.5;
const C4: Float = 1.0;

const A21: Float = 0.5;
const A32: Float = 0.5;
const A43: Float = 1.0;

const B1: Float = 1.0 / 6.0;
const B2: Float = 1.0 / 3.0;
const B3: Float = 1.0 / 3.0;
const B4: Float = 1.0 / 6.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    struct Cubic;

    impl ODE for Cubic {
        fn dimension(&self) -> usize {
            1
        }

        fn ode(&self, t: Float, _y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError> {
            dydt[0] = 3.0 * t * t;
            Ok(())
        }
    }

    #[test]
    fn exact_on_cubic_quadrature() {
        let settings = Settings::default();
        let mut ev = Evaluator::new(&Cubic, usize::MAX);
        let mut formula = Rk4::new(1);
        let mut y1 = [0.0];
        let mut f1 = [0.0];
        let err = formula.attempt(&mut ev, 1.0, &[1.0], &[3.0], 0.5, &mut y1, &settings).unwrap();
        assert_eq!(err, 0.0);
        assert!((y1[0] - 1.5f64.powi(3)).abs() < 1e-14);
        assert_eq!(ev.evaluations(), 3);

        let model = formula
            .complete(&mut ev, 1.0, &[1.0], &[3.0], 0.5, &y1, &mut f1, Some(Vec::new()))
            .unwrap();
        assert_eq!(ev.evaluations(), 4);
        assert_eq!(
            model,
            DenseModel::Hermite {
                f0: vec![3.0],
                f1: vec![6.75]
            }
        );
    }
}
