//! Start phase of the Adams integrators.

use crate::{
    Float,
    core::{
        interpolate::{Interpolate, StepInterpolator},
        ode::{Evaluator, ODE},
        solout::{ControlFlag, SolOut},
    },
    error::Result,
    events::EventManager,
    methods::{
        rk::{Dop853, RungeKutta},
        settings::Settings,
    },
    nordsieck::NordsieckTransformer,
};

/// High order rows `r_2 .. r_k` of the Nordsieck vector at `t0`.
///
/// A Dormand–Prince 8(5,3) run over `[t0, t0 + (k-1) h]` provides the
/// derivatives at `t0 + i h`; together with `y0` and `scaled0 = h y'(t0)`
/// they form the history `transformer` maps to Nordsieck form. The run shares
/// the evaluation budget of `ev` and is invisible to step handlers and
/// events.
pub(crate) fn high_order_rows<F>(
    ev: &mut Evaluator<'_, F>,
    transformer: &NordsieckTransformer,
    settings: &Settings,
    t0: Float,
    y0: &[Float],
    scaled0: &[Float],
    h: Float,
) -> Result<Vec<Vec<Float>>>
where
    F: ODE + ?Sized,
{
    let steps = transformer.size() - 2;
    let times: Vec<Float> = (1..=steps).map(|i| t0 + i as Float * h).collect();
    let t_last = t0 + steps as Float * h;

    let mut starter = RungeKutta::<Dop853>::new(starter_settings(settings))?;
    let mut sampler = DerivativeSampler::new(times);
    let mut y = y0.to_vec();
    {
        let mut solouts: [&mut dyn SolOut; 1] = [&mut sampler];
        starter.run(ev, t0, t_last, &mut y, &mut solouts, &mut EventManager::none(), true)?;
    }

    // values at offset 0, then derivatives from the oldest offset -(k-1) to 0
    let mut history = Vec::with_capacity(steps + 2);
    history.push(y0.to_vec());
    for sample in sampler.samples.iter().rev() {
        history.push(sample.iter().map(|d| h * d).collect());
    }
    history.push(scaled0.to_vec());

    Ok(transformer
        .multistep_to_nordsieck_rows(&history)
        .into_iter()
        .skip(2)
        .collect())
}

fn starter_settings(settings: &Settings) -> Settings {
    Settings::builder()
        .rtol(settings.rtol.clone())
        .atol(settings.atol.clone())
        .uround(settings.uround)
        .build()
}

/// Collects the interpolated derivative at fixed times.
struct DerivativeSampler {
    times: Vec<Float>,
    samples: Vec<Vec<Float>>,
}

impl DerivativeSampler {
    fn new(times: Vec<Float>) -> Self {
        Self {
            samples: Vec::with_capacity(times.len()),
            times,
        }
    }
}

impl SolOut for DerivativeSampler {
    fn reset(&mut self) {
        self.samples.clear();
    }

    fn solout(&mut self, interpolator: &StepInterpolator, last: bool) -> ControlFlag {
        let end = interpolator.current_time();
        while let Some(&t) = self.times.get(self.samples.len()) {
            let reached = if interpolator.is_forward() { t <= end } else { t >= end };
            // rounding may leave the final sample a hair past the end
            if !reached && !last {
                break;
            }
            let mut dydt = vec![0.0; interpolator.dimension()];
            interpolator.interpolate_derivative(t, &mut dydt);
            self.samples.push(dydt);
        }
        ControlFlag::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use approx::assert_relative_eq;

    struct Quartic;

    impl ODE for Quartic {
        fn dimension(&self) -> usize {
            1
        }

        fn ode(&self, t: Float, _y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError> {
            dydt[0] = 4.0 * t.powi(3);
            Ok(())
        }
    }

    #[test]
    fn rows_are_scaled_taylor_coefficients() {
        // y = t⁴ around t0 = 1 with h = 0.1: r_j = h^j / j! y⁽ʲ⁾(1)
        let transformer = NordsieckTransformer::new(0, 1, -3, 1).unwrap();
        let settings = Settings::builder().rtol(1e-12).atol(1e-12).build();
        let mut ev = Evaluator::new(&Quartic, usize::MAX);
        let h: Float = 0.1;
        let rows = high_order_rows(&mut ev, &transformer, &settings, 1.0, &[1.0], &[0.4], h).unwrap();
        assert_eq!(rows.len(), 3);
        assert_relative_eq!(rows[0][0], 6.0 * h.powi(2), epsilon = 1e-9);
        assert_relative_eq!(rows[1][0], 4.0 * h.powi(3), epsilon = 1e-9);
        assert_relative_eq!(rows[2][0], h.powi(4), epsilon = 1e-9);
        assert!(ev.evaluations() > 0);
    }

    #[test]
    fn sampler_catches_up_on_last_step() {
        let mut sampler = DerivativeSampler::new(vec![0.5, 1.0 + 1e-15]);
        let mut interpolator = StepInterpolator::new(0.0, &[0.0], true);
        interpolator.store(1.0, &[1.0]);
        assert_eq!(sampler.solout(&interpolator, false), ControlFlag::Continue);
        assert_eq!(sampler.samples.len(), 1);
        sampler.solout(&interpolator, true);
        assert_eq!(sampler.samples, vec![vec![1.0], vec![1.0]]);
        sampler.reset();
        assert!(sampler.samples.is_empty());
    }
}
