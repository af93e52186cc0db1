//! Compute an initial step size guess

use crate::{
    Float,
    core::ode::{Evaluator, ODE},
    error::Result,
    methods::settings::Settings,
};

/// Initial step size guess from the scale of the derivative at `(t, y)`.
///
/// One explicit Euler step probes the second derivative; the result is
/// `min(100|h|, (0.01 / max(|y''|, |y'|))^(1/order), hmax)` with the sign of
/// `direction`. Costs one model evaluation.
pub fn hinit<F>(
    ev: &mut Evaluator<'_, F>,
    t: Float,
    y: &[Float],
    f0: &[Float],
    direction: Float,
    order: usize,
    hmax: Float,
    settings: &Settings,
) -> Result<Float>
where
    F: ODE + ?Sized,
{
    let n = y.len();
    let rtol = &settings.rtol;
    let atol = &settings.atol;
    let mut dnf: Float = 0.0;
    let mut dny: Float = 0.0;

    for i in 0..n {
        let sk = atol[i] + rtol[i] * y[i].abs();
        dnf += (f0[i] / sk) * (f0[i] / sk);
        dny += (y[i] / sk) * (y[i] / sk);
    }

    let mut h = if dnf <= 1e-10 || dny <= 1e-10 {
        1.0e-6
    } else {
        (dny / dnf).sqrt() * 0.01
    };
    h = h.min(hmax.abs()) * direction.signum();

    // Explicit Euler step: y1 = y + h * f0
    let y1: Vec<Float> = y.iter().zip(f0).map(|(yi, fi)| yi + h * fi).collect();
    let mut f1 = vec![0.0; n];
    ev.call(t + h, &y1, &mut f1)?;

    // Estimate second derivative
    let mut der2: Float = 0.0;
    for i in 0..n {
        let sk = atol[i] + rtol[i] * y[i].abs();
        let df = (f1[i] - f0[i]) / sk;
        der2 += df * df;
    }
    der2 = der2.sqrt() / h.abs();

    let der12 = der2.abs().max(dnf.sqrt());
    let h1 = if der12 <= 1.0e-15 {
        (1.0e-6 as Float).max(h.abs() * 1.0e-3)
    } else {
        (0.01 / der12).powf(1.0 / order as Float)
    };

    let h = (100.0 * h.abs()).min(h1).min(hmax.abs());
    Ok(h * direction.signum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    struct Decay;

    impl ODE for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn ode(&self, _t: Float, y: &[Float], dydt: &mut [Float]) -> std::result::Result<(), ModelError> {
            dydt[0] = -y[0];
            Ok(())
        }
    }

    #[test]
    fn guess_is_bounded_and_signed() {
        let settings = Settings::default();
        let mut ev = Evaluator::new(&Decay, usize::MAX);
        let h = hinit(&mut ev, 0.0, &[1.0], &[-1.0], -1.0, 5, 0.5, &settings).unwrap();
        assert!(h < 0.0 && h.abs() <= 0.5);
        assert_eq!(ev.evaluations(), 1);

        let h = hinit(&mut ev, 0.0, &[1.0], &[-1.0], 1.0, 5, 1e-3, &settings).unwrap();
        assert_eq!(h, 1e-3);
    }
}
