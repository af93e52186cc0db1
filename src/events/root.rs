//! Bracketed root finding for switching functions.

use crate::{
    Float,
    error::{Error, Result},
};

/// Locate the sign change of `g` between `ta` and `tb`.
///
/// `ta` comes first in integration order and `g(ta)`, `g(tb)` must have
/// different signs (zero counts as positive). Iterates Illinois-modified
/// regula falsi, falling back to bisection whenever the bracket fails to halve
/// over two iterations. Returns the bracket end lying after the crossing, so
/// `g` already carries its new sign there.
pub(crate) fn locate<G>(
    mut g: G,
    ta: Float,
    ga: Float,
    tb: Float,
    gb: Float,
    convergence: Float,
    max_iterations: usize,
) -> Result<Float>
where
    G: FnMut(Float) -> Float,
{
    let before_positive = ga >= 0.0;
    let (mut a, mut fa) = (ta, ga);
    let (mut b, mut fb) = (tb, gb);
    let mut side = 0i8;
    let mut checkpoint = (b - a).abs();
    let mut bisect = false;

    for iteration in 0..max_iterations {
        let width = (b - a).abs();
        if width <= convergence {
            return Ok(b);
        }

        if iteration % 2 == 0 {
            bisect = width > 0.5 * checkpoint && iteration > 0;
            checkpoint = width;
        }

        let mut x = if bisect {
            0.5 * (a + b)
        } else {
            b - fb * (b - a) / (fb - fa)
        };
        if !(x > a.min(b) && x < a.max(b)) {
            x = 0.5 * (a + b);
        }

        let fx = g(x);
        if (fx >= 0.0) == before_positive {
            a = x;
            fa = fx;
            if side == -1 {
                fb *= 0.5;
            }
            side = -1;
        } else {
            b = x;
            fb = fx;
            if side == 1 {
                fa *= 0.5;
            }
            side = 1;
        }
    }

    if (b - a).abs() <= convergence {
        Ok(b)
    } else {
        Err(Error::EventNotConverged {
            t_lo: a.min(b),
            t_hi: a.max(b),
            iterations: max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn finds_root_after_crossing() {
        let root = locate(|t| t * t - 2.0, 0.0, -2.0, 2.0, 2.0, 1e-12, 100).unwrap();
        assert_abs_diff_eq!(root, 2f64.sqrt(), epsilon = 1e-12);
        assert!(root * root - 2.0 >= 0.0);
    }

    #[test]
    fn backward_bracket() {
        // integration runs from 3 down to 0, crossing at 1
        let root = locate(|t| t - 1.0, 3.0, 2.0, 0.0, -1.0, 1e-12, 100).unwrap();
        assert_abs_diff_eq!(root, 1.0, epsilon = 1e-12);
        assert!(root - 1.0 < 0.0);
    }

    #[test]
    fn flat_function_needs_bisection() {
        // regula falsi alone stalls on this shape
        let g = |t: Float| (t - 0.3).powi(9) + 1e-3 * (t - 0.3);
        let root = locate(g, 0.0, g(0.0), 1.0, g(1.0), 1e-12, 200).unwrap();
        assert_abs_diff_eq!(root, 0.3, epsilon = 1e-11);
    }

    #[test]
    fn budget_exhaustion_is_an_error() {
        let err = locate(|t| t - 0.123, 0.0, -0.123, 1.0, 0.877, 1e-15, 3).unwrap_err();
        assert!(matches!(err, Error::EventNotConverged { iterations: 3, .. }));
    }
}
