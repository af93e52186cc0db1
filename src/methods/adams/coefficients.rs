//! Exact Adams coefficient tables and the Nordsieck update they induce.

use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::{
    Float,
    error::{Error, Result},
    matrix::{self, RationalMatrix, integer},
};

/// Largest supported number of steps.
pub const MAX_ORDER: usize = 8;

/// Coefficients of the `k`-step Adams methods.
///
/// The classical tables are kept for reference and inspection:
/// `y_{n+1} = y_n + h Σ β_i f_{n-i}` for Bashforth (`k` entries) and
/// `y_{n+1} = y_n + h Σ β*_i f_{n+1-i}` for Moulton (`k + 1` entries). The
/// integrator itself works on the Nordsieck vector `[y, h y', r_2 .. r_k]`,
/// advanced by the update matrix `U` and corrected along `c1`.
///
/// ```
/// use ivp_engine::methods::adams::AdamsCoefficients;
///
/// let c = AdamsCoefficients::new(2)?;
/// assert_eq!(c.corrector_float(), vec![5.0 / 12.0, 8.0 / 12.0, -1.0 / 12.0]);
/// # Ok::<(), ivp_engine::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct AdamsCoefficients {
    order: usize,
    predictor: Vec<BigRational>,
    corrector: Vec<BigRational>,
    ms_to_n: Vec<Float>,
    update: Vec<Float>,
    c1: Vec<Float>,
}

impl AdamsCoefficients {
    pub fn new(order: usize) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(Error::InvalidOrder {
                order,
                max: MAX_ORDER,
            });
        }

        let differences = backward_differences(order + 1);
        let gamma = gamma(order);
        let predictor = (0..order)
            .map(|i| {
                (i..order).fold(BigRational::zero(), |acc, j| {
                    acc + &gamma[j] * integer(differences[j][i])
                })
            })
            .collect();
        let gamma_star = gamma_star(order);
        let corrector = (0..=order)
            .map(|i| {
                (i..=order).fold(BigRational::zero(), |acc, j| {
                    acc + &gamma_star[j] * integer(differences[j][i])
                })
            })
            .collect();

        // high order part of the Nordsieck vector: r_2 .. r_k
        let m = order - 1;
        let p = build_p(m);
        let p_inverse = p.inverse().ok_or(Error::InvalidOrder {
            order,
            max: MAX_ORDER,
        })?;
        let c1 = (0..m)
            .map(|i| p_inverse.row(i).iter().fold(BigRational::zero(), |acc, x| acc + x))
            .map(|c| matrix::to_float(&c))
            .collect();

        // transform to multistep form, shift one step, transform back
        let shifted = RationalMatrix::from_fn(m, |i, j| {
            if i == 0 {
                BigRational::zero()
            } else {
                p[(i - 1, j)].clone()
            }
        });
        let update = p_inverse.mul(&shifted);

        Ok(Self {
            order,
            predictor,
            corrector,
            ms_to_n: p_inverse.to_float(),
            update: update.to_float(),
            c1,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Exact Bashforth coefficients `β_0 .. β_{k-1}`.
    pub fn predictor(&self) -> &[BigRational] {
        &self.predictor
    }

    /// Exact Moulton coefficients `β*_0 .. β*_k`.
    pub fn corrector(&self) -> &[BigRational] {
        &self.corrector
    }

    pub fn predictor_float(&self) -> Vec<Float> {
        self.predictor.iter().map(matrix::to_float).collect()
    }

    pub fn corrector_float(&self) -> Vec<Float> {
        self.corrector.iter().map(matrix::to_float).collect()
    }

    /// Row-major `(k-1) × (k-1)` map from scaled derivative differences
    /// `h y'_{n-i} - h y'_n`, `i = 1..k-1`, to `r_2 .. r_k`.
    pub fn multistep_to_nordsieck(&self) -> &[Float] {
        &self.ms_to_n
    }

    /// Row-major `(k-1) × (k-1)` Nordsieck update matrix `U`.
    pub fn update(&self) -> &[Float] {
        &self.update
    }

    pub fn c1(&self) -> &[Float] {
        &self.c1
    }

    /// `U · rows + c1 ⊗ (scaled_old - scaled_new)`.
    pub(crate) fn advance(&self, rows: &[Vec<Float>], scaled_old: &[Float], scaled_new: &[Float]) -> Vec<Vec<Float>> {
        let mut next = matrix::operate_rows(&self.update, self.order - 1, rows);
        self.correct(&mut next, scaled_old, scaled_new);
        next
    }

    /// `rows += c1 ⊗ (scaled_old - scaled_new)`.
    pub(crate) fn correct(&self, rows: &mut [Vec<Float>], scaled_old: &[Float], scaled_new: &[Float]) {
        for (row, c) in rows.iter_mut().zip(&self.c1) {
            for ((r, a), b) in row.iter_mut().zip(scaled_old).zip(scaled_new) {
                *r += c * (a - b);
            }
        }
    }
}

/// `P[i][j] = (j + 2) (-(i + 1))^(j + 1)`: Taylor expansion of
/// `h y'_{n-i-1} - h y'_n` in terms of `r_2 .. r_{m+1}`.
fn build_p(m: usize) -> RationalMatrix {
    let mut p = RationalMatrix::zeros(m);
    for i in 0..m {
        let factor = -((i + 1) as i64);
        let mut aj = factor;
        for j in 0..m {
            p[(i, j)] = integer(aj * (j as i64 + 2));
            aj *= factor;
        }
    }
    p
}

/// `d[j][i] = (-1)^i C(j, i)`: weight of `f_{n-i}` in the backward
/// difference `∇^j f_n`.
fn backward_differences(size: usize) -> Vec<Vec<i64>> {
    let mut d = vec![vec![0i64; size]; size];
    for j in 0..size {
        d[j][0] = 1;
        for i in 1..=j {
            // Pascal's triangle with alternating signs
            d[j][i] = d[j - 1][i] - d[j - 1][i - 1];
        }
    }
    d
}

/// `γ_0 = 1`, `γ_i = 1 - Σ_{j=1..i} γ_{i-j} / (j + 1)`.
fn gamma(order: usize) -> Vec<BigRational> {
    let mut g: Vec<BigRational> = Vec::with_capacity(order);
    for i in 0..order {
        let mut value = BigRational::one();
        for j in 1..=i {
            value -= &g[i - j] / integer(j as i64 + 1);
        }
        g.push(value);
    }
    g
}

/// `γ*_0 = 1`, `γ*_i = -Σ_{j=1..i} γ*_{i-j} / (j + 1)`.
fn gamma_star(order: usize) -> Vec<BigRational> {
    let mut g: Vec<BigRational> = Vec::with_capacity(order + 1);
    g.push(BigRational::one());
    for i in 1..=order {
        let mut value = BigRational::zero();
        for j in 1..=i {
            value -= &g[i - j] / integer(j as i64 + 1);
        }
        g.push(value);
    }
    g
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;

    fn frac(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn backward_differences_follow_pascal() {
        let d = backward_differences(4);
        assert_eq!(d[1], vec![1, -1, 0, 0]);
        assert_eq!(d[2], vec![1, -2, 1, 0]);
        assert_eq!(d[3], vec![1, -3, 3, -1]);
    }

    #[test]
    fn gamma_sequences() {
        assert_eq!(gamma(4), vec![frac(1, 1), frac(1, 2), frac(5, 12), frac(3, 8)]);
        assert_eq!(
            gamma_star(3),
            vec![frac(1, 1), frac(-1, 2), frac(-1, 12), frac(-1, 24)]
        );
    }

    #[test]
    fn low_order_tables() {
        let c = AdamsCoefficients::new(2).unwrap();
        assert_eq!(c.predictor(), &[frac(3, 2), frac(-1, 2)]);
        assert_eq!(c.corrector(), &[frac(5, 12), frac(8, 12), frac(-1, 12)]);

        let c = AdamsCoefficients::new(1).unwrap();
        assert_eq!(c.predictor(), &[frac(1, 1)]);
        assert_eq!(c.corrector(), &[frac(1, 2), frac(1, 2)]);
        assert!(c.c1().is_empty());
        assert!(c.update().is_empty());
    }

    #[test]
    fn order_two_nordsieck_update() {
        // P = [-2], so c1 = [-1/2] and U = [0]
        let c = AdamsCoefficients::new(2).unwrap();
        assert_eq!(c.c1(), &[-0.5]);
        assert_eq!(c.update(), &[0.0]);
        assert_eq!(c.multistep_to_nordsieck(), &[-0.5]);
    }

    #[test]
    fn coefficients_sum_to_one() {
        for k in 1..=MAX_ORDER {
            let c = AdamsCoefficients::new(k).unwrap();
            let p: BigRational = c.predictor().iter().sum();
            let q: BigRational = c.corrector().iter().sum();
            assert_eq!(p, BigRational::one(), "predictor order {k}");
            assert_eq!(q, BigRational::one(), "corrector order {k}");
        }
    }

    #[test]
    fn unsupported_orders() {
        for k in [0, MAX_ORDER + 1] {
            assert!(matches!(
                AdamsCoefficients::new(k),
                Err(Error::InvalidOrder { max: MAX_ORDER, .. })
            ));
        }
    }
}
