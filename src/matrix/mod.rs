//! Square matrices over exact rationals.
//!
//! Coefficient matrices are assembled and inverted exactly, then converted to
//! floating point once.

mod linear;

use std::ops::{Index, IndexMut};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::Float;

/// Dense `n × n` matrix of [`BigRational`] stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RationalMatrix {
    n: usize,
    data: Vec<BigRational>,
}

impl RationalMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![BigRational::zero(); n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m[(i, i)] = BigRational::one();
        }
        m
    }

    /// Build from a function of `(row, column)`.
    pub fn from_fn<F>(n: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> BigRational,
    {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(f(i, j));
            }
        }
        Self { n, data }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn row(&self, i: usize) -> &[BigRational] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Matrix product `self · rhs`.
    pub fn mul(&self, rhs: &RationalMatrix) -> RationalMatrix {
        let n = self.n;
        let mut out = Self::zeros(n);
        for i in 0..n {
            for k in 0..n {
                let a = &self[(i, k)];
                if a.is_zero() {
                    continue;
                }
                for j in 0..n {
                    out[(i, j)] += a * &rhs[(k, j)];
                }
            }
        }
        out
    }

    /// Row-major floating point copy.
    pub fn to_float(&self) -> Vec<Float> {
        self.data.iter().map(to_float).collect()
    }
}

impl Index<(usize, usize)> for RationalMatrix {
    type Output = BigRational;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for RationalMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        &mut self.data[i * self.n + j]
    }
}

/// Exact integer as a rational.
pub(crate) fn integer(value: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(value))
}

pub(crate) fn to_float(value: &BigRational) -> Float {
    value.to_f64().unwrap_or(Float::NAN)
}

/// Apply a row-major `n × n` float matrix to a vector.
pub(crate) fn operate(matrix: &[Float], n: usize, v: &[Float]) -> Vec<Float> {
    (0..n)
        .map(|i| {
            matrix[i * n..(i + 1) * n]
                .iter()
                .zip(v)
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Apply a row-major `n × n` float matrix to `n` stacked state vectors.
pub(crate) fn operate_rows(matrix: &[Float], n: usize, rows: &[Vec<Float>]) -> Vec<Vec<Float>> {
    let dim = rows.first().map_or(0, Vec::len);
    (0..n)
        .map(|i| {
            let mut out = vec![0.0; dim];
            for (k, row) in rows.iter().enumerate() {
                let a = matrix[i * n + k];
                if a == 0.0 {
                    continue;
                }
                for (o, x) in out.iter_mut().zip(row) {
                    *o += a * x;
                }
            }
            out
        })
        .collect()
}
