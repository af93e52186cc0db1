//! Exact conversion between multistep histories and Nordsieck vectors.
//!
//! A Nordsieck vector at `t_k` holds the scaled derivatives
//! `[y_k, h y'_k, h²/2 y''_k, ..., hⁿ⁻¹/(n-1)! y⁽ⁿ⁻¹⁾_k]`. A multistep history
//! holds past values `y_{k-l}` for `l` in `p..q` followed by past scaled
//! derivatives `h y'_{k-l}` for `l` in `r..s`. For a polynomial of degree
//! below `n = (q - p) + (s - r)` both representations carry the same
//! information and the maps between them are exact.

use log::debug;

use crate::{
    Float,
    error::{Error, Result},
    matrix::{self, RationalMatrix, integer},
};

/// Precomputed linear maps between a multistep history and a Nordsieck
/// vector.
///
/// ```
/// use ivp_engine::nordsieck::NordsieckTransformer;
///
/// // three past values of y = 1 + t + t² sampled with h = 1 at t = 0, -1, -2
/// let transformer = NordsieckTransformer::new(0, 3, 0, 0)?;
/// let nordsieck = transformer.multistep_to_nordsieck(&[1.0, 1.0, 3.0]);
/// assert_eq!(nordsieck, vec![1.0, 1.0, 1.0]);
/// # Ok::<(), ivp_engine::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct NordsieckTransformer {
    offsets: (i32, i32, i32, i32),
    n: usize,
    exact_nordsieck_to_multistep: RationalMatrix,
    exact_multistep_to_nordsieck: RationalMatrix,
    nordsieck_to_multistep: Vec<Float>,
    multistep_to_nordsieck: Vec<Float>,
}

impl NordsieckTransformer {
    /// Build the transform for values at offsets `p..q` and scaled
    /// derivatives at offsets `r..s` (offsets count steps back from the
    /// current point and may be negative).
    pub fn new(p: i32, q: i32, r: i32, s: i32) -> Result<Self> {
        let n_to_m = build_nordsieck_to_multistep(p, q, r, s)?;
        let m_to_n = n_to_m
            .inverse()
            .ok_or(Error::SingularTransform { p, q, r, s })?;
        debug!("Nordsieck transform ({p}, {q}, {r}, {s}) of size {}", n_to_m.dim());

        Ok(Self {
            offsets: (p, q, r, s),
            n: n_to_m.dim(),
            nordsieck_to_multistep: n_to_m.to_float(),
            multistep_to_nordsieck: m_to_n.to_float(),
            exact_nordsieck_to_multistep: n_to_m,
            exact_multistep_to_nordsieck: m_to_n,
        })
    }

    /// Size `n` of both representations.
    pub fn size(&self) -> usize {
        self.n
    }

    /// The `(p, q, r, s)` offsets this transform was built for.
    pub fn offsets(&self) -> (i32, i32, i32, i32) {
        self.offsets
    }

    pub fn exact_nordsieck_to_multistep(&self) -> &RationalMatrix {
        &self.exact_nordsieck_to_multistep
    }

    pub fn exact_multistep_to_nordsieck(&self) -> &RationalMatrix {
        &self.exact_multistep_to_nordsieck
    }

    /// Transform a scalar history into a Nordsieck vector.
    ///
    /// # Panics
    ///
    /// Panics if `history.len()` differs from [`Self::size`].
    pub fn multistep_to_nordsieck(&self, history: &[Float]) -> Vec<Float> {
        assert_eq!(history.len(), self.n, "history length mismatch");
        matrix::operate(&self.multistep_to_nordsieck, self.n, history)
    }

    /// Transform a scalar Nordsieck vector back into a history.
    ///
    /// # Panics
    ///
    /// Panics if `nordsieck.len()` differs from [`Self::size`].
    pub fn nordsieck_to_multistep(&self, nordsieck: &[Float]) -> Vec<Float> {
        assert_eq!(nordsieck.len(), self.n, "Nordsieck length mismatch");
        matrix::operate(&self.nordsieck_to_multistep, self.n, nordsieck)
    }

    /// Transform a history of state vectors, one per entry, into the rows of
    /// a Nordsieck array.
    ///
    /// # Panics
    ///
    /// Panics if `history.len()` differs from [`Self::size`].
    pub fn multistep_to_nordsieck_rows(&self, history: &[Vec<Float>]) -> Vec<Vec<Float>> {
        assert_eq!(history.len(), self.n, "history length mismatch");
        matrix::operate_rows(&self.multistep_to_nordsieck, self.n, history)
    }

    /// Transform the rows of a Nordsieck array back into a history of state
    /// vectors.
    ///
    /// # Panics
    ///
    /// Panics if `nordsieck.len()` differs from [`Self::size`].
    pub fn nordsieck_to_multistep_rows(&self, nordsieck: &[Vec<Float>]) -> Vec<Vec<Float>> {
        assert_eq!(nordsieck.len(), self.n, "Nordsieck length mismatch");
        matrix::operate_rows(&self.nordsieck_to_multistep, self.n, nordsieck)
    }
}

/// Exact Nordsieck-to-history matrix: Taylor expansions of `y_{k-l}` and
/// `h y'_{k-l}` in terms of the scaled derivatives at `t_k`.
pub fn build_nordsieck_to_multistep(p: i32, q: i32, r: i32, s: i32) -> Result<RationalMatrix> {
    if q < p || s < r || (q == p && s == r) {
        return Err(Error::InvalidOffsets { p, q, r, s });
    }
    let n = ((q - p) + (s - r)) as usize;
    let mut m = RationalMatrix::zeros(n);

    let mut i = 0;
    for l in p..q {
        // y_{k-l}: [1, -l, l², -l³, ...]
        let factor = integer(-(l as i64));
        let mut power = integer(1);
        for j in 0..n {
            m[(i, j)] = power.clone();
            power *= &factor;
        }
        i += 1;
    }
    for l in r..s {
        // h y'_{k-l}: [0, 1, -2l, 3l², -4l³, ...]
        let factor = integer(-(l as i64));
        let mut power = integer(1);
        for j in 1..n {
            m[(i, j)] = &power * integer(j as i64);
            power *= &factor;
        }
        i += 1;
    }
    Ok(m)
}
