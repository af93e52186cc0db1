#![allow(dead_code)]

use std::cell::Cell;

use ivp_engine::prelude::*;

/// Simple harmonic oscillator: y'' = -y.
pub struct SHO;

impl ODE for SHO {
    fn dimension(&self) -> usize {
        2
    }

    fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        dydt[0] = y[1];
        dydt[1] = -y[0];
        Ok(())
    }
}

/// Exact SHO solution for y(0) = [1, 0].
pub fn sho_exact(t: f64) -> [f64; 2] {
    [t.cos(), -t.sin()]
}

/// Exponential decay y' = -λ y.
pub struct Decay {
    pub lambda: f64,
}

impl ODE for Decay {
    fn dimension(&self) -> usize {
        1
    }

    fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        dydt[0] = -self.lambda * y[0];
        Ok(())
    }
}

/// y' = 3t² - 2t + 1, solved by y = t³ - t² + t + 1.
pub struct Cubic;

impl ODE for Cubic {
    fn dimension(&self) -> usize {
        1
    }

    fn ode(&self, t: f64, _y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        dydt[0] = 3.0 * t * t - 2.0 * t + 1.0;
        Ok(())
    }
}

pub fn cubic_exact(t: f64) -> f64 {
    t * t * t - t * t + t + 1.0
}

/// Planar two body problem starting at periapsis, period 2π.
pub struct Kepler {
    pub eccentricity: f64,
}

impl Kepler {
    pub fn initial_state(&self) -> [f64; 4] {
        let e = self.eccentricity;
        [1.0 - e, 0.0, 0.0, ((1.0 + e) / (1.0 - e)).sqrt()]
    }

    /// Position at time `t` from Kepler's equation E - e sin E = t.
    pub fn position(&self, t: f64) -> [f64; 2] {
        let e = self.eccentricity;
        let mut anomaly = t;
        for _ in 0..50 {
            let delta = (anomaly - e * anomaly.sin() - t) / (1.0 - e * anomaly.cos());
            anomaly -= delta;
            if delta.abs() < 1e-15 {
                break;
            }
        }
        [anomaly.cos() - e, (1.0 - e * e).sqrt() * anomaly.sin()]
    }
}

impl ODE for Kepler {
    fn dimension(&self) -> usize {
        4
    }

    fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        let r2 = y[0] * y[0] + y[1] * y[1];
        let r3 = r2 * r2.sqrt();
        dydt[0] = y[2];
        dydt[1] = y[3];
        dydt[2] = -y[0] / r3;
        dydt[3] = -y[1] / r3;
        Ok(())
    }
}

/// Vertical fall under gravity: y = [height, velocity].
pub struct Ball;

pub const GRAVITY: f64 = 9.81;

impl ODE for Ball {
    fn dimension(&self) -> usize {
        2
    }

    fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        dydt[0] = y[1];
        dydt[1] = -GRAVITY;
        Ok(())
    }
}

/// y' = rate, with the rate shared with an event handler.
pub struct Ramp<'a> {
    pub rate: &'a Cell<f64>,
}

impl ODE for Ramp<'_> {
    fn dimension(&self) -> usize {
        1
    }

    fn ode(&self, _t: f64, _y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        dydt[0] = self.rate.get();
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("model left its domain at t = {0}")]
pub struct OutOfDomain(pub f64);

/// Decay that fails once `t` passes `limit`.
pub struct Fragile {
    pub limit: f64,
}

impl ODE for Fragile {
    fn dimension(&self) -> usize {
        1
    }

    fn ode(&self, t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
        if t > self.limit {
            return Err(ModelError::new(OutOfDomain(t)));
        }
        dydt[0] = -y[0];
        Ok(())
    }
}

/// Every method with the step-size control used by the shared tests.
pub fn adaptive_methods() -> [Method; 4] {
    [Method::DOPRI5, Method::DOP853, Method::AdamsBashforth(4), Method::AdamsMoulton(4)]
}

/// Error allowance relative to the one-step methods at equal tolerances.
///
/// Bashforth shares its step control with Moulton but has the larger error
/// constant, so its global error runs over an order of magnitude higher.
pub fn error_scale(method: Method) -> f64 {
    match method {
        Method::AdamsBashforth(_) => 50.0,
        _ => 1.0,
    }
}

pub fn default_opts_dense(method: Method) -> IVPOptions<'static> {
    IVPOptions::builder()
        .method(method)
        .rtol(1e-10)
        .atol(1e-10)
        .dense_output(true)
        .build()
}
