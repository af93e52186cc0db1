//! An ODE integration engine: adaptive Dormand–Prince integrators, Adams
//! predictor-corrector integrators built on an exact Nordsieck transform,
//! dense output, event location, and persistent continuous output.
//!
//! ```no_run
//! use ivp_engine::prelude::*;
//!
//! struct Decay;
//!
//! impl ODE for Decay {
//!     fn dimension(&self) -> usize {
//!         1
//!     }
//!
//!     fn ode(&self, _t: f64, y: &[f64], dydt: &mut [f64]) -> Result<(), ModelError> {
//!         dydt[0] = -y[0];
//!         Ok(())
//!     }
//! }
//!
//! let mut integrator = DormandPrince54::new(Settings::builder().rtol(1e-8).atol(1e-10).build())?;
//! let mut y = [0.0];
//! let result = integrator.integrate(&Decay, 0.0, &[1.0], 1.0, &mut y, &mut Handlers::new())?;
//! assert_eq!(result.status, Status::Success);
//! # Ok::<(), ivp_engine::Error>(())
//! ```

pub mod core;
pub mod error;
pub mod events;
pub mod matrix;
pub mod methods;
pub mod nordsieck;
pub mod prelude;
pub mod solve;

pub use error::{Error, ModelError, Result};

/// Scalar type used for times and states.
pub type Float = f64;
