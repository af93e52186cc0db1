//! Core traits and types used throughout the library.

pub mod integrator;
pub mod interpolate;
pub mod ode;
pub mod solout;
pub mod solution;
pub mod status;
pub mod tolerance;
