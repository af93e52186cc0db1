//! Convenient prelude: import the most commonly used traits, types, and functions.
//!
//! Bring this into scope with:
//!
//! ```rust
//! use ivp_engine::prelude::*;
//! ```
//!
//! Re-exports included:
//! - Core traits and types: `ODE`, `Interpolate`, `SolOut`, `ControlFlag`,
//!   `StepInterpolator`, `IntegrationResult`, `Status`, `Tolerance`,
//!   `Integrator`, `Handlers`.
//! - Events: `EventHandler`, `EventConfig`, `Action`.
//! - Integrators: `DormandPrince54`, `DormandPrince853`, `ClassicalRungeKutta`,
//!   `Adams`, and their `Settings`.
//! - High-level API: `solve_ivp`, `IVPOptions`, `IVPSolution`, `Method`,
//!   `ContinuousOutput`.
//! - Errors: `Error`, `ModelError`.

pub use crate::core::{
    integrator::{Handlers, Integrator},
    interpolate::{Interpolate, StepInterpolator},
    ode::ODE,
    solout::{ControlFlag, SolOut},
    solution::IntegrationResult,
    status::Status,
    tolerance::Tolerance,
};
pub use crate::error::{Error, ModelError};
pub use crate::events::{Action, EventConfig, EventHandler};
pub use crate::methods::{
    adams::{Adams, Variant},
    rk::{ClassicalRungeKutta, DormandPrince54, DormandPrince853},
    settings::Settings,
};
pub use crate::solve::{ContinuousOutput, IVPOptions, IVPSolution, Method, solve_ivp};
