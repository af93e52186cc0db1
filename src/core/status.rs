//! Status codes for integrators

use serde::{Deserialize, Serialize};

/// How an integration run ended. Failures are reported as [`crate::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Reached the requested end time.
    Success,
    /// An event handler returned [`crate::events::Action::Stop`].
    Stopped,
    /// A step handler returned [`crate::core::solout::ControlFlag::Interrupt`].
    Interrupted,
}
