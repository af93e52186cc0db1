// Numerical methods

pub mod adams;
pub mod controller;
pub mod hinit;
pub mod rk;
pub mod settings;

pub use adams::Adams;
pub use rk::{ClassicalRungeKutta, DormandPrince54, DormandPrince853, RungeKutta};
pub use settings::Settings;
