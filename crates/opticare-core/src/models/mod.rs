//! Domain models for the OptiCare system.

mod appointment;
mod patient;

pub use appointment::*;
pub use patient::*;
