//! # Axis control library.
//!
//! This library allows other crates in the workspace to access items defined
//! inside the axis executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Axis driver abstraction - the contract any actuator back end must implement, plus the
/// physics-simulation back end
pub mod axis_driver;

/// Unit conversion layer - pure mappings between mechanism space and sensor space
pub mod convert;

/// Mechanism control module - owns the goal, allowed range and output mode of the axis
pub mod mech_ctrl;
