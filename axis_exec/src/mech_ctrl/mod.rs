//! Mechanism control module
//!
//! MechCtrl owns the commanded state of one bounded axis: the goal position,
//! the allowed range, the output mode and the motor enable. Each cycle it
//! clamps the goal into the allowed range, pushes it to the axis driver,
//! refreshes the driver's inputs and applies exactly one control path. The
//! driver back end is interchangeable, so the same module runs against
//! hardware or against the physics simulation.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MechCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MechCtrlError {
    #[error("Failed to load MechCtrl parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Invalid mechanism ratio, mech_per_rot must be non-zero, got {0}")]
    InvalidMechPerRot(f64),

    #[error("Failed to initialise archiver: {0}")]
    ArchInitError(String),
}
