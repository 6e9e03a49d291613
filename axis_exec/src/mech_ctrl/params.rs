//! Parameters structure for MechCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::axis_driver::{FfGains, PidGains, ProfileParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Mechanism control.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Human-readable name of the axis, used in logs and archive paths.
    pub axis_name: String,

    // ---- CAPABILITIES ----

    /// The lowest position the allowed range may ever be widened to, a
    /// physical property of the mechanism.
    ///
    /// Units: mechanism units (m or rad)
    pub min_min_pos: f64,

    /// The highest position the allowed range may ever be widened to, a
    /// physical property of the mechanism.
    ///
    /// Units: mechanism units (m or rad)
    pub max_max_pos: f64,

    /// Mechanism displacement per encoder rotation.
    ///
    /// Units: (m or rad)/rotation
    pub mech_per_rot: f64,

    /// Whether the motors should brake while idle.
    pub brake_mode: bool,

    // ---- CONTROL ----

    /// Initial tunable gains, pushed to the driver at init.
    pub gains: TunableGains,
}

/// The tunable gain groups of the closed loop, applied to the driver
/// incrementally: only groups that differ from the previously applied set
/// are pushed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TunableGains {
    pub pid: PidGains,

    pub ff: FfGains,

    pub profile: ProfileParams,

    /// Units: amps
    pub stator_current_limit_a: f64,
}
