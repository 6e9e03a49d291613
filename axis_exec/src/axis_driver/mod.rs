//! Axis driver abstraction
//!
//! An axis driver is the back end of the mechanism controller: it reads
//! sensor/motor state into an [`Inputs`] snapshot, applies the requested
//! control path to the motors, and accepts incremental configuration
//! changes. Two kinds of driver exist: real hardware drivers (out of scope
//! for this crate, living with the bus wiring) and the physics-simulation
//! driver in [`sim`], which lets the identical controller logic run with no
//! hardware attached.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use sim::{SimAxisDriver, SimParams};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The control path the driver applies to the motors.
///
/// Exactly one mode is active at a time. A mode change takes effect on the
/// next [`AxisDriver::apply_outputs`] call.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OutputMode {
    /// Track the goal position with profiled closed-loop control.
    ClosedLoop,

    /// Apply an externally supplied voltage, bypassing the closed loop.
    Voltage,

    /// Apply an externally supplied current, bypassing the closed loop.
    Current,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::ClosedLoop
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of sensor and motor state, refreshed once per control cycle.
///
/// When a `connected` flag is false the associated numeric fields retain
/// their last-known values, they are stale-but-labelled, never silently
/// zeroed.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Inputs {
    /// True only if the last encoder read reported no fault.
    pub encoder_connected: bool,

    /// Current encoder position. Tracks total rotation since power on, not
    /// absolute position.
    ///
    /// Units: rotations
    pub encoder_pos_rot: f64,

    /// Current encoder velocity.
    ///
    /// Units: rotations/second
    pub encoder_vel_rots: f64,

    /// The current closed-loop goal position, in terms of the encoder.
    ///
    /// Units: rotations
    pub encoder_goal_pos_rot: f64,

    /// Profile setpoint position, in terms of the encoder.
    ///
    /// Units: rotations
    pub encoder_setpoint_pos_rot: f64,

    /// Current closed-loop tracking error (distance from setpoint position).
    ///
    /// Units: rotations
    pub closed_loop_error_rot: f64,

    /// True only if the last lead motor read reported no fault.
    pub lead_motor_connected: bool,

    /// Supply current of the lead motor.
    ///
    /// Units: amps
    pub lead_motor_supply_current_a: f64,

    /// Stator current of the lead motor.
    ///
    /// Units: amps
    pub lead_motor_stator_current_a: f64,

    /// True only if the last follower motor read reported no fault.
    pub follower_motor_connected: bool,

    /// Supply current of the follower motor.
    ///
    /// Units: amps
    pub follower_motor_supply_current_a: f64,

    /// Stator current of the follower motor.
    ///
    /// Units: amps
    pub follower_motor_stator_current_a: f64,
}

/// Snapshot of what the driver applied to the motors this cycle.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Outputs {
    /// Are the motors currently disabled in software?
    pub motors_disabled: bool,

    /// The output mode that was applied.
    pub output_mode: OutputMode,

    /// The voltage applied to the motors.
    ///
    /// Units: volts
    pub applied_volts: f64,

    /// Contribution of the proportional term to motor output. Zero outside
    /// closed-loop mode.
    ///
    /// Units: volts
    pub p_contrib_v: f64,

    /// Contribution of the integral term to motor output. Zero outside
    /// closed-loop mode.
    ///
    /// Units: volts
    pub i_contrib_v: f64,

    /// Contribution of the derivative term to motor output. Zero outside
    /// closed-loop mode.
    ///
    /// Units: volts
    pub d_contrib_v: f64,
}

impl Default for Outputs {
    fn default() -> Self {
        Outputs {
            motors_disabled: false,
            output_mode: OutputMode::ClosedLoop,
            applied_volts: 0.0,
            p_contrib_v: 0.0,
            i_contrib_v: 0.0,
            d_contrib_v: 0.0,
        }
    }
}

/// Proportional/integral/derivative gains for closed-loop control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Feedforward gains for closed-loop control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FfGains {
    /// Static friction compensation.
    ///
    /// Units: volts
    pub ks: f64,

    /// Velocity feedforward.
    ///
    /// Units: volts/(rotation/second)
    pub kv: f64,

    /// Acceleration feedforward.
    ///
    /// Units: volts/(rotation/second^2)
    pub ka: f64,

    /// Gravity compensation. Constant for a linear mechanism, scaled by the
    /// cosine of the arm angle for a rotational one.
    ///
    /// Units: volts
    pub kg: f64,
}

/// Motion profile parameters for closed-loop control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Maximum setpoint velocity. Zero disables the cruise limit.
    ///
    /// Units: rotations/second
    pub cruise_vel_rots: f64,

    /// Exponential profile velocity constant.
    ///
    /// Units: volts/(rotation/second)
    pub expo_kv: f64,

    /// Exponential profile acceleration constant.
    ///
    /// Units: volts/(rotation/second^2)
    pub expo_ka: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The contract any actuator back end must implement.
///
/// # Failure semantics
///
/// No operation on this trait may abort the control cycle. Transient
/// hardware faults are reported through the `connected` flags in [`Inputs`],
/// with the affected numeric fields retaining their last-known values.
///
/// # Configuration invariant
///
/// The configuration setters (`set_pid`, `set_ff`, `set_profile`,
/// `set_stator_current_limit`, `set_brake_mode`) are incremental: applying
/// one group must not reset or overwrite another group previously
/// configured. Implementations must track configuration state per group
/// rather than rebuilding a whole configuration object.
pub trait AxisDriver {
    /// Perform a fresh read of sensor and motor state.
    fn update_inputs(&mut self) -> Inputs;

    /// Apply exactly one control path based on the requested output mode.
    ///
    /// When motors are disabled this overrides every mode and commands zero
    /// voltage.
    fn apply_outputs(&mut self) -> Outputs;

    /// Set the encoder goal position the driver will control to when in
    /// closed-loop mode.
    fn set_goal_pos(&mut self, pos_rot: f64);

    /// Rebase the encoder's running position without affecting mechanism
    /// calibration elsewhere.
    fn set_encoder_position(&mut self, pos_rot: f64);

    /// Select which control path [`Self::apply_outputs`] applies.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Set the voltage applied when in [`OutputMode::Voltage`].
    fn set_override_voltage(&mut self, volts: f64);

    /// Set the current applied when in [`OutputMode::Current`].
    fn set_override_current(&mut self, amps: f64);

    /// Set whether the motors should be disabled in software.
    fn set_motors_disabled(&mut self, disabled: bool);

    /// Update PID gains, leaving all other configuration untouched.
    fn set_pid(&mut self, gains: PidGains);

    /// Update feedforward gains, leaving all other configuration untouched.
    fn set_ff(&mut self, gains: FfGains);

    /// Update motion profile parameters, leaving all other configuration
    /// untouched.
    fn set_profile(&mut self, profile: ProfileParams);

    /// Set the stator current limit for the motors, leaving all other
    /// configuration untouched.
    fn set_stator_current_limit(&mut self, amps: f64);

    /// Set whether the motors should brake while idle.
    fn set_brake_mode(&mut self, brake: bool);
}
