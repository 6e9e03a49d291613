//! Physics-simulation axis driver
//!
//! Implements the [`AxisDriver`] contract by integrating a single
//! degree-of-freedom model of the mechanism forward by one fixed step per
//! cycle, then synthesising encoder and motor readings consistent with that
//! model. This closes the sense/actuate loop without any hardware attached,
//! so the mechanism controller runs identically in simulation and on the
//! real actuator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

// Internal
use super::{AxisDriver, FfGains, Inputs, OutputMode, Outputs, PidGains, ProfileParams};
use crate::convert;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Standard gravity.
///
/// Units: meters/second^2
const GRAVITY_MS2: f64 = 9.81;

// ---------------------------------------------------------------------------
// PARAMETERS
// ---------------------------------------------------------------------------

/// Parameters for the simulation driver, fixed at construction.
#[derive(Clone, Debug, Deserialize)]
pub struct SimParams {
    /// Integration step, equal to the control period.
    ///
    /// Units: seconds
    pub step_s: f64,

    /// Characteristic of one drive motor.
    pub motor: MotorParams,

    /// Number of mechanically coupled motors driving the axis. The first is
    /// the lead motor, the rest are followers.
    pub motor_count: u32,

    /// Overall reduction between the motor rotor and the mechanism's drum or
    /// arm pivot.
    ///
    /// Units: motor rotations per mechanism rotation
    pub reduction: f64,

    /// Mechanism displacement per encoder rotation.
    ///
    /// Units: (m or rad)/rotation
    pub mech_per_rot: f64,

    /// The dynamic model of the load.
    pub model: MechModel,

    /// Minimum mechanism position, a hard travel stop.
    ///
    /// Units: mechanism units (m or rad)
    pub min_pos: f64,

    /// Maximum mechanism position, a hard travel stop.
    ///
    /// Units: mechanism units (m or rad)
    pub max_pos: f64,

    /// Whether gravity acts on the load.
    pub simulate_gravity: bool,

    /// Mechanism position at power on.
    ///
    /// Units: mechanism units (m or rad)
    pub start_pos: f64,

    /// Which numerical integrator advances the model.
    pub integrator: Integrator,

    /// Standard deviation of encoder position measurement noise. Zero
    /// disables noise injection on position.
    ///
    /// Units: rotations
    pub pos_std_dev_rot: f64,

    /// Standard deviation of encoder velocity measurement noise. Zero
    /// disables noise injection on velocity.
    ///
    /// Units: rotations/second
    pub vel_std_dev_rots: f64,

    /// RNG seed for deterministic runs. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// True if the encoder counts negative for positive mechanism motion.
    pub encoder_inverted: bool,

    /// Encoder magnet/zero offset, subtracted from the synthesised reading.
    ///
    /// Units: rotations
    pub encoder_magnet_offset_rot: f64,

    /// Supply (battery) voltage available to the motors.
    ///
    /// Units: volts
    pub supply_voltage_v: f64,
}

/// Torque/speed characteristic of a single DC motor.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct MotorParams {
    /// Units: volts
    pub nominal_voltage_v: f64,

    /// Units: newton-meters
    pub stall_torque_nm: f64,

    /// Units: amps
    pub stall_current_a: f64,

    /// Units: amps
    pub free_current_a: f64,

    /// Units: radians/second
    pub free_speed_rads: f64,
}

/// The dynamic model of the mechanism's load.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MechModel {
    /// An elevator-style carriage on a drum: mechanism units are metres.
    Linear {
        carriage_mass_kg: f64,
        drum_radius_m: f64,
    },

    /// A single-jointed arm: mechanism units are radians, zero horizontal.
    Arm { moi_kgm2: f64, arm_length_m: f64 },
}

/// Numerical integrator selection.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    SemiImplicitEuler,
    Rk4,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulation driver state.
pub struct SimAxisDriver {
    params: SimParams,

    // Derived motor constants, computed once at construction
    /// Winding resistance. Units: ohms
    r_ohms: f64,
    /// Speed constant. Units: (radians/second)/volt
    kv_radsv: f64,
    /// Torque constant. Units: newton-meters/amp
    kt_nma: f64,

    // Mechanism-space model state
    /// Units: mechanism units (m or rad)
    pos: f64,
    /// Units: mechanism units/second
    vel: f64,

    /// Voltage commanded at the last `apply_outputs`, driving the next
    /// integration step.
    applied_volts: f64,

    // Controller-set state
    goal_pos_rot: f64,
    override_volts: f64,
    override_amps: f64,
    output_mode: OutputMode,
    motors_disabled: bool,

    // Configuration state, tracked per group so one group can be applied
    // without disturbing the others
    pid: PidGains,
    ff: FfGains,
    profile: ProfileParams,
    stator_current_limit_a: f64,
    brake_mode: bool,

    /// True while the motors are undriven with brake mode off. A coasting
    /// motor is open-circuit, so it produces no torque and draws no current.
    coasting: bool,

    // Closed-loop state
    setpoint_pos_rot: f64,
    setpoint_vel_rots: f64,
    setpoint_acc_rots2: f64,
    integ_accum_v: f64,
    last_error_rot: f64,

    /// Offset applied to the synthesised encoder reading by
    /// `set_encoder_position`.
    rebase_offset_rot: f64,

    // Fault injection, used to exercise stale-data handling
    sensor_fault: bool,
    motor_fault: bool,

    rng: StdRng,

    last_inputs: Inputs,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimAxisDriver {
    /// Create a new simulation driver.
    ///
    /// The model is pre-stepped once so that the first control cycle
    /// observes readings consistent with the starting position rather than
    /// an all-zero snapshot.
    pub fn new(params: &SimParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let r_ohms = params.motor.nominal_voltage_v / params.motor.stall_current_a;
        let kv_radsv = params.motor.free_speed_rads
            / (params.motor.nominal_voltage_v - params.motor.free_current_a * r_ohms);
        let kt_nma = params.motor.stall_torque_nm / params.motor.stall_current_a;

        let mut driver = SimAxisDriver {
            params: params.clone(),
            r_ohms,
            kv_radsv,
            kt_nma,
            pos: params.start_pos,
            vel: 0.0,
            applied_volts: 0.0,
            goal_pos_rot: 0.0,
            override_volts: 0.0,
            override_amps: 0.0,
            output_mode: OutputMode::ClosedLoop,
            motors_disabled: false,
            pid: PidGains::default(),
            ff: FfGains::default(),
            profile: ProfileParams::default(),
            stator_current_limit_a: 0.0,
            brake_mode: false,
            coasting: false,
            setpoint_pos_rot: 0.0,
            setpoint_vel_rots: 0.0,
            setpoint_acc_rots2: 0.0,
            integ_accum_v: 0.0,
            last_error_rot: 0.0,
            rebase_offset_rot: 0.0,
            sensor_fault: false,
            motor_fault: false,
            rng,
            last_inputs: Inputs::default(),
        };

        // Start the closed loop at rest on the current position so the first
        // cycle does not see a spurious error
        let start_rot = driver.encoder_pos_raw();
        driver.goal_pos_rot = start_rot;
        driver.setpoint_pos_rot = start_rot;

        driver.update_inputs();

        driver
    }

    /// Inject or clear an encoder fault. While faulted, `update_inputs`
    /// reports `encoder_connected = false` and retains the last-known
    /// readings.
    pub fn set_sensor_fault(&mut self, fault: bool) {
        self.sensor_fault = fault;
    }

    /// Inject or clear a motor fault. While faulted, `update_inputs` reports
    /// the motors disconnected and retains the last-known currents.
    pub fn set_motor_fault(&mut self, fault: bool) {
        self.motor_fault = fault;
    }

    /// Current true mechanism position (no measurement noise).
    ///
    /// Units: mechanism units (m or rad)
    pub fn true_position(&self) -> f64 {
        self.pos
    }

    /// Current true mechanism velocity (no measurement noise).
    ///
    /// Units: mechanism units/second
    pub fn true_velocity(&self) -> f64 {
        self.vel
    }

    // ---- MODEL ----

    /// Motor rotor speed for a given mechanism velocity.
    ///
    /// Units: radians/second
    fn motor_speed_rads(&self, vel: f64) -> f64 {
        match self.params.model {
            MechModel::Linear { drum_radius_m, .. } => vel / drum_radius_m * self.params.reduction,
            MechModel::Arm { .. } => vel * self.params.reduction,
        }
    }

    /// Mechanism-space acceleration for the given state and applied voltage.
    ///
    /// The DC motor model gives stator current `i = (v - w/kv) / r` per
    /// motor, hence torque `kt * i` per motor at the rotor, multiplied up by
    /// the reduction at the mechanism.
    fn accel(&self, pos: f64, vel: f64, volts: f64) -> f64 {
        let rotor_torque_nm = if self.coasting {
            0.0
        } else {
            let motor_speed = self.motor_speed_rads(vel);
            let stator_a = (volts - motor_speed / self.kv_radsv) / self.r_ohms;
            self.kt_nma * stator_a * self.params.motor_count as f64
        };

        match self.params.model {
            MechModel::Linear {
                carriage_mass_kg,
                drum_radius_m,
            } => {
                let force_n = rotor_torque_nm * self.params.reduction / drum_radius_m;
                let gravity = if self.params.simulate_gravity {
                    GRAVITY_MS2
                } else {
                    0.0
                };
                force_n / carriage_mass_kg - gravity
            }
            MechModel::Arm {
                moi_kgm2,
                arm_length_m,
            } => {
                let torque_nm = rotor_torque_nm * self.params.reduction;
                let gravity = if self.params.simulate_gravity {
                    // Uniform-rod gravity torque, expressed as an angular
                    // acceleration: 3g cos(theta) / 2L
                    3.0 * GRAVITY_MS2 * pos.cos() / (2.0 * arm_length_m)
                } else {
                    0.0
                };
                torque_nm / moi_kgm2 - gravity
            }
        }
    }

    /// Advance the model by one fixed step using the last applied voltage,
    /// then clamp to the travel stops.
    fn step_model(&mut self) {
        let dt = self.params.step_s;
        let volts = self.applied_volts;

        match self.params.integrator {
            Integrator::SemiImplicitEuler => {
                let a = self.accel(self.pos, self.vel, volts);
                self.vel += a * dt;
                self.pos += self.vel * dt;
            }
            Integrator::Rk4 => {
                let k1x = self.vel;
                let k1v = self.accel(self.pos, self.vel, volts);

                let k2x = self.vel + 0.5 * dt * k1v;
                let k2v = self.accel(
                    self.pos + 0.5 * dt * k1x,
                    self.vel + 0.5 * dt * k1v,
                    volts,
                );

                let k3x = self.vel + 0.5 * dt * k2v;
                let k3v = self.accel(
                    self.pos + 0.5 * dt * k2x,
                    self.vel + 0.5 * dt * k2v,
                    volts,
                );

                let k4x = self.vel + dt * k3v;
                let k4v = self.accel(self.pos + dt * k3x, self.vel + dt * k3v, volts);

                self.pos += dt / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
                self.vel += dt / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v);
            }
        }

        // Hard stops: position pinned, velocity zeroed on the step that
        // reaches a limit
        if self.pos <= self.params.min_pos {
            self.pos = self.params.min_pos;
            if self.vel < 0.0 {
                self.vel = 0.0;
            }
        }
        if self.pos >= self.params.max_pos {
            self.pos = self.params.max_pos;
            if self.vel > 0.0 {
                self.vel = 0.0;
            }
        }
    }

    // ---- SENSOR SYNTHESIS ----

    fn encoder_direction(&self) -> f64 {
        if self.params.encoder_inverted {
            -1.0
        } else {
            1.0
        }
    }

    /// Noise-free encoder position for the current model state.
    fn encoder_pos_raw(&self) -> f64 {
        convert::mech_to_sensor(self.pos, self.params.mech_per_rot) * self.encoder_direction()
            - self.params.encoder_magnet_offset_rot
            + self.rebase_offset_rot
    }

    /// Noise-free encoder velocity for the current model state.
    fn encoder_vel_raw(&self) -> f64 {
        convert::mech_to_sensor(self.vel, self.params.mech_per_rot) * self.encoder_direction()
    }

    /// Mechanism position as the closed loop sees it, inverted from the
    /// last measured encoder reading. The control paths must work from this,
    /// never from the true model state.
    fn measured_mech_pos(&self) -> f64 {
        let raw = (self.last_inputs.encoder_pos_rot - self.rebase_offset_rot
            + self.params.encoder_magnet_offset_rot)
            * self.encoder_direction();
        convert::sensor_to_mech(raw, self.params.mech_per_rot)
    }

    /// Zero-mean gaussian sample via Box-Muller. Zero std dev draws nothing
    /// from the RNG so noise-free runs stay deterministic regardless of
    /// seeding.
    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        let u1: f64 = self.rng.gen::<f64>().max(f64::EPSILON);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * std_dev
    }

    /// Stator current drawn by one motor at the present state and voltage.
    fn stator_current_a(&self) -> f64 {
        if self.coasting {
            return 0.0;
        }
        (self.applied_volts - self.motor_speed_rads(self.vel) / self.kv_radsv) / self.r_ohms
    }

    // ---- CONTROL PATHS ----

    /// Clamp a voltage request to the supply rails and, when a stator
    /// current limit is configured, to the voltage window that keeps the
    /// stator current within that limit.
    fn limit_volts(&self, volts: f64) -> f64 {
        let supply = self.params.supply_voltage_v;
        let mut v = volts.max(-supply).min(supply);

        if self.stator_current_limit_a > 0.0 {
            let back_emf = self.motor_speed_rads(self.vel) / self.kv_radsv;
            let v_hi = self.stator_current_limit_a * self.r_ohms + back_emf;
            let v_lo = -self.stator_current_limit_a * self.r_ohms + back_emf;
            v = v.max(v_lo).min(v_hi);
        }

        v
    }

    /// Advance the exponential profile setpoint one step toward the goal.
    ///
    /// The profile approaches the goal as a first-order lag with time
    /// constant `expo_ka / expo_kv`, with the setpoint velocity clamped to
    /// the cruise velocity when one is configured.
    fn advance_profile(&mut self) {
        let dt = self.params.step_s;
        let err = self.goal_pos_rot - self.setpoint_pos_rot;

        if err == 0.0 {
            self.setpoint_acc_rots2 = -self.setpoint_vel_rots / dt;
            self.setpoint_vel_rots = 0.0;
            return;
        }

        let tau_s = if self.profile.expo_kv > 0.0 {
            self.profile.expo_ka / self.profile.expo_kv
        } else {
            0.0
        };

        let mut vel_des = if tau_s > 0.0 { err / tau_s } else { err / dt };

        let cruise = self.profile.cruise_vel_rots;
        if cruise > 0.0 {
            vel_des = vel_des.max(-cruise).min(cruise);
        }

        self.setpoint_acc_rots2 = (vel_des - self.setpoint_vel_rots) / dt;
        self.setpoint_vel_rots = vel_des;

        let next = self.setpoint_pos_rot + vel_des * dt;

        // Never step past the goal
        if (self.goal_pos_rot - next) * err < 0.0 {
            self.setpoint_pos_rot = self.goal_pos_rot;
            self.setpoint_vel_rots = 0.0;
        } else {
            self.setpoint_pos_rot = next;
        }
    }

    /// Closed-loop voltage: PID on the profile setpoint against the measured
    /// encoder position, plus kS/kV/kA/kG feedforward. Returns the voltage
    /// and the individual P/I/D contributions.
    fn closed_loop_volts(&mut self) -> (f64, f64, f64, f64) {
        let dt = self.params.step_s;

        self.advance_profile();

        let measured = self.last_inputs.encoder_pos_rot;
        let error = self.setpoint_pos_rot - measured;

        let p = self.pid.kp * error;

        self.integ_accum_v += self.pid.ki * error * dt;
        // Anti-windup clamp on the integral contribution
        let supply = self.params.supply_voltage_v;
        self.integ_accum_v = self.integ_accum_v.max(-supply).min(supply);
        let i = self.integ_accum_v;

        let d = self.pid.kd * (error - self.last_error_rot) / dt;
        self.last_error_rot = error;

        let gravity_ff = match self.params.model {
            MechModel::Linear { .. } => self.ff.kg,
            MechModel::Arm { .. } => self.ff.kg * self.measured_mech_pos().cos(),
        };
        let ff = self.ff.ks * self.setpoint_vel_rots.signum()
            + self.ff.kv * self.setpoint_vel_rots
            + self.ff.ka * self.setpoint_acc_rots2
            + gravity_ff;

        (p + i + d + ff, p, i, d)
    }

    /// Voltage that realises the requested stator current at the present
    /// rotor speed: `v = i * r + w / kv`.
    fn current_override_volts(&self) -> f64 {
        let mut amps = self.override_amps;
        if self.stator_current_limit_a > 0.0 {
            amps = amps
                .max(-self.stator_current_limit_a)
                .min(self.stator_current_limit_a);
        }
        amps * self.r_ohms + self.motor_speed_rads(self.vel) / self.kv_radsv
    }
}

impl AxisDriver for SimAxisDriver {
    fn update_inputs(&mut self) -> Inputs {
        // Integrate the model first so readings reflect the voltage applied
        // last cycle
        self.step_model();

        // Start from the last snapshot so faulted channels retain their
        // last-known values
        let mut inputs = self.last_inputs;

        if self.sensor_fault {
            inputs.encoder_connected = false;
        } else {
            inputs.encoder_connected = true;
            let pos_noise = self.gaussian(self.params.pos_std_dev_rot);
            let vel_noise = self.gaussian(self.params.vel_std_dev_rots);
            inputs.encoder_pos_rot = self.encoder_pos_raw() + pos_noise;
            inputs.encoder_vel_rots = self.encoder_vel_raw() + vel_noise;
        }

        if self.motor_fault {
            inputs.lead_motor_connected = false;
            inputs.follower_motor_connected = false;
        } else {
            let stator_a = self.stator_current_a();
            let supply_a =
                stator_a.abs() * self.applied_volts.abs() / self.params.supply_voltage_v;

            inputs.lead_motor_connected = true;
            inputs.lead_motor_stator_current_a = stator_a;
            inputs.lead_motor_supply_current_a = supply_a;

            // The follower is mechanically coupled to the same axis: its
            // state derives from the shared mechanism state, never from an
            // independent integration
            inputs.follower_motor_connected = self.params.motor_count > 1;
            inputs.follower_motor_stator_current_a = stator_a;
            inputs.follower_motor_supply_current_a = supply_a;
        }

        inputs.encoder_goal_pos_rot = self.goal_pos_rot;
        inputs.encoder_setpoint_pos_rot = self.setpoint_pos_rot;
        inputs.closed_loop_error_rot = self.setpoint_pos_rot - inputs.encoder_pos_rot;

        self.last_inputs = inputs;

        inputs
    }

    fn apply_outputs(&mut self) -> Outputs {
        let mut outputs = Outputs {
            motors_disabled: self.motors_disabled,
            output_mode: self.output_mode,
            ..Outputs::default()
        };

        self.coasting = self.motors_disabled && !self.brake_mode;

        if self.motors_disabled {
            // Disable overrides every mode
            self.applied_volts = 0.0;
        } else {
            match self.output_mode {
                OutputMode::ClosedLoop => {
                    let (volts, p, i, d) = self.closed_loop_volts();
                    self.applied_volts = self.limit_volts(volts);
                    outputs.p_contrib_v = p;
                    outputs.i_contrib_v = i;
                    outputs.d_contrib_v = d;
                }
                OutputMode::Voltage => {
                    self.applied_volts = self.limit_volts(self.override_volts);
                }
                OutputMode::Current => {
                    let volts = self.current_override_volts();
                    self.applied_volts = self.limit_volts(volts);
                }
            }
        }

        outputs.applied_volts = self.applied_volts;

        trace!(
            "SimAxisDriver applied {:.3} V in {:?} mode",
            self.applied_volts,
            self.output_mode
        );

        outputs
    }

    fn set_goal_pos(&mut self, pos_rot: f64) {
        self.goal_pos_rot = pos_rot;
    }

    fn set_encoder_position(&mut self, pos_rot: f64) {
        let raw = convert::mech_to_sensor(self.pos, self.params.mech_per_rot)
            * self.encoder_direction()
            - self.params.encoder_magnet_offset_rot;
        self.rebase_offset_rot = pos_rot - raw;
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    fn set_override_voltage(&mut self, volts: f64) {
        self.override_volts = volts;
    }

    fn set_override_current(&mut self, amps: f64) {
        self.override_amps = amps;
    }

    fn set_motors_disabled(&mut self, disabled: bool) {
        self.motors_disabled = disabled;
    }

    fn set_pid(&mut self, gains: PidGains) {
        self.pid = gains;
    }

    fn set_ff(&mut self, gains: FfGains) {
        self.ff = gains;
    }

    fn set_profile(&mut self, profile: ProfileParams) {
        self.profile = profile;
    }

    fn set_stator_current_limit(&mut self, amps: f64) {
        self.stator_current_limit_a = amps;
    }

    fn set_brake_mode(&mut self, brake: bool) {
        self.brake_mode = brake;
    }
}
