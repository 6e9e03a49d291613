//! Implementations for the MechCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{MechCtrlError, Params, TunableGains};
use crate::axis_driver::{AxisDriver, Inputs, OutputMode, Outputs};
use crate::convert;
use util::{
    archive::{Archived, Archiver},
    maths,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mechanism control module state
pub struct MechCtrl {
    pub(crate) params: Params,

    /// The actuator back end, hardware or simulation.
    driver: Box<dyn AxisDriver>,

    /// The goal as commanded. Retained unclamped so that widening the
    /// allowed range later restores reachability of the original goal.
    goal_pos: f64,

    /// The goal after clamping into the allowed range, as published to the
    /// driver.
    clamped_goal_pos: f64,

    /// Current allowed range minimum.
    min_pos: f64,

    /// Current allowed range maximum.
    max_pos: f64,

    /// True while the last requested min/max bound had to be clamped to the
    /// capability range. Persist until the bound is next set.
    min_bound_limited: bool,
    max_bound_limited: bool,

    motors_disabled: bool,

    /// The gain groups most recently pushed to the driver, used to push only
    /// changed groups on a retune.
    applied_gains: Option<TunableGains>,

    inputs: Inputs,
    arch_inputs: Archiver,

    outputs: Outputs,
    arch_outputs: Archiver,

    pub(crate) report: StatusReport,
    arch_goal: Archiver,
}

/// Input data to Mechanism Control.
#[derive(Default)]
pub struct InputData {
    /// Updated tunable gains, or `None` if there is no retune on this cycle.
    pub gains: Option<TunableGains>,
}

/// Output of one MechCtrl cycle: the driver state as read and as applied.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct OutputData {
    pub inputs: Inputs,
    pub outputs: Outputs,
}

/// Status report for MechCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True if the commanded goal lay outside the allowed range this cycle.
    pub goal_limited: bool,

    /// True if the requested range minimum was clamped to the capability
    /// range.
    pub min_bound_limited: bool,

    /// True if the requested range maximum was clamped to the capability
    /// range.
    pub max_bound_limited: bool,

    /// True if the encoder reading is stale (sensor reported a fault).
    pub sensor_stale: bool,

    /// True if the lead motor reading is stale.
    pub lead_motor_stale: bool,

    /// True if the follower motor reading is stale.
    pub follower_motor_stale: bool,
}

/// Archived once per cycle alongside the status report.
#[derive(Clone, Copy, Serialize, Debug)]
struct GoalRecord {
    /// Units: mechanism units (m or rad)
    unclamped_goal: f64,

    /// Units: mechanism units (m or rad)
    clamped_goal: f64,

    /// Units: mechanism units (m or rad)
    min_pos: f64,

    /// Units: mechanism units (m or rad)
    max_pos: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for MechCtrl {
    type InitData = &'static str;
    type InitError = MechCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = MechCtrlError;

    /// Initialise the MechCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;
        let axis_name = params.axis_name.clone();

        self.apply_params(params)?;

        // Create the arch folder for this axis
        let mut arch_path = session.arch_root.clone();
        arch_path.push(&axis_name);
        std::fs::create_dir_all(arch_path)
            .map_err(|e| MechCtrlError::ArchInitError(e.to_string()))?;

        // Initialise the archivers
        self.arch_inputs = Archiver::from_path(session, &format!("{}/inputs.csv", axis_name))
            .map_err(|e| MechCtrlError::ArchInitError(e.to_string()))?;
        self.arch_outputs = Archiver::from_path(session, &format!("{}/outputs.csv", axis_name))
            .map_err(|e| MechCtrlError::ArchInitError(e.to_string()))?;
        self.arch_goal = Archiver::from_path(session, &format!("{}/goal.csv", axis_name))
            .map_err(|e| MechCtrlError::ArchInitError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of Mechanism Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Push any retuned gain groups before this cycle's control path runs
        if let Some(gains) = input_data.gains {
            self.apply_if_changed(&gains);
        }

        // Clamp the commanded goal into the allowed range. Always reclamp
        // from the unclamped goal, never from a previously clamped value.
        self.clamped_goal_pos = maths::clamp(&self.goal_pos, &self.min_pos, &self.max_pos);
        if self.clamped_goal_pos != self.goal_pos {
            self.report.goal_limited = true;
        }
        self.report.min_bound_limited = self.min_bound_limited;
        self.report.max_bound_limited = self.max_bound_limited;

        self.driver.set_goal_pos(convert::mech_to_sensor(
            self.clamped_goal_pos,
            self.params.mech_per_rot,
        ));

        // Refresh inputs before applying outputs, so the control path acts
        // on this cycle's readings
        self.inputs = self.driver.update_inputs();
        self.report.sensor_stale = !self.inputs.encoder_connected;
        self.report.lead_motor_stale = !self.inputs.lead_motor_connected;
        self.report.follower_motor_stale = !self.inputs.follower_motor_connected;

        self.outputs = self.driver.apply_outputs();

        trace!(
            "MechCtrl [{}]: pos {:.4}, goal {:.4} (clamped {:.4}), applied {:.3} V",
            self.params.axis_name,
            self.position(),
            self.goal_pos,
            self.clamped_goal_pos,
            self.outputs.applied_volts
        );

        Ok((
            OutputData {
                inputs: self.inputs,
                outputs: self.outputs,
            },
            self.report,
        ))
    }
}

impl Archived for MechCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_inputs.serialise(self.inputs)?;
        self.arch_outputs.serialise(self.outputs)?;
        self.arch_goal.serialise(GoalRecord {
            unclamped_goal: self.goal_pos,
            clamped_goal: self.clamped_goal_pos,
            min_pos: self.min_pos,
            max_pos: self.max_pos,
        })?;

        Ok(())
    }
}

impl MechCtrl {
    /// Create a new uninitialised MechCtrl wrapping the given driver.
    ///
    /// [`State::init`] must be called before the first [`State::proc`].
    pub fn new(driver: Box<dyn AxisDriver>) -> Self {
        MechCtrl {
            params: Params::default(),
            driver,
            goal_pos: 0.0,
            clamped_goal_pos: 0.0,
            min_pos: 0.0,
            max_pos: 0.0,
            min_bound_limited: false,
            max_bound_limited: false,
            motors_disabled: false,
            applied_gains: None,
            inputs: Inputs::default(),
            arch_inputs: Archiver::default(),
            outputs: Outputs::default(),
            arch_outputs: Archiver::default(),
            report: StatusReport::default(),
            arch_goal: Archiver::default(),
        }
    }

    /// Validate and adopt a parameter set, push the initial configuration to
    /// the driver, and start the goal at the current measured position.
    fn apply_params(&mut self, params: Params) -> Result<(), MechCtrlError> {
        if params.mech_per_rot == 0.0 {
            return Err(MechCtrlError::InvalidMechPerRot(params.mech_per_rot));
        }

        self.params = params;

        // The allowed range starts at the full mechanism capability
        self.min_pos = self.params.min_min_pos;
        self.max_pos = self.params.max_max_pos;

        self.driver.set_brake_mode(self.params.brake_mode);
        let gains = self.params.gains;
        self.apply_if_changed(&gains);

        // Start the goal at the current position so the mechanism holds
        // still until commanded
        self.inputs = self.driver.update_inputs();
        self.goal_pos =
            convert::sensor_to_mech(self.inputs.encoder_pos_rot, self.params.mech_per_rot);
        self.clamped_goal_pos = maths::clamp(&self.goal_pos, &self.min_pos, &self.max_pos);

        Ok(())
    }

    /// Push only the gain groups that differ from those already applied.
    ///
    /// Each group is compared and pushed independently, so a retune of one
    /// group never disturbs the driver's state for the others.
    pub fn apply_if_changed(&mut self, gains: &TunableGains) {
        let applied = self.applied_gains;

        if applied.map(|a| a.pid) != Some(gains.pid) {
            self.driver.set_pid(gains.pid);
        }
        if applied.map(|a| a.ff) != Some(gains.ff) {
            self.driver.set_ff(gains.ff);
        }
        if applied.map(|a| a.profile) != Some(gains.profile) {
            self.driver.set_profile(gains.profile);
        }
        if applied.map(|a| a.stator_current_limit_a) != Some(gains.stator_current_limit_a) {
            self.driver.set_stator_current_limit(gains.stator_current_limit_a);
        }

        self.applied_gains = Some(*gains);
    }

    /// Command a new goal position.
    ///
    /// The unclamped value is retained, the clamp into the allowed range
    /// happens every cycle in [`State::proc`].
    ///
    /// Units: mechanism units (m or rad)
    pub fn set_goal_position(&mut self, pos: f64) {
        self.goal_pos = pos;
    }

    /// Set the minimum of the allowed range, itself clamped to the
    /// mechanism's capability range.
    ///
    /// Units: mechanism units (m or rad)
    pub fn set_min_position(&mut self, min: f64) {
        self.min_pos = maths::clamp(&min, &self.params.min_min_pos, &self.params.max_max_pos);
        self.min_bound_limited = self.min_pos != min;
    }

    /// Set the maximum of the allowed range, itself clamped to the
    /// mechanism's capability range.
    ///
    /// Units: mechanism units (m or rad)
    pub fn set_max_position(&mut self, max: f64) {
        self.max_pos = maths::clamp(&max, &self.params.min_min_pos, &self.params.max_max_pos);
        self.max_bound_limited = self.max_pos != max;
    }

    /// Set both ends of the allowed range.
    ///
    /// The two bounds are clamped to the capability range independently and
    /// are not reordered against each other. If `min > max` the goal clamp
    /// resolves to the min bound.
    pub fn set_allowed_range(&mut self, min: f64, max: f64) {
        self.set_min_position(min);
        self.set_max_position(max);
    }

    /// Select the control path the driver applies. Takes effect on the next
    /// cycle.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.driver.set_output_mode(mode);
    }

    /// Set the voltage applied in [`OutputMode::Voltage`].
    pub fn set_override_voltage(&mut self, volts: f64) {
        self.driver.set_override_voltage(volts);
    }

    /// Set the current applied in [`OutputMode::Current`].
    pub fn set_override_current(&mut self, amps: f64) {
        self.driver.set_override_current(amps);
    }

    /// Disable or re-enable the motors in software. While disabled every
    /// output mode commands zero voltage.
    pub fn set_motors_disabled(&mut self, disabled: bool) {
        self.motors_disabled = disabled;
        self.driver.set_motors_disabled(disabled);
    }

    /// Set whether the motors brake while idle.
    pub fn set_brake_mode(&mut self, brake: bool) {
        self.driver.set_brake_mode(brake);
    }

    /// Rebase the sensor so the current mechanism position reads as `pos`.
    ///
    /// Units: mechanism units (m or rad)
    pub fn set_sensor_position(&mut self, pos: f64) {
        self.driver
            .set_encoder_position(convert::mech_to_sensor(pos, self.params.mech_per_rot));
    }

    /// Last measured mechanism position.
    ///
    /// Units: mechanism units (m or rad)
    pub fn position(&self) -> f64 {
        convert::sensor_to_mech(self.inputs.encoder_pos_rot, self.params.mech_per_rot)
    }

    /// Last measured mechanism velocity.
    ///
    /// Units: mechanism units/second
    pub fn velocity(&self) -> f64 {
        convert::sensor_to_mech(self.inputs.encoder_vel_rots, self.params.mech_per_rot)
    }

    /// True if the last encoder reading was fresh.
    pub fn is_sensor_connected(&self) -> bool {
        self.inputs.encoder_connected
    }

    /// True if the motors are currently disabled in software.
    pub fn motors_disabled(&self) -> bool {
        self.motors_disabled
    }

    /// The goal as commanded, before range clamping.
    pub fn unclamped_goal(&self) -> f64 {
        self.goal_pos
    }

    /// The goal as published to the driver on the last cycle.
    pub fn clamped_goal(&self) -> f64 {
        self.clamped_goal_pos
    }

    /// The current allowed range as (min, max).
    pub fn allowed_range(&self) -> (f64, f64) {
        (self.min_pos, self.max_pos)
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::axis_driver::{
        sim::{Integrator, MechModel, MotorParams, SimParams},
        FfGains, PidGains, ProfileParams, SimAxisDriver,
    };

    /// A two-motor elevator on a 20 mm drum with a 0.1 m/rotation encoder
    /// ratio, travel capability 0 to 10 m.
    fn sim_params() -> SimParams {
        SimParams {
            step_s: 0.02,
            motor: MotorParams {
                nominal_voltage_v: 12.0,
                stall_torque_nm: 7.09,
                stall_current_a: 366.0,
                free_current_a: 2.0,
                free_speed_rads: 628.0,
            },
            motor_count: 2,
            reduction: 5.0,
            mech_per_rot: 0.1,
            model: MechModel::Linear {
                carriage_mass_kg: 6.0,
                drum_radius_m: 0.02,
            },
            min_pos: 0.0,
            max_pos: 10.0,
            simulate_gravity: false,
            start_pos: 1.0,
            integrator: Integrator::Rk4,
            pos_std_dev_rot: 0.0,
            vel_std_dev_rots: 0.0,
            seed: Some(7),
            encoder_inverted: false,
            encoder_magnet_offset_rot: 0.0,
            supply_voltage_v: 12.0,
        }
    }

    fn mech_params() -> Params {
        Params {
            axis_name: "elevator".into(),
            min_min_pos: 0.0,
            max_max_pos: 10.0,
            mech_per_rot: 0.1,
            brake_mode: true,
            gains: TunableGains {
                pid: PidGains {
                    kp: 2.0,
                    ki: 0.0,
                    kd: 0.0,
                },
                ff: FfGains::default(),
                profile: ProfileParams {
                    cruise_vel_rots: 20.0,
                    expo_kv: 1.0,
                    expo_ka: 0.1,
                },
                stator_current_limit_a: 80.0,
            },
        }
    }

    fn sim_mech() -> MechCtrl {
        let mut mech = MechCtrl::new(Box::new(SimAxisDriver::new(&sim_params())));
        mech.apply_params(mech_params())
            .expect("failed to apply test params");
        mech
    }

    /// An AxisDriver stub that records which trait methods are called and
    /// serves a fixed inputs snapshot.
    struct StubDriver {
        calls: Rc<RefCell<Vec<String>>>,
        inputs: Inputs,
    }

    impl StubDriver {
        fn new(inputs: Inputs) -> (Self, Rc<RefCell<Vec<String>>>) {
            let calls = Rc::new(RefCell::new(Vec::new()));
            (
                StubDriver {
                    calls: calls.clone(),
                    inputs,
                },
                calls,
            )
        }

        fn record(&self, call: &str) {
            self.calls.borrow_mut().push(call.into());
        }
    }

    impl AxisDriver for StubDriver {
        fn update_inputs(&mut self) -> Inputs {
            self.record("update_inputs");
            self.inputs
        }

        fn apply_outputs(&mut self) -> Outputs {
            self.record("apply_outputs");
            Outputs::default()
        }

        fn set_goal_pos(&mut self, _pos_rot: f64) {
            self.record("set_goal_pos");
        }

        fn set_encoder_position(&mut self, _pos_rot: f64) {
            self.record("set_encoder_position");
        }

        fn set_output_mode(&mut self, _mode: OutputMode) {
            self.record("set_output_mode");
        }

        fn set_override_voltage(&mut self, _volts: f64) {
            self.record("set_override_voltage");
        }

        fn set_override_current(&mut self, _amps: f64) {
            self.record("set_override_current");
        }

        fn set_motors_disabled(&mut self, _disabled: bool) {
            self.record("set_motors_disabled");
        }

        fn set_pid(&mut self, _gains: PidGains) {
            self.record("set_pid");
        }

        fn set_ff(&mut self, _gains: FfGains) {
            self.record("set_ff");
        }

        fn set_profile(&mut self, _profile: ProfileParams) {
            self.record("set_profile");
        }

        fn set_stator_current_limit(&mut self, _amps: f64) {
            self.record("set_stator_current_limit");
        }

        fn set_brake_mode(&mut self, _brake: bool) {
            self.record("set_brake_mode");
        }
    }

    #[test]
    fn test_goal_clamped_then_restored_by_widening() {
        let mut mech = sim_mech();

        mech.set_goal_position(5.0);
        mech.set_allowed_range(0.0, 2.0);

        let (_, report) = mech.proc(&InputData::default()).expect("proc failed");
        assert!(report.goal_limited);
        assert_eq!(mech.clamped_goal(), 2.0);
        assert_eq!(mech.unclamped_goal(), 5.0);

        // Widening the range restores the original goal without recommanding
        mech.set_allowed_range(0.0, 10.0);
        let (_, report) = mech.proc(&InputData::default()).expect("proc failed");
        assert!(!report.goal_limited);
        assert_eq!(mech.clamped_goal(), 5.0);
    }

    #[test]
    fn test_range_clamped_to_capabilities() {
        let mut mech = sim_mech();

        mech.set_allowed_range(-5.0, 20.0);
        assert_eq!(mech.allowed_range(), (0.0, 10.0));

        let (_, report) = mech.proc(&InputData::default()).expect("proc failed");
        assert!(report.min_bound_limited);
        assert!(report.max_bound_limited);

        // An in-capability range clears the flags
        mech.set_allowed_range(1.0, 9.0);
        let (_, report) = mech.proc(&InputData::default()).expect("proc failed");
        assert!(!report.min_bound_limited);
        assert!(!report.max_bound_limited);
    }

    #[test]
    fn test_set_goal_idempotent() {
        let mut mech = sim_mech();

        mech.set_goal_position(5.0);
        mech.proc(&InputData::default()).expect("proc failed");
        let first = mech.clamped_goal();

        // Recommanding the same goal changes nothing
        mech.set_goal_position(5.0);
        mech.proc(&InputData::default()).expect("proc failed");

        assert_eq!(mech.clamped_goal(), first);
        assert_eq!(mech.unclamped_goal(), 5.0);
    }

    #[test]
    fn test_goal_clamped_end_to_end() {
        // 1:1 encoder ratio, capability 0 to 1 m: a 1.5 m goal must be
        // published to the driver as exactly 1.0 rotation
        let mut sim = sim_params();
        sim.mech_per_rot = 1.0;

        let mut params = mech_params();
        params.mech_per_rot = 1.0;
        params.max_max_pos = 1.0;

        let mut mech = MechCtrl::new(Box::new(SimAxisDriver::new(&sim)));
        mech.apply_params(params).expect("failed to apply test params");

        mech.set_goal_position(1.5);
        let (output, report) = mech.proc(&InputData::default()).expect("proc failed");

        assert!(report.goal_limited);
        assert_eq!(mech.clamped_goal(), 1.0);
        assert!((output.inputs.encoder_goal_pos_rot - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_range_resolves_to_min() {
        let mut mech = sim_mech();

        // Bounds are not reordered against each other: with min > max the
        // goal clamp resolves to the min bound
        mech.set_goal_position(2.0);
        mech.set_allowed_range(3.0, 1.0);

        mech.proc(&InputData::default()).expect("proc failed");

        assert_eq!(mech.allowed_range(), (3.0, 1.0));
        assert_eq!(mech.clamped_goal(), 3.0);
    }

    #[test]
    fn test_goal_published_in_sensor_space() {
        let mut mech = sim_mech();

        mech.set_goal_position(2.0);
        let (output, _) = mech.proc(&InputData::default()).expect("proc failed");

        // 2.0 m at 0.1 m/rotation is 20 rotations
        assert!((output.inputs.encoder_goal_pos_rot - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_goal_holds_position() {
        let mech = sim_mech();

        // Goal starts at the measured position, 1.0 m start
        assert!((mech.unclamped_goal() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_motors_disabled_forces_zero_volts() {
        let mut mech = sim_mech();

        mech.set_output_mode(OutputMode::Voltage);
        mech.set_override_voltage(5.0);
        mech.set_motors_disabled(true);

        let (output, _) = mech.proc(&InputData::default()).expect("proc failed");

        assert!(output.outputs.motors_disabled);
        assert_eq!(output.outputs.applied_volts, 0.0);
    }

    #[test]
    fn test_closed_loop_reaches_goal() {
        let mut mech = sim_mech();

        mech.set_goal_position(2.5);

        for _ in 0..300 {
            mech.proc(&InputData::default()).expect("proc failed");
        }

        assert!(
            (mech.position() - 2.5).abs() < 0.05,
            "did not reach goal, at {}",
            mech.position()
        );
    }

    #[test]
    fn test_retune_pushes_only_changed_groups() {
        let (stub, calls) = StubDriver::new(Inputs {
            encoder_connected: true,
            lead_motor_connected: true,
            follower_motor_connected: true,
            ..Inputs::default()
        });
        let mut mech = MechCtrl::new(Box::new(stub));
        mech.apply_params(mech_params())
            .expect("failed to apply test params");

        // The initial application pushes every group
        let initial = calls.borrow().clone();
        assert!(initial.iter().any(|c| c == "set_pid"));
        assert!(initial.iter().any(|c| c == "set_ff"));
        assert!(initial.iter().any(|c| c == "set_profile"));
        assert!(initial.iter().any(|c| c == "set_stator_current_limit"));

        calls.borrow_mut().clear();

        // A retune of the PID group alone must not touch the other groups
        let mut gains = mech_params().gains;
        gains.pid.kp = 4.0;
        mech.proc(&InputData { gains: Some(gains) }).expect("proc failed");

        let retune = calls.borrow().clone();
        assert!(retune.iter().any(|c| c == "set_pid"));
        assert!(!retune.iter().any(|c| c == "set_ff"));
        assert!(!retune.iter().any(|c| c == "set_profile"));
        assert!(!retune.iter().any(|c| c == "set_stator_current_limit"));

        // Re-sending identical gains pushes nothing
        calls.borrow_mut().clear();
        mech.proc(&InputData { gains: Some(gains) }).expect("proc failed");
        let resend = calls.borrow().clone();
        assert!(!resend.iter().any(|c| c.starts_with("set_p")));
        assert!(!resend.iter().any(|c| c == "set_ff"));
        assert!(!resend.iter().any(|c| c == "set_stator_current_limit"));
    }

    #[test]
    fn test_inputs_refreshed_before_outputs_applied() {
        let (stub, calls) = StubDriver::new(Inputs::default());
        let mut mech = MechCtrl::new(Box::new(stub));
        mech.apply_params(mech_params())
            .expect("failed to apply test params");

        calls.borrow_mut().clear();
        mech.proc(&InputData::default()).expect("proc failed");

        let recorded = calls.borrow().clone();
        let update_idx = recorded.iter().position(|c| c == "update_inputs");
        let apply_idx = recorded.iter().position(|c| c == "apply_outputs");
        assert!(update_idx < apply_idx, "calls were {:?}", recorded);
    }

    #[test]
    fn test_stale_sensor_reported() {
        let (stub, _) = StubDriver::new(Inputs {
            encoder_connected: false,
            lead_motor_connected: true,
            follower_motor_connected: false,
            ..Inputs::default()
        });
        let mut mech = MechCtrl::new(Box::new(stub));
        mech.apply_params(mech_params())
            .expect("failed to apply test params");

        let (_, report) = mech.proc(&InputData::default()).expect("proc failed");

        assert!(report.sensor_stale);
        assert!(!report.lead_motor_stale);
        assert!(report.follower_motor_stale);
        assert!(!mech.is_sensor_connected());
    }

    #[test]
    fn test_zero_mech_per_rot_rejected() {
        let mut params = mech_params();
        params.mech_per_rot = 0.0;

        let mut mech = MechCtrl::new(Box::new(SimAxisDriver::new(&sim_params())));
        match mech.apply_params(params) {
            Err(MechCtrlError::InvalidMechPerRot(_)) => (),
            other => panic!("expected InvalidMechPerRot, got {:?}", other.err()),
        }
    }
}
