//! # Axis Control Executable
//!
//! This executable runs the mechanism controller for one bounded axis
//! against the physics-simulation driver:
//!
//!     - Initialise the session, logger and parameters
//!     - Initialise MechCtrl over a SimAxisDriver
//!     - Main loop (fixed period):
//!         - Step through the commanded goal sequence
//!         - MechCtrl cyclic processing
//!         - Telemetry archiving
//!
//! Swapping the simulation driver for a hardware one changes nothing else
//! in this file, the controller is back-end agnostic.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Parameters for the axis executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use axis_lib::axis_driver::{SimAxisDriver, SimParams};
use axis_lib::mech_ctrl::{InputData, MechCtrl};
use params::ExecParams;
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new("axis_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Axis Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("axis_exec.toml").wrap_err("Failed to load executable parameters")?;
    exec_params
        .validate()
        .wrap_err("Invalid executable parameters")?;
    let sim_params: SimParams = util::params::load("sim_axis_driver.toml")
        .wrap_err("Failed to load simulation driver parameters")?;

    info!("Parameters loaded");

    // Snapshot the loaded parameters into the session for later analysis
    session.save("exec_params.json", &exec_params);

    // ---- MODULE INITIALISATION ----

    let driver = SimAxisDriver::new(&sim_params);

    let mut mech = MechCtrl::new(Box::new(driver));
    mech.init("mech_ctrl.toml", &session)
        .wrap_err("Failed to initialise MechCtrl")?;

    info!("MechCtrl initialised");

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let cycles_per_goal = (exec_params.goal_dwell_s / exec_params.cycle_period_s).ceil() as u64;
    let one_hz_cycles = ((1.0 / exec_params.cycle_period_s).round() as u64).max(1);

    let mut goal_idx = 0usize;
    let mut num_cycles = 0u64;
    let mut num_consec_overruns = 0u64;

    if let Some(&goal) = exec_params.goal_sequence.first() {
        info!("Commanding goal {:.3}", goal);
        mech.set_goal_position(goal);
    }

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Step the goal sequence once the dwell on the current goal elapses
        if num_cycles > 0 && num_cycles % cycles_per_goal == 0 {
            goal_idx += 1;
            match exec_params.goal_sequence.get(goal_idx) {
                Some(&goal) => {
                    info!("Commanding goal {:.3}", goal);
                    mech.set_goal_position(goal);
                }
                None => {
                    info!("Goal sequence complete, exiting");
                    break;
                }
            }
        }

        // ---- MODULE PROCESSING ----

        let (output, report) = mech
            .proc(&InputData::default())
            .wrap_err("MechCtrl processing failed")?;

        if report.sensor_stale {
            warn!("Encoder reading is stale");
        }
        if report.lead_motor_stale || report.follower_motor_stale {
            warn!("Motor reading is stale");
        }

        // ---- TELEMETRY ----

        // Archiving failures must not bring the control loop down
        if let Err(e) = mech.write() {
            warn!("Failed to archive MechCtrl data: {}", e);
        }

        if num_cycles % one_hz_cycles == 0 {
            info!(
                "pos {:.3}, goal {:.3}, applied {:.2} V",
                mech.position(),
                mech.clamped_goal(),
                output.outputs.applied_volts
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_overruns = 0;
                thread::sleep(d);
            }
            None => {
                num_consec_overruns += 1;
                warn!(
                    "Cycle overran by {:.6} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s,
                    num_consec_overruns
                );
            }
        }

        num_cycles += 1;
    }

    Ok(())
}
