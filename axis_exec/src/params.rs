//! Parameters structure for the axis executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors in a loaded executable parameter set.
#[derive(Debug, thiserror::Error)]
pub enum ExecParamsError {
    #[error("cycle_period_s must be positive and finite, got {0}")]
    InvalidCyclePeriod(f64),

    #[error("goal_dwell_s must be positive and finite, got {0}")]
    InvalidGoalDwell(f64),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the axis executable.
#[derive(Debug, Deserialize, Serialize)]
pub struct ExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Goal positions commanded in order, one per dwell period. The
    /// executable exits once the last goal's dwell elapses.
    ///
    /// Units: mechanism units (m or rad)
    pub goal_sequence: Vec<f64>,

    /// Time to dwell on each goal before commanding the next.
    ///
    /// Units: seconds
    pub goal_dwell_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ExecParams {
    /// Check the loaded values are usable by the control loop.
    ///
    /// The cycle period and dwell both feed duration and cycle-count
    /// arithmetic, so a non-positive or non-finite value would panic the
    /// main loop rather than fail cleanly here.
    pub fn validate(&self) -> Result<(), ExecParamsError> {
        if !self.cycle_period_s.is_finite() || self.cycle_period_s <= 0.0 {
            return Err(ExecParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }
        if !self.goal_dwell_s.is_finite() || self.goal_dwell_s <= 0.0 {
            return Err(ExecParamsError::InvalidGoalDwell(self.goal_dwell_s));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> ExecParams {
        ExecParams {
            cycle_period_s: 0.02,
            goal_sequence: vec![0.5, 1.2],
            goal_dwell_s: 3.0,
        }
    }

    #[test]
    fn test_valid_params_accepted() {
        assert!(valid_params().validate().is_ok());
    }

    #[test]
    fn test_zero_dwell_rejected() {
        let mut params = valid_params();
        params.goal_dwell_s = 0.0;

        match params.validate() {
            Err(ExecParamsError::InvalidGoalDwell(_)) => (),
            other => panic!("expected InvalidGoalDwell, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_period_rejected() {
        let mut params = valid_params();
        params.cycle_period_s = -0.02;

        match params.validate() {
            Err(ExecParamsError::InvalidCyclePeriod(_)) => (),
            other => panic!("expected InvalidCyclePeriod, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut params = valid_params();
        params.cycle_period_s = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = valid_params();
        params.goal_dwell_s = f64::INFINITY;
        assert!(params.validate().is_err());
    }
}
