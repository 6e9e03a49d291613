//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable giving the root of the software installation.
///
/// Parameter files and session directories are resolved relative to this
/// root.
pub const SW_ROOT_ENV_VAR: &str = "AXIS_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
///
/// Returns `Err(())` if the `AXIS_SW_ROOT` environment variable is not set.
pub fn get_axis_sw_root() -> Result<PathBuf, ()> {
    match env::var(SW_ROOT_ENV_VAR) {
        Ok(v) => Ok(PathBuf::from(v)),
        Err(_) => Err(()),
    }
}
