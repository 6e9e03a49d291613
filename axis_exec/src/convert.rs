//! Unit conversion between mechanism space and sensor space.
//!
//! Mechanism space is the physical units of the controlled axis (metres of
//! carriage travel for a linear mechanism, radians of arm rotation for a
//! rotational one). Sensor space is encoder rotations. The two are related by
//! a fixed ratio: the mechanism displacement produced by one encoder
//! rotation.

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a mechanism-space quantity into encoder rotations.
///
/// `mech_per_rot` is the mechanism displacement per encoder rotation
/// (m/rotation or rad/rotation). Works for positions and velocities alike as
/// the scaling is linear.
pub fn mech_to_sensor(mech: f64, mech_per_rot: f64) -> f64 {
    mech / mech_per_rot
}

/// Convert encoder rotations into a mechanism-space quantity.
///
/// Exact inverse of [`mech_to_sensor`] up to floating point rounding.
pub fn sensor_to_mech(rot: f64, mech_per_rot: f64) -> f64 {
    rot * mech_per_rot
}
