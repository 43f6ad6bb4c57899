//! Joint control module
//!
//! Converts calibrated joint targets into actuator-native position demands
//! from live feedback, guarding every cycle against the arm's static joint
//! limits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod limits;
mod params;
mod state;
mod transform;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use limits::*;
pub use params::*;
pub use state::*;
pub use transform::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of joints on the arm.
pub const NUM_JOINTS: usize = comms_if::eqpt::pose::NUM_JOINTS;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during JointCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum JointCtrlError {
    #[error("{0}")]
    LimitViolation(LimitViolation),
}
