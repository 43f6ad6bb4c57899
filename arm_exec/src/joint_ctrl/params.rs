//! Parameters structure for JointCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::NUM_JOINTS;
use comms_if::eqpt::act::ActId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Joint control.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- CALIBRATION ----
    /// Encoder calibration offset of each joint, subtracted from the raw
    /// encoder reading to align it with the calibrated zero. Set at startup,
    /// never mutated afterwards.
    ///
    /// Units: rotations
    pub offset_rot: [f64; NUM_JOINTS],

    /// Gear ratio converting encoder-space distance into actuator-native
    /// distance for the base group of joints (J1-J3).
    pub base_gear_ratio: f64,

    /// Gear ratio converting encoder-space distance into actuator-native
    /// distance for the wrist group of joints (J4-J6).
    pub wrist_gear_ratio: f64,

    // ---- CAPABILITIES ----
    /// Minimum joint absolute position (lowest negative value), in
    /// offset-corrected encoder space.
    ///
    /// Units: rotations
    pub min_enc_pos_rot: [f64; NUM_JOINTS],

    /// Maximum joint absolute position (highest positive value), in
    /// offset-corrected encoder space.
    ///
    /// Units: rotations
    pub max_enc_pos_rot: [f64; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// The gear ratio of the joint driven by the given actuator.
    ///
    /// The ratio is a static lookup from the actuator id: the wrist group
    /// (J4-J6) shares one ratio, the base group (J1-J3) another.
    pub fn gear_ratio(&self, act_id: ActId) -> f64 {
        if act_id.index() >= 3 {
            self.wrist_gear_ratio
        } else {
            self.base_gear_ratio
        }
    }
}
