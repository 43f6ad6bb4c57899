//! Static joint limit guard

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use std::fmt;

// Internal
use super::{Params, NUM_JOINTS};
use comms_if::eqpt::act::ActId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A joint limit violation.
///
/// Identifies the first violating joint (lowest joint index first, lower
/// bound checked before upper) together with the measured value and the bound
/// it crossed. This is diagnostic information only, it is not used for
/// partial recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LimitViolation {
    /// The actuator driving the violating joint.
    pub act_id: ActId,

    /// Which bound was crossed.
    pub bound: LimitBound,

    /// The offset-corrected encoder measurement, in rotations.
    pub value: f64,

    /// The value of the crossed bound, in rotations.
    pub limit: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The bound crossed by an out-of-limits measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitBound {
    Lower,
    Upper,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check a full set of offset-corrected encoder measurements against the
/// static joint limits.
///
/// Both bounds are inclusive: a measurement exactly equal to a bound passes.
/// Joints are checked lowest index first and for each joint the lower bound
/// is checked before the upper, so the reported violation is always the first
/// in that order.
pub fn check_limits(
    enc_pos_rot: &[f64; NUM_JOINTS],
    params: &Params,
) -> Result<(), LimitViolation> {
    for (i, act_id) in ActId::ALL.iter().enumerate() {
        if enc_pos_rot[i] < params.min_enc_pos_rot[i] {
            return Err(LimitViolation {
                act_id: *act_id,
                bound: LimitBound::Lower,
                value: enc_pos_rot[i],
                limit: params.min_enc_pos_rot[i],
            });
        }
        if enc_pos_rot[i] > params.max_enc_pos_rot[i] {
            return Err(LimitViolation {
                act_id: *act_id,
                bound: LimitBound::Upper,
                value: enc_pos_rot[i],
                limit: params.max_enc_pos_rot[i],
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            LimitBound::Lower => write!(
                f,
                "Joint {} out of limits: {} is below the lower limit ({})",
                self.act_id, self.value, self.limit
            ),
            LimitBound::Upper => write!(
                f,
                "Joint {} out of limits: {} is above the upper limit ({})",
                self.act_id, self.value, self.limit
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
