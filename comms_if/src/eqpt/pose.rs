//! # Pose Source Messages
//!
//! The pose source publishes full arm poses as six joint angles in radians.
//! This module defines the wire format and the calibrated [`JointTarget`]
//! snapshot the control loop works with.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::act::NUM_ACTS;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the arm. Joint index `i` is driven by actuator id
/// `i + 1`.
pub const NUM_JOINTS: usize = NUM_ACTS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A full arm pose as published by the pose source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PoseFrame {
    /// Target angle of each joint in radians, indexed by joint number.
    pub angles_rad: Vec<f64>,
}

/// A calibrated joint target snapshot.
///
/// Built from a [`PoseFrame`] by converting each angle from radians into
/// actuator rotations and applying the fixed mounting convention of joint 2,
/// which is sign-inverted relative to the pose source's frame.
///
/// A target is immutable once built and is only ever replaced as a whole, so
/// the control loop never observes a partially updated pose.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct JointTarget {
    /// Target position of each joint, in rotations.
    pub rotations: [f64; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised when converting a pose frame into a joint target.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PoseError {
    #[error("Insufficient pose data: expected at least 6 joint angles, found {0}")]
    InsufficientPoseData(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointTarget {
    /// Build a calibrated target from a raw pose frame.
    ///
    /// A frame with fewer than six angles is rejected whole, never partially
    /// applied. Angles beyond the sixth are ignored.
    pub fn from_pose(frame: &PoseFrame) -> Result<Self, PoseError> {
        if frame.angles_rad.len() < NUM_JOINTS {
            return Err(PoseError::InsufficientPoseData(frame.angles_rad.len()));
        }

        // Convert radians to rotations
        let mut rotations = [0.0; NUM_JOINTS];
        for (i, angle_rad) in frame.angles_rad.iter().take(NUM_JOINTS).enumerate() {
            rotations[i] = angle_rad / std::f64::consts::TAU;
        }

        // Joint 2 is mounted mirrored relative to the pose source's frame
        rotations[1] = -rotations[1];

        Ok(JointTarget { rotations })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_radians_to_rotations() {
        let frame = PoseFrame {
            angles_rad: vec![TAU, PI, 0.0, -PI, TAU, -TAU],
        };

        let target = JointTarget::from_pose(&frame).unwrap();

        assert_eq!(target.rotations[0], 1.0);
        assert_eq!(target.rotations[2], 0.0);
        assert_eq!(target.rotations[3], -0.5);
        assert_eq!(target.rotations[4], 1.0);
        assert_eq!(target.rotations[5], -1.0);
    }

    #[test]
    fn test_joint_2_sign_inversion() {
        let mut angles = vec![0.0; NUM_JOINTS];
        angles[1] = PI;

        let target = JointTarget::from_pose(&PoseFrame { angles_rad: angles }).unwrap();

        // The effective target of joint index 1 is always the negation of the
        // raw value
        assert_eq!(target.rotations[1], -0.5);
    }

    #[test]
    fn test_insufficient_pose_rejected() {
        let frame = PoseFrame {
            angles_rad: vec![0.0, 0.1, 0.2, 0.3],
        };

        assert_eq!(
            JointTarget::from_pose(&frame),
            Err(PoseError::InsufficientPoseData(4))
        );
    }

    #[test]
    fn test_extra_angles_ignored() {
        let frame = PoseFrame {
            angles_rad: vec![0.0; NUM_JOINTS + 2],
        };

        let target = JointTarget::from_pose(&frame).unwrap();
        assert_eq!(target.rotations, [0.0; NUM_JOINTS]);
    }
}
