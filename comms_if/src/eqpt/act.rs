//! # Actuator Equipment Types
//!
//! Messages exchanged with the actuator driver daemon. The daemon owns the
//! actuator bus and exposes one request/reply endpoint per actuator; these
//! types are the payloads carried on those endpoints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of actuators on the arm.
pub const NUM_ACTS: usize = 6;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the arm's actuators.
///
/// `J1` drives the base joint and `J6` the final wrist joint. Each id maps
/// permanently to the joint of the same number, so the joint index of an id
/// is always `id.index()`.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    J1,
    J2,
    J3,
    J4,
    J5,
    J6,
}

/// A demand for a single actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ActDemand {
    /// Move to the given actuator-native position. The velocity target is
    /// always zero in position mode, the motion profile being shaped by the
    /// acceleration and velocity limits instead.
    Position {
        pos: f64,
        accel_limit: f64,
        velocity_limit: f64,
    },

    /// Maintain the present position, without a new numeric target.
    Hold,

    /// Stop and disarm the actuator.
    Stop,
}

/// Request sent to the driver daemon for a single actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ActRequest {
    /// Read the actuator's current state.
    Query,

    /// Execute the wrapped demand.
    Demand(ActDemand),
}

/// Response returned by the driver daemon for a single actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ActResponse {
    /// Response to an [`ActRequest::Query`].
    State(ActState),

    /// The demand was accepted.
    Ack,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of a single actuator as reported by the driver.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct ActState {
    /// Measured position in the actuator's native frame.
    pub pos: f64,

    /// Raw output encoder position in rotations. Calibration offsets are not
    /// applied by the driver.
    pub enc_pos: f64,

    /// Fault code raised by the actuator, if any.
    pub fault: Option<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActId {
    /// All actuator ids in joint order.
    pub const ALL: [ActId; NUM_ACTS] = [
        ActId::J1,
        ActId::J2,
        ActId::J3,
        ActId::J4,
        ActId::J5,
        ActId::J6,
    ];

    /// The zero-based joint index this actuator drives.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The actuator driving the given zero-based joint index, or `None` if
    /// the index is out of range.
    pub fn from_index(index: usize) -> Option<ActId> {
        ActId::ALL.get(index).copied()
    }
}

impl fmt::Display for ActId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.index() + 1)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
