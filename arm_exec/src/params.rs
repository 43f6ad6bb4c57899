//! Parameters structure for the arm control executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::act::NUM_ACTS;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the arm control executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmExecParams {
    // ---- NETWORK ----
    /// Endpoint the pose source publishes poses on.
    pub pose_endpoint: String,

    /// Endpoint of the actuator driver daemon for each actuator, in joint
    /// order.
    pub act_endpoints: [String; NUM_ACTS],

    // ---- TIMEOUTS ----
    /// Maximum time to wait for the response to a single actuator request.
    ///
    /// Units: milliseconds
    pub act_response_timeout_ms: u64,

    /// Maximum time to wait for a full six-actuator fan-out to complete.
    ///
    /// Units: milliseconds
    pub dispatch_timeout_ms: u64,
}
