//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::pose::JointTarget;

use crate::joint_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Pose source
    /// The most recent full joint target, or `None` if no full pose has been
    /// received yet.
    ///
    /// The target is only ever replaced as a whole six joint snapshot. It is
    /// retained across cycles so an invalid pose frame never clears a valid
    /// target.
    pub latest_target: Option<JointTarget>,

    // JointCtrl
    pub joint_ctrl: joint_ctrl::JointCtrl,
    pub joint_ctrl_input: joint_ctrl::InputData,
    pub joint_ctrl_output: joint_ctrl::OutputData,
    pub joint_ctrl_status_rpt: joint_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive actuator communication errors
    pub num_consec_act_comm_errors: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.joint_ctrl_input = joint_ctrl::InputData::default();
        self.joint_ctrl_output = joint_ctrl::OutputData::default();
        self.joint_ctrl_status_rpt = joint_ctrl::StatusReport::default();
    }
}
