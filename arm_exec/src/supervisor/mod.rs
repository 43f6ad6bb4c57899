//! # Motion Supervisor module
//!
//! This module implements the [`Supervisor`] state machine orchestrating the
//! arm's closed loop. The machine is broken down into three motion states:
//!
//! - `WaitingForTarget` - No joint target has been received from the pose
//!   source yet.
//! - `Tracking` - Actively tracking the latest target: each cycle the six
//!   actuators are queried, the limit guard is run, fresh position demands
//!   are computed from live feedback and dispatched.
//! - `Holding` - The arm holds its present position. Entered either once
//!   every actuator has converged on its demanded position, or as the
//!   fallback after a limit violation. Once entered it is never left.
//!
//! All cyclic errors are handled inside [`Supervisor::step`]: limit
//! violations suppress tracking in favour of holding, and actuator
//! communication failures abort the remainder of the cycle with the next
//! natural cycle acting as the retry. None of them terminate the process.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// Internal
use crate::act_client::{ActClient, ActClientError};
use crate::data_store::DataStore;
use crate::joint_ctrl::{InputData as JointCtrlInput, JointCtrlError};
use comms_if::eqpt::act::{ActDemand, ActId, ActState, NUM_ACTS};
use util::module::State;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Limit of the number of consecutive actuator communication errors before an
/// error is raised in the log.
const MAX_ACT_COMM_ERROR_LIMIT: u64 = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Motion supervisor state machine.
pub struct Supervisor {
    /// Parameters for the supervisor.
    params: Params,

    /// The current motion state.
    state: MotionState,

    /// True if holding was entered through a limit violation rather than
    /// through convergence.
    degraded: bool,

    /// Status report of the most recent step.
    report: StatusReport,
}

/// Parameters for the Motion Supervisor.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Maximum absolute difference between a commanded and measured
    /// actuator-native position for an actuator to count as arrived. All six
    /// actuators must be within this threshold simultaneously for the
    /// supervisor to settle into holding.
    pub convergence_threshold: f64,

    /// Acceleration limit applied to every position demand.
    pub accel_limit: f64,

    /// Velocity limit applied to every position demand.
    pub velocity_limit: f64,
}

/// Status report for Supervisor processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// The motion state at the end of the step.
    pub state: MotionState,

    /// True if holding was entered through a limit violation.
    pub degraded: bool,

    /// True if an actuator communication error aborted this cycle.
    pub cycle_aborted: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motion states of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionState {
    /// No joint target has been received yet.
    WaitingForTarget,

    /// Actively tracking the latest joint target.
    Tracking,

    /// Holding the current position. There is no transition out of this
    /// state.
    Holding,
}

/// Errors that can occur in the motion supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Failed to load Supervisor params: {0}")]
    ParamLoadError(util::params::LoadError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Supervisor {
    /// Initialise the supervisor.
    ///
    /// Expected init data is the path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, SupervisorError> {
        let params = match util::params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(SupervisorError::ParamLoadError(e)),
        };

        Ok(Self::with_params(params))
    }

    /// Create the supervisor with explicit parameters rather than a parameter
    /// file.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            state: MotionState::WaitingForTarget,
            degraded: false,
            report: StatusReport::default(),
        }
    }

    /// The current motion state.
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Status report of the most recent step.
    pub fn report(&self) -> StatusReport {
        self.report
    }

    /// Perform one cycle of motion supervision.
    ///
    /// Queries feedback, guards, transforms and dispatches according to the
    /// current motion state. All cyclic errors are handled here, none
    /// propagate to the caller.
    pub fn step(&mut self, ds: &mut DataStore, act_client: &mut ActClient) {
        self.report = StatusReport::default();

        match self.state {
            MotionState::WaitingForTarget => {
                // Explicit check for the first full target, nothing to do
                // until one arrives
                if ds.latest_target.is_some() {
                    self.transition(MotionState::Tracking);
                } else if ds.is_1_hz_cycle {
                    info!("Waiting for pose data");
                }
            }
            MotionState::Tracking => self.step_tracking(ds, act_client),
            MotionState::Holding => self.step_holding(ds, act_client),
        }

        self.report.state = self.state;
        self.report.degraded = self.degraded;
    }

    /// Perform one cycle of target tracking.
    fn step_tracking(&mut self, ds: &mut DataStore, act_client: &mut ActClient) {
        // The target was observed before entering Tracking, and targets are
        // never cleared, so it must still be present
        let target = match ds.latest_target {
            Some(t) => t,
            None => {
                warn!("Tracking with no target set, reverting to waiting");
                self.transition(MotionState::WaitingForTarget);
                return;
            }
        };

        // Query fresh feedback from all six actuators
        let act_states = match act_client.query_all() {
            Ok(s) => s,
            Err(e) => {
                self.abort_cycle(ds, e);
                return;
            }
        };

        warn_faults(&act_states);

        // Guard the measurements and map the target into each actuator's
        // native frame
        ds.joint_ctrl_input = JointCtrlInput { target, act_states };

        let output = match ds.joint_ctrl.proc(&ds.joint_ctrl_input) {
            Ok((output, report)) => {
                ds.joint_ctrl_output = output;
                ds.joint_ctrl_status_rpt = report;
                output
            }
            Err(JointCtrlError::LimitViolation(violation)) => {
                warn!("{}", violation);
                warn!("Joint limit violated, falling back to holding the current position");

                self.degraded = true;
                self.transition(MotionState::Holding);
                return;
            }
        };

        // Check per-actuator convergence of the measured positions against
        // this cycle's demands
        let converged = (0..NUM_ACTS).all(|i| {
            (act_states[i].pos - output.act_pos[i]).abs() < self.params.convergence_threshold
        });

        if converged {
            info!(
                "All actuators within {} of their targets, holding position",
                self.params.convergence_threshold
            );

            match act_client.hold_all() {
                Ok(()) => {
                    ds.num_consec_act_comm_errors = 0;
                    self.transition(MotionState::Holding);
                }
                Err(e) => self.abort_cycle(ds, e),
            }
        } else {
            let mut demands = [ActDemand::Hold; NUM_ACTS];
            for (demand, pos) in demands.iter_mut().zip(output.act_pos.iter()) {
                *demand = ActDemand::Position {
                    pos: *pos,
                    accel_limit: self.params.accel_limit,
                    velocity_limit: self.params.velocity_limit,
                };
            }

            trace!("Dispatching position demands: {:?}", output.act_pos);

            match act_client.demand_all(demands) {
                Ok(()) => ds.num_consec_act_comm_errors = 0,
                Err(e) => self.abort_cycle(ds, e),
            }
        }
    }

    /// Perform one cycle of position holding.
    ///
    /// The limit guard is still re-evaluated every cycle for diagnostics,
    /// but its result no longer changes behaviour: the hold demand is issued
    /// regardless, keeping the arm stalled in place.
    fn step_holding(&mut self, ds: &mut DataStore, act_client: &mut ActClient) {
        match act_client.query_all() {
            Ok(act_states) => {
                warn_faults(&act_states);

                if let Err(violation) = ds.joint_ctrl.guard(&act_states) {
                    warn!("{}", violation);
                }
            }
            Err(e) => {
                warn!("Actuator query failed while holding: {}", e);
                ds.num_consec_act_comm_errors += 1;
            }
        }

        match act_client.hold_all() {
            Ok(()) => ds.num_consec_act_comm_errors = 0,
            Err(e) => {
                warn!("Hold dispatch failed: {}", e);
                ds.num_consec_act_comm_errors += 1;
            }
        }
    }

    /// Abandon the rest of the cycle after an actuator communication failure.
    ///
    /// No demand is dispatched from a cycle whose feedback or fan-out was
    /// incomplete, the next natural cycle is the retry.
    fn abort_cycle(&mut self, ds: &mut DataStore, error: ActClientError) {
        warn!("Cycle aborted: {}", error);

        self.report.cycle_aborted = true;
        ds.num_consec_act_comm_errors += 1;

        if ds.num_consec_act_comm_errors == MAX_ACT_COMM_ERROR_LIMIT {
            error!(
                "Maximum number of consecutive actuator communication errors ({}) reached",
                MAX_ACT_COMM_ERROR_LIMIT
            );
        }
    }

    /// Transition to a new motion state.
    fn transition(&mut self, new_state: MotionState) {
        info!("Supervisor state change: {} -> {}", self.state, new_state);
        self.state = new_state;
    }
}

impl Default for MotionState {
    fn default() -> Self {
        MotionState::WaitingForTarget
    }
}

impl Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionState::WaitingForTarget => write!(f, "MotionState::WaitingForTarget"),
            MotionState::Tracking => write!(f, "MotionState::Tracking"),
            MotionState::Holding => write!(f, "MotionState::Holding"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Issue a warning for every actuator reporting a fault code.
///
/// Fault handling is the driver's concern, the supervisor only reports.
fn warn_faults(act_states: &[ActState; NUM_ACTS]) {
    for (i, state) in act_states.iter().enumerate() {
        if let Some(fault) = state.fault {
            warn!("Actuator {} reports fault code {}", ActId::ALL[i], fault);
        }
    }
}
