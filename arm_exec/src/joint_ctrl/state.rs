//! Implementations for the JointCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    check_limits, transform, JointCtrlError, LimitViolation, Params, NUM_JOINTS,
};
use comms_if::eqpt::{
    act::{ActId, ActState, NUM_ACTS},
    pose::JointTarget,
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint control module state
#[derive(Default)]
pub struct JointCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Input data to Joint Control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// The joint target to track.
    pub target: JointTarget,

    /// The state of each actuator, as queried this cycle. The states are a
    /// snapshot owned by the current cycle, they are never cached across
    /// cycles.
    pub act_states: [ActState; NUM_ACTS],
}

/// Output demands from JointCtrl that the actuator client must dispatch.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct OutputData {
    /// Demanded actuator-native position of each actuator.
    pub act_pos: [f64; NUM_ACTS],
}

/// Status report for JointCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Offset-corrected encoder position of each joint this cycle.
    ///
    /// Units: rotations
    pub enc_pos_rot: [f64; NUM_JOINTS],

    /// The violation that failed the limit guard, if any.
    pub limit_violation: Option<LimitViolation>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for JointCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = JointCtrlError;

    /// Initialise the JointCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        // Load the parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };

        Ok(())
    }

    /// Perform cyclic processing of Joint Control.
    ///
    /// The limit guard runs before any demand is computed. A failing guard
    /// aborts processing, no demand must reach the actuators from a cycle
    /// whose measurements are out of limits.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Apply the calibration offsets to the raw encoder readings
        for i in 0..NUM_JOINTS {
            self.report.enc_pos_rot[i] =
                input_data.act_states[i].enc_pos - self.params.offset_rot[i];
        }

        // Guard against the static joint limits
        if let Err(violation) = check_limits(&self.report.enc_pos_rot, &self.params) {
            self.report.limit_violation = Some(violation);
            return Err(JointCtrlError::LimitViolation(violation));
        }

        // Map each joint target into the actuator's native frame
        let mut output = OutputData::default();

        for (i, act_id) in ActId::ALL.iter().enumerate() {
            output.act_pos[i] = transform::act_target_pos(
                input_data.target.rotations[i],
                self.params.offset_rot[i],
                input_data.act_states[i].enc_pos,
                input_data.act_states[i].pos,
                self.params.gear_ratio(*act_id),
            );
        }

        trace!("JointCtrl output act positions: {:?}", output.act_pos);

        Ok((output, self.report))
    }
}

impl JointCtrl {
    /// Create the module with explicit parameters rather than a parameter
    /// file.
    pub fn with_params(params: Params) -> Self {
        JointCtrl {
            params,
            report: StatusReport::default(),
        }
    }

    /// Run the limit guard alone over the given actuator states.
    ///
    /// Used while holding, where no demands are computed but the guard is
    /// still re-evaluated every cycle for diagnostics.
    pub fn guard(&self, act_states: &[ActState; NUM_ACTS]) -> Result<(), LimitViolation> {
        let mut enc_pos_rot = [0.0; NUM_JOINTS];
        for i in 0..NUM_JOINTS {
            enc_pos_rot[i] = act_states[i].enc_pos - self.params.offset_rot[i];
        }

        check_limits(&enc_pos_rot, &self.params)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::pose::PoseFrame;

    fn test_params() -> Params {
        Params {
            offset_rot: [0.37, 0.631, 0.789, 0.604, 0.68, 0.53],
            base_gear_ratio: 131.75,
            wrist_gear_ratio: 75.0,
            min_enc_pos_rot: [-0.1, -0.125, -0.25, -0.6, -0.75, -1.0],
            max_enc_pos_rot: [0.1, 0.0625, 0.125, 0.0625, 0.75, 1.0],
        }
    }

    fn test_input() -> InputData {
        let frame = PoseFrame {
            angles_rad: vec![0.0; NUM_JOINTS],
        };

        let mut act_states = [ActState::default(); NUM_ACTS];
        for (i, state) in act_states.iter_mut().enumerate() {
            // Raw encoder readings at the calibrated zero
            state.enc_pos = test_params().offset_rot[i];
            state.pos = 10.0;
        }

        InputData {
            target: JointTarget::from_pose(&frame).unwrap(),
            act_states,
        }
    }

    #[test]
    fn test_proc_is_pure() {
        let mut joint_ctrl = JointCtrl::with_params(test_params());
        let input = test_input();

        let (first, _) = joint_ctrl.proc(&input).unwrap();
        let (second, _) = joint_ctrl.proc(&input).unwrap();

        assert_eq!(first.act_pos, second.act_pos);
    }

    #[test]
    fn test_converged_input_holds_position() {
        let mut joint_ctrl = JointCtrl::with_params(test_params());
        let input = test_input();

        // With zero targets and encoders at the calibrated zero, every
        // actuator is commanded to its measured position
        let (output, report) = joint_ctrl.proc(&input).unwrap();

        for i in 0..NUM_ACTS {
            assert!((output.act_pos[i] - 10.0).abs() < 1e-12);
            assert!(report.enc_pos_rot[i].abs() < 1e-12);
        }
    }

    #[test]
    fn test_gear_ratio_groups() {
        let params = test_params();

        assert_eq!(params.gear_ratio(ActId::J1), 131.75);
        assert_eq!(params.gear_ratio(ActId::J3), 131.75);
        assert_eq!(params.gear_ratio(ActId::J4), 75.0);
        assert_eq!(params.gear_ratio(ActId::J6), 75.0);
    }

    #[test]
    fn test_limit_violation_aborts_proc() {
        let mut joint_ctrl = JointCtrl::with_params(test_params());
        let mut input = test_input();

        // Push joint 3's raw encoder reading over its upper limit
        input.act_states[2].enc_pos = test_params().offset_rot[2] + 0.2;

        match joint_ctrl.proc(&input) {
            Err(JointCtrlError::LimitViolation(violation)) => {
                assert_eq!(violation.act_id, ActId::J3);
            }
            other => panic!("Expected a limit violation, got {:?}", other.map(|(o, _)| o)),
        }
    }
}
