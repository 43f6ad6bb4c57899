//! Shared test rig: scripted actuator drivers.
//!
//! Each mock driver shares its state with the test through an
//! `Arc<Mutex<..>>`, so the test can inject failures and inspect the demand
//! stream while the worker threads own the drivers themselves. Queries step a
//! simple motion model: the actuator travels a fixed fraction of the distance
//! to its last position demand, with the encoder tracking the travel through
//! the gear ratio.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arm_lib::act_client::{ActDriver, ActDriverError};
use arm_lib::joint_ctrl::{Params as JointCtrlParams, NUM_JOINTS};
use arm_lib::supervisor::Params as SupervisorParams;
use comms_if::eqpt::act::{ActDemand, ActId, ActState, NUM_ACTS};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Shared state of one mock actuator.
pub struct MockActState {
    /// Measured actuator-native position.
    pub pos: f64,

    /// Raw encoder position, in rotations.
    pub enc_pos: f64,

    /// Gear ratio between actuator-native and encoder-space travel.
    pub ratio: f64,

    /// Fault code to report on queries.
    pub fault: Option<u8>,

    /// Every demand received, in order.
    pub demands: Vec<ActDemand>,

    /// If true queries fail with a response timeout.
    pub fail_query: bool,

    /// If true demands fail with a response timeout.
    pub fail_demand: bool,

    /// Time the driver stalls before answering a demand.
    pub demand_delay: Option<Duration>,

    /// Fraction of the remaining distance to the last position demand
    /// travelled before each query.
    pub approach: f64,

    /// The last commanded position target, if any.
    pub target_pos: Option<f64>,
}

/// A scripted [`ActDriver`] over shared mock state.
pub struct MockActDriver {
    shared: Arc<Mutex<MockActState>>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MockActState {
    pub fn new(enc_pos: f64, ratio: f64) -> Self {
        Self {
            pos: 0.0,
            enc_pos,
            ratio,
            fault: None,
            demands: Vec::new(),
            fail_query: false,
            fail_demand: false,
            demand_delay: None,
            approach: 0.5,
            target_pos: None,
        }
    }

    /// Number of position demands received.
    pub fn num_position_demands(&self) -> usize {
        self.demands
            .iter()
            .filter(|d| matches!(d, ActDemand::Position { .. }))
            .count()
    }

    /// Number of hold demands received.
    pub fn num_hold_demands(&self) -> usize {
        self.demands
            .iter()
            .filter(|d| matches!(d, ActDemand::Hold))
            .count()
    }

    /// True if no position demand follows the first hold demand.
    pub fn no_position_after_hold(&self) -> bool {
        let first_hold = self.demands.iter().position(|d| matches!(d, ActDemand::Hold));

        match first_hold {
            Some(i) => self.demands[i..]
                .iter()
                .all(|d| !matches!(d, ActDemand::Position { .. })),
            None => true,
        }
    }
}

impl ActDriver for MockActDriver {
    fn query(&mut self) -> Result<ActState, ActDriverError> {
        let mut state = self.shared.lock().unwrap();

        if state.fail_query {
            return Err(ActDriverError::ResponseTimeout);
        }

        // Step the simulated motion toward the last position target. Moving
        // the actuator by delta moves the encoder by -delta/ratio.
        if let Some(target) = state.target_pos {
            let delta = (target - state.pos) * state.approach;
            state.pos += delta;
            state.enc_pos -= delta / state.ratio;
        }

        Ok(ActState {
            pos: state.pos,
            enc_pos: state.enc_pos,
            fault: state.fault,
        })
    }

    fn demand(&mut self, demand: ActDemand) -> Result<(), ActDriverError> {
        let delay = {
            let state = self.shared.lock().unwrap();
            state.demand_delay
        };

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut state = self.shared.lock().unwrap();

        if state.fail_demand {
            return Err(ActDriverError::ResponseTimeout);
        }

        state.demands.push(demand);

        if let ActDemand::Position { pos, .. } = demand {
            state.target_pos = Some(pos);
        }

        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// The flight calibration used across the scenario tests.
pub fn joint_ctrl_params() -> JointCtrlParams {
    JointCtrlParams {
        offset_rot: [0.37, 0.631, 0.789, 0.604, 0.68, 0.53],
        base_gear_ratio: 131.75,
        wrist_gear_ratio: 75.0,
        min_enc_pos_rot: [-0.1, -0.125, -0.25, -0.6, -0.75, -1.0],
        max_enc_pos_rot: [0.1, 0.0625, 0.125, 0.0625, 0.75, 1.0],
    }
}

pub fn supervisor_params() -> SupervisorParams {
    SupervisorParams {
        convergence_threshold: 0.3,
        accel_limit: 2.0,
        velocity_limit: 5.0,
    }
}

/// Build a six actuator rig consistent with the given joint control
/// parameters.
///
/// Each actuator starts with its raw encoder reading at the calibrated zero
/// plus `enc_error_rot`, i.e. an offset-corrected error of `enc_error_rot`.
pub fn make_rig(
    params: &JointCtrlParams,
    enc_error_rot: f64,
) -> (
    Vec<Arc<Mutex<MockActState>>>,
    [Box<dyn ActDriver>; NUM_ACTS],
) {
    let mut shared = Vec::with_capacity(NUM_JOINTS);

    for (i, act_id) in ActId::ALL.iter().enumerate() {
        let enc_pos = params.offset_rot[i] + enc_error_rot;
        shared.push(Arc::new(Mutex::new(MockActState::new(
            enc_pos,
            params.gear_ratio(*act_id),
        ))));
    }

    let driver = |i: usize| -> Box<dyn ActDriver> {
        Box::new(MockActDriver {
            shared: shared[i].clone(),
        })
    };

    let drivers = [
        driver(0),
        driver(1),
        driver(2),
        driver(3),
        driver(4),
        driver(5),
    ];

    (shared, drivers)
}
