//! Closed-loop scenario tests for the motion supervisor.
//!
//! These run the supervisor state machine against scripted actuator drivers,
//! covering convergence to holding, rejection of undersized poses, the limit
//! violation fallback and cycle-local actuator failures.

mod common;

use std::time::Duration;

use arm_lib::act_client::ActClient;
use arm_lib::data_store::DataStore;
use arm_lib::joint_ctrl::JointCtrl;
use arm_lib::supervisor::{MotionState, Supervisor};
use comms_if::eqpt::pose::{JointTarget, PoseFrame};

use common::*;

/// Maximum number of cycles a converging rig may take to settle into holding.
const MAX_CONVERGENCE_CYCLES: usize = 50;

fn zero_pose_target() -> JointTarget {
    JointTarget::from_pose(&PoseFrame {
        angles_rad: vec![0.0; 6],
    })
    .unwrap()
}

#[test]
fn scenario_a_converges_to_holding() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.05);

    let mut ds = DataStore::default();
    ds.joint_ctrl = JointCtrl::with_params(joint_ctrl_params());
    ds.latest_target = Some(zero_pose_target());

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));
    let mut supervisor = Supervisor::with_params(supervisor_params());

    // First step observes the target and begins tracking
    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::Tracking);

    // With converging feedback the supervisor must settle into holding
    // within a bounded number of cycles
    let mut cycles = 0;
    while supervisor.state() != MotionState::Holding {
        assert!(
            cycles < MAX_CONVERGENCE_CYCLES,
            "no convergence after {} cycles",
            MAX_CONVERGENCE_CYCLES
        );

        supervisor.step(&mut ds, &mut act_client);
        cycles += 1;
    }

    for state in &shared {
        let state = state.lock().unwrap();

        // Tracking dispatched numeric targets, then exactly one hold at the
        // transition
        assert!(state.num_position_demands() > 0);
        assert_eq!(state.num_hold_demands(), 1);
        assert!(state.no_position_after_hold());
    }

    // Every subsequent cycle re-issues the hold demand
    supervisor.step(&mut ds, &mut act_client);
    supervisor.step(&mut ds, &mut act_client);

    for state in &shared {
        let state = state.lock().unwrap();
        assert_eq!(state.num_hold_demands(), 3);
        assert!(state.no_position_after_hold());
    }
}

#[test]
fn scenario_b_insufficient_pose_is_rejected() {
    // Start away from the target so tracking does not converge during the
    // test
    let (_shared, drivers) = make_rig(&joint_ctrl_params(), 0.05);

    let mut ds = DataStore::default();
    ds.joint_ctrl = JointCtrl::with_params(joint_ctrl_params());

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));
    let mut supervisor = Supervisor::with_params(supervisor_params());

    // A pose with only 4 of 6 angles is rejected whole and no target is set
    let short_frame = PoseFrame {
        angles_rad: vec![0.1, 0.2, 0.3, 0.4],
    };
    assert!(JointTarget::from_pose(&short_frame).is_err());

    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::WaitingForTarget);

    // A full pose is accepted and tracking begins
    ds.latest_target = Some(zero_pose_target());
    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::Tracking);

    // A later undersized pose leaves the previous target untouched and the
    // supervisor in its current state
    let previous_target = ds.latest_target;
    if let Ok(target) = JointTarget::from_pose(&short_frame) {
        ds.latest_target = Some(target);
    }

    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(ds.latest_target, previous_target);
    assert_eq!(supervisor.state(), MotionState::Tracking);
}

#[test]
fn scenario_c_limit_violation_falls_back_to_holding() {
    let params = joint_ctrl_params();
    let (shared, drivers) = make_rig(&params, 0.0);

    // Push joint 3 (zero based index 2) over its upper limit
    shared[2].lock().unwrap().enc_pos = params.offset_rot[2] + 0.2;

    let mut ds = DataStore::default();
    ds.joint_ctrl = JointCtrl::with_params(params);
    ds.latest_target = Some(zero_pose_target());

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));
    let mut supervisor = Supervisor::with_params(supervisor_params());

    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::Tracking);

    // The guard fails on the first tracking cycle: no demand is dispatched
    // and the supervisor falls back to holding
    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::Holding);
    assert!(supervisor.report().degraded);

    for state in &shared {
        assert!(state.lock().unwrap().demands.is_empty());
    }

    // Hold demands begin on the next cycle and repeat every cycle
    supervisor.step(&mut ds, &mut act_client);
    supervisor.step(&mut ds, &mut act_client);

    for state in &shared {
        let state = state.lock().unwrap();
        assert_eq!(state.num_position_demands(), 0);
        assert_eq!(state.num_hold_demands(), 2);
    }
}

#[test]
fn scenario_d_failed_dispatch_aborts_the_cycle() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.05);

    // Queries succeed but actuator J4's demands time out
    shared[3].lock().unwrap().fail_demand = true;

    let mut ds = DataStore::default();
    ds.joint_ctrl = JointCtrl::with_params(joint_ctrl_params());
    ds.latest_target = Some(zero_pose_target());

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));
    let mut supervisor = Supervisor::with_params(supervisor_params());

    supervisor.step(&mut ds, &mut act_client);
    assert_eq!(supervisor.state(), MotionState::Tracking);

    // The dispatch failure is a cycle error, not a silent partial success:
    // the cycle aborts and tracking is retried next cycle
    supervisor.step(&mut ds, &mut act_client);
    assert!(supervisor.report().cycle_aborted);
    assert_eq!(supervisor.state(), MotionState::Tracking);
    assert_eq!(ds.num_consec_act_comm_errors, 1);

    // Once the actuator recovers the loop converges as normal
    shared[3].lock().unwrap().fail_demand = false;

    let mut cycles = 0;
    while supervisor.state() != MotionState::Holding {
        assert!(cycles < 50, "no convergence after recovery");
        supervisor.step(&mut ds, &mut act_client);
        cycles += 1;
    }
}

#[test]
fn holding_never_resumes_tracking() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.01);

    let mut ds = DataStore::default();
    ds.joint_ctrl = JointCtrl::with_params(joint_ctrl_params());
    ds.latest_target = Some(zero_pose_target());

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));
    let mut supervisor = Supervisor::with_params(supervisor_params());

    let mut cycles = 0;
    while supervisor.state() != MotionState::Holding {
        assert!(cycles < MAX_CONVERGENCE_CYCLES);
        supervisor.step(&mut ds, &mut act_client);
        cycles += 1;
    }

    // A new target arriving while holding must not restart tracking
    ds.latest_target = Some(
        JointTarget::from_pose(&PoseFrame {
            angles_rad: vec![0.05, 0.0, 0.0, 0.0, 0.0, 0.0],
        })
        .unwrap(),
    );

    for _ in 0..5 {
        supervisor.step(&mut ds, &mut act_client);
        assert_eq!(supervisor.state(), MotionState::Holding);
    }

    for state in &shared {
        assert!(state.lock().unwrap().no_position_after_hold());
    }
}
