//! Fan-out behaviour tests for the actuator client.

mod common;

use std::time::Duration;

use arm_lib::act_client::{ActClient, ActClientError, ActDriverError};
use comms_if::eqpt::act::{ActDemand, ActId, NUM_ACTS};

use common::*;

#[test]
fn query_all_returns_states_in_joint_order() {
    let params = joint_ctrl_params();
    let (shared, drivers) = make_rig(&params, 0.0);

    // Give each actuator a distinctive position
    for (i, state) in shared.iter().enumerate() {
        state.lock().unwrap().pos = i as f64 * 10.0;
    }

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));

    let states = act_client.query_all().unwrap();
    for (i, state) in states.iter().enumerate() {
        assert_eq!(state.pos, i as f64 * 10.0);
        assert_eq!(state.enc_pos, params.offset_rot[i]);
    }
}

#[test]
fn demand_all_reaches_every_actuator() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.0);
    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));

    act_client.stop_all().unwrap();
    act_client.hold_all().unwrap();

    for state in &shared {
        let state = state.lock().unwrap();
        assert_eq!(
            state.demands,
            vec![ActDemand::Stop, ActDemand::Hold]
        );
    }
}

#[test]
fn failed_demand_is_a_typed_error() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.0);
    shared[4].lock().unwrap().fail_demand = true;

    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));

    match act_client.hold_all() {
        Err(ActClientError::ActError { id, source }) => {
            assert_eq!(id, ActId::J5);
            assert_eq!(source, ActDriverError::ResponseTimeout);
        }
        other => panic!("Expected an actuator error, got {:?}", other),
    }
}

#[test]
fn slow_actuator_times_out_the_fan_out() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.0);

    // Actuator J2 stalls for far longer than the fan-out timeout
    shared[1].lock().unwrap().demand_delay = Some(Duration::from_millis(200));

    let mut act_client = ActClient::new(drivers, Duration::from_millis(20));

    // The fan-out must not silently proceed with five of six
    // acknowledgements
    match act_client.hold_all() {
        Err(ActClientError::DispatchIncomplete { missing, .. }) => {
            assert_eq!(missing, vec![ActId::J2]);
        }
        other => panic!("Expected an incomplete dispatch, got {:?}", other),
    }

    // The stale reply from the abandoned fan-out must not satisfy a later
    // one. Wait for the stalled worker to finish serving the first demand
    // before issuing the next.
    shared[1].lock().unwrap().demand_delay = None;
    std::thread::sleep(Duration::from_millis(250));

    act_client.hold_all().unwrap();

    // Both holds eventually reach the actuator, in order
    let state = shared[1].lock().unwrap();
    assert_eq!(state.demands, vec![ActDemand::Hold, ActDemand::Hold]);
}

#[test]
fn demands_are_delivered_in_order() {
    let (shared, drivers) = make_rig(&joint_ctrl_params(), 0.0);
    let mut act_client = ActClient::new(drivers, Duration::from_millis(1000));

    let mut expected = Vec::new();
    for i in 0..10 {
        let pos = i as f64;
        act_client
            .demand_all([ActDemand::Position {
                pos,
                accel_limit: 2.0,
                velocity_limit: 5.0,
            }; NUM_ACTS])
            .unwrap();
        expected.push(pos);
    }

    for state in &shared {
        let state = state.lock().unwrap();
        let received: Vec<f64> = state
            .demands
            .iter()
            .filter_map(|d| match d {
                ActDemand::Position { pos, .. } => Some(*pos),
                _ => None,
            })
            .collect();
        assert_eq!(received, expected);
    }
}
