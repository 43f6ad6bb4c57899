//! Main arm control executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Disarm all actuators into a known stopped state
//!     - Main loop:
//!         - Shutdown signal check
//!         - Pose acquisition from the pose source
//!         - Motion supervision:
//!             - Actuator state acquisition (six-way concurrent fan-out)
//!             - Joint limit guarding
//!             - Coordinate transformation
//!             - Actuator demand dispatch (six-way concurrent fan-out)
//!         - Telemetry
//!         - Cycle management
//!
//! # Modules
//!
//! All cyclicly processed modules (e.g. `joint_ctrl`) shall meet the
//! following requirements:
//!     1. Provide a public struct implementing the `util::module::State`
//!        trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    act_client::{ActClient, ActDriver, ZmqActDriver},
    data_store::DataStore,
    params::ArmExecParams,
    pose_client::PoseClient,
    supervisor::Supervisor,
    CYCLE_FREQUENCY_HZ, CYCLE_PERIOD_S,
};
use comms_if::eqpt::act::NUM_ACTS;
use comms_if::eqpt::pose::JointTarget;
use comms_if::net::zmq;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Precision Arm Control Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- SHUTDOWN SIGNAL ----

    // The flag is checked once per cycle boundary, never mid fan-out, so a
    // shutdown always leaves the actuators with a completed command set.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
            .wrap_err("Failed to set the shutdown signal handler")?;
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.joint_ctrl
        .init("joint_ctrl.toml", &session)
        .wrap_err("Failed to initialise JointCtrl")?;
    info!("JointCtrl init complete");

    let mut supervisor =
        Supervisor::init("supervisor.toml").wrap_err("Failed to initialise the Supervisor")?;
    info!("Supervisor init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    let mut pose_client = PoseClient::new(&zmq_ctx, &exec_params.pose_endpoint)
        .wrap_err("Failed to initialise the PoseClient")?;
    info!("PoseClient initialised");

    let mut act_client = {
        let driver = |index: usize| -> Result<Box<dyn ActDriver>, Report> {
            let endpoint = &exec_params.act_endpoints[index];

            let driver = ZmqActDriver::new(
                &zmq_ctx,
                endpoint,
                exec_params.act_response_timeout_ms as i32,
            )
            .wrap_err_with(|| format!("Failed to connect to actuator endpoint {}", endpoint))?;

            Ok(Box::new(driver))
        };

        // One fixed driver handle per actuator id, in joint order
        let drivers: [Box<dyn ActDriver>; NUM_ACTS] = [
            driver(0)?,
            driver(1)?,
            driver(2)?,
            driver(3)?,
            driver(4)?,
            driver(5)?,
        ];

        let c = ActClient::new(
            drivers,
            Duration::from_millis(exec_params.dispatch_timeout_ms),
        );
        info!("ActClient initialised");
        c
    };

    info!("Network initialisation complete");

    // ---- ACTUATOR DISARM ----

    // Guarantee a known disarmed state before the control loop begins. A
    // failure here is fatal, there is no point entering the loop with
    // unresponsive actuators.
    act_client
        .stop_all()
        .wrap_err("Failed to put the actuators into a known stopped state")?;
    info!("All actuators stopped\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- SHUTDOWN CHECK ----

        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested");
            break;
        }

        // ---- DATA INPUT ----

        // Drain the pose subscription, keeping only the newest frame. A
        // frame is only applied as a complete six joint snapshot.
        if let Some(frame) = pose_client.latest_frame() {
            match JointTarget::from_pose(&frame) {
                Ok(target) => {
                    debug!("New joint target: {:?}", target.rotations);
                    ds.latest_target = Some(target);
                }
                // An invalid pose is discarded whole and the previous target
                // retained
                Err(e) => warn!("{}", e),
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        supervisor.step(&mut ds, &mut act_client);

        // ---- TELEMETRY ----

        if ds.is_1_hz_cycle {
            session.save("joint_ctrl/status_report.json", ds.joint_ctrl_status_rpt);
            session.save("supervisor/status_report.json", supervisor.report());
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    // Best effort disarm, the actuators must not be left under an in-flight
    // position demand
    match act_client.stop_all() {
        Ok(()) => info!("All actuators stopped"),
        Err(e) => warn!("Could not stop all actuators during shutdown: {}", e),
    }

    drop(act_client);

    session.save("supervisor/final_status_report.json", supervisor.report());
    session.exit();

    info!("End of execution");

    Ok(())
}
