//! Library components of the arm control executable.
//!
//! See `main.rs` for a description of the executable's architecture.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod act_client;
pub mod data_store;
pub mod joint_ctrl;
pub mod params;
pub mod pose_client;
pub mod supervisor;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
///
/// The fixed inter-cycle sleep bounds the actuator command rate and the load
/// placed on the actuator bus.
pub const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
pub const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;
