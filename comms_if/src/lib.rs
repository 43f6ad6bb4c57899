//! # Communications Interface
//!
//! This crate defines the interfaces between the arm control executable and
//! its external collaborators:
//!
//! - [`eqpt`] - equipment data and message types (actuator demands and
//!   states, pose source frames)
//! - [`net`] - networking abstractions over ZMQ, the transport chosen for
//!   the software.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod eqpt;
pub mod net;
