//! # Equipment Types
//!
//! Data and message types describing the equipment the software interacts
//! with: the arm's six actuators and the external pose source.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod act;
pub mod pose;
