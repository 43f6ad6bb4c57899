//! Per-actuator worker thread
//!
//! Each worker owns the driver handle for one actuator and serves requests
//! from the client in the order they were issued, so one actuator's command
//! stream is never reordered.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::mpsc::{Receiver, Sender};

use comms_if::eqpt::act::{ActDemand, ActId, ActState};

use super::{ActDriver, ActDriverError};

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// A request from the client to one worker.
#[derive(Debug, Clone, Copy)]
pub(super) enum Request {
    /// Query the actuator's state.
    Query { seq: u64 },

    /// Execute a demand on the actuator.
    Demand { seq: u64, demand: ActDemand },
}

/// The payload of a successful reply.
#[derive(Debug, Clone, Copy)]
pub(super) enum ReplyData {
    /// The actuator's state, in response to a query.
    State(ActState),

    /// The actuator acknowledged a demand.
    Ack,
}

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// A worker's reply to one request.
#[derive(Debug)]
pub(super) struct Reply {
    pub act_id: ActId,

    /// The fan-out sequence number of the request this reply answers.
    pub seq: u64,

    pub result: Result<ReplyData, ActDriverError>,
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Serve requests for a single actuator until the client drops the request
/// channel.
pub(super) fn worker_thread(
    act_id: ActId,
    mut driver: Box<dyn ActDriver>,
    req_rx: Receiver<Request>,
    reply_tx: Sender<Reply>,
) {
    while let Ok(request) = req_rx.recv() {
        let (seq, result) = match request {
            Request::Query { seq } => (seq, driver.query().map(ReplyData::State)),
            Request::Demand { seq, demand } => (seq, driver.demand(demand).map(|_| ReplyData::Ack)),
        };

        // If the client is gone there is nothing left to serve
        if reply_tx.send(Reply {
            act_id,
            seq,
            result,
        })
        .is_err()
        {
            break;
        }
    }
}
