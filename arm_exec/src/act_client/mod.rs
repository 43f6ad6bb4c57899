//! # Actuator Client
//!
//! This module is the dispatch path between the control loop and the six
//! actuators. It owns one worker thread per actuator, each holding an
//! [`ActDriver`] handle, and fans requests out to all six concurrently,
//! joining before the cycle may proceed.
//!
//! A fan-out either completes with a reply from every actuator or fails with
//! a typed error - a partial set of acknowledgements is never silently
//! accepted. Within one actuator's own stream, requests are delivered in the
//! order they were issued.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod worker;
mod zmq_driver;

pub use zmq_driver::ZmqActDriver;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::warn;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// Internal
use comms_if::eqpt::act::{ActDemand, ActId, ActState, NUM_ACTS};
use worker::{worker_thread, Reply, ReplyData, Request};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait providing a unified interface to a single actuator.
///
/// The production implementation is [`ZmqActDriver`], which forwards requests
/// to the actuator driver daemon. Tests substitute scripted mock drivers.
pub trait ActDriver: Send {
    /// Query the actuator's current state.
    fn query(&mut self) -> Result<ActState, ActDriverError>;

    /// Execute a demand on the actuator.
    fn demand(&mut self, demand: ActDemand) -> Result<(), ActDriverError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client dispatching requests to the six actuators.
pub struct ActClient {
    /// The per-actuator workers, in joint order.
    workers: Vec<Worker>,

    /// Channel on which all workers reply.
    reply_rx: Receiver<Reply>,

    /// Maximum time to wait for a full fan-out to complete.
    fan_out_timeout: Duration,

    /// Fan-out sequence counter, used to discard replies belonging to an
    /// abandoned fan-out.
    seq: u64,
}

/// Handle to one actuator's worker thread.
struct Worker {
    act_id: ActId,

    req_tx: Sender<Request>,

    handle: JoinHandle<()>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a single actuator driver.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ActDriverError {
    #[error("The driver is not connected to the actuator daemon")]
    NotConnected,

    #[error("Could not send the request to the actuator daemon: {0}")]
    SendFailed(String),

    #[error("No response from the actuator within the timeout")]
    ResponseTimeout,

    #[error("Unexpected response from the actuator daemon: {0}")]
    UnexpectedResponse(String),
}

/// Errors raised by the actuator client.
#[derive(thiserror::Error, Debug)]
pub enum ActClientError {
    #[error("Actuator {id} error: {source}")]
    ActError {
        id: ActId,
        source: ActDriverError,
    },

    #[error("Dispatch incomplete: no reply from {missing:?} within {timeout_ms} ms")]
    DispatchIncomplete {
        missing: Vec<ActId>,
        timeout_ms: u64,
    },

    #[error("The worker thread for actuator {0} has died")]
    WorkerDead(ActId),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActClient {
    /// Create a new client over the given actuator drivers, in joint order.
    ///
    /// One worker thread is spawned per driver. The handles are a fixed six
    /// element collection for the lifetime of the client, there is no
    /// re-registration.
    pub fn new(drivers: [Box<dyn ActDriver>; NUM_ACTS], fan_out_timeout: Duration) -> Self {
        let (reply_tx, reply_rx) = channel();

        let mut workers = Vec::with_capacity(NUM_ACTS);

        for (act_id, driver) in ActId::ALL.iter().zip(Vec::from(drivers).into_iter()) {
            let (req_tx, req_rx) = channel();
            let reply_tx = reply_tx.clone();
            let act_id = *act_id;

            let handle = thread::spawn(move || worker_thread(act_id, driver, req_rx, reply_tx));

            workers.push(Worker {
                act_id,
                req_tx,
                handle,
            });
        }

        Self {
            workers,
            reply_rx,
            fan_out_timeout,
            seq: 0,
        }
    }

    /// Query the state of all six actuators concurrently.
    ///
    /// Returns the states in joint order once every actuator has replied, or
    /// an error if any query failed or the fan-out did not complete within
    /// the timeout.
    pub fn query_all(&mut self) -> Result<[ActState; NUM_ACTS], ActClientError> {
        let seq = self.next_seq();

        for worker in &self.workers {
            if worker.req_tx.send(Request::Query { seq }).is_err() {
                return Err(ActClientError::WorkerDead(worker.act_id));
            }
        }

        let replies = self.collect(seq)?;

        let mut states = [ActState::default(); NUM_ACTS];
        for (i, reply) in replies.iter().enumerate() {
            match reply {
                ReplyData::State(state) => states[i] = *state,
                ReplyData::Ack => {
                    return Err(ActClientError::ActError {
                        id: ActId::ALL[i],
                        source: ActDriverError::UnexpectedResponse(
                            "acknowledgement to a query".into(),
                        ),
                    })
                }
            }
        }

        Ok(states)
    }

    /// Dispatch one demand per actuator concurrently, in joint order.
    ///
    /// Returns once every actuator has acknowledged, or an error if any
    /// demand failed or the fan-out did not complete within the timeout.
    pub fn demand_all(&mut self, demands: [ActDemand; NUM_ACTS]) -> Result<(), ActClientError> {
        let seq = self.next_seq();

        for (worker, demand) in self.workers.iter().zip(demands.iter()) {
            let request = Request::Demand {
                seq,
                demand: *demand,
            };

            if worker.req_tx.send(request).is_err() {
                return Err(ActClientError::WorkerDead(worker.act_id));
            }
        }

        self.collect(seq).map(|_| ())
    }

    /// Command all six actuators to maintain their present position.
    pub fn hold_all(&mut self) -> Result<(), ActClientError> {
        self.demand_all([ActDemand::Hold; NUM_ACTS])
    }

    /// Stop and disarm all six actuators.
    pub fn stop_all(&mut self) -> Result<(), ActClientError> {
        self.demand_all([ActDemand::Stop; NUM_ACTS])
    }

    /// Advance the fan-out sequence counter.
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Collect one reply from every actuator for the given fan-out sequence.
    ///
    /// Replies carrying an older sequence number belong to an abandoned
    /// fan-out and are discarded. Either all six replies arrive within the
    /// timeout or a typed error identifying the missing actuators is
    /// returned.
    fn collect(&mut self, seq: u64) -> Result<[ReplyData; NUM_ACTS], ActClientError> {
        let deadline = Instant::now() + self.fan_out_timeout;

        let mut replies: [Option<ReplyData>; NUM_ACTS] = [None; NUM_ACTS];
        let mut num_received = 0;

        while num_received < NUM_ACTS {
            let remaining = deadline.saturating_duration_since(Instant::now());

            let reply = match self.reply_rx.recv_timeout(remaining) {
                Ok(r) => r,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    // All workers have died, report the first outstanding one
                    let id = Self::first_missing(&replies);
                    return Err(ActClientError::WorkerDead(id));
                }
            };

            // Discard stale replies from an abandoned fan-out
            if reply.seq != seq {
                continue;
            }

            match reply.result {
                Ok(data) => {
                    let index = reply.act_id.index();
                    if replies[index].is_none() {
                        replies[index] = Some(data);
                        num_received += 1;
                    }
                }
                Err(source) => {
                    return Err(ActClientError::ActError {
                        id: reply.act_id,
                        source,
                    })
                }
            }
        }

        if num_received == NUM_ACTS {
            // All slots are filled at this point
            let mut out = [ReplyData::Ack; NUM_ACTS];
            for (slot, reply) in out.iter_mut().zip(replies.iter()) {
                if let Some(data) = reply {
                    *slot = *data;
                }
            }
            Ok(out)
        } else {
            let missing = replies
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_none())
                .map(|(i, _)| ActId::ALL[i])
                .collect();

            Err(ActClientError::DispatchIncomplete {
                missing,
                timeout_ms: self.fan_out_timeout.as_millis() as u64,
            })
        }
    }

    /// The first actuator with no reply collected yet.
    fn first_missing(replies: &[Option<ReplyData>; NUM_ACTS]) -> ActId {
        for (i, reply) in replies.iter().enumerate() {
            if reply.is_none() {
                return ActId::ALL[i];
            }
        }

        ActId::J1
    }
}

impl Drop for ActClient {
    fn drop(&mut self) {
        // Dropping a worker's request channel stops it once its queue is
        // drained
        for worker in self.workers.drain(..) {
            let Worker {
                act_id,
                req_tx,
                handle,
            } = worker;

            drop(req_tx);

            if handle.join().is_err() {
                warn!("Worker thread for actuator {} panicked", act_id);
            }
        }
    }
}
