//! # Pose Client
//!
//! This module subscribes to the pose source's publication stream and
//! surfaces the most recent full pose each cycle. Each publication carries a
//! complete [`PoseFrame`], so the control loop only ever observes whole
//! poses, never a partially updated one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::pose::PoseFrame,
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PoseClient {
    pose_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum PoseClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseClient {
    /// Create a new instance of the pose client.
    ///
    /// Blocks until the pose source's publication endpoint is reachable, or
    /// fails if it cannot be reached within the connection timeout.
    pub fn new(ctx: &zmq::Context, endpoint: &str) -> Result<Self, PoseClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            ..Default::default()
        };

        // Create the socket
        let pose_socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, endpoint)
            .map_err(PoseClientError::SocketError)?;

        // Subscribe to all publications on the endpoint
        pose_socket.set_subscribe(b"").map_err(|e| {
            PoseClientError::SocketError(MonitoredSocketError::SocketOptionError(
                "set_subscribe".into(),
                e,
            ))
        })?;

        // Create self
        Ok(Self { pose_socket })
    }

    /// Drain the subscription and return the newest pose frame, or `None` if
    /// no new frame has arrived since the last call.
    ///
    /// Frames which cannot be parsed are discarded with a warning.
    pub fn latest_frame(&mut self) -> Option<PoseFrame> {
        let mut latest = None;

        loop {
            let msg = match self.pose_socket.recv_msg(zmq::DONTWAIT) {
                Ok(m) => m,
                Err(_) => break,
            };

            match serde_json::from_str(msg.as_str().unwrap_or("")) {
                Ok(frame) => latest = Some(frame),
                Err(e) => warn!("Could not parse a pose frame: {}", e),
            }
        }

        latest
    }
}
