//! ZMQ-backed actuator driver
//!
//! The production [`ActDriver`] implementation. Each driver holds a REQ
//! socket to the daemon endpoint serving its actuator; serialisation of the
//! underlying actuator bus is the daemon's responsibility.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::act::{ActDemand, ActRequest, ActResponse, ActState},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use super::{ActDriver, ActDriverError};

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// [`ActDriver`] implementation forwarding requests to the actuator driver
/// daemon over ZMQ.
pub struct ZmqActDriver {
    socket: MonitoredSocket,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ZmqActDriver {
    /// Connect to the daemon endpoint serving one actuator.
    ///
    /// `response_timeout_ms` bounds every receive on the socket, so no
    /// request can suspend indefinitely.
    pub fn new(
        ctx: &zmq::Context,
        endpoint: &str,
        response_timeout_ms: i32,
    ) -> Result<Self, MonitoredSocketError> {
        // Create the socket options
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: response_timeout_ms,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(ctx, zmq::REQ, socket_options, endpoint)?;

        Ok(Self { socket })
    }

    /// Send one request and wait for the daemon's response.
    fn request(&mut self, request: &ActRequest) -> Result<ActResponse, ActDriverError> {
        // If not connected return now
        if !self.socket.connected() {
            return Err(ActDriverError::NotConnected);
        }

        // Serialize the request
        let request_str = serde_json::to_string(request)
            .map_err(|e| ActDriverError::SendFailed(e.to_string()))?;

        // Send the request to the daemon
        self.socket
            .send(request_str.as_str(), 0)
            .map_err(|e| ActDriverError::SendFailed(e.to_string()))?;

        // Receive the response, bounded by the socket's receive timeout
        let msg = match self.socket.recv_msg(0) {
            Ok(m) => m,
            Err(zmq::Error::EAGAIN) => return Err(ActDriverError::ResponseTimeout),
            Err(e) => return Err(ActDriverError::UnexpectedResponse(e.to_string())),
        };

        serde_json::from_str(msg.as_str().unwrap_or(""))
            .map_err(|e| ActDriverError::UnexpectedResponse(e.to_string()))
    }
}

impl ActDriver for ZmqActDriver {
    fn query(&mut self) -> Result<ActState, ActDriverError> {
        match self.request(&ActRequest::Query)? {
            ActResponse::State(state) => Ok(state),
            ActResponse::Ack => Err(ActDriverError::UnexpectedResponse(
                "acknowledgement to a query".into(),
            )),
        }
    }

    fn demand(&mut self, demand: ActDemand) -> Result<(), ActDriverError> {
        match self.request(&ActRequest::Demand(demand))? {
            ActResponse::Ack => Ok(()),
            ActResponse::State(_) => Err(ActDriverError::UnexpectedResponse(
                "state report to a demand".into(),
            )),
        }
    }
}
