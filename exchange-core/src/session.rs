use tracing::{debug, warn};

use crate::codec::prelude::*;
use crate::dispatcher::Dispatcher;

/// SessionState is the per-connection handshake state machine (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just accepted; only a Logon is acceptable.
    Open,
    /// Past a valid Logon; Heartbeat/NewOrderSingle/OrderCancelRequest/Logout are acceptable.
    LoggedIn,
    /// Past a Logout or unrecoverable codec error; no further messages are processed.
    Closing,
}

/// One accepted connection's state: handshake phase, decode buffer, and outbound sequencing.
/// Mutated only by its own worker; never shared across tasks (§5).
pub struct Session {
    pub id: u64,
    state: SessionState,
    buffer: Vec<u8>,
    outbound_seq: u64,
    /// Our own identity on the wire to this peer (their inbound TargetCompID, tag 56),
    /// echoed from Logon; not authenticated (§4.3).
    sender_comp_id: String,
    /// The peer's identity (their inbound SenderCompID, tag 49), echoed from Logon.
    target_comp_id: String,
}

impl Session {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: SessionState::Open,
            buffer: Vec::new(),
            outbound_seq: 1,
            sender_comp_id: crate::codec::encode::DEFAULT_SENDER_COMP_ID.to_string(),
            target_comp_id: crate::codec::encode::DEFAULT_TARGET_COMP_ID.to_string(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn transition(&mut self, new_state: SessionState) {
        self.state = new_state;
    }

    /// Captures the peer's CompID pair from an inbound Logon, swapped for our own outbound use
    /// (our tag 49 is their inbound tag 56, our tag 56 is their inbound tag 49).
    pub(crate) fn adopt_comp_ids(&mut self, inbound_sender: &str, inbound_target: &str) {
        self.sender_comp_id = inbound_target.to_string();
        self.target_comp_id = inbound_sender.to_string();
    }

    /// The sequence number (tag 34) to stamp on the next outbound message, then advances it.
    pub(crate) fn next_outbound_seq(&mut self) -> u64 {
        let seq = self.outbound_seq;
        self.outbound_seq += 1;
        seq
    }

    /// Builds an outbound frame using this session's echoed CompID pair (§4.3).
    pub(crate) fn build_frame(&mut self, msg_type: &str, body_fields: &[(u32, String)]) -> Vec<u8> {
        let seq = self.next_outbound_seq();
        crate::codec::encode::build_for(&self.sender_comp_id, &self.target_comp_id, msg_type, seq, body_fields)
    }

    /// Appends `bytes` to the session's decode buffer and decodes/dispatches as many complete
    /// messages as are present, returning the outbound byte frames to write back to the peer,
    /// in order (§4.3 "Per-call contract"). The caller (the acceptor's per-connection worker)
    /// performs the actual socket write; this method is pure of I/O.
    pub fn feed(&mut self, bytes: &[u8], dispatcher: &Dispatcher) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);
        let mut outbound = Vec::new();

        loop {
            if self.state == SessionState::Closing {
                break;
            }

            let frame_len = match frame_next(&self.buffer) {
                Ok(FrameResult::Complete(len)) => len,
                Ok(FrameResult::Incomplete) => break,
                Err(_) => {
                    warn!(session_id = self.id, "malformed framing, closing session");
                    self.transition(SessionState::Closing);
                    self.buffer.clear();
                    break;
                }
            };

            let frame: Vec<u8> = self.buffer.drain(..frame_len).collect();

            match decode(&frame) {
                Ok(message) => {
                    outbound.extend(dispatcher.dispatch(self, message));
                }
                Err(CodecError::ChecksumMismatch) => {
                    debug!(session_id = self.id, "dropping message with bad checksum");
                }
                Err(CodecError::MissingRequiredHeaderTag(tag)) => {
                    debug!(session_id = self.id, tag, "dropping message missing required tag");
                }
                Err(CodecError::UnknownMessageType(msg_type)) => {
                    debug!(session_id = self.id, %msg_type, "dropping unknown message type");
                }
                Err(CodecError::MalformedFraming) => {
                    warn!(session_id = self.id, "malformed framing, closing session");
                    self.transition(SessionState::Closing);
                    break;
                }
            }
        }

        outbound
    }
}
