//! Transport-facing queues.
//!
//! The simulation exchanges messages with the transport layer through two
//! channels: an MPSC input queue (transport tasks write, the simulation
//! drains at the start of each tick) and an outbound queue (the simulation
//! writes after the delta step, transport tasks read). Channels are
//! `crossbeam-channel`, which preserves per-producer FIFO order -- one
//! transport task per client gives the required per-client input ordering.
//!
//! The simulation never blocks on these queues; sends into a disconnected
//! outbound queue are dropped with a warning.

use crossbeam_channel::{unbounded, Receiver, Sender};

use riftline_net::protocol::{ClientMessage, ServerMessage};
use riftline_world::ids::PlayerId;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// One inbound message tagged with its sender.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEnvelope {
    /// The sending player.
    pub player: PlayerId,
    /// The message.
    pub message: ClientMessage,
}

/// One outbound message tagged with its recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEnvelope {
    /// The receiving player.
    pub player: PlayerId,
    /// The message.
    pub message: ServerMessage,
}

// ---------------------------------------------------------------------------
// Channel constructors
// ---------------------------------------------------------------------------

/// Sender half of the input queue, cloned per transport task.
pub type InputSender = Sender<InputEnvelope>;
/// Receiver half of the input queue, owned by the session.
pub type InputReceiver = Receiver<InputEnvelope>;
/// Sender half of the outbound queue, owned by the session.
pub type OutboundSender = Sender<OutboundEnvelope>;
/// Receiver half of the outbound queue, owned by transport tasks.
pub type OutboundReceiver = Receiver<OutboundEnvelope>;

/// Build the input queue.
pub fn input_queue() -> (InputSender, InputReceiver) {
    unbounded()
}

/// Build the outbound queue.
pub fn outbound_queue() -> (OutboundSender, OutboundReceiver) {
    unbounded()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
