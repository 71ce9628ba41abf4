//! Typed protocol records.
//!
//! The core exposes typed inbound and outbound records; wire framing,
//! authentication and reconnection are the transport layer's business.
//! Client sequence numbers are monotonic per client; the server drops
//! out-of-order and duplicate sequences.

use serde::{Deserialize, Serialize};

use riftline_world::champion::AbilitySlot;
use riftline_world::entity::EntityId;
use riftline_world::ids::{ItemId, PlayerId};
use riftline_world::math::Vec2;
use riftline_world::records::Team;

use crate::delta::StateUpdate;

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Categories of pings players can place on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PingKind {
    /// Plain attention ping.
    Generic,
    /// Danger warning.
    Danger,
    /// On-my-way signal.
    OnMyWay,
    /// Assistance request.
    Assist,
}

/// The payload of one client input message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientPayload {
    /// Walk to a point.
    Move(Vec2),
    /// Attack-move to a point.
    AttackMove(Vec2),
    /// Attack a specific unit.
    TargetUnit(EntityId),
    /// Halt movement and attacks.
    Stop,
    /// Cast an ability slot at an optional unit or point.
    Ability {
        /// The slot to cast.
        slot: AbilitySlot,
        /// Unit target, for targeted abilities.
        target_unit: Option<EntityId>,
        /// Point target, for skillshots and ground casts.
        target_point: Option<Vec2>,
    },
    /// Spend a skill point on a slot.
    LevelUp {
        /// The slot to rank up.
        slot: AbilitySlot,
    },
    /// Buy an item from the store.
    BuyItem {
        /// The item to buy.
        item: ItemId,
    },
    /// Sell the item in an inventory slot.
    SellItem {
        /// Inventory slot index.
        slot: usize,
    },
    /// Start the recall channel.
    Recall,
    /// Place a map ping.
    Ping {
        /// Ping position.
        position: Vec2,
        /// Ping category.
        kind: PingKind,
    },
    /// Send a chat line.
    Chat {
        /// The message text.
        text: String,
    },
    /// Place a vision ward.
    PlaceWard {
        /// Ward position.
        position: Vec2,
    },
}

/// One inbound message: `(sequence, client_time, payload)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Monotonic per-client sequence number.
    pub sequence: u32,
    /// The client's local send time, echoed in `Pong`.
    pub client_time: f64,
    /// What the client wants.
    pub payload: ClientPayload,
}

/// Tracks the last accepted sequence for one client and drops everything
/// out of order or duplicated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SequenceGate {
    last_accepted: Option<u32>,
}

impl SequenceGate {
    /// Accept the message's sequence if it advances the window. Returns
    /// `false` for duplicates and reordered arrivals, which the caller
    /// drops.
    pub fn accept(&mut self, sequence: u32) -> bool {
        match self.last_accepted {
            Some(last) if sequence <= last => false,
            _ => {
                self.last_accepted = Some(sequence);
                true
            }
        }
    }

    /// The last accepted sequence, if any.
    pub fn last(&self) -> Option<u32> {
        self.last_accepted
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Error codes surfaced to clients. Failures never close the connection
/// mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed or ineligible input.
    InvalidInput,
    /// Input referenced an entity the client cannot act on.
    NotAllowed,
}

/// One outbound record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Full resync: every visible entity plus the session configuration.
    /// Sent on join and on request after a desync.
    FullState {
        /// Server tick at snapshot time.
        tick: u64,
        /// The receiving player.
        player: PlayerId,
        /// Full state for every entity visible to the player's team.
        update: StateUpdate,
        /// Session configuration as JSON, for client-side prediction setup.
        config: serde_json::Value,
    },
    /// Per-tick incremental update.
    StateUpdate(StateUpdate),
    /// The match started.
    GameStart {
        /// First simulated tick.
        tick: u64,
    },
    /// The match ended.
    GameEnd {
        /// Winning team, if the game did not end in abandonment.
        winner: Option<Team>,
        /// Final tick.
        tick: u64,
    },
    /// A typed failure notice.
    Error {
        /// Machine-readable code.
        code: ErrorCode,
        /// Human-readable context.
        text: String,
    },
    /// Latency probe response.
    Pong {
        /// The client time echoed back.
        client_time: f64,
        /// Server time at response.
        server_time: f64,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_gate_is_monotonic() {
        let mut gate = SequenceGate::default();
        assert!(gate.accept(1));
        assert!(gate.accept(2));
        // Duplicate and reordered sequences drop.
        assert!(!gate.accept(2));
        assert!(!gate.accept(1));
        // Gaps are fine; monotonicity is all that matters.
        assert!(gate.accept(10));
        assert_eq!(gate.last(), Some(10));
    }

    #[test]
    fn messages_round_trip_as_json() {
        let message = ClientMessage {
            sequence: 7,
            client_time: 12.5,
            payload: ClientPayload::Ability {
                slot: AbilitySlot::Q,
                target_unit: None,
                target_point: Some(Vec2::new(100.0, 200.0)),
            },
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: ClientMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(message, back);
    }
}
