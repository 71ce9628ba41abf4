//! Riftline net -- the per-client state delivery pipeline.
//!
//! Everything between the simulation and the transport: typed protocol
//! records, per-team vision with bush occlusion, the priority filter, and
//! the dirty-field delta encoder with per-client baselines.
//!
//! The pipeline per tick is vision (once per team) -> priority (per
//! client) -> delta (per client), producing one
//! [`StateUpdate`](delta::StateUpdate) per client. Wire framing is the
//! transport's concern; this crate only deals in typed records.

#![deny(unsafe_code)]

pub mod delta;
pub mod priority;
pub mod protocol;
pub mod vision;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::delta::{
        build_update, ChangedFields, ClientView, CreationInfo, EntityDelta, FieldSnapshot,
        StateUpdate,
    };
    pub use crate::priority::{classify, should_send, Priority, SendContext};
    pub use crate::protocol::{
        ClientMessage, ClientPayload, ErrorCode, PingKind, SequenceGate, ServerMessage,
    };
    pub use crate::vision::{compute_team_vision, VisionSnapshot};
}
