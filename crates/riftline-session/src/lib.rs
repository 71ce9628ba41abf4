//! Riftline session -- the authoritative match runtime.
//!
//! Owns a match's entire simulation state and drives the fixed-tick loop:
//! input drain, timers and effects, the action scheduler, movement,
//! collision, deaths and rewards, event publication, and the per-client
//! vision/priority/delta delivery pipeline.
//!
//! Sessions share nothing mutable: the catalog is the only process-wide
//! read-only state, so any number of sessions run in parallel, each pinned
//! to one logical executor.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use riftline_catalog::config::SessionConfig;
//! use riftline_catalog::content::{demo_catalog, WARDEN, PYRE};
//! use riftline_session::prelude::*;
//! use riftline_world::ids::PlayerId;
//! use riftline_world::records::Team;
//!
//! let (input_tx, input_rx) = input_queue();
//! let (outbound_tx, outbound_rx) = outbound_queue();
//!
//! let mut session = Session::new(SessionSetup {
//!     catalog: Arc::new(demo_catalog()),
//!     config: SessionConfig::default(),
//!     seed: 0xC0FFEE,
//!     inputs: input_rx,
//!     outbound: outbound_tx,
//!     sinks: Vec::new(),
//!     path_provider: None,
//! })
//! .expect("valid catalog and config");
//!
//! session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
//! session.add_player(PlayerId(2), Team::Red, PYRE).unwrap();
//! session.start();
//! session.run_ticks(125); // one second of simulation
//!
//! assert_eq!(session.tick_count(), 125);
//! assert!(outbound_rx.try_iter().count() > 0);
//! # drop(input_tx);
//! ```

#![deny(unsafe_code)]

pub mod metrics;
pub mod queues;
pub mod session;
pub mod snapshot;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that fail session start. Nothing in this enum is ever produced
/// during a live tick; mid-tick failures are degraded and logged instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The catalog or configuration failed validation, or a setup call
    /// referenced an unknown id.
    #[error(transparent)]
    Catalog(#[from] riftline_catalog::CatalogError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::metrics::{SessionMetrics, TickTimings};
    pub use crate::queues::{
        input_queue, outbound_queue, InputEnvelope, InputReceiver, InputSender, OutboundEnvelope,
        OutboundReceiver, OutboundSender,
    };
    pub use crate::session::{Session, SessionPhase, SessionSetup};
    pub use crate::snapshot::{SessionSnapshot, SnapshotHistory};
    pub use crate::SessionError;
}
