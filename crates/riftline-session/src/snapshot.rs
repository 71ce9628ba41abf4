//! Session snapshots with BLAKE3 hashing.
//!
//! A [`SessionSnapshot`] captures everything that affects simulation
//! determinism: the entity world, the pending action schedule, the tick
//! counter and the seed. The hash is BLAKE3 over the canonical bincode
//! byte stream, so two runs that agree on the hash agree on the whole
//! simulation state -- this is what the determinism conformance tests
//! compare.
//!
//! [`SnapshotHistory`] is the lag-compensation hook: a bounded ring of
//! recent snapshots. The core keeps the buffer; rewinding against it is
//! deliberately out of scope.
//!
//! Not captured: client views, queues, metrics, event sinks. Those are
//! delivery-side state, reconstructed by resync after a restore.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use riftline_sim::scheduler::ActionScheduler;
use riftline_world::store::World;

use crate::session::Session;

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of one session's simulation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Tick counter at capture time.
    pub tick: u64,
    /// The session seed.
    pub seed: u64,
    /// The full entity world.
    pub world: World,
    /// Pending scheduled actions.
    pub scheduler: ActionScheduler,
    /// BLAKE3 hex digest of the canonical encoding of the fields above.
    pub hash: String,
}

#[derive(Serialize)]
struct HashBody<'a> {
    tick: u64,
    seed: u64,
    world: &'a World,
    scheduler: &'a ActionScheduler,
}

fn compute_hash(
    tick: u64,
    seed: u64,
    world: &World,
    scheduler: &ActionScheduler,
) -> Result<String, anyhow::Error> {
    let body = HashBody {
        tick,
        seed,
        world,
        scheduler,
    };
    let bytes = bincode::serde::encode_to_vec(&body, bincode::config::standard())?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

impl Session {
    /// Capture a snapshot of the simulation state.
    pub fn capture_snapshot(&self) -> Result<SessionSnapshot, anyhow::Error> {
        let (world, scheduler, tick, seed) = self.parts_for_snapshot();
        let hash = compute_hash(tick, seed, world, scheduler)?;
        Ok(SessionSnapshot {
            tick,
            seed,
            world: world.clone(),
            scheduler: scheduler.clone(),
            hash,
        })
    }

    /// The BLAKE3 digest of the current simulation state.
    pub fn state_hash(&self) -> Result<String, anyhow::Error> {
        let (world, scheduler, tick, seed) = self.parts_for_snapshot();
        compute_hash(tick, seed, world, scheduler)
    }

    /// Restore simulation state from a snapshot.
    ///
    /// The snapshot's hash is verified first; a mismatch aborts without
    /// touching session state. Client baselines are NOT restored -- callers
    /// resync clients with a full state after restoring.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot: &SessionSnapshot,
    ) -> Result<(), anyhow::Error> {
        let expected = compute_hash(
            snapshot.tick,
            snapshot.seed,
            &snapshot.world,
            &snapshot.scheduler,
        )?;
        if expected != snapshot.hash {
            anyhow::bail!(
                "snapshot hash mismatch: recorded {} but recomputed {}",
                snapshot.hash,
                expected
            );
        }
        self.restore_parts(
            snapshot.world.clone(),
            snapshot.scheduler.clone(),
            snapshot.tick,
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SnapshotHistory
// ---------------------------------------------------------------------------

/// Bounded ring of recent snapshots, keyed by tick.
#[derive(Debug, Default)]
pub struct SnapshotHistory {
    ring: VecDeque<SessionSnapshot>,
    capacity: usize,
}

impl SnapshotHistory {
    /// A history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a snapshot, evicting the oldest past capacity.
    pub fn push(&mut self, snapshot: SessionSnapshot) {
        if self.capacity == 0 {
            return;
        }
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(snapshot);
    }

    /// The snapshot captured at `tick`, if still buffered.
    pub fn at_tick(&self, tick: u64) -> Option<&SessionSnapshot> {
        self.ring.iter().find(|s| s.tick == tick)
    }

    /// Number of buffered snapshots.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use riftline_catalog::config::SessionConfig;
    use riftline_catalog::content::{demo_catalog, WARDEN};
    use riftline_world::ids::PlayerId;
    use riftline_world::records::Team;

    use crate::queues::{input_queue, outbound_queue};
    use crate::session::SessionSetup;

    fn session() -> Session {
        let (_tx, rx) = input_queue();
        let (out_tx, _out_rx) = outbound_queue();
        let mut session = Session::new(SessionSetup {
            catalog: Arc::new(demo_catalog()),
            config: SessionConfig::default(),
            seed: 99,
            inputs: rx,
            outbound: out_tx,
            sinks: Vec::new(),
            path_provider: None,
        })
        .unwrap();
        session.add_player(PlayerId(1), Team::Blue, WARDEN).unwrap();
        session.start();
        session
    }

    #[test]
    fn snapshot_round_trip_restores_tick_and_world() {
        let mut session = session();
        session.run_ticks(10);
        let snapshot = session.capture_snapshot().unwrap();
        assert_eq!(snapshot.tick, 10);
        assert_eq!(snapshot.hash.len(), 64);

        session.run_ticks(10);
        assert_eq!(session.tick_count(), 20);

        session.restore_from_snapshot(&snapshot).unwrap();
        assert_eq!(session.tick_count(), 10);
        assert_eq!(session.state_hash().unwrap(), snapshot.hash);
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let mut session = session();
        session.run_ticks(5);
        let mut snapshot = session.capture_snapshot().unwrap();
        snapshot.tick += 1;
        assert!(session.restore_from_snapshot(&snapshot).is_err());
        // State untouched by the failed restore.
        assert_eq!(session.tick_count(), 5);
    }

    #[test]
    fn history_ring_evicts_oldest() {
        let mut session = session();
        let mut history = SnapshotHistory::new(3);
        for _ in 0..5 {
            session.tick();
            history.push(session.capture_snapshot().unwrap());
        }
        assert_eq!(history.len(), 3);
        assert!(history.at_tick(1).is_none());
        assert!(history.at_tick(2).is_none());
        assert!(history.at_tick(3).is_some());
        assert!(history.at_tick(5).is_some());
    }
}
