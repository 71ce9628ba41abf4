//! The entity store.
//!
//! [`World`] owns every entity record for the lifetime of a session; other
//! subsystems hold only [`EntityId`] handles. Iteration is in slot order,
//! which is insertion order for never-recycled indices -- never hash-map
//! order, so simulation passes are deterministic.
//!
//! Destruction is deferred: [`World::mark_removed`] queues the id and
//! [`World::commit_removals`] frees the slots at the end of the tick, which
//! keeps iteration stable while systems are still running.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::{EntityAllocator, EntityId};
use crate::records::EntityRecord;
use crate::WorldError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Container for all entity records in one session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct World {
    allocator: EntityAllocator,
    /// Slot storage indexed by `EntityId::index()`.
    slots: Vec<Option<EntityRecord>>,
    /// Ids queued for removal at the end of the tick.
    pending_removals: Vec<EntityId>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, assigning it a fresh id. Returns the id.
    pub fn insert(&mut self, mut record: EntityRecord) -> EntityId {
        let id = self.allocator.allocate();
        record.id = id;
        let idx = id.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(record);
        id
    }

    /// Whether the id refers to a live entity (possibly dead-flagged but not
    /// yet removed).
    pub fn contains(&self, id: EntityId) -> bool {
        self.allocator.is_live(id)
    }

    /// Shared access to a record.
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        if !self.allocator.is_live(id) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    /// Mutable access to a record.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        if !self.allocator.is_live(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    /// Mutable access to two distinct records at once, for pairwise
    /// resolution. Returns an error if the ids are equal or either is stale.
    pub fn get_pair_mut(
        &mut self,
        a: EntityId,
        b: EntityId,
    ) -> Result<(&mut EntityRecord, &mut EntityRecord), WorldError> {
        if a == b {
            return Err(WorldError::SameEntityPair { entity: a });
        }
        if !self.allocator.is_live(a) {
            return Err(WorldError::StaleEntity { entity: a });
        }
        if !self.allocator.is_live(b) {
            return Err(WorldError::StaleEntity { entity: b });
        }
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        let (lo, hi) = if ia < ib { (ia, ib) } else { (ib, ia) };
        let (left, right) = self.slots.split_at_mut(hi);
        let lo_rec = left[lo].as_mut().ok_or(WorldError::StaleEntity { entity: a })?;
        let hi_rec = right[0].as_mut().ok_or(WorldError::StaleEntity { entity: b })?;
        if ia < ib {
            Ok((lo_rec, hi_rec))
        } else {
            Ok((hi_rec, lo_rec))
        }
    }

    /// Iterate all records in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    /// Iterate all records mutably in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EntityRecord> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    /// All live ids in slot order. Collected up front so callers can mutate
    /// the world while walking the list.
    pub fn ids(&self) -> Vec<EntityId> {
        self.slots
            .iter()
            .filter_map(|s| s.as_ref().map(|r| r.id))
            .collect()
    }

    /// Number of records currently stored (including dead-flagged ones that
    /// have not been committed for removal yet).
    pub fn len(&self) -> usize {
        self.allocator.live_count()
    }

    /// Whether the world holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue an entity for removal at the end of the tick. Queuing a stale
    /// id is a no-op; queuing twice is harmless.
    pub fn mark_removed(&mut self, id: EntityId) {
        if self.allocator.is_live(id) {
            if !self.pending_removals.contains(&id) {
                self.pending_removals.push(id);
            }
        } else {
            warn!(entity = %id, "mark_removed on stale entity id");
        }
    }

    /// Free every queued slot. Returns the removed ids in queue order.
    pub fn commit_removals(&mut self) -> Vec<EntityId> {
        let pending = std::mem::take(&mut self.pending_removals);
        let mut removed = Vec::with_capacity(pending.len());
        for id in pending {
            if self.allocator.free(id) {
                self.slots[id.index() as usize] = None;
                removed.push(id);
            }
        }
        removed
    }

    /// Ids currently queued for end-of-tick removal.
    pub fn pending_removals(&self) -> &[EntityId] {
        &self.pending_removals
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::records::{EntityKind, Team};
    use crate::shape::Collider;

    fn minion(x: f64) -> EntityRecord {
        EntityRecord::new(
            EntityKind::Minion,
            Team::Blue,
            Vec2::new(x, 0.0),
            Collider::circle(20.0),
        )
    }

    #[test]
    fn insert_assigns_unique_ids() {
        let mut world = World::new();
        let a = world.insert(minion(0.0));
        let b = world.insert(minion(10.0));
        assert_ne!(a, b);
        assert_eq!(world.len(), 2);
        assert_eq!(world.get(a).unwrap().position.x, 0.0);
        assert_eq!(world.get(b).unwrap().position.x, 10.0);
    }

    #[test]
    fn iteration_is_slot_ordered() {
        let mut world = World::new();
        let ids: Vec<_> = (0..5).map(|i| world.insert(minion(i as f64))).collect();
        let seen: Vec<_> = world.iter().map(|r| r.id).collect();
        assert_eq!(seen, ids);
    }

    #[test]
    fn deferred_removal() {
        let mut world = World::new();
        let a = world.insert(minion(0.0));
        let b = world.insert(minion(10.0));

        world.mark_removed(a);
        // Still accessible until the commit.
        assert!(world.get(a).is_some());
        assert_eq!(world.len(), 2);

        let removed = world.commit_removals();
        assert_eq!(removed, vec![a]);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn double_mark_is_harmless() {
        let mut world = World::new();
        let a = world.insert(minion(0.0));
        world.mark_removed(a);
        world.mark_removed(a);
        assert_eq!(world.commit_removals().len(), 1);
    }

    #[test]
    fn stale_id_after_removal() {
        let mut world = World::new();
        let a = world.insert(minion(0.0));
        world.mark_removed(a);
        world.commit_removals();

        assert!(!world.contains(a));
        // The recycled slot gets a different generation.
        let c = world.insert(minion(5.0));
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(world.get(a).is_none());
        assert!(world.get(c).is_some());
    }

    #[test]
    fn pair_access() {
        let mut world = World::new();
        let a = world.insert(minion(0.0));
        let b = world.insert(minion(10.0));

        let (ra, rb) = world.get_pair_mut(a, b).unwrap();
        ra.position.x = 1.0;
        rb.position.x = 2.0;
        assert_eq!(world.get(a).unwrap().position.x, 1.0);
        assert_eq!(world.get(b).unwrap().position.x, 2.0);

        // Order is respected regardless of index order.
        let (rb2, ra2) = world.get_pair_mut(b, a).unwrap();
        assert_eq!(rb2.position.x, 2.0);
        assert_eq!(ra2.position.x, 1.0);

        assert!(world.get_pair_mut(a, a).is_err());
    }
}
