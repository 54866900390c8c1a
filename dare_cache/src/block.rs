//! `CacheBlock` — a named collection of [`CacheBlob`]s with a UID index and
//! a defragmentation planner (spec §4.2).

use dare_util::BugSink;
use spin::RwLock;

use crate::blob::{CacheBlob, CacheBlobStats};
use crate::defrag::{collect_live, plan_defrag, DefragStep};
use crate::error::{
    ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID, ERROR_MSG_INVALID_ARGUMENT_SIZE,
    ERROR_MSG_INVALID_ARGUMENT_UID, ERROR_MSG_INVALID_OPERATION_INITIALIZATION_REQUIRED,
    ERROR_MSG_INVALID_OPERATION_INITIALIZED, ERROR_MSG_INVALID_OPERATION_OBJECT_EXISTS,
};
use crate::object::{CacheIndex, CacheObject, INVALID_UID};

struct Inner {
    name: String,
    filename: String,
    default_capacity: u32,
    indices: Vec<CacheIndex>,
    blobs: Vec<CacheBlob>,
    initialized: bool,
}

/// Named set of blobs, guarded by a single reader/writer spin lock (spec
/// §4.2/§5: "a single RWSpinLock guards the entire block").
pub struct CacheBlock {
    inner: RwLock<Inner>,
}

impl CacheBlock {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                name: String::new(),
                filename: String::new(),
                default_capacity: 0,
                indices: Vec::new(),
                blobs: Vec::new(),
                initialized: false,
            }),
        }
    }

    pub fn initialize(
        &self,
        name: impl Into<String>,
        filename: impl Into<String>,
        default_capacity: u32,
        bugs: &dyn BugSink,
    ) -> bool {
        let mut inner = self.inner.write();
        if inner.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_INITIALIZED);
            return false;
        }
        inner.name = name.into();
        inner.filename = filename.into();
        inner.default_capacity = default_capacity;
        inner.initialized = true;
        tracing::debug!(name = %inner.name, default_capacity, "CacheBlock::initialize");
        true
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    pub fn filename(&self) -> String {
        self.inner.read().filename.clone()
    }

    pub fn default_capacity(&self) -> u32 {
        self.inner.read().default_capacity
    }

    pub fn blob_count(&self) -> usize {
        self.inner.read().blobs.len()
    }

    /// `create(uid, size)`: first-fit across existing blobs in index order,
    /// else append a fresh `default_capacity` blob (spec §4.2 "Placement
    /// policy").
    pub fn create(&self, uid: u32, size: u32, bugs: &dyn BugSink) -> Option<CacheIndex> {
        let mut inner = self.inner.write();
        if !inner.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_INITIALIZATION_REQUIRED);
            return None;
        }
        if uid == INVALID_UID {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_UID);
            return None;
        }
        if size == 0 {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_SIZE);
            return None;
        }
        if inner.indices.iter().any(|idx| idx.uid == uid) {
            bugs.report(ERROR_MSG_INVALID_OPERATION_OBJECT_EXISTS);
            return None;
        }

        for (blob_id, blob) in inner.blobs.iter_mut().enumerate() {
            if let Some(object_id) = blob.reserve(uid, size, bugs) {
                let index = CacheIndex::new(uid, blob_id as u32, object_id);
                inner.indices.push(index);
                tracing::trace!(uid, blob_id, object_id, "CacheBlock::create placed");
                return Some(index);
            }
        }

        if size > inner.default_capacity {
            // Precondition violation: no blob, existing or fresh, can ever
            // satisfy this request.
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_SIZE);
            return None;
        }
        let default_capacity = inner.default_capacity;
        let mut blob = CacheBlob::with_capacity(default_capacity);
        let object_id = blob.reserve(uid, size, bugs)?;
        let blob_id = inner.blobs.len() as u32;
        inner.blobs.push(blob);
        let index = CacheIndex::new(uid, blob_id, object_id);
        inner.indices.push(index);
        tracing::trace!(uid, blob_id, object_id, "CacheBlock::create appended blob");
        Some(index)
    }

    /// `update(idx, size)`: in-place resize, else destroy-then-reserve in
    /// the same blob, else other blobs in order, else a fresh blob (spec
    /// §4.2 "Resize policy").
    pub fn update(&self, idx: CacheIndex, size: u32, bugs: &dyn BugSink) -> Option<CacheIndex> {
        let mut inner = self.inner.write();
        if !inner.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_INITIALIZATION_REQUIRED);
            return None;
        }
        if size == 0 || size > inner.default_capacity {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_SIZE);
            return None;
        }
        let default_capacity = inner.default_capacity;
        let blob_id = idx.blob_id as usize;
        let current_capacity = {
            let Some(blob) = inner.blobs.get(blob_id) else {
                bugs.report(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID);
                return None;
            };
            let Some(object) = blob.get_object(idx.object_id) else {
                bugs.report(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID);
                return None;
            };
            if object.uid != idx.uid {
                bugs.report(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID);
                return None;
            }
            object.capacity
        };

        if size <= current_capacity {
            let blob = inner.blobs.get_mut(blob_id)?;
            if blob.update(idx.object_id, size, bugs) {
                return Some(idx);
            }
        }

        // Spill: destroy the old slot (tombstoned, offsets stable) then
        // try to reserve it elsewhere.
        {
            let blob = inner.blobs.get_mut(blob_id)?;
            blob.destroy(idx.object_id, bugs);
        }

        if let Some(object_id) = inner.blobs[blob_id].reserve(idx.uid, size, bugs) {
            let new_index = CacheIndex::new(idx.uid, idx.blob_id, object_id);
            Self::rewrite_index(&mut inner.indices, idx.uid, new_index);
            return Some(new_index);
        }

        for (other_id, blob) in inner.blobs.iter_mut().enumerate() {
            if other_id == blob_id {
                continue;
            }
            if let Some(object_id) = blob.reserve(idx.uid, size, bugs) {
                let new_index = CacheIndex::new(idx.uid, other_id as u32, object_id);
                Self::rewrite_index(&mut inner.indices, idx.uid, new_index);
                return Some(new_index);
            }
        }

        let mut fresh = CacheBlob::with_capacity(default_capacity);
        let object_id = fresh.reserve(idx.uid, size, bugs)?;
        let new_blob_id = inner.blobs.len() as u32;
        inner.blobs.push(fresh);
        let new_index = CacheIndex::new(idx.uid, new_blob_id, object_id);
        Self::rewrite_index(&mut inner.indices, idx.uid, new_index);
        Some(new_index)
    }

    fn rewrite_index(indices: &mut [CacheIndex], uid: u32, new_index: CacheIndex) {
        if let Some(slot) = indices.iter_mut().find(|idx| idx.uid == uid) {
            *slot = new_index;
        }
    }

    /// Destroys the underlying slot and swap-removes the block-level index
    /// entry. File contents are not rewritten here (spec §4.2 "Destroy").
    pub fn destroy(&self, idx: CacheIndex, bugs: &dyn BugSink) -> Option<CacheIndex> {
        let mut inner = self.inner.write();
        if !inner.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_INITIALIZATION_REQUIRED);
            return None;
        }
        let blob = inner.blobs.get_mut(idx.blob_id as usize)?;
        if !blob.destroy(idx.object_id, bugs) {
            return None;
        }
        if let Some(pos) = inner.indices.iter().position(|i| i.uid == idx.uid) {
            inner.indices.swap_remove(pos);
        }
        Some(idx)
    }

    pub fn find(&self, uid: u32) -> Option<CacheIndex> {
        self.inner
            .read()
            .indices
            .iter()
            .find(|idx| idx.uid == uid)
            .copied()
    }

    pub fn get_object(&self, idx: CacheIndex) -> Option<CacheObject> {
        let inner = self.inner.read();
        let object = inner.blobs.get(idx.blob_id as usize)?.get_object(idx.object_id)?;
        if object.uid == idx.uid {
            Some(object)
        } else {
            None
        }
    }

    /// UID-keyed scan across blobs independent of the `indices` side table
    /// (recovered from `CacheBlock.cpp`'s `FindObject`; used when a caller
    /// only has a raw UID).
    pub fn find_object(&self, uid: u32) -> Option<(CacheIndex, CacheObject)> {
        let inner = self.inner.read();
        for (blob_id, blob) in inner.blobs.iter().enumerate() {
            for (object_id, object) in blob.objects().iter().enumerate() {
                if object.uid == uid {
                    return Some((
                        CacheIndex::new(uid, blob_id as u32, object_id as u32),
                        *object,
                    ));
                }
            }
        }
        None
    }

    /// `CacheBlock.cpp`'s `DestroyObject` counterpart to [`Self::find_object`].
    pub fn destroy_object(&self, uid: u32, bugs: &dyn BugSink) -> Option<CacheIndex> {
        let idx = self.find(uid)?;
        self.destroy(idx, bugs)
    }

    pub fn blob_stats(&self) -> Vec<CacheBlobStats> {
        self.inner.read().blobs.iter().map(|b| b.stats()).collect()
    }

    pub fn indices(&self) -> Vec<CacheIndex> {
        self.inner.read().indices.clone()
    }

    /// Produces the ordered copy-command plan described in spec §4.2
    /// ("Defragmentation plan").
    pub fn get_defrag_steps(&self) -> Vec<DefragStep> {
        let inner = self.inner.read();
        let live = collect_live(&inner.blobs);
        plan_defrag(&live, inner.default_capacity)
    }

    /// Persisted form: the `indices` side table plus each blob's object
    /// vector in placement order (spec §6: the `.lfindex` file's two
    /// arrays).
    pub fn snapshot(&self) -> (Vec<CacheIndex>, Vec<Vec<CacheObject>>) {
        let inner = self.inner.read();
        let blobs = inner.blobs.iter().map(|b| b.objects().to_vec()).collect();
        (inner.indices.clone(), blobs)
    }

    /// Rebuilds an already-`initialize`d-in-spirit block directly from a
    /// `.lfindex` snapshot, skipping `initialize`'s "already initialized"
    /// bug path since this is construction, not a caller mistake.
    pub fn restore_from(
        &self,
        name: impl Into<String>,
        filename: impl Into<String>,
        indices: Vec<CacheIndex>,
        blobs: Vec<Vec<CacheObject>>,
        default_capacity: u32,
    ) {
        let mut inner = self.inner.write();
        inner.name = name.into();
        inner.filename = filename.into();
        inner.default_capacity = default_capacity;
        inner.blobs = blobs
            .into_iter()
            .map(|objects| CacheBlob::from_objects(default_capacity, objects))
            .collect();
        inner.indices = indices;
        inner.initialized = true;
    }
}

impl Default for CacheBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dare_util::RecordingBugSink;

    fn new_block(default_capacity: u32) -> CacheBlock {
        let block = CacheBlock::new();
        let sink = RecordingBugSink::new();
        assert!(block.initialize("textures", "textures.cache", default_capacity, &sink));
        block
    }

    /// Spec §8 Scenario A — placement across blobs.
    #[test]
    fn scenario_a_placement_across_blobs() {
        let block = new_block(8 * 1024);
        let sink = RecordingBugSink::new();
        let entries = [
            (0u32, 2048u32),
            (1, 3072),
            (2, 2048),
            (3, 4096),
            (4, 256),
            (5, 767),
            (6, 2048),
            (7, 2049),
            (8, 2000),
        ];
        for (uid, size) in entries {
            assert!(block.create(uid, size, &sink).is_some(), "uid {uid} failed to place");
        }
        assert!(sink.messages().is_empty());

        let blob_of = |uid: u32| block.find(uid).unwrap().blob_id;
        assert_eq!(blob_of(0), 0);
        assert_eq!(blob_of(1), 0);
        assert_eq!(blob_of(2), 0);
        assert_eq!(blob_of(4), 0);
        assert_eq!(blob_of(5), 0);
        assert_eq!(blob_of(3), 1);
        assert_eq!(blob_of(6), 1);
        assert_eq!(blob_of(8), 1);
        assert_eq!(blob_of(7), 2);

        let stats = block.blob_stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].capacity - stats[0].used, 1);
        assert_eq!(stats[1].capacity - stats[1].used, 48);
        assert_eq!(stats[2].capacity - stats[2].used, 6143);
    }

    #[test]
    fn update_in_place_does_not_move_object() {
        let block = new_block(8 * 1024);
        let sink = RecordingBugSink::new();
        // Capacity is pinned to the size at reservation time; shrinking
        // then re-growing within that retained capacity stays in place.
        let idx = block.create(0, 900, &sink).unwrap();
        let shrunk = block.update(idx, 500, &sink).unwrap();
        assert_eq!(shrunk, idx);
        assert_eq!(block.get_object(shrunk).unwrap().size, 500);
        let regrown = block.update(idx, 800, &sink).unwrap();
        assert_eq!(regrown, idx);
        assert_eq!(block.get_object(regrown).unwrap().size, 800);
        assert_eq!(block.get_object(regrown).unwrap().capacity, 900);
    }

    #[test]
    fn update_spills_into_a_new_blob_when_no_blob_has_room() {
        let block = new_block(1024);
        let sink = RecordingBugSink::new();
        // Blob 0 is filled solid, so later growth can never land there.
        block.create(0, 1024, &sink).unwrap();
        let b = block.create(1, 512, &sink).unwrap();
        assert_eq!(b.blob_id, 1);
        let moved = block.update(b, 1024, &sink).unwrap();
        assert_eq!(moved.blob_id, 2, "must relocate to a fresh blob");
        assert_eq!(block.get_object(moved).unwrap().size, 1024);
        assert!(block.find(1).is_some());
    }

    #[test]
    fn destroy_then_create_reuses_the_tombstoned_slot() {
        let block = new_block(8 * 1024);
        let sink = RecordingBugSink::new();
        let idx = block.create(0, 256, &sink).unwrap();
        block.destroy(idx, &sink);
        assert!(block.find(0).is_none());
        let idx2 = block.create(1, 200, &sink).unwrap();
        assert_eq!(idx2.blob_id, idx.blob_id);
        assert_eq!(idx2.object_id, idx.object_id);
    }

    #[test]
    fn duplicate_uid_create_is_a_bug() {
        let block = new_block(8 * 1024);
        let sink = RecordingBugSink::new();
        block.create(0, 128, &sink).unwrap();
        assert!(block.create(0, 128, &sink).is_none());
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_OPERATION_OBJECT_EXISTS));
    }

    #[test]
    fn size_over_default_capacity_is_a_bug() {
        let block = new_block(1024);
        let sink = RecordingBugSink::new();
        assert!(block.create(0, 2048, &sink).is_none());
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_ARGUMENT_SIZE));
    }

    /// Defrag applied to the exact placement derived in
    /// `scenario_a_placement_across_blobs`: every live uid is relocated
    /// exactly once into a tightly packed, largest-first replica.
    #[test]
    fn defrag_plan_repacks_scenario_a_with_no_fragmentation() {
        let block = new_block(8 * 1024);
        let sink = RecordingBugSink::new();
        for (uid, size) in [
            (0u32, 2048u32),
            (1, 3072),
            (2, 2048),
            (3, 4096),
            (4, 256),
            (5, 767),
            (6, 2048),
            (7, 2049),
            (8, 2000),
        ] {
            block.create(uid, size, &sink).unwrap();
        }

        let steps = block.get_defrag_steps();
        assert_eq!(steps.len(), 9);

        let mut seen: Vec<u32> = steps.iter().map(|s| s.uid).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);

        // Largest object is packed first into blob 0 at object 0.
        let first = steps.first().unwrap();
        assert_eq!(first.uid, 3);
        assert_eq!(first.size, 4096);
        assert_eq!(first.dest_blob, 0);
        assert_eq!(first.dest_object, 0);

        // The replica never exceeds the configured default capacity.
        use std::collections::HashMap;
        let mut used: HashMap<u32, u32> = HashMap::new();
        for step in &steps {
            *used.entry(step.dest_blob).or_insert(0) += step.size;
        }
        for total in used.values() {
            assert!(*total <= 8 * 1024);
        }
    }
}
