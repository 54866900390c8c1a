//! `CacheBlob` — fixed-capacity byte arena with a first-fit allocator over
//! an insertion-ordered, location-contiguous object vector (spec §4.1).

use dare_util::BugSink;

use crate::error::{
    ERROR_MSG_INVALID_ARGUMENT_ASSET_ID, ERROR_MSG_INVALID_ARGUMENT_CAPACITY,
    ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID, ERROR_MSG_INVALID_ARGUMENT_SIZE,
    ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID, ERROR_MSG_INVALID_OPERATION_BLOB_INITIALIZED,
    ERROR_MSG_INVALID_OPERATION_BLOB_NOT_INITIALIZED,
};
use crate::object::{CacheObject, INVALID_UID};

/// Per-blob fragmentation/usage snapshot (`CacheTypes.h`'s `CacheBlobStats`,
/// surfaced in §4.1's prose as "fragmentation tracking").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheBlobStats {
    pub used: u32,
    pub reserved: u32,
    pub capacity: u32,
    pub object_count: u32,
    pub fragmented_bytes: u32,
    pub fragmented_objects: u32,
}

/// Fixed-capacity region hosting a sequence of [`CacheObject`] slots, laid
/// out strictly in increasing `location` order.
#[derive(Debug, Default)]
pub struct CacheBlob {
    objects: Vec<CacheObject>,
    used: u32,
    reserved: u32,
    capacity: u32,
    initialized: bool,
}

impl CacheBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an already-initialized blob directly; used by
    /// [`crate::block::CacheBlock`] when appending a fresh blob, where the
    /// "already initialized" bug path can never trigger.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            objects: Vec::new(),
            used: 0,
            reserved: 0,
            capacity,
            initialized: true,
        }
    }

    pub fn initialize(&mut self, capacity: u32, bugs: &dyn BugSink) -> bool {
        if self.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_BLOB_INITIALIZED);
            return false;
        }
        if capacity == 0 {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_CAPACITY);
            return false;
        }
        self.capacity = capacity;
        self.initialized = true;
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[CacheObject] {
        &self.objects
    }

    pub fn fragmented_bytes(&self) -> u32 {
        self.objects
            .iter()
            .filter(|o| o.is_tombstone())
            .map(|o| o.capacity)
            .sum()
    }

    pub fn fragmented_objects(&self) -> u32 {
        self.objects.iter().filter(|o| o.is_tombstone()).count() as u32
    }

    pub fn stats(&self) -> CacheBlobStats {
        CacheBlobStats {
            used: self.used,
            reserved: self.reserved,
            capacity: self.capacity,
            object_count: self.objects.len() as u32,
            fragmented_bytes: self.fragmented_bytes(),
            fragmented_objects: self.fragmented_objects(),
        }
    }

    /// First-fit-over-tombstones, else append-to-trailing-free-region
    /// (spec §4.1 steps 1-5). Returns `None` on capacity exhaustion (not a
    /// bug) and reports a bug for malformed input or an uninitialized blob.
    pub fn reserve(&mut self, uid: u32, size: u32, bugs: &dyn BugSink) -> Option<u32> {
        if !self.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_BLOB_NOT_INITIALIZED);
            return None;
        }
        if size == 0 {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_SIZE);
            return None;
        }
        if uid == INVALID_UID {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_ASSET_ID);
            return None;
        }
        if size > self.capacity.saturating_sub(self.used) {
            tracing::trace!(uid, size, "CacheBlob::reserve capacity outcome: no room");
            return None;
        }

        for (id, object) in self.objects.iter_mut().enumerate() {
            if object.is_tombstone() && object.capacity >= size {
                object.uid = uid;
                object.size = size;
                self.used += size;
                tracing::trace!(uid, id, "CacheBlob::reserve reused tombstone");
                return Some(id as u32);
            }
        }

        if size <= self.capacity.saturating_sub(self.reserved) {
            let location = self
                .objects
                .last()
                .map(|o| o.location + o.capacity)
                .unwrap_or(0);
            self.objects.push(CacheObject {
                uid,
                location,
                size,
                capacity: size,
            });
            self.used += size;
            self.reserved += size;
            let id = (self.objects.len() - 1) as u32;
            tracing::trace!(uid, id, location, "CacheBlob::reserve appended");
            return Some(id);
        }

        tracing::trace!(uid, size, "CacheBlob::reserve capacity outcome: fragmented");
        None
    }

    /// Resizes an existing slot in place. Fails (without reporting a bug)
    /// if `size` exceeds the slot's retained capacity — callers (namely
    /// [`crate::block::CacheBlock`]) interpret that as a signal to relocate
    /// the object rather than as misuse.
    pub fn update(&mut self, object_id: u32, size: u32, bugs: &dyn BugSink) -> bool {
        if !self.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_BLOB_NOT_INITIALIZED);
            return false;
        }
        if size == 0 {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_SIZE);
            return false;
        }
        let Some(object) = self.objects.get_mut(object_id as usize) else {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID);
            return false;
        };
        if object.is_tombstone() {
            bugs.report(ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID);
            return false;
        }
        if size > object.capacity {
            return false;
        }
        self.used = self.used - object.size + size;
        object.size = size;
        true
    }

    /// Tombstones a slot: `uid <- INVALID`, `size <- 0`, `capacity` kept so
    /// later slots retain their offsets.
    pub fn destroy(&mut self, object_id: u32, bugs: &dyn BugSink) -> bool {
        if !self.initialized {
            bugs.report(ERROR_MSG_INVALID_OPERATION_BLOB_NOT_INITIALIZED);
            return false;
        }
        let Some(object) = self.objects.get_mut(object_id as usize) else {
            bugs.report(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID);
            return false;
        };
        if object.is_tombstone() {
            bugs.report(ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID);
            return false;
        }
        self.used -= object.size;
        object.uid = INVALID_UID;
        object.size = 0;
        true
    }

    pub fn get_object(&self, object_id: u32) -> Option<CacheObject> {
        self.objects.get(object_id as usize).copied()
    }

    /// Rebuilds a blob from a previously persisted object vector (`.lfindex`
    /// restore), recomputing `used`/`reserved` from the objects themselves.
    pub fn from_objects(capacity: u32, objects: Vec<CacheObject>) -> Self {
        let used = objects.iter().filter(|o| !o.is_tombstone()).map(|o| o.size).sum();
        let reserved = objects.iter().map(|o| o.capacity).sum();
        Self {
            objects,
            used,
            reserved,
            capacity,
            initialized: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dare_util::RecordingBugSink;

    #[test]
    fn reserve_fills_empty_blob_exactly() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 1024, &sink).unwrap();
        assert_eq!(id, 0);
        assert_eq!(blob.used(), 1024);
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn reserve_over_capacity_plus_one_fails_without_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        assert!(blob.reserve(0, 1025, &sink).is_none());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn reserve_zero_size_is_a_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        assert!(blob.reserve(0, 0, &sink).is_none());
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_ARGUMENT_SIZE));
    }

    #[test]
    fn reserve_invalid_uid_is_a_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        assert!(blob.reserve(INVALID_UID, 10, &sink).is_none());
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_ARGUMENT_ASSET_ID));
    }

    #[test]
    fn destroy_then_reserve_reuses_same_slot() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 256, &sink).unwrap();
        assert!(blob.destroy(id, &sink));
        let id2 = blob.reserve(1, 200, &sink).unwrap();
        assert_eq!(id, id2);
        let obj = blob.get_object(id2).unwrap();
        assert_eq!(obj.capacity, 256);
        assert_eq!(obj.size, 200);
    }

    #[test]
    fn destroy_of_tombstone_is_a_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 10, &sink).unwrap();
        assert!(blob.destroy(id, &sink));
        assert!(!blob.destroy(id, &sink));
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID));
    }

    #[test]
    fn update_of_tombstone_is_a_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 10, &sink).unwrap();
        blob.destroy(id, &sink);
        assert!(!blob.update(id, 5, &sink));
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID));
    }

    #[test]
    fn update_beyond_capacity_fails_quietly() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 10, &sink).unwrap();
        assert!(!blob.update(id, 11, &sink));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn update_in_place_shrinks_used() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let id = blob.reserve(0, 100, &sink).unwrap();
        assert!(blob.update(id, 40, &sink));
        assert_eq!(blob.used(), 40);
        assert_eq!(blob.get_object(id).unwrap().capacity, 100);
    }

    #[test]
    fn fragmentation_metrics_count_tombstones() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        let a = blob.reserve(0, 100, &sink).unwrap();
        let _b = blob.reserve(1, 200, &sink).unwrap();
        blob.destroy(a, &sink);
        assert_eq!(blob.fragmented_bytes(), 100);
        assert_eq!(blob.fragmented_objects(), 1);
    }

    #[test]
    fn out_of_range_object_id_is_a_bug() {
        let mut blob = CacheBlob::with_capacity(1024);
        let sink = RecordingBugSink::new();
        assert!(!blob.update(99, 1, &sink));
        assert_eq!(sink.last(), Some(ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID));
    }
}
