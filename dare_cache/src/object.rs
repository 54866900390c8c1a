//! `CacheObject` and `CacheIndex` — the locator types spec section 3 builds
//! everything else on top of.

use serde::{Deserialize, Serialize};

/// Sentinel UID denoting a tombstone (a destroyed slot whose capacity is
/// kept around so later objects keep their offsets).
pub const INVALID_UID: u32 = u32::MAX;

/// One record per live or dead slot within a [`crate::blob::CacheBlob`].
///
/// Invariant (spec §3): for all `i > 0`,
/// `objects[i].location == objects[i-1].location + objects[i-1].capacity`;
/// `sum(capacity) <= blob.capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheObject {
    pub uid: u32,
    pub location: u32,
    pub size: u32,
    pub capacity: u32,
}

impl CacheObject {
    pub fn is_tombstone(&self) -> bool {
        self.uid == INVALID_UID
    }
}

/// Locator triple `(uid, blobID, objectID)`. "Valid" iff all three fields
/// are set, i.e. this is never constructed with a sentinel blob/object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    pub uid: u32,
    pub blob_id: u32,
    pub object_id: u32,
}

impl CacheIndex {
    pub fn new(uid: u32, blob_id: u32, object_id: u32) -> Self {
        Self {
            uid,
            blob_id,
            object_id,
        }
    }
}
