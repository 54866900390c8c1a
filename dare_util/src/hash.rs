//! Content digest used for `AssetTypeInfo::modify_hash` (spec section 3).
//!
//! Neither the teacher workspace nor any sibling example crate depends on a
//! dedicated hashing crate (blake3, xxhash, seahash...), so rather than pull
//! in an ungrounded dependency for a single digest field this wraps the
//! standard library's `SipHash` (`DefaultHasher`) behind a named type. See
//! DESIGN.md for the Open Question this resolves.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetHash(pub u64);

impl AssetHash {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for AssetHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
