//! `AssetObject` — the trait boundary for prototype/instance payloads.
//! Spec section 1 puts the streaming/serialization formats *inside* a cache
//! object out of scope ("only their size and boundaries matter here"); this
//! crate only needs payloads that can serialize themselves into a buffer and
//! rehydrate from one, since `createInstance`/`updateInstances` (spec
//! section 4.4) clone prototypes via a serialize/deserialize round trip
//! rather than a language-level `Clone`.

use std::any::Any;

pub trait AssetObject: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Serializes this object's content into a byte buffer. Round-tripping
    /// through `deserialize_into` on a freshly-constructed instance of the
    /// same concrete type must reproduce equivalent content (spec section 8:
    /// "effective deep clone via the round-trip law").
    fn serialize(&self) -> Vec<u8>;

    /// Overwrites this object's content from a buffer produced by
    /// `serialize` on an instance of the same concrete type.
    fn deserialize_into(&mut self, bytes: &[u8]);
}

impl dyn AssetObject {
    pub fn downcast_ref<T: AssetObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: AssetObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
