//! `TAsset<T>`/`TAssetType<T>` — spec section 3's redesigned reference
//! semantics, replacing the source's `TAtomicStrongPointer`/
//! `TAtomicWeakPointer` intrusive smart pointers (spec section 9).

use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::asset_object::AssetObject;
use crate::type_info::{DynamicTuple, InstanceCell};

/// Weak-by-type reference: pins a type's *existence* without forcing its
/// prototype to load. Increments `AssetHandle::weak_refs` on construction,
/// decrements on drop.
pub struct TAssetType<T: AssetObject> {
    tuple: Arc<DynamicTuple>,
    _marker: PhantomData<T>,
}

impl<T: AssetObject> TAssetType<T> {
    pub fn new(tuple: Arc<DynamicTuple>) -> Self {
        tuple.handle.weak_refs.fetch_add(1, Ordering::AcqRel);
        Self {
            tuple,
            _marker: PhantomData,
        }
    }

    pub fn tuple(&self) -> &Arc<DynamicTuple> {
        &self.tuple
    }
}

impl<T: AssetObject> Clone for TAssetType<T> {
    fn clone(&self) -> Self {
        Self::new(self.tuple.clone())
    }
}

impl<T: AssetObject> Drop for TAssetType<T> {
    fn drop(&mut self) {
        self.tuple.handle.weak_refs.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Strong reference: keeps a cloned `AssetObject` instance alive and
/// increments `AssetHandle::strong_refs` on the handle for as long as this
/// (or any clone of it) is held.
pub struct TAsset<T: AssetObject> {
    tuple: Arc<DynamicTuple>,
    instance: InstanceCell,
    _marker: PhantomData<T>,
}

impl<T: AssetObject> TAsset<T> {
    pub(crate) fn new(tuple: Arc<DynamicTuple>, instance: InstanceCell) -> Self {
        tuple.handle.strong_refs.fetch_add(1, Ordering::AcqRel);
        Self {
            tuple,
            instance,
            _marker: PhantomData,
        }
    }

    pub fn tuple(&self) -> &Arc<DynamicTuple> {
        &self.tuple
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.instance.read();
        guard.as_any().downcast_ref::<T>().map(f)
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.instance.write();
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }
}

impl<T: AssetObject> Clone for TAsset<T> {
    fn clone(&self) -> Self {
        self.tuple.handle.strong_refs.fetch_add(1, Ordering::AcqRel);
        Self {
            tuple: self.tuple.clone(),
            instance: self.instance.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: AssetObject> Drop for TAsset<T> {
    fn drop(&mut self) {
        self.tuple.handle.strong_refs.fetch_sub(1, Ordering::AcqRel);
    }
}
