//! `AssetTypeInfo`, `AssetHandle`, and `DynamicTuple` — the per-asset record
//! spec section 3 describes, reworked per section 9's Design Notes away
//! from the source's intrusive atomic smart pointers: a handle's parent
//! link is a `(arena_id, generation)` weak reference into the domain's
//! arena (`dare_containers::SparseSlotMap`) rather than a raw pointer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use dare_containers::prelude::DefaultSlot;
use dare_util::reflection::ConcreteTypeId;
use dare_util::AssetHash;
use parking_lot::RwLock as RecordLock;

use crate::asset_object::AssetObject;
use crate::load_state::{LoadState, OpSlot};
use crate::path::AssetPath;

/// A weak, generation-checked reference to another domain entry — the
/// `(arena_id, generation)` pair from spec section 9, standing in for the
/// source's `AssetTypeInfo*` parent pointer.
pub type TypeSlot = DefaultSlot<Arc<DynamicTuple>>;

/// Mutable fields of spec section 3's `AssetTypeInfo`, guarded by the
/// type's own per-record read/write lock. Reference counts live outside
/// this lock on `DynamicTuple` directly, since they must be touchable
/// without blocking on the record lock (spec section 5).
pub struct AssetTypeInfo {
    pub path: AssetPath,
    /// `INVALID` (`u32::MAX`) for engine concrete-type-only records,
    /// addressable only by name (spec section 4.4, step 2).
    pub uid: u32,
    pub concrete_type: ConcreteTypeId,
    pub parent: Option<TypeSlot>,
    pub cache_index: Option<dare_cache::CacheIndex>,
    pub load_state: LoadState,
    pub modify_hash: AssetHash,
    pub modify_date: u64,
}

impl AssetTypeInfo {
    pub fn new(path: AssetPath, uid: u32, concrete_type: ConcreteTypeId) -> Self {
        Self {
            path,
            uid,
            concrete_type,
            parent: None,
            cache_index: None,
            load_state: LoadState::Unloaded,
            modify_hash: AssetHash::default(),
            modify_date: 0,
        }
    }
}

/// Shared object associated with a type (spec section 3). `strong_refs`/
/// `weak_refs` are the *handle's* holder counts driven by `TAsset<T>`/
/// `TAssetType<T>` — distinct from `DynamicTuple::strong_references`/
/// `weak_references`, which track the dependency graph via
/// `add_dependency`/`remove_dependency`.
pub struct AssetHandle {
    pub(crate) prototype: RecordLock<Option<Box<dyn AssetObject>>>,
    pub strong_refs: AtomicU32,
    pub weak_refs: AtomicU32,
}

impl AssetHandle {
    pub fn new() -> Self {
        Self {
            prototype: RecordLock::new(None),
            strong_refs: AtomicU32::new(0),
            weak_refs: AtomicU32::new(0),
        }
    }

    pub fn has_prototype(&self) -> bool {
        self.prototype.read().is_some()
    }
}

impl Default for AssetHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub type InstanceCell = Arc<RecordLock<Box<dyn AssetObject>>>;
pub type WeakInstanceRef = Weak<RecordLock<Box<dyn AssetObject>>>;

/// `{ AssetTypeInfo type; AssetHandle handle; WeakInstanceList instances }`
/// (spec section 3). One tuple per registered asset; its address is stable
/// for the domain's lifetime since it's held behind an `Arc` inside the
/// domain's arena slot, never moved out.
pub struct DynamicTuple {
    pub info: RecordLock<AssetTypeInfo>,
    pub handle: AssetHandle,
    /// Weak-by-type reference count on this type's own record, touched by
    /// `add_dependency`/`remove_dependency` — the dependency graph's rung,
    /// not the handle's holder count.
    pub strong_references: AtomicU32,
    pub weak_references: AtomicU32,
    pub op_state: OpSlot,
    pub instances: spin::Mutex<Vec<WeakInstanceRef>>,
}

impl DynamicTuple {
    pub fn new(info: AssetTypeInfo) -> Arc<Self> {
        Arc::new(Self {
            info: RecordLock::new(info),
            handle: AssetHandle::new(),
            strong_references: AtomicU32::new(0),
            weak_references: AtomicU32::new(0),
            op_state: OpSlot::new(),
            instances: spin::Mutex::new(Vec::new()),
        })
    }

    /// Dependency-graph reference (spec section 4.4's `AddDependency`),
    /// distinct from the handle's holder refs.
    pub fn add_dependency(&self, strong: bool) {
        if strong {
            self.strong_references.fetch_add(1, Ordering::AcqRel);
        } else {
            self.weak_references.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn remove_dependency(&self, strong: bool) {
        if strong {
            self.strong_references.fetch_sub(1, Ordering::AcqRel);
        } else {
            self.weak_references.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Whether any instance in the weak list still resolves.
    pub fn has_live_instances(&self) -> bool {
        self.instances.lock().iter().any(|w| w.strong_count() > 0)
    }

    /// Swap-erases dead weak references (spec section 4.4's GC sweep,
    /// "the only place weak-list shrinks").
    pub fn collect_garbage(&self) {
        self.instances.lock().retain(|w| w.strong_count() > 0);
    }
}
