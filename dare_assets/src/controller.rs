//! `AssetDataController` (spec section 4.4) — the in-memory registry of
//! `AssetTypeInfo` records: per-domain tables keyed by name/alias/UID,
//! prototype/instance lifetime, reference counting, the load-state
//! machine, and weak-handle GC.
//!
//! Grounded on `Controllers/AssetDataController.cpp`'s `LoadDomain`,
//! `CreateType`, `Find`, `CreatePrototype`/`UnloadPrototype`,
//! `CreateInstance`/`UpdateInstances`, `CollectGarbage`, `GenerateUID`, and
//! the three `GetProcessor` overloads.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dare_cache::{CacheBlockType, CacheIndex, INVALID_UID};
use dare_containers::dashmap::DashMap;
use dare_containers::prelude::{Container, SparseSlotMap};
use dare_util::reflection::ConcreteTypeId;
use dare_util::Services;

use crate::asset_object::AssetObject;
use crate::error::{
    AssetDataError, ERROR_MSG_INVALID_OPERATION_DOMAIN_EXISTS,
    ERROR_MSG_INVALID_OPERATION_LIVE_INSTANCES, ERROR_MSG_INVALID_OPERATION_PROTOTYPE_TYPE,
    ERROR_MSG_INVALID_OPERATION_STRONG_REFS,
};
use crate::load_state::LoadState;
use crate::path::AssetPath;
use crate::processor::{AssetProcessor, ProcessorRegistry};
use crate::reference::TAsset;
use crate::type_info::{AssetTypeInfo, DynamicTuple, InstanceCell, TypeSlot};
use crate::typemap::AssetTypeMap;

/// UID generation (spec section 4.4 / 9's Open Question resolution): draw
/// from a secure RNG until the id is absent from the id table, but cap
/// attempts and report a hard error instead of looping forever.
const MAX_UID_ATTEMPTS: u32 = 64;

struct DomainTable {
    arena: SparseSlotMap<Arc<DynamicTuple>>,
    /// Includes both the canonical path key and any aliases (e.g. the bare
    /// concrete-type name for engine types, spec section 4.4 step 2).
    by_name: DashMap<String, TypeSlot>,
    by_uid: DashMap<u32, TypeSlot>,
}

impl DomainTable {
    fn new() -> Self {
        Self {
            arena: SparseSlotMap::new(),
            by_name: DashMap::new(),
            by_uid: DashMap::new(),
        }
    }

    fn insert(&mut self, tuple: Arc<DynamicTuple>, keys: &[String], uid: Option<u32>) -> TypeSlot {
        let slot = self.arena.insert(tuple);
        for key in keys {
            self.by_name.insert(key.clone(), slot.clone());
        }
        if let Some(uid) = uid {
            self.by_uid.insert(uid, slot.clone());
        }
        slot
    }

    fn get(&self, slot: &TypeSlot) -> Option<Arc<DynamicTuple>> {
        self.arena.with_slot(slot, |t| t.clone()).ok()
    }
}

pub struct AssetDataController {
    domains: spin::RwLock<HashMap<String, DomainTable>>,
    /// Global UID -> owning domain, enforcing spec section 8 invariant 4
    /// (UID uniqueness across all domains) and backing `generate_uid`'s
    /// collision check.
    uid_domains: DashMap<u32, String>,
    processors: parking_lot::RwLock<ProcessorRegistry>,
}

impl AssetDataController {
    pub fn new() -> Self {
        Self {
            domains: spin::RwLock::new(HashMap::new()),
            uid_domains: DashMap::new(),
            processors: parking_lot::RwLock::new(ProcessorRegistry::new()),
        }
    }

    pub fn register_processor(&self, processor: Arc<dyn AssetProcessor>) {
        self.processors.write().register(processor);
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.domains.read().contains_key(domain)
    }

    pub fn domains(&self) -> Vec<String> {
        self.domains.read().keys().cloned().collect()
    }

    /// `loadDomain(domain, typeMap)` (spec section 4.4).
    pub fn load_domain(
        &self,
        domain: &str,
        type_map: &AssetTypeMap,
        services: &Services,
    ) -> Result<(), AssetDataError> {
        if self.has_domain(domain) {
            services
                .bug_sink()
                .report(ERROR_MSG_INVALID_OPERATION_DOMAIN_EXISTS);
            return Err(AssetDataError::DomainExists);
        }

        let mut table = DomainTable::new();

        // Step 2: for the engine domain only, enumerate concrete
        // AssetObject-descended reflected types; key by the engine/Types
        // path and alias by the bare type name. UID is INVALID: these are
        // addressable only by name.
        if domain == "engine" {
            for (name, concrete_type) in services.reflection().registered_types() {
                let path = AssetPath::engine_type(&name);
                let tuple = DynamicTuple::new(AssetTypeInfo::new(
                    path.clone(),
                    INVALID_UID,
                    concrete_type,
                ));
                table.insert(tuple, &[path.to_string(), name], None);
            }
        }

        // Step 3: one AssetTypeInfo per data-driven typemap entry.
        let mut by_path_slot: HashMap<String, TypeSlot> = HashMap::new();
        let mut pending_parents: Vec<(TypeSlot, Option<u32>, String)> = Vec::new();
        for mapping in type_map.types() {
            let path = AssetPath::parse(&mapping.path)
                .ok_or_else(|| AssetDataError::MalformedPath(mapping.path.clone()))?;
            let concrete_type = services
                .reflection()
                .find_type(&mapping.concrete_type)
                .ok_or(AssetDataError::NoType)?;

            let mut info = AssetTypeInfo::new(path.clone(), mapping.cache_uid, concrete_type);
            if mapping.cache_uid != INVALID_UID {
                info.cache_index = Some(CacheIndex::new(
                    mapping.cache_uid,
                    mapping.cache_blob_id,
                    mapping.cache_object_id,
                ));
            }
            let tuple = DynamicTuple::new(info);
            tuple
                .strong_references
                .store(mapping.strong_references, Ordering::Release);
            tuple
                .weak_references
                .store(mapping.weak_references, Ordering::Release);

            let uid = (mapping.cache_uid != INVALID_UID).then_some(mapping.cache_uid);
            let slot = table.insert(tuple, &[path.to_string()], uid);
            if let Some(uid) = uid {
                self.uid_domains.insert(uid, domain.to_string());
            }
            by_path_slot.insert(mapping.path.clone(), slot.clone());
            pending_parents.push((slot, mapping.parent_uid, mapping.concrete_type.clone()));
        }

        // Step 4: second pass, link parent pointers. A declared parent UID
        // resolves within this same domain's load (mods only declare
        // parents among their own or already-loaded engine entries); an
        // empty parent falls back to the concrete-type alias record.
        for (slot, parent_uid, concrete_name) in pending_parents {
            let parent_slot = match parent_uid {
                Some(uid) => table.by_uid.get(&uid).map(|r| r.clone()),
                None => table.by_name.get(&concrete_name).map(|r| r.clone()),
            };
            if let (Some(tuple), Some(parent_slot)) = (table.get(&slot), parent_slot) {
                tuple.info.write().parent = Some(parent_slot);
            }
        }

        self.domains.write().insert(domain.to_string(), table);
        tracing::debug!(domain, "AssetDataController::load_domain");
        Ok(())
    }

    /// Drops every record in `domain` and releases its UIDs back to the
    /// global pool (`ReleaseDomainContext` in the source).
    pub fn release_domain(&self, domain: &str) -> Result<(), AssetDataError> {
        let table = self
            .domains
            .write()
            .remove(domain)
            .ok_or(AssetDataError::NoDomain)?;
        for entry in table.by_uid.iter() {
            self.uid_domains.remove(entry.key());
        }
        Ok(())
    }

    /// Registers a new runtime type (used by dynamic creation and ops like
    /// `SaveDomainOp`'s siblings), generating a fresh UID.
    pub fn create_type(
        &self,
        domain: &str,
        path: AssetPath,
        concrete_type: ConcreteTypeId,
    ) -> Result<Arc<DynamicTuple>, AssetDataError> {
        let uid = self.generate_uid()?;
        let mut domains = self.domains.write();
        let table = domains.get_mut(domain).ok_or(AssetDataError::NoDomain)?;
        let tuple = DynamicTuple::new(AssetTypeInfo::new(path.clone(), uid, concrete_type));
        table.insert(tuple.clone(), &[path.to_string()], Some(uid));
        self.uid_domains.insert(uid, domain.to_string());
        Ok(tuple)
    }

    /// Any state -> DELETED (spec section 4.4 state machine), terminal.
    pub fn delete_type(&self, tuple: &Arc<DynamicTuple>) {
        tuple.info.write().load_state = LoadState::Deleted;
    }

    pub fn find_by_path(&self, domain: &str, path: &AssetPath) -> Option<Arc<DynamicTuple>> {
        let domains = self.domains.read();
        let table = domains.get(domain)?;
        let slot = table.by_name.get(&path.to_string())?.clone();
        table.get(&slot)
    }

    pub fn find_by_name(&self, domain: &str, name: &str) -> Option<Arc<DynamicTuple>> {
        let domains = self.domains.read();
        let table = domains.get(domain)?;
        let slot = table.by_name.get(name)?.clone();
        table.get(&slot)
    }

    /// UID lookup is global: uids are unique across all domains (spec
    /// section 8, invariant 4).
    pub fn find_by_uid(&self, uid: u32) -> Option<Arc<DynamicTuple>> {
        let domain = self.uid_domains.get(&uid)?.clone();
        let domains = self.domains.read();
        let table = domains.get(&domain)?;
        let slot = table.by_uid.get(&uid)?.clone();
        table.get(&slot)
    }

    /// `generateUID`: draw from a secure RNG, rejecting draws already in
    /// the id table, capped at `MAX_UID_ATTEMPTS` (spec section 9's Open
    /// Question resolution: cap attempts and report a hard error instead
    /// of looping unboundedly).
    pub fn generate_uid(&self) -> Result<u32, AssetDataError> {
        for _ in 0..MAX_UID_ATTEMPTS {
            let candidate: u32 = rand::random();
            if candidate == INVALID_UID {
                continue;
            }
            if !self.uid_domains.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(AssetDataError::UidExhausted {
            attempts: MAX_UID_ATTEMPTS,
        })
    }

    /// `createPrototype(type) -> (ok, AssetHandle*)` (spec section 4.4).
    /// Takes the type's write lock for the duration of the call.
    pub fn create_prototype(
        &self,
        tuple: &Arc<DynamicTuple>,
        services: &Services,
    ) -> Result<(), AssetDataError> {
        let mut info = tuple.info.write();
        if tuple.handle.has_prototype() {
            return Ok(());
        }
        let processor = self
            .processors
            .read()
            .find_by_concrete_type(services.reflection(), info.concrete_type)
            .ok_or(AssetDataError::NoProcessor)?;
        let prototype_type = match processor.prototype_type(info.concrete_type) {
            Some(ty) => ty,
            None => {
                services
                    .bug_sink()
                    .report(ERROR_MSG_INVALID_OPERATION_PROTOTYPE_TYPE);
                return Err(AssetDataError::NoProcessor);
            }
        };
        let mut prototype = match processor.instantiate(prototype_type) {
            Some(obj) => obj,
            None => {
                services
                    .bug_sink()
                    .report(ERROR_MSG_INVALID_OPERATION_PROTOTYPE_TYPE);
                return Err(AssetDataError::NoProcessor);
            }
        };
        processor.on_create_prototype(prototype.as_mut());
        *tuple.handle.prototype.write() = Some(prototype);
        tuple.handle.weak_refs.store(1, Ordering::Release);
        info.load_state = LoadState::Loaded;
        tracing::trace!(path = %info.path, "AssetDataController::create_prototype");
        Ok(())
    }

    /// `unloadPrototype(type)` (spec section 4.4).
    pub fn unload_prototype(
        &self,
        tuple: &Arc<DynamicTuple>,
        services: &Services,
    ) -> Result<(), AssetDataError> {
        let mut info = tuple.info.write();
        if tuple.handle.strong_refs.load(Ordering::Acquire) > 0 {
            services
                .bug_sink()
                .report(ERROR_MSG_INVALID_OPERATION_STRONG_REFS);
            return Err(AssetDataError::StrongReferencesOutstanding);
        }
        if tuple.has_live_instances() {
            services
                .bug_sink()
                .report(ERROR_MSG_INVALID_OPERATION_LIVE_INSTANCES);
            return Err(AssetDataError::LiveInstancesOutstanding);
        }
        let processor = self
            .processors
            .read()
            .find_by_concrete_type(services.reflection(), info.concrete_type);
        if let Some(mut prototype) = tuple.handle.prototype.write().take() {
            if let Some(processor) = processor {
                processor.on_destroy_prototype(prototype.as_mut());
            }
        }
        tuple.handle.weak_refs.store(0, Ordering::Release);
        info.load_state = LoadState::Unloaded;
        Ok(())
    }

    /// `createInstance(type)` (spec section 4.4): serializes the prototype
    /// and deserializes into a freshly-constructed instance (the round-trip
    /// clone law of spec section 8), then tracks it via a weak reference.
    pub fn create_instance<T: AssetObject>(
        &self,
        tuple: &Arc<DynamicTuple>,
        services: &Services,
    ) -> Result<TAsset<T>, AssetDataError> {
        let concrete_type = {
            let info = tuple.info.read();
            if info.load_state != LoadState::Loaded {
                return Err(AssetDataError::NotLoaded);
            }
            info.concrete_type
        };
        let processor = self
            .processors
            .read()
            .find_by_concrete_type(services.reflection(), concrete_type)
            .ok_or(AssetDataError::NoProcessor)?;
        let mut instance = processor
            .instantiate(concrete_type)
            .ok_or(AssetDataError::NoProcessor)?;
        let bytes = {
            let prototype = tuple.handle.prototype.read();
            prototype
                .as_ref()
                .ok_or(AssetDataError::NotLoaded)?
                .serialize()
        };
        instance.deserialize_into(&bytes);
        let cell: InstanceCell = Arc::new(parking_lot::RwLock::new(instance));
        tuple.instances.lock().push(Arc::downgrade(&cell));
        Ok(TAsset::new(tuple.clone(), cell))
    }

    /// `updateInstances(type, sourceObject)` (spec section 4.4): propagates
    /// `source`'s content into every live instance, preserving identity.
    pub fn update_instances(&self, tuple: &Arc<DynamicTuple>, source: &dyn AssetObject) {
        let bytes = source.serialize();
        for weak in tuple.instances.lock().iter() {
            if let Some(instance) = weak.upgrade() {
                instance.write().deserialize_into(&bytes);
            }
        }
    }

    /// GC sweep (spec section 4.4): called each frame/tick, swap-erases
    /// every type's dead weak instance references.
    pub fn update(&self) {
        let domains = self.domains.read();
        for table in domains.values() {
            for entry in table.arena.iter() {
                if let Some(tuple) = entry.data {
                    tuple.collect_garbage();
                }
            }
        }
    }

    pub fn find_processor_by_concrete_type(
        &self,
        services: &Services,
        ty: ConcreteTypeId,
    ) -> Option<Arc<dyn AssetProcessor>> {
        self.processors
            .read()
            .find_by_concrete_type(services.reflection(), ty)
    }

    pub fn find_processor_by_path(&self, path: &AssetPath) -> Option<Arc<dyn AssetProcessor>> {
        self.processors.read().find_by_path(path)
    }

    pub fn find_processor_by_block_type(
        &self,
        block_type: CacheBlockType,
    ) -> Option<Arc<dyn AssetProcessor>> {
        self.processors.read().find_by_block_type(block_type)
    }

    /// `queryInfo(type, query) -> info` (spec section 4.3), split across the
    /// two crates that own each half: the content hash is read back and
    /// hashed through `cache` (`AssetCacheController::query_hash`); the
    /// modify date is read straight off the type record, matching the
    /// original's "cache modify date is whats on the type" comment
    /// (`Controllers/AssetCacheController.cpp`). Requires a cache index to
    /// be set on the type, same as the original's `Invalid(type->GetCacheIndex())`
    /// guard.
    pub fn query_info(
        &self,
        tuple: &Arc<DynamicTuple>,
        cache: &dare_cache::AssetCacheController,
        domain: &str,
        block_type: CacheBlockType,
        query: AssetInfoQuery,
    ) -> Result<AssetInfoQueryResult, AssetDataError> {
        let info = tuple.info.read();
        let cache_index = info.cache_index.ok_or(AssetDataError::NoCacheIndex)?;
        let mut result = AssetInfoQueryResult::default();
        if query.hash {
            result.hash = Some(cache.query_hash(domain, block_type, cache_index.uid)?);
        }
        if query.modify_date {
            result.modify_date = Some(info.modify_date);
        }
        Ok(result)
    }
}

/// Which fields of [`AssetInfoQueryResult`] `query_info` should populate
/// (spec section 4.3's `AssetInfoQuery`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetInfoQuery {
    pub hash: bool,
    pub modify_date: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssetInfoQueryResult {
    pub hash: Option<dare_util::AssetHash>,
    pub modify_date: Option<u64>,
}

impl Default for AssetDataController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_object::test_support::{StubAssetCharacter, StubAssetHunter};
    use crate::typemap::AssetTypeMapping;
    use dare_util::{ReflectionService, Services, StaticReflectionService, TracingBugSink};
    use std::any::TypeId;
    use std::sync::Arc as StdArc;

    struct StubHunterProcessor;
    impl AssetProcessor for StubHunterProcessor {
        fn target_type(&self) -> ConcreteTypeId {
            TypeId::of::<StubAssetHunter>()
        }
        fn prototype_type(&self, concrete: ConcreteTypeId) -> Option<ConcreteTypeId> {
            Some(concrete)
        }
        fn instantiate(&self, ty: ConcreteTypeId) -> Option<Box<dyn AssetObject>> {
            if ty == TypeId::of::<StubAssetHunter>() {
                Some(Box::new(StubAssetHunter::default()))
            } else {
                None
            }
        }
        fn cache_block_score(&self, _block_type: CacheBlockType) -> Option<u32> {
            Some(1)
        }
        fn accept_import_path(&self, _path: &AssetPath) -> bool {
            false
        }
    }

    fn services_with_hunter() -> Services {
        let mut reflection = StaticReflectionService::new();
        reflection.register::<StubAssetCharacter>("StubAssetCharacter");
        reflection
            .register_with_parent::<StubAssetHunter, StubAssetCharacter>("StubAssetHunter");
        Services::new(
            StdArc::new(TracingBugSink::new()),
            StdArc::new(reflection),
            StdArc::new(dare_util::ThreadWorkerPool::new(1)),
        )
    }

    #[test]
    fn load_domain_rejects_duplicate_registration() {
        let controller = AssetDataController::new();
        let services = services_with_hunter();
        controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap();
        let err = controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap_err();
        assert!(matches!(err, AssetDataError::DomainExists));
    }

    #[test]
    fn scenario_e_prototype_lifecycle() {
        let controller = AssetDataController::new();
        controller.register_processor(StdArc::new(StubHunterProcessor));
        let services = services_with_hunter();

        let type_map = AssetTypeMap {
            types: vec![AssetTypeMapping {
                path: "/engine/npcs/boss.hunter".to_string(),
                parent_uid: None,
                concrete_type: "StubAssetHunter".to_string(),
                cache_uid: 7,
                cache_blob_id: 0,
                cache_object_id: 0,
                weak_references: 0,
                strong_references: 0,
            }],
        };
        controller
            .load_domain("engine", &type_map, &services)
            .unwrap();
        let tuple = controller
            .find_by_path("engine", &AssetPath::parse("/engine/npcs/boss.hunter").unwrap())
            .unwrap();

        controller.create_prototype(&tuple, &services).unwrap();
        assert_eq!(tuple.info.read().load_state, LoadState::Loaded);
        assert_eq!(tuple.handle.strong_refs.load(Ordering::Acquire), 0);
        assert_eq!(tuple.handle.weak_refs.load(Ordering::Acquire), 1);

        let instance = controller
            .create_instance::<StubAssetHunter>(&tuple, &services)
            .unwrap();
        assert_eq!(tuple.instances.lock().len(), 1);
        assert_eq!(tuple.handle.strong_refs.load(Ordering::Acquire), 1);

        drop(instance);
        controller.update();
        assert!(tuple.instances.lock().is_empty());
        controller.unload_prototype(&tuple, &services).unwrap();
        assert_eq!(tuple.info.read().load_state, LoadState::Unloaded);
    }

    #[test]
    fn scenario_f_double_set_op_exactly_one_winner() {
        let controller = AssetDataController::new();
        let services = services_with_hunter();
        controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap();
        let tuple = controller
            .create_type(
                "engine",
                AssetPath::parse("/engine/npcs/boss.hunter").unwrap(),
                TypeId::of::<StubAssetHunter>(),
            )
            .unwrap();

        let a = tuple.op_state.set_op(crate::load_state::OpState::Loading);
        let b = tuple.op_state.set_op(crate::load_state::OpState::Loading);
        assert!(a ^ b);
    }

    #[test]
    fn generate_uid_is_unique_across_calls() {
        let controller = AssetDataController::new();
        let services = services_with_hunter();
        controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..32 {
            let tuple = controller
                .create_type(
                    "engine",
                    AssetPath::parse(&format!("/engine/gen/{}", seen.len())).unwrap(),
                    TypeId::of::<StubAssetHunter>(),
                )
                .unwrap();
            let uid = tuple.info.read().uid;
            assert!(seen.insert(uid), "uid {uid} was generated twice");
        }
    }

    #[test]
    fn query_info_reports_hash_and_modify_date_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dare_cache::AssetCacheController::new();
        cache.add_domain("engine", dir.path()).unwrap();
        let bugs = dare_util::RecordingBugSink::new();

        let controller = AssetDataController::new();
        let services = services_with_hunter();
        controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap();
        let tuple = controller
            .create_type(
                "engine",
                AssetPath::parse("/engine/npcs/boss.hunter").unwrap(),
                TypeId::of::<StubAssetHunter>(),
            )
            .unwrap();
        let uid = tuple.info.read().uid;

        let idx = cache
            .write("engine", CacheBlockType::Object, uid, b"hunter bytes", &bugs)
            .unwrap();
        tuple.info.write().cache_index = Some(idx);
        tuple.info.write().modify_date = 42;

        let result = controller
            .query_info(
                &tuple,
                &cache,
                "engine",
                CacheBlockType::Object,
                AssetInfoQuery {
                    hash: true,
                    modify_date: true,
                },
            )
            .unwrap();
        assert_eq!(result.modify_date, Some(42));
        assert_eq!(result.hash, Some(dare_util::AssetHash::of(b"hunter bytes")));
    }

    #[test]
    fn query_info_without_cache_index_is_an_error() {
        let controller = AssetDataController::new();
        let services = services_with_hunter();
        controller
            .load_domain("engine", &AssetTypeMap::default(), &services)
            .unwrap();
        let tuple = controller
            .create_type(
                "engine",
                AssetPath::parse("/engine/npcs/unset.hunter").unwrap(),
                TypeId::of::<StubAssetHunter>(),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let cache = dare_cache::AssetCacheController::new();
        cache.add_domain("engine", dir.path()).unwrap();

        let err = controller
            .query_info(
                &tuple,
                &cache,
                "engine",
                CacheBlockType::Object,
                AssetInfoQuery {
                    hash: true,
                    modify_date: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AssetDataError::NoCacheIndex));
    }
}
