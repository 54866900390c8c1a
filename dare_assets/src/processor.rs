//! `AssetProcessor` — the plugin boundary spec section 1 describes as "out
//! of scope; we describe the interface the core consumes", grounded on
//! `DefaultAssetProcessor.cpp`'s method surface (`GetTargetType`,
//! `GetCacheBlockScore`, `AcceptImportPath`, `GetPrototypeType`,
//! `GetConcreteType`, `OnCreatePrototype`/`OnDestroyPrototype`,
//! `PrepareAsset`, `OnLoadAsset`/`OnUnloadAsset`). `Import`/`Export` are
//! plugin-specific content transforms and stay out of scope per spec
//! section 1; only the interface around them is modeled here.

use dare_cache::CacheBlockType;
use dare_util::reflection::ConcreteTypeId;

use crate::asset_object::AssetObject;
use crate::path::AssetPath;

pub trait AssetProcessor: Send + Sync {
    /// The concrete type this processor is registered against (the source's
    /// `GetTargetType`/`GetConcreteType`).
    fn target_type(&self) -> ConcreteTypeId;

    /// The type to instantiate when creating a prototype for `concrete`.
    /// `None` means "this processor cannot prototype that type" (abstract
    /// or unrecognized).
    fn prototype_type(&self, concrete: ConcreteTypeId) -> Option<ConcreteTypeId>;

    /// Constructs a default instance of `ty`. Spec section 4.4:
    /// "instantiate through reflection" — here the processor owns
    /// construction since it already knows its target type statically.
    fn instantiate(&self, ty: ConcreteTypeId) -> Option<Box<dyn AssetObject>>;

    /// Lower is a better fit; `None` means "does not handle this block
    /// type" (`GetCacheBlockScore`).
    fn cache_block_score(&self, block_type: CacheBlockType) -> Option<u32>;

    /// Whether this processor's importer recognizes `path`'s extension
    /// (`AcceptImportPath`).
    fn accept_import_path(&self, path: &AssetPath) -> bool;

    fn on_create_prototype(&self, _prototype: &mut dyn AssetObject) {}
    fn on_destroy_prototype(&self, _prototype: &mut dyn AssetObject) {}
    fn prepare_asset(&self, _object: &mut dyn AssetObject) {}
    fn on_load_asset(&self, _object: &mut dyn AssetObject) {}
    fn on_unload_asset(&self, _object: &mut dyn AssetObject) {}
}

/// Holds the registered processor set and implements the three selection
/// modes from spec section 4.4.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: Vec<std::sync::Arc<dyn AssetProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, processor: std::sync::Arc<dyn AssetProcessor>) {
        self.processors.push(processor);
    }

    /// By concrete type: best = shortest non-`INVALID` distance from a
    /// processor's target type to `requested`.
    pub fn find_by_concrete_type(
        &self,
        reflection: &dyn dare_util::ReflectionService,
        requested: ConcreteTypeId,
    ) -> Option<std::sync::Arc<dyn AssetProcessor>> {
        self.processors
            .iter()
            .filter_map(|p| {
                reflection
                    .distance(p.target_type(), requested)
                    .map(|d| (d, p))
            })
            .min_by_key(|(d, _)| *d)
            .map(|(_, p)| p.clone())
    }

    /// By path: first processor accepting the extension.
    pub fn find_by_path(&self, path: &AssetPath) -> Option<std::sync::Arc<dyn AssetProcessor>> {
        self.processors
            .iter()
            .find(|p| p.accept_import_path(path))
            .cloned()
    }

    /// By cache-block type: processor with the lowest score for that block.
    pub fn find_by_block_type(
        &self,
        block_type: CacheBlockType,
    ) -> Option<std::sync::Arc<dyn AssetProcessor>> {
        self.processors
            .iter()
            .filter_map(|p| p.cache_block_score(block_type).map(|s| (s, p)))
            .min_by_key(|(s, _)| *s)
            .map(|(_, p)| p.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_object::test_support::{StubAssetCharacter, StubAssetHunter};
    use dare_util::{ReflectionService, StaticReflectionService};
    use std::any::TypeId;
    use std::sync::Arc;

    struct StubProcessor {
        target: ConcreteTypeId,
        score: u32,
        ext: &'static str,
    }

    impl AssetProcessor for StubProcessor {
        fn target_type(&self) -> ConcreteTypeId {
            self.target
        }
        fn prototype_type(&self, concrete: ConcreteTypeId) -> Option<ConcreteTypeId> {
            Some(concrete)
        }
        fn instantiate(&self, ty: ConcreteTypeId) -> Option<Box<dyn AssetObject>> {
            if ty == TypeId::of::<StubAssetHunter>() {
                Some(Box::new(StubAssetHunter::default()))
            } else if ty == TypeId::of::<StubAssetCharacter>() {
                Some(Box::new(StubAssetCharacter::default()))
            } else {
                None
            }
        }
        fn cache_block_score(&self, _block_type: CacheBlockType) -> Option<u32> {
            Some(self.score)
        }
        fn accept_import_path(&self, path: &AssetPath) -> bool {
            path.ext() == Some(self.ext)
        }
    }

    #[test]
    fn selects_by_concrete_type_distance() {
        let mut reflection = StaticReflectionService::new();
        reflection.register::<StubAssetCharacter>("StubAssetCharacter");
        reflection
            .register_with_parent::<StubAssetHunter, StubAssetCharacter>("StubAssetHunter");

        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(StubProcessor {
            target: TypeId::of::<StubAssetCharacter>(),
            score: 1,
            ext: "char",
        }));
        registry.register(Arc::new(StubProcessor {
            target: TypeId::of::<StubAssetHunter>(),
            score: 2,
            ext: "hunter",
        }));

        let found = registry
            .find_by_concrete_type(&reflection, TypeId::of::<StubAssetHunter>())
            .unwrap();
        assert_eq!(found.target_type(), TypeId::of::<StubAssetHunter>());
    }

    #[test]
    fn selects_by_block_score_lowest_wins() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(StubProcessor {
            target: TypeId::of::<StubAssetHunter>(),
            score: 5,
            ext: "hunter",
        }));
        registry.register(Arc::new(StubProcessor {
            target: TypeId::of::<StubAssetCharacter>(),
            score: 1,
            ext: "char",
        }));
        let found = registry.find_by_block_type(CacheBlockType::Object).unwrap();
        assert_eq!(found.target_type(), TypeId::of::<StubAssetCharacter>());
    }

    #[test]
    fn selects_by_import_path_extension() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Arc::new(StubProcessor {
            target: TypeId::of::<StubAssetHunter>(),
            score: 1,
            ext: "hunter",
        }));
        let path = AssetPath::parse("/engine/npcs/boss.hunter").unwrap();
        assert!(registry.find_by_path(&path).is_some());
        let other = AssetPath::parse("/engine/npcs/boss.char").unwrap();
        assert!(registry.find_by_path(&other).is_none());
    }
}
