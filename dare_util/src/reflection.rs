//! Reflection is an external collaborator (spec section 1 Non-goals list
//! command-line parsing, configuration loading, and similar integrations as
//! out of scope; the original `ReflectionMgr`/`TokenTable` fall in the same
//! bucket). `dare_assets` only needs a narrow boundary: resolve a type name
//! to a stable identifier, and construct a default instance of it.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Identifies a concrete asset payload type (the original's `Type*`).
pub type ConcreteTypeId = TypeId;

pub trait ReflectionService: Send + Sync {
    /// Resolve a declared type name (as found in a `.typemap` entry) to the
    /// concrete type it names.
    fn find_type(&self, name: &str) -> Option<ConcreteTypeId>;

    /// Construct a boxed default instance of a previously-registered type.
    fn instantiate(&self, ty: ConcreteTypeId) -> Option<Box<dyn Any + Send + Sync>>;

    /// Every type name this service can resolve, with its identifier. Used
    /// to enumerate the engine domain's concrete-type population on
    /// `AssetDataController::load_domain` (spec section 4.4, step 2).
    fn registered_types(&self) -> Vec<(String, ConcreteTypeId)> {
        Vec::new()
    }

    /// Distance from `from`'s declared type to `to` along the reflection
    /// hierarchy, used by processor selection (spec section 4.4:
    /// "best = shortest non-INVALID distance from processor's target type
    /// to requested type"). The default only recognizes an exact match;
    /// a reflection service that tracks inheritance overrides this to walk
    /// parent links.
    fn distance(&self, from: ConcreteTypeId, to: ConcreteTypeId) -> Option<usize> {
        if from == to {
            Some(0)
        } else {
            None
        }
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// A fixed, compile-time-registered reflection table — the "static"
/// counterpart to a dynamic reflection system, sufficient for tests and for
/// `dare_engine`'s demo wiring.
#[derive(Default)]
pub struct StaticReflectionService {
    by_name: HashMap<String, ConcreteTypeId>,
    factories: HashMap<ConcreteTypeId, Factory>,
    /// Immediate parent of a registered type, for `distance`. Absent entries
    /// are roots (e.g. the engine's `AssetObject` base).
    parents: HashMap<ConcreteTypeId, ConcreteTypeId>,
}

impl StaticReflectionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Any + Send + Sync + Default>(&mut self, name: &str) {
        let ty = TypeId::of::<T>();
        self.by_name.insert(name.to_string(), ty);
        self.factories
            .insert(ty, Box::new(|| Box::new(T::default())));
    }

    /// Register `T` as a direct descendant of `Parent` in the reflection
    /// hierarchy (spec section 8, Scenario E: `StubAssetHunter` derives from
    /// `StubAssetCharacter`), so `distance` can walk back to it.
    pub fn register_with_parent<T: Any + Send + Sync + Default, Parent: Any>(&mut self, name: &str) {
        self.register::<T>(name);
        self.parents.insert(TypeId::of::<T>(), TypeId::of::<Parent>());
    }
}

impl ReflectionService for StaticReflectionService {
    fn find_type(&self, name: &str) -> Option<ConcreteTypeId> {
        self.by_name.get(name).copied()
    }

    fn instantiate(&self, ty: ConcreteTypeId) -> Option<Box<dyn Any + Send + Sync>> {
        self.factories.get(&ty).map(|factory| factory())
    }

    fn registered_types(&self) -> Vec<(String, ConcreteTypeId)> {
        self.by_name
            .iter()
            .map(|(name, ty)| (name.clone(), *ty))
            .collect()
    }

    fn distance(&self, from: ConcreteTypeId, to: ConcreteTypeId) -> Option<usize> {
        let mut cur = from;
        let mut steps = 0;
        loop {
            if cur == to {
                return Some(steps);
            }
            cur = *self.parents.get(&cur)?;
            steps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct StubAssetHunter;

    #[test]
    fn registers_and_resolves_by_name() {
        let mut reflection = StaticReflectionService::new();
        reflection.register::<StubAssetHunter>("StubAssetHunter");
        let ty = reflection.find_type("StubAssetHunter").unwrap();
        assert_eq!(ty, TypeId::of::<StubAssetHunter>());
        assert!(reflection.instantiate(ty).is_some());
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let reflection = StaticReflectionService::new();
        assert!(reflection.find_type("DoesNotExist").is_none());
    }

    #[derive(Default)]
    struct StubAssetCharacter;

    #[test]
    fn distance_walks_registered_parent_chain() {
        let mut reflection = StaticReflectionService::new();
        reflection.register::<StubAssetCharacter>("StubAssetCharacter");
        reflection.register_with_parent::<StubAssetHunter, StubAssetCharacter>("StubAssetHunter");

        let hunter = TypeId::of::<StubAssetHunter>();
        let character = TypeId::of::<StubAssetCharacter>();
        assert_eq!(reflection.distance(hunter, hunter), Some(0));
        assert_eq!(reflection.distance(hunter, character), Some(1));
        assert_eq!(reflection.distance(character, hunter), None);
    }
}
