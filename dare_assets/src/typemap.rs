//! `AssetTypeMap` — per-domain type-map persistence (spec section 6:
//! `cache.typemap` for the engine domain, `<mod>/modinfo.typemap` for mods),
//! recovered from `AssetTypeMap.cpp/h` per SPEC_FULL's supplemented-feature
//! list. Serialized the same way as `dare_cache`'s `.lfindex` sidecars:
//! pretty-printed JSON via `serde_json`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssetDataError;

/// One entry, mirroring `AssetTypeMapping`'s fields: path, parent-path,
/// concrete-type name, cache UID/blob-id/object-id, and the persisted
/// weak/strong reference counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTypeMapping {
    pub path: String,
    /// UID of the declared parent record, or `None` to fall back to the
    /// concrete-type alias record (spec section 4.4, step 4).
    pub parent_uid: Option<u32>,
    pub concrete_type: String,
    pub cache_uid: u32,
    pub cache_blob_id: u32,
    pub cache_object_id: u32,
    pub weak_references: u32,
    pub strong_references: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetTypeMap {
    pub types: Vec<AssetTypeMapping>,
}

impl AssetTypeMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetDataError> {
        let text = std::fs::read_to_string(path).map_err(|e| AssetDataError::Io(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| AssetDataError::TypeMap(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetDataError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| AssetDataError::TypeMap(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| AssetDataError::Io(e.to_string()))
    }

    pub fn types(&self) -> &[AssetTypeMapping] {
        &self.types
    }
}
