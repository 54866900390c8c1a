//! Thin harness wiring `Services`, the phased init sequence from spec
//! section 9's Design Notes (`pre-core -> core -> runtime -> service ->
//! post`), and the cache/asset controllers together. Not a game engine —
//! the renderer, editor GUI, and network transfer layer are out of scope
//! (spec section 1).

use std::path::Path;
use std::sync::Arc;

use dare_assets::{AssetDataController, AssetObject, AssetPath, AssetTypeMap, AssetTypeMapping};
use dare_cache::{AssetCacheController, CacheBlockType};
use dare_util::phase::{InitPhase, Phased};
use dare_util::Services;

/// Registers the cache controller's domain during the `Core` phase and
/// saves it back to disk during shutdown's `Core` phase, mirroring the
/// original `Program`'s subsystem ordering.
pub struct CacheSubsystem {
    pub controller: Arc<AssetCacheController>,
    pub domain: String,
    pub root: std::path::PathBuf,
}

impl Phased for CacheSubsystem {
    fn init(&mut self, phase: InitPhase, _services: &Services) {
        if phase == InitPhase::Core {
            self.controller
                .add_domain(&self.domain, &self.root)
                .expect("engine domain must be addable exactly once at startup");
            tracing::info!(domain = %self.domain, "CacheSubsystem initialized");
        }
    }

    fn shutdown(&mut self, phase: InitPhase, _services: &Services) {
        if phase == InitPhase::Core {
            if let Err(e) = self.controller.save_domain(&self.domain) {
                tracing::warn!(error = %e, "CacheSubsystem failed to persist domain on shutdown");
            }
        }
    }
}

/// Registers the asset data controller's domain during the `Runtime`
/// phase, after the cache subsystem's `Core`-phase domain is available.
pub struct AssetSubsystem {
    pub controller: Arc<AssetDataController>,
    pub domain: String,
    pub type_map: AssetTypeMap,
}

impl Phased for AssetSubsystem {
    fn init(&mut self, phase: InitPhase, services: &Services) {
        if phase == InitPhase::Runtime {
            self.controller
                .load_domain(&self.domain, &self.type_map, services)
                .expect("asset domain must load exactly once at startup");
            tracing::info!(domain = %self.domain, "AssetSubsystem initialized");
        }
    }

    fn shutdown(&mut self, phase: InitPhase, _services: &Services) {
        if phase == InitPhase::Runtime {
            let _ = self.controller.release_domain(&self.domain);
        }
    }
}

/// Minimal demo payload standing in for a real texture/mesh/script asset —
/// enough to exercise `AssetObject`'s serialize/deserialize contract.
#[derive(Default, Debug, PartialEq)]
pub struct DemoTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl AssetObject for DemoTexture {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
    fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.pixels.len());
        bytes.extend_from_slice(&self.width.to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.extend_from_slice(&self.pixels);
        bytes
    }
    fn deserialize_into(&mut self, bytes: &[u8]) {
        if bytes.len() < 8 {
            return;
        }
        self.width = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        self.height = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        self.pixels = bytes[8..].to_vec();
    }
}

/// Runs the write path then the read path from spec section 2 end to end
/// against `root`: write `bytes` for `uid` under `domain`/`block_type`,
/// then read it back and assert it round-trips.
pub fn demo_write_then_read(
    cache: &AssetCacheController,
    domain: &str,
    block_type: CacheBlockType,
    uid: u32,
    bytes: &[u8],
    services: &Services,
) -> anyhow::Result<Vec<u8>> {
    cache.write(domain, block_type, uid, bytes, services.bug_sink())?;
    let mut out = Vec::new();
    cache.read(domain, block_type, uid, &mut out)?;
    Ok(out)
}

pub fn demo_type_map() -> AssetTypeMap {
    AssetTypeMap {
        types: vec![AssetTypeMapping {
            path: "/engine/textures/ui/cursor.tex".to_string(),
            parent_uid: None,
            concrete_type: "DemoTexture".to_string(),
            cache_uid: 1,
            cache_blob_id: 0,
            cache_object_id: 0,
            weak_references: 0,
            strong_references: 0,
        }],
    }
}

pub fn demo_path() -> AssetPath {
    AssetPath::parse("/engine/textures/ui/cursor.tex").expect("literal path is well formed")
}

pub fn default_services() -> Services {
    let mut reflection = dare_util::StaticReflectionService::new();
    reflection.register::<DemoTexture>("DemoTexture");
    Services::new(
        Arc::new(dare_util::TracingBugSink::new()),
        Arc::new(reflection),
        Arc::new(dare_util::ThreadWorkerPool::new(2)),
    )
}

pub fn build_program(
    cache: Arc<AssetCacheController>,
    assets: Arc<AssetDataController>,
    root: impl AsRef<Path>,
) -> dare_util::phase::Program {
    let mut program = dare_util::phase::Program::new();
    program.register(Box::new(CacheSubsystem {
        controller: cache,
        domain: "engine".to_string(),
        root: root.as_ref().to_path_buf(),
    }));
    program.register(Box::new(AssetSubsystem {
        controller: assets,
        domain: "engine".to_string(),
        type_map: demo_type_map(),
    }));
    program
}
