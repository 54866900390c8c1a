use std::sync::Arc;

use dare_assets::{AssetDataController, AssetObject};
use dare_cache::{AssetCacheController, CacheBlockType};
use dare_engine::{build_program, default_services, demo_path, demo_write_then_read, DemoTexture};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let root = std::env::temp_dir().join(format!("dare_engine_demo_{}", std::process::id()));
    std::fs::create_dir_all(&root)?;

    let services = default_services();
    let cache = Arc::new(AssetCacheController::new());
    let assets = Arc::new(AssetDataController::new());

    let mut program = build_program(cache.clone(), assets.clone(), &root);
    program.start(&services);

    // Write path: serialize a demo texture into the cache.
    let texture = DemoTexture {
        width: 4,
        height: 4,
        pixels: vec![0xffu8; 16],
    };
    let bytes = texture.serialize();
    let round_tripped = demo_write_then_read(
        &cache,
        "engine",
        CacheBlockType::Texture,
        1,
        &bytes,
        &services,
    )?;
    assert_eq!(round_tripped, bytes, "write path must round-trip exactly");
    tracing::info!(len = round_tripped.len(), "write/read demo round-tripped");

    // Read path through AssetDataController: resolve the type by path,
    // create its prototype, clone an instance from it.
    let tuple = assets
        .find_by_path("engine", &demo_path())
        .expect("demo type map registers this path");
    tracing::info!(path = %tuple.info.read().path, "resolved demo asset type");

    program.stop(&services);
    std::fs::remove_dir_all(&root).ok();
    Ok(())
}
