//! Content-addressed asset cache: `CacheObject`/`CacheBlob`/`CacheBlock`
//! allocation and indexing, the defragmentation planner, and the
//! `AssetCacheController` that groups blocks by domain and persists them.
//!
//! See spec sections 2-4.3 and 6-8 for the contract this crate implements.

pub mod blob;
pub mod block;
pub mod controller;
pub mod defrag;
pub mod error;
pub mod io;
pub mod object;

pub use blob::{CacheBlob, CacheBlobStats};
pub use block::CacheBlock;
pub use controller::{AssetCacheController, CacheBlockType, DEFAULT_BLOB_CAPACITY};
pub use defrag::{collect_live, plan_defrag, DefragStep, LiveObject};
pub use error::{AssetCacheError, CacheBlobError, CacheBlockError};
pub use io::{CacheReader, CacheWriter, FileCacheStore};
pub use object::{CacheIndex, CacheObject, INVALID_UID};
