//! Stable error strings (spec §6) and the `thiserror` result-carrying enums
//! (spec §9 Design Notes: "Exceptions for test asserts. Replace with a
//! result-carrying error type; tests assert on kind + message.").
//!
//! Two tiers per spec §7:
//!
//! - *Bugs* (precondition violations) report one of the `ERROR_MSG_*`
//!   strings below through [`dare_util::BugSink`] and return a sentinel
//!   (`None`/`false`). They are never `Result::Err`.
//! - *Capacity/result outcomes* are the [`CacheBlobError`]/[`CacheBlockError`]/
//!   [`AssetCacheError`] variants below, returned from fallible operations
//!   that are not themselves bugs (e.g. `AssetCacheController::read`/`write`).

use thiserror::Error;

pub const ERROR_MSG_INVALID_OPERATION_BLOB_INITIALIZED: &str =
    "CacheBlob: invalid operation, blob already initialized";
pub const ERROR_MSG_INVALID_OPERATION_BLOB_NOT_INITIALIZED: &str =
    "CacheBlob: invalid operation, blob not initialized";
pub const ERROR_MSG_INVALID_ARGUMENT_CAPACITY: &str = "CacheBlob: invalid argument, capacity";
pub const ERROR_MSG_INVALID_ARGUMENT_ASSET_ID: &str = "CacheBlob: invalid argument, asset id";
pub const ERROR_MSG_INVALID_ARGUMENT_SIZE: &str = "CacheBlob: invalid argument, size";
pub const ERROR_MSG_INVALID_ARGUMENT_OBJECT_ID: &str = "CacheBlob: invalid argument, object id";
pub const ERROR_MSG_INVALID_OPERATION_ASSOC_OBJECT_ID: &str =
    "CacheBlob: invalid operation, object id refers to a tombstone";
pub const ERROR_MSG_INVALID_OPERATION_OBJECT_NULL: &str =
    "CacheBlob: invalid operation, object is null";

pub const ERROR_MSG_INVALID_OPERATION_INITIALIZED: &str =
    "CacheBlock: invalid operation, block already initialized";
pub const ERROR_MSG_INVALID_OPERATION_INITIALIZATION_REQUIRED: &str =
    "CacheBlock: invalid operation, initialization required";
pub const ERROR_MSG_INVALID_OPERATION_OBJECT_EXISTS: &str =
    "CacheBlock: invalid operation, object already exists for this uid";
pub const ERROR_MSG_INVALID_ARGUMENT_UID: &str = "CacheBlock: invalid argument, uid";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum CacheBlobError {
    #[error("blob is full")]
    Full,
    #[error("object id out of range")]
    InvalidObjectId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum CacheBlockError {
    #[error("uid already present in block")]
    UidExists,
    #[error("no object found for uid")]
    NotFound,
    #[error("requested size exceeds the block's default blob capacity")]
    ExceedsDefaultCapacity,
    #[error("block ran out of placement options")]
    NoPlacement,
}

#[derive(Debug, Error)]
pub enum AssetCacheError {
    #[error("no cache block registered for this asset's block type")]
    NoBlock,
    #[error("no domain registered with that name")]
    NoDomain,
    #[error("domain is already registered")]
    DomainExists,
    #[error(transparent)]
    Block(#[from] CacheBlockError),
    #[error("destination buffer capacity {have} is smaller than object size {need}")]
    BufferTooSmall { have: usize, need: usize },
    #[error("io error: {0}")]
    Io(String),
    #[error("index (de)serialization error: {0}")]
    Index(String),
}
