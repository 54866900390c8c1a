//! Stable bug-report strings (spec section 6/7, mirrored on `dare_cache`'s
//! `error.rs`) and the `thiserror` result-carrying [`AssetDataError`] for
//! `AssetDataController`'s capacity/result outcomes.
//!
//! Same two-tier split as `dare_cache`: the constants below are reported
//! through [`dare_util::BugSink`] on precondition violations and the
//! offending call still returns its sentinel; `AssetDataError` is returned
//! from operations whose failure is a routine outcome, not a bug.

use thiserror::Error;

pub const ERROR_MSG_INVALID_OPERATION_DOMAIN_EXISTS: &str =
    "AssetDataController: invalid operation, domain already registered";
pub const ERROR_MSG_INVALID_ARGUMENT_TYPE_NULL: &str =
    "AssetDataController: invalid argument, type is null";
pub const ERROR_MSG_INVALID_OPERATION_NOT_LOADED: &str =
    "AssetDataController: invalid operation, type is not loaded";
pub const ERROR_MSG_INVALID_OPERATION_PROTOTYPE_TYPE: &str =
    "AssetDataController: invalid operation, prototype type is null or abstract";
pub const ERROR_MSG_INVALID_OPERATION_STRONG_REFS: &str =
    "AssetDataController: invalid operation, strong references still outstanding";
pub const ERROR_MSG_INVALID_OPERATION_LIVE_INSTANCES: &str =
    "AssetDataController: invalid operation, live instances still outstanding";
pub const ERROR_MSG_INVALID_ARGUMENT_PATH: &str =
    "AssetDataController: invalid argument, malformed asset path";
pub const ERROR_MSG_INVALID_OPERATION_UID_EXISTS: &str =
    "AssetDataController: invalid operation, uid already present in id table";

#[derive(Debug, Error)]
pub enum AssetDataError {
    #[error("no domain registered with that name")]
    NoDomain,
    #[error("domain is already registered")]
    DomainExists,
    #[error("no type registered for that path or uid")]
    NoType,
    #[error("type has no cache index assigned yet")]
    NoCacheIndex,
    #[error("type is not in the LOADED state")]
    NotLoaded,
    #[error("no processor could be resolved for this request")]
    NoProcessor,
    #[error("strong references still outstanding on this handle")]
    StrongReferencesOutstanding,
    #[error("live instances still outstanding on this type")]
    LiveInstancesOutstanding,
    #[error("uid space exhausted after {attempts} collision(s)")]
    UidExhausted { attempts: u32 },
    #[error("malformed asset path: {0}")]
    MalformedPath(String),
    #[error("op submission refused, an operation is already in flight for this type")]
    OpInFlight,
    #[error(transparent)]
    Cache(#[from] dare_cache::AssetCacheError),
    #[error("type-map (de)serialization error: {0}")]
    TypeMap(String),
    #[error("io error: {0}")]
    Io(String),
}
