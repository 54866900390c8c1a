//! In-memory registry of `AssetTypeInfo` records: prototype/instance
//! lifetime, reference counting, the load-state machine, processor
//! selection, and UID generation (spec sections 3, 4.4, 4.5).
//!
//! See spec sections 1, 3, 4.4, 4.5, 6-9 for the contract this crate
//! implements.

pub mod asset_object;
pub mod controller;
pub mod error;
pub mod load_state;
pub mod op;
pub mod path;
pub mod processor;
pub mod reference;
pub mod type_info;
pub mod typemap;

pub use asset_object::AssetObject;
pub use controller::{AssetDataController, AssetInfoQuery, AssetInfoQueryResult};
pub use error::AssetDataError;
pub use load_state::{LoadState, OpSlot, OpState};
pub use op::{AssetOp, ExecutionThread, OpStatus, SaveDomainOp};
pub use path::AssetPath;
pub use processor::{AssetProcessor, ProcessorRegistry};
pub use reference::{TAsset, TAssetType};
pub use type_info::{AssetHandle, AssetTypeInfo, DynamicTuple, InstanceCell, TypeSlot, WeakInstanceRef};
pub use typemap::{AssetTypeMap, AssetTypeMapping};
