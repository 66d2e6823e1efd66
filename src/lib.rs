#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod config;
pub mod debug;
pub mod environment;
pub mod error;
pub mod helper;
pub mod host;
pub mod lookup;
pub mod manifest;
pub mod pipeline;
pub mod precompile;

pub use asset_paths::{AssetReference, AssetType, ReferenceKind};
pub use config::{AssetConfig, ConfigFile};
pub use environment::{
  Asset, AssetEnvironment, CachedEnvironment, DirectoryEnvironment, MemoryAsset, MemoryEnvironment,
  UrlContext,
};
pub use error::{AssetError, AssetResult};
pub use helper::{AssetHelper, AssetTag, PathOptions, TagOptions};
pub use host::{AssetHost, RequestContext};
pub use lookup::{ResolvedAsset, SourceLookup};
pub use manifest::Manifest;
pub use pipeline::AssetPipeline;
pub use precompile::{PrecompileList, PrecompileRule};
