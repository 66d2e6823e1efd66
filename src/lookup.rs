//! The two interchangeable sources a logical path can be resolved against.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::trace;

use crate::environment::AssetEnvironment;
use crate::error::{AssetError, AssetResult};
use crate::manifest::Manifest;

/// Result of resolving one logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// Logical path that was resolved.
  pub logical_path: String,
  /// Digest-qualified file name.
  pub digest_path: String,
  /// Content digest, when the source knows it.
  pub digest: Option<String>,
  /// Declared dependencies; always empty for manifest lookups.
  pub dependencies: Vec<String>,
  /// Runtime URL references; always empty for manifest lookups.
  pub links: Vec<String>,
  /// Underlying source file, known only to live lookups.
  pub filename: Option<PathBuf>,
}

/// Where logical paths are resolved; chosen once per helper context.
#[derive(Clone)]
pub enum SourceLookup {
  /// Static table written by a previous precompile.
  Manifest(Arc<Manifest>),
  /// Compile on demand through the environment.
  Live(Arc<dyn AssetEnvironment>),
}

impl SourceLookup {
  /// Resolve a logical path, failing with [`AssetError::NotFound`] when it is unknown.
  pub fn resolve(&self, logical_path: &str) -> AssetResult<ResolvedAsset> {
    self
      .find(logical_path)?
      .ok_or_else(|| AssetError::not_found(logical_path))
  }

  /// Resolve a logical path; `Ok(None)` when it is unknown.
  pub fn find(&self, logical_path: &str) -> AssetResult<Option<ResolvedAsset>> {
    match self {
      Self::Manifest(manifest) => {
        let resolved = manifest
          .digest_path(logical_path)
          .map(|digest_path| ResolvedAsset {
            logical_path: logical_path.to_string(),
            digest_path: digest_path.to_string(),
            digest: manifest.digest(logical_path).map(str::to_string),
            dependencies: Vec::new(),
            links: Vec::new(),
            filename: None,
          });
        trace!(logical_path, found = resolved.is_some(), "manifest lookup");
        Ok(resolved)
      }
      Self::Live(environment) => {
        let resolved = environment.find_asset(logical_path)?.map(|asset| ResolvedAsset {
          digest_path: asset.digest_path(),
          logical_path: asset.logical_path,
          digest: Some(asset.digest),
          dependencies: asset.dependencies,
          links: asset.links,
          filename: Some(asset.filename),
        });
        trace!(logical_path, found = resolved.is_some(), "live lookup");
        Ok(resolved)
      }
    }
  }

  /// Returns `true` when assets are compiled on demand.
  pub fn is_live(&self) -> bool {
    matches!(self, Self::Live(_))
  }

  /// The live environment, when selected.
  pub fn environment(&self) -> Option<&Arc<dyn AssetEnvironment>> {
    match self {
      Self::Live(environment) => Some(environment),
      Self::Manifest(_) => None,
    }
  }

  /// The manifest, when selected.
  pub fn manifest(&self) -> Option<&Arc<Manifest>> {
    match self {
      Self::Manifest(manifest) => Some(manifest),
      Self::Live(_) => None,
    }
  }
}

impl fmt::Debug for SourceLookup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Manifest(manifest) => f.debug_tuple("Manifest").field(&manifest.len()).finish(),
      Self::Live(environment) => f
        .debug_struct("Live")
        .field("cached", &environment.is_cached())
        .finish(),
    }
  }
}
