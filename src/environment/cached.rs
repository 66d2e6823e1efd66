use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use super::{Asset, AssetEnvironment};
use crate::error::AssetResult;

/// Read-through wrapper memoizing lookups of another environment.
///
/// Once substituted it never consults the filesystem again for an asset it has already seen,
/// which is what production deployments want when files only change on restart. Failed lookups
/// are not memoized.
pub struct CachedEnvironment {
  inner: Arc<dyn AssetEnvironment>,
  assets: RwLock<HashMap<String, Option<Asset>>>,
  bundles: RwLock<HashMap<String, String>>,
  logical_paths: RwLock<Option<Vec<(String, PathBuf)>>>,
}

impl CachedEnvironment {
  /// Wrap an environment.
  pub fn new(inner: Arc<dyn AssetEnvironment>) -> Self {
    Self {
      inner,
      assets: RwLock::new(HashMap::new()),
      bundles: RwLock::new(HashMap::new()),
      logical_paths: RwLock::new(None),
    }
  }

  /// The wrapped environment.
  pub fn inner(&self) -> &Arc<dyn AssetEnvironment> {
    &self.inner
  }
}

impl AssetEnvironment for CachedEnvironment {
  fn find_asset(&self, logical_path: &str) -> AssetResult<Option<Asset>> {
    if let Some(hit) = self
      .assets
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(logical_path)
    {
      trace!(logical_path, "cached asset lookup hit");
      return Ok(hit.clone());
    }

    let asset = self.inner.find_asset(logical_path)?;
    self
      .assets
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(logical_path.to_string(), asset.clone());
    Ok(asset)
  }

  fn compile(&self, logical_path: &str) -> AssetResult<String> {
    if let Some(source) = self
      .bundles
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(logical_path)
    {
      return Ok(source.clone());
    }

    let source = self.inner.compile(logical_path)?;
    self
      .bundles
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(logical_path.to_string(), source.clone());
    Ok(source)
  }

  fn logical_paths(&self) -> AssetResult<Vec<(String, PathBuf)>> {
    if let Some(paths) = self
      .logical_paths
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
    {
      return Ok(paths.clone());
    }

    let paths = self.inner.logical_paths()?;
    *self
      .logical_paths
      .write()
      .unwrap_or_else(PoisonError::into_inner) = Some(paths.clone());
    Ok(paths)
  }

  fn is_cached(&self) -> bool {
    true
  }
}
