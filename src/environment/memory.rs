//! In-memory environment for frameworks and tests that do not compile from disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use super::{Asset, AssetEnvironment, dependency_closure};
use crate::error::{AssetError, AssetResult};

/// Definition of one asset held by a [`MemoryEnvironment`].
#[derive(Debug, Clone)]
pub struct MemoryAsset {
  logical_path: String,
  filename: PathBuf,
  source: String,
  dependencies: Vec<String>,
  links: Vec<String>,
  failure: Option<String>,
}

impl MemoryAsset {
  /// Asset with the given logical path and source; its filename defaults to the logical path.
  pub fn new(logical_path: impl Into<String>, source: impl Into<String>) -> Self {
    let logical_path = logical_path.into();
    Self {
      filename: PathBuf::from(&logical_path),
      logical_path,
      source: source.into(),
      dependencies: Vec::new(),
      links: Vec::new(),
      failure: None,
    }
  }

  /// Full path reported to predicate precompile rules.
  pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
    self.filename = filename.into();
    self
  }

  /// Declared dependencies, in order.
  pub fn requires<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies = dependencies.into_iter().map(Into::into).collect();
    self
  }

  /// Runtime URL references.
  pub fn links<I, S>(mut self, links: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.links = links.into_iter().map(Into::into).collect();
    self
  }

  /// Make every lookup of this asset fail with the given compilation error.
  pub fn failing(mut self, message: impl Into<String>) -> Self {
    self.failure = Some(message.into());
    self
  }
}

/// Environment serving a fixed set of assets from memory.
///
/// Digests are SHA-256 over the environment version and the asset's own source.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnvironment {
  version: String,
  assets: BTreeMap<String, MemoryAsset>,
}

impl MemoryEnvironment {
  /// Empty environment.
  pub fn new() -> Self {
    Self::default()
  }

  /// Version string mixed into every digest.
  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = version.into();
    self
  }

  /// Add an asset, replacing any previous definition with the same logical path.
  pub fn with(mut self, asset: MemoryAsset) -> Self {
    self.insert(asset);
    self
  }

  /// Add an asset in place.
  pub fn insert(&mut self, asset: MemoryAsset) {
    self.assets.insert(asset.logical_path.clone(), asset);
  }

  fn digest(&self, asset: &MemoryAsset) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.version.as_bytes());
    hasher.update(asset.source.as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl AssetEnvironment for MemoryEnvironment {
  fn find_asset(&self, logical_path: &str) -> AssetResult<Option<Asset>> {
    let Some(asset) = self.assets.get(logical_path) else {
      return Ok(None);
    };
    if let Some(message) = &asset.failure {
      return Err(AssetError::compilation(logical_path, message.clone()));
    }

    Ok(Some(Asset {
      logical_path: asset.logical_path.clone(),
      filename: asset.filename.clone(),
      digest: self.digest(asset),
      dependencies: asset.dependencies.clone(),
      links: asset.links.clone(),
    }))
  }

  fn compile(&self, logical_path: &str) -> AssetResult<String> {
    let mut bundle = String::new();
    for asset in dependency_closure(self, logical_path)? {
      if let Some(definition) = self.assets.get(&asset.logical_path) {
        bundle.push_str(&definition.source);
        if !definition.source.ends_with('\n') {
          bundle.push('\n');
        }
      }
    }
    Ok(bundle)
  }

  fn logical_paths(&self) -> AssetResult<Vec<(String, PathBuf)>> {
    Ok(
      self
        .assets
        .values()
        .map(|asset| (asset.logical_path.clone(), asset.filename.clone()))
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digests_change_with_version() {
    let plain = MemoryEnvironment::new().with(MemoryAsset::new("foo.js", "var foo;"));
    let versioned = plain.clone().with_version("production");

    let a = plain.find_asset("foo.js").unwrap().unwrap();
    let b = versioned.find_asset("foo.js").unwrap().unwrap();
    assert_eq!(a.digest.len(), 64);
    assert_ne!(a.digest, b.digest);
  }

  #[test]
  fn compiles_bundle_in_dependency_order() {
    let env = MemoryEnvironment::new()
      .with(MemoryAsset::new("foo.js", "var foo;"))
      .with(MemoryAsset::new("bar.js", "var bar;\n").requires(["foo.js"]));

    assert_eq!(env.compile("bar.js").unwrap(), "var foo;\nvar bar;\n");
  }

  #[test]
  fn failing_assets_report_compilation_errors() {
    let env = MemoryEnvironment::new().with(MemoryAsset::new("bad.js", "").failing("unexpected token"));
    assert_eq!(
      env.find_asset("bad.js"),
      Err(AssetError::compilation("bad.js", "unexpected token"))
    );
  }

  #[test]
  fn unknown_assets_are_absent() {
    let env = MemoryEnvironment::new();
    assert_eq!(env.find_asset("missing.js"), Ok(None));
  }
}
