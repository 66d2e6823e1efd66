//! Compilation environments the live lookup delegates to.
//!
//! The resolution layer only needs three capabilities from an environment: find an asset (and
//! with it a digest and the declared dependencies), compile its bundled source, and enumerate the
//! logical paths it can serve. Everything else about how assets are processed stays behind the
//! [`AssetEnvironment`] trait.

mod cached;
mod context;
mod directives;
mod directory;
mod memory;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::asset_paths::digest_file_name;
use crate::error::{AssetError, AssetResult};

pub use cached::CachedEnvironment;
pub use context::UrlContext;
pub use directives::{Directives, parse_directives};
pub use directory::DirectoryEnvironment;
pub use memory::{MemoryAsset, MemoryEnvironment};

/// An asset as reported by a compilation environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
  /// Logical path, extension included.
  pub logical_path: String,
  /// Full path of the underlying source file.
  pub filename: PathBuf,
  /// Content digest of the compiled asset.
  pub digest: String,
  /// Assets this one statically requires, in declaration order.
  pub dependencies: Vec<String>,
  /// Assets referenced at runtime through URLs; never expanded.
  pub links: Vec<String>,
}

impl Asset {
  /// Digest-qualified file name, e.g. `foo-<digest>.js`.
  pub fn digest_path(&self) -> String {
    digest_file_name(&self.logical_path, &self.digest)
  }
}

/// Contract consumed from the asset compilation collaborator.
pub trait AssetEnvironment: Send + Sync {
  /// Locate and, if necessary, compile an asset. `Ok(None)` means no such logical path exists.
  fn find_asset(&self, logical_path: &str) -> AssetResult<Option<Asset>>;

  /// Bundled source of an asset with its dependencies concatenated ahead of it.
  fn compile(&self, logical_path: &str) -> AssetResult<String>;

  /// Every logical path the environment can serve, with its source file.
  fn logical_paths(&self) -> AssetResult<Vec<(String, PathBuf)>>;

  /// Returns `true` for read-through caching wrappers.
  fn is_cached(&self) -> bool {
    false
  }
}

/// Flatten an asset's dependency graph, dependencies first and the asset itself last.
///
/// Duplicates keep their first position. A missing dependency or a cycle is reported as a
/// compilation failure of the asset that declared it.
pub fn dependency_closure(
  environment: &dyn AssetEnvironment,
  logical_path: &str,
) -> AssetResult<Vec<Asset>> {
  let root = environment
    .find_asset(logical_path)?
    .ok_or_else(|| AssetError::not_found(logical_path))?;

  let mut walk = ClosureWalk {
    environment,
    stack: Vec::new(),
    seen: BTreeSet::new(),
    ordered: Vec::new(),
  };
  walk.visit(root)?;
  Ok(walk.ordered)
}

struct ClosureWalk<'a> {
  environment: &'a dyn AssetEnvironment,
  stack: Vec<String>,
  seen: BTreeSet<String>,
  ordered: Vec<Asset>,
}

impl ClosureWalk<'_> {
  fn visit(&mut self, asset: Asset) -> AssetResult<()> {
    if self.seen.contains(&asset.logical_path) {
      return Ok(());
    }
    if self.stack.contains(&asset.logical_path) {
      return Err(AssetError::compilation(
        &asset.logical_path,
        format!(
          "circular dependency: {} -> {}",
          self.stack.join(" -> "),
          asset.logical_path
        ),
      ));
    }

    self.stack.push(asset.logical_path.clone());
    for dependency in &asset.dependencies {
      let required = self.environment.find_asset(dependency)?.ok_or_else(|| {
        AssetError::compilation(
          &asset.logical_path,
          format!("couldn't find file '{dependency}'"),
        )
      })?;
      self.visit(required)?;
    }
    self.stack.pop();

    self.seen.insert(asset.logical_path.clone());
    self.ordered.push(asset);
    Ok(())
  }
}
