//! Loading and querying the persisted precompile manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default manifest file name inside the public asset directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Serialized form of the manifest written by the precompile step.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ManifestDocument {
  /// Digest-qualified file name to file metadata.
  #[serde(default)]
  pub files: BTreeMap<String, ManifestFileRecord>,
  /// Logical path to digest-qualified file name.
  #[serde(default)]
  pub assets: BTreeMap<String, String>,
}

/// Metadata recorded for each compiled file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ManifestFileRecord {
  /// Logical path the file was compiled from.
  pub logical_path: String,
  /// Content digest embedded in the file name.
  #[serde(default)]
  pub digest: Option<String>,
  /// Size in bytes.
  #[serde(default)]
  pub size: Option<u64>,
  /// Modification time as written by the compiler.
  #[serde(default)]
  pub mtime: Option<String>,
}

/// Immutable logical-path table of one manifest instance.
///
/// A manifest is never mutated after construction; reloading means building a new instance.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
  path: Option<PathBuf>,
  assets: BTreeMap<String, String>,
  files: BTreeMap<String, ManifestFileRecord>,
}

impl Manifest {
  /// Build a manifest from logical path / digest path pairs.
  pub fn from_entries<I, K, V>(entries: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      path: None,
      assets: entries
        .into_iter()
        .map(|(logical, digest_path)| (logical.into(), digest_path.into()))
        .collect(),
      files: BTreeMap::new(),
    }
  }

  /// Build a manifest from an already parsed document.
  pub fn from_document(document: ManifestDocument) -> Self {
    Self {
      path: None,
      assets: document.assets,
      files: document.files,
    }
  }

  /// Load a manifest from disk.
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("manifest not found at {}", path.display()))?;
    let document: ManifestDocument = serde_json::from_str(&content)
      .with_context(|| format!("failed to parse manifest JSON at {}", path.display()))?;
    debug!(
      path = %path.display(),
      assets = document.assets.len(),
      "loaded asset manifest"
    );

    Ok(Self {
      path: Some(path.to_path_buf()),
      ..Self::from_document(document)
    })
  }

  /// Open the manifest for a public asset directory.
  ///
  /// An explicit path must exist. Otherwise the directory is searched with [`locate_manifest`],
  /// and a directory without any manifest yields an empty one, so every lookup misses.
  pub fn open(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
    if let Some(path) = explicit {
      return Self::load(path);
    }

    match locate_manifest(dir)? {
      Some(path) => Self::load(&path),
      None => {
        debug!(dir = %dir.display(), "no asset manifest found; starting empty");
        Ok(Self::default())
      }
    }
  }

  /// File the manifest was loaded from, if any.
  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  /// Digest-qualified file name for a logical path.
  pub fn digest_path(&self, logical_path: &str) -> Option<&str> {
    self.assets.get(logical_path).map(String::as_str)
  }

  /// Digest recorded for a logical path, when the manifest carries file metadata.
  pub fn digest(&self, logical_path: &str) -> Option<&str> {
    let digest_path = self.digest_path(logical_path)?;
    self
      .files
      .get(digest_path)
      .and_then(|record| record.digest.as_deref())
  }

  /// Logical path to digest path entries.
  pub fn assets(&self) -> &BTreeMap<String, String> {
    &self.assets
  }

  /// Number of logical paths.
  pub fn len(&self) -> usize {
    self.assets.len()
  }

  /// Returns `true` when the manifest maps nothing.
  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }
}

/// Find the manifest inside a public asset directory.
///
/// `manifest.json` wins; otherwise the lexically last `manifest-*.json` is used.
pub fn locate_manifest(dir: &Path) -> Result<Option<PathBuf>> {
  let plain = dir.join(MANIFEST_FILE);
  if plain.is_file() {
    return Ok(Some(plain));
  }
  if !dir.is_dir() {
    return Ok(None);
  }

  let mut matches: Vec<PathBuf> = Vec::new();
  for entry in fs::read_dir(dir)
    .with_context(|| format!("failed to read manifest directory at {}", dir.display()))?
  {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }

    let file_name = entry.file_name();
    let Some(name) = file_name.to_str() else {
      continue;
    };

    if name.starts_with("manifest-") && name.ends_with(".json") {
      matches.push(entry.path());
    }
  }

  matches.sort();
  Ok(matches.pop())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  const DOCUMENT: &str = r#"{
    "files": {
      "foo-abc123.js": {"logical_path": "foo.js", "digest": "abc123", "size": 12}
    },
    "assets": {
      "foo.js": "foo-abc123.js",
      "foo.css": "foo-def456.css"
    }
  }"#;

  #[test]
  fn loads_assets_and_file_digests() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(MANIFEST_FILE);
    fs::write(&path, DOCUMENT).unwrap();

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.path(), Some(path.as_path()));
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest.digest_path("foo.js"), Some("foo-abc123.js"));
    assert_eq!(manifest.digest("foo.js"), Some("abc123"));
    assert_eq!(manifest.digest("foo.css"), None);
    assert_eq!(manifest.digest_path("foo"), None);
  }

  #[test]
  fn reports_parse_failures_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(MANIFEST_FILE);
    fs::write(&path, "{not json").unwrap();

    let err = Manifest::load(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse manifest JSON"));
  }

  #[test]
  fn locates_latest_fingerprinted_manifest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("manifest-111.json"), "{}").unwrap();
    fs::write(dir.path().join("manifest-222.json"), "{}").unwrap();
    fs::write(dir.path().join("other.json"), "{}").unwrap();

    let found = locate_manifest(dir.path()).unwrap();
    assert_eq!(found, Some(dir.path().join("manifest-222.json")));
  }

  #[test]
  fn plain_manifest_takes_precedence() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("manifest-111.json"), "{}").unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), "{}").unwrap();

    let found = locate_manifest(dir.path()).unwrap();
    assert_eq!(found, Some(dir.path().join(MANIFEST_FILE)));
  }

  #[test]
  fn missing_directory_opens_empty_manifest() {
    let dir = tempdir().unwrap();
    let manifest = Manifest::open(&dir.path().join("public/assets"), None).unwrap();
    assert!(manifest.is_empty());
    assert!(manifest.path().is_none());
  }

  #[test]
  fn explicit_manifest_must_exist() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("custom.json");
    assert!(Manifest::open(dir.path(), Some(&missing)).is_err());
  }
}
