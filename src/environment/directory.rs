//! Environment compiling assets on demand from ordered source directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::trace;

use super::directives::{Directives, parse_directives, rewrite_url_references};
use super::{Asset, AssetEnvironment, UrlContext, dependency_closure};
use crate::error::{AssetError, AssetResult};

/// Serves every file found under its source roots, addressed by its path relative to the root.
///
/// Earlier roots shadow later ones. A file's digest covers the environment version, its own
/// processed source, the digests of everything it requires and the contents of the files its
/// stylesheet `url(...)` targets point at, so touching any of them re-digests the bundle.
/// Files that are not UTF-8 text are served as opaque blobs without directives.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEnvironment {
  roots: Vec<PathBuf>,
  version: String,
  urls: UrlContext,
}

/// Contents of one source file.
enum SourceFile {
  Text(Directives),
  Binary(Vec<u8>),
}

impl DirectoryEnvironment {
  /// Environment over the given roots, searched in order.
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self {
      roots,
      version: String::new(),
      urls: UrlContext::default(),
    }
  }

  /// Version string mixed into every digest.
  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = version.into();
    self
  }

  /// URL settings for `url(...)` targets rewritten in compiled stylesheets.
  pub fn with_url_context(mut self, urls: UrlContext) -> Self {
    self.urls = urls;
    self
  }

  /// Append a source root with the lowest precedence.
  pub fn append_path(&mut self, root: impl Into<PathBuf>) {
    self.roots.push(root.into());
  }

  /// Source roots in search order.
  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }

  /// Version mixed into digests.
  pub fn version(&self) -> &str {
    &self.version
  }

  fn locate(&self, logical_path: &str) -> Option<PathBuf> {
    let relative = Path::new(logical_path);
    let stays_inside = relative
      .components()
      .all(|component| matches!(component, Component::Normal(_)));
    if !stays_inside {
      return None;
    }

    self
      .roots
      .iter()
      .map(|root| root.join(relative))
      .find(|candidate| candidate.is_file())
  }

  fn read_source(&self, logical_path: &str, filename: &Path) -> AssetResult<SourceFile> {
    let bytes = read_file(logical_path, filename)?;
    Ok(match String::from_utf8(bytes) {
      Ok(source) => SourceFile::Text(parse_directives(&source, is_stylesheet(logical_path))),
      Err(err) => SourceFile::Binary(err.into_bytes()),
    })
  }

  /// Directive argument resolved to a logical path.
  ///
  /// The form carrying the declaring file's extension wins when it exists; otherwise the
  /// argument as written is used if it exists or already has an extension
  /// (`//= link logo.png` from a stylesheet).
  fn resolve_directive(&self, current: &str, argument: &str) -> Option<String> {
    let written = argument_path(current, argument)?;
    let resolved = with_declaring_extension(current, &written);
    if resolved == written || self.locate(&resolved).is_some() {
      return Some(resolved);
    }
    if self.locate(&written).is_some() || Path::new(&written).extension().is_some() {
      return Some(written);
    }
    Some(resolved)
  }

  /// Point the relative `url(...)` targets of a stylesheet body at their served URLs.
  fn rewrite_urls(&self, logical_path: &str, body: &str) -> AssetResult<String> {
    rewrite_url_references(body, |reference| {
      let Some(target) = resolve_url_reference(logical_path, reference.base()) else {
        return Ok(None);
      };
      let Some(asset) = self.find_asset(&target)? else {
        return Ok(None);
      };
      Ok(Some(reference.attach_tail(&self.urls.asset_url(&asset), None)))
    })
  }

  fn load(&self, logical_path: &str, stack: &mut Vec<String>) -> AssetResult<Option<Asset>> {
    let Some(filename) = self.locate(logical_path) else {
      return Ok(None);
    };
    if stack.iter().any(|entry| entry == logical_path) {
      return Err(AssetError::compilation(
        logical_path,
        format!(
          "circular dependency: {} -> {}",
          stack.join(" -> "),
          logical_path
        ),
      ));
    }

    let mut hasher = Sha256::new();
    hasher.update(self.version.as_bytes());
    let directives = match self.read_source(logical_path, &filename)? {
      SourceFile::Text(directives) => {
        hasher.update(directives.body.as_bytes());
        directives
      }
      SourceFile::Binary(bytes) => {
        hasher.update(&bytes);
        Directives::default()
      }
    };

    let mut dependencies = Vec::with_capacity(directives.requires.len());
    stack.push(logical_path.to_string());
    for argument in &directives.requires {
      let required = self.resolve_directive(logical_path, argument).ok_or_else(|| {
        AssetError::compilation(logical_path, format!("invalid require '{argument}'"))
      })?;
      let dependency = self.load(&required, stack)?.ok_or_else(|| {
        AssetError::compilation(logical_path, format!("couldn't find file '{required}'"))
      })?;
      hasher.update(dependency.digest.as_bytes());
      dependencies.push(required);
    }
    stack.pop();

    let mut links = Vec::new();
    for argument in &directives.links {
      let linked = self.resolve_directive(logical_path, argument).ok_or_else(|| {
        AssetError::compilation(logical_path, format!("invalid link '{argument}'"))
      })?;
      if self.locate(&linked).is_none() {
        return Err(AssetError::compilation(
          logical_path,
          format!("couldn't find linked file '{linked}'"),
        ));
      }
      links.push(linked);
    }
    for reference in &directives.url_references {
      let Some(linked) = resolve_url_reference(logical_path, reference) else {
        continue;
      };
      let Some(target) = self.locate(&linked) else {
        continue;
      };
      hasher.update(read_file(logical_path, &target)?);
      if !links.contains(&linked) {
        links.push(linked);
      }
    }

    trace!(logical_path, file = %filename.display(), "compiled asset");
    Ok(Some(Asset {
      logical_path: logical_path.to_string(),
      filename,
      digest: hex::encode(hasher.finalize()),
      dependencies,
      links,
    }))
  }
}

/// CSS `url(...)` targets keep their own extension; only `./` and `../` forms are relative to
/// the stylesheet.
fn resolve_url_reference(current: &str, reference: &str) -> Option<String> {
  if reference.starts_with("./") || reference.starts_with("../") {
    resolve_relative(current, reference)
  } else {
    Some(reference.to_string())
  }
}

fn is_stylesheet(logical_path: &str) -> bool {
  logical_path.ends_with(".css")
}

fn read_file(logical_path: &str, filename: &Path) -> AssetResult<Vec<u8>> {
  fs::read(filename).map_err(|err| {
    AssetError::compilation(
      logical_path,
      format!("failed to read {}: {err}", filename.display()),
    )
  })
}

fn resolve_relative(current: &str, argument: &str) -> Option<String> {
  let mut segments: Vec<&str> = current.split('/').collect();
  segments.pop();
  for segment in argument.split('/') {
    match segment {
      "." | "" => {}
      ".." => {
        segments.pop()?;
      }
      other => segments.push(other),
    }
  }
  Some(segments.join("/"))
}

/// Logical path a directive argument names, before extension handling.
///
/// Bare names are logical paths; `./` and `../` arguments are relative to the declaring file's
/// directory.
fn argument_path(current: &str, argument: &str) -> Option<String> {
  let resolved = if argument.starts_with("./") || argument.starts_with("../") {
    resolve_relative(current, argument)?
  } else {
    argument.trim_start_matches('/').to_string()
  };
  (!resolved.is_empty()).then_some(resolved)
}

/// Append the declaring file's extension unless the path already ends with it, so
/// `jquery.min` from `app.js` becomes `jquery.min.js`.
fn with_declaring_extension(current: &str, path: &str) -> String {
  match Path::new(current).extension().and_then(|ext| ext.to_str()) {
    Some(extension) if !path.ends_with(&format!(".{extension}")) => format!("{path}.{extension}"),
    _ => path.to_string(),
  }
}

impl AssetEnvironment for DirectoryEnvironment {
  fn find_asset(&self, logical_path: &str) -> AssetResult<Option<Asset>> {
    self.load(logical_path, &mut Vec::new())
  }

  fn compile(&self, logical_path: &str) -> AssetResult<String> {
    let mut bundle = String::new();
    for asset in dependency_closure(self, logical_path)? {
      match self.read_source(&asset.logical_path, &asset.filename)? {
        SourceFile::Text(directives) if is_stylesheet(&asset.logical_path) => {
          bundle.push_str(&self.rewrite_urls(&asset.logical_path, &directives.body)?);
        }
        SourceFile::Text(directives) => bundle.push_str(&directives.body),
        SourceFile::Binary(_) => {
          return Err(AssetError::compilation(
            &asset.logical_path,
            "binary files cannot be bundled",
          ));
        }
      }
    }
    Ok(bundle)
  }

  fn logical_paths(&self) -> AssetResult<Vec<(String, PathBuf)>> {
    let mut found = BTreeMap::new();
    for root in &self.roots {
      collect_files(root, Path::new(""), &mut found);
    }
    Ok(found.into_iter().collect())
  }
}

fn collect_files(dir: &Path, relative_root: &Path, found: &mut BTreeMap<String, PathBuf>) {
  let Ok(entries) = fs::read_dir(dir) else {
    return;
  };

  for entry in entries.flatten() {
    let file_name = entry.file_name();
    if file_name.to_string_lossy().starts_with('.') {
      continue;
    }
    let Ok(file_type) = entry.file_type() else {
      continue;
    };

    let next_relative = relative_root.join(&file_name);
    if file_type.is_dir() {
      collect_files(&entry.path(), &next_relative, found);
    } else if file_type.is_file() {
      let logical_path = next_relative.to_string_lossy().replace('\\', "/");
      found.entry(logical_path).or_insert_with(|| entry.path());
    }
  }
}
