//! View-context helper turning logical asset names into URLs and include tags.
//!
//! Every call runs the same pipeline: classify the reference, infer its extension, resolve it
//! against the context's source (authorizing live lookups against the precompile rules), then
//! prepend the prefix and host and reattach the caller's query and fragment. Tag builders add
//! debug expansion on top, emitting one tag per source file of a bundle.

mod tags;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::asset_paths::{AssetReference, AssetType, ReferenceKind, join_url_path};
use crate::config::AssetConfig;
use crate::debug::{DEBUG_BODY_PARAM, DebugExpander};
use crate::environment::{AssetEnvironment, dependency_closure};
use crate::error::{AssetError, AssetResult};
use crate::host::RequestContext;
use crate::lookup::{ResolvedAsset, SourceLookup};
use crate::manifest::Manifest;

pub use tags::{AssetTag, TagOptions, url_attribute};

/// Options for single-path resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOptions {
  /// Type deciding extension inference and the public fallback directory.
  pub asset_type: AssetType,
  /// Request the raw individual file (`?body=1`) instead of the bundle.
  pub debug: bool,
}

impl PathOptions {
  /// Options for an asset type.
  pub fn of_type(asset_type: AssetType) -> Self {
    Self {
      asset_type,
      debug: false,
    }
  }

  /// Mark the path as a debug body request.
  pub fn debug(mut self) -> Self {
    self.debug = true;
    self
  }
}

/// Asset helper bound to one rendering context.
///
/// The lookup source is fixed at construction; the helper never switches between the manifest
/// and the live environment afterwards.
#[derive(Debug)]
pub struct AssetHelper {
  config: Arc<AssetConfig>,
  source: SourceLookup,
  request: Option<RequestContext>,
  precompiled_links: OnceLock<BTreeSet<String>>,
}

impl AssetHelper {
  /// Helper resolving against `source` with the given configuration.
  pub fn new(config: Arc<AssetConfig>, source: SourceLookup) -> Self {
    Self {
      config,
      source,
      request: None,
      precompiled_links: OnceLock::new(),
    }
  }

  /// Attach the request being rendered, for request-dependent hosts.
  pub fn with_request(mut self, request: RequestContext) -> Self {
    self.request = Some(request);
    self
  }

  /// Configuration in effect.
  pub fn config(&self) -> &AssetConfig {
    &self.config
  }

  /// Lookup source selected for this context.
  pub fn source(&self) -> &SourceLookup {
    &self.source
  }

  /// The live environment, identical on every call; `None` in precompiled mode.
  pub fn assets_environment(&self) -> Option<&Arc<dyn AssetEnvironment>> {
    self.source.environment()
  }

  /// The manifest, when resolving in precompiled mode.
  pub fn assets_manifest(&self) -> Option<&Arc<Manifest>> {
    self.source.manifest()
  }

  /// Debug expansion only applies to live lookups; manifests describe final bundles.
  pub fn debug_assets(&self) -> bool {
    self.config.debug && self.source.is_live()
  }

  /// Resolve any reference into a URL.
  pub fn asset_path(&self, source: &str, options: PathOptions) -> AssetResult<String> {
    let reference = AssetReference::parse(source)?;
    self.path_for(&reference, options, None)
  }

  /// Resolve a script reference, inferring `.js`.
  pub fn javascript_path(&self, source: &str) -> AssetResult<String> {
    self.asset_path(source, PathOptions::of_type(AssetType::Javascript))
  }

  /// Resolve a stylesheet reference, inferring `.css`.
  pub fn stylesheet_path(&self, source: &str) -> AssetResult<String> {
    self.asset_path(source, PathOptions::of_type(AssetType::Stylesheet))
  }

  /// Resolve an image reference.
  pub fn image_path(&self, source: &str) -> AssetResult<String> {
    self.asset_path(source, PathOptions::of_type(AssetType::Image))
  }

  /// Digest-qualified file name of a logical path, e.g. `foo-<digest>.js`.
  pub fn asset_digest_path(&self, logical_path: &str) -> AssetResult<String> {
    self
      .resolve_authorized(logical_path, None)?
      .map(|resolved| resolved.digest_path)
      .ok_or_else(|| AssetError::not_found(logical_path))
  }

  /// Include tags for several sources, in order, failing on the first source that fails.
  ///
  /// Without debug expansion every source yields exactly one tag. When bundles are expanded,
  /// tags repeated across sources (a shared dependency) are emitted once, at their first
  /// position.
  pub fn asset_include_tags(
    &self,
    sources: &[&str],
    asset_type: AssetType,
    options: &TagOptions,
  ) -> AssetResult<Vec<AssetTag>> {
    let dedupe = self.expands_bundles(options);
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for (_, result) in self.include_tags_by_source(sources, asset_type, options) {
      for tag in result? {
        if !dedupe || seen.insert(tag.url.clone()) {
          tags.push(tag);
        }
      }
    }
    Ok(tags)
  }

  /// Include tags resolved independently per source, so callers can keep partial results.
  pub fn include_tags_by_source<'s>(
    &self,
    sources: &[&'s str],
    asset_type: AssetType,
    options: &TagOptions,
  ) -> Vec<(&'s str, AssetResult<Vec<AssetTag>>)> {
    sources
      .iter()
      .map(|source| (*source, self.tags_for_source(source, asset_type, options)))
      .collect()
  }

  /// `<script>` markup for the given sources, one tag per line.
  pub fn javascript_include_tag(&self, sources: &[&str], options: &TagOptions) -> AssetResult<String> {
    let tags = self.asset_include_tags(sources, AssetType::Javascript, options)?;
    Ok(render_tags(&tags))
  }

  /// `<link rel="stylesheet">` markup for the given sources, one tag per line.
  pub fn stylesheet_link_tag(&self, sources: &[&str], options: &TagOptions) -> AssetResult<String> {
    let tags = self.asset_include_tags(sources, AssetType::Stylesheet, options)?;
    Ok(render_tags(&tags))
  }

  fn tags_for_source(
    &self,
    source: &str,
    asset_type: AssetType,
    options: &TagOptions,
  ) -> AssetResult<Vec<AssetTag>> {
    let reference = AssetReference::parse(source)?;

    if self.expands_bundles(options) && reference.kind() == ReferenceKind::Relative {
      if let Some(urls) = self.expand_for_debug(&reference, asset_type)? {
        return Ok(
          urls
            .into_iter()
            .map(|url| AssetTag::new(asset_type, url, &options.attributes))
            .collect(),
        );
      }
    }

    let url = self.path_for(&reference, PathOptions::of_type(asset_type), None)?;
    Ok(vec![AssetTag::new(asset_type, url, &options.attributes)])
  }

  fn expands_bundles(&self, options: &TagOptions) -> bool {
    options.debug != Some(false) && self.debug_assets()
  }

  /// URLs of every source file in the bundle, or `None` when the bundle is not in the pipeline.
  fn expand_for_debug(
    &self,
    reference: &AssetReference,
    asset_type: AssetType,
  ) -> AssetResult<Option<Vec<String>>> {
    let Some(environment) = self.source.environment() else {
      return Ok(None);
    };
    let logical_path = reference.with_default_extension(asset_type.default_extension());
    let Some(bundle) = self.resolve_authorized(&logical_path, None)? else {
      return Ok(None);
    };

    let members = DebugExpander::new(environment.as_ref()).expand(&bundle.logical_path)?;
    trace!(bundle = %bundle.logical_path, members = members.len(), "expanded debug bundle");

    // Members of an authorized bundle are servable on their own.
    let granted: BTreeSet<String> = members.iter().cloned().collect();
    members
      .iter()
      .map(|member| {
        let resolved = self
          .resolve_authorized(member, Some(&granted))?
          .ok_or_else(|| AssetError::not_found(member.as_str()))?;
        Ok(reference.attach_tail(&self.pipeline_url(&resolved), Some(DEBUG_BODY_PARAM)))
      })
      .collect::<AssetResult<Vec<_>>>()
      .map(Some)
  }

  fn path_for(
    &self,
    reference: &AssetReference,
    options: PathOptions,
    granted: Option<&BTreeSet<String>>,
  ) -> AssetResult<String> {
    let extension = options.asset_type.default_extension();
    match reference.kind() {
      ReferenceKind::External => Ok(reference.base().to_string()),
      ReferenceKind::Absolute => {
        let path = reference.with_default_extension(extension);
        Ok(reference.attach_tail(&format!("{}{}", self.host_prefix(), path), None))
      }
      ReferenceKind::Relative => {
        let logical_path = reference.with_default_extension(extension);
        match self.resolve_authorized(&logical_path, granted)? {
          Some(resolved) => {
            let marker = options.debug.then_some(DEBUG_BODY_PARAM);
            Ok(reference.attach_tail(&self.pipeline_url(&resolved), marker))
          }
          None => {
            let path = self.public_path(&logical_path, options.asset_type)?;
            Ok(reference.attach_tail(&format!("{}{}", self.host_prefix(), path), None))
          }
        }
      }
    }
  }

  /// Host, prefix and either the digest path or the logical path, without query.
  fn pipeline_url(&self, resolved: &ResolvedAsset) -> String {
    let served = if self.config.digest {
      &resolved.digest_path
    } else {
      &resolved.logical_path
    };
    format!("{}{}", self.host_prefix(), join_url_path(&self.config.prefix, served))
  }

  fn host_prefix(&self) -> String {
    self.config.host.prefix(self.request.as_ref())
  }

  fn resolve_authorized(
    &self,
    logical_path: &str,
    granted: Option<&BTreeSet<String>>,
  ) -> AssetResult<Option<ResolvedAsset>> {
    let Some(resolved) = self.source.find(logical_path)? else {
      return Ok(None);
    };
    if self.source.is_live() {
      self.authorize(&resolved, granted)?;
    }
    Ok(Some(resolved))
  }

  fn authorize(
    &self,
    resolved: &ResolvedAsset,
    granted: Option<&BTreeSet<String>>,
  ) -> AssetResult<()> {
    let logical_path = resolved.logical_path.as_str();
    if granted.is_some_and(|members| members.contains(logical_path)) {
      return Ok(());
    }

    let filename = resolved
      .filename
      .as_deref()
      .unwrap_or_else(|| Path::new(logical_path));
    if self.config.precompile.authorized(logical_path, filename) {
      return Ok(());
    }
    if self.precompiled_links()?.contains(logical_path) {
      trace!(logical_path, "authorized as a link of a precompiled asset");
      return Ok(());
    }

    Err(AssetError::not_precompiled(logical_path))
  }

  /// Everything linked, directly or through other links, from an asset the rules admit or from
  /// anything such an asset requires. Computed once per context.
  fn precompiled_links(&self) -> AssetResult<&BTreeSet<String>> {
    if let Some(links) = self.precompiled_links.get() {
      return Ok(links);
    }

    let mut links = BTreeSet::new();
    if let Some(environment) = self.source.environment() {
      let environment = environment.as_ref();
      let mut pending = Vec::new();
      for (logical_path, filename) in environment.logical_paths()? {
        if self.config.precompile.authorized(&logical_path, &filename) {
          pending.extend(bundle_links(environment, &logical_path)?);
        }
      }
      while let Some(link) = pending.pop() {
        if !links.insert(link.clone()) {
          continue;
        }
        if environment.find_asset(&link)?.is_some() {
          pending.extend(bundle_links(environment, &link)?);
        }
      }
    }
    Ok(self.precompiled_links.get_or_init(|| links))
  }

  fn public_path(&self, logical_path: &str, asset_type: AssetType) -> AssetResult<String> {
    if !self.config.public_fallback {
      return Err(AssetError::not_found(logical_path));
    }
    debug!(logical_path, %asset_type, "asset not in pipeline; using public directory");
    Ok(join_url_path(asset_type.public_dir().unwrap_or_default(), logical_path))
  }
}

/// Links declared by an asset and by every asset it requires.
fn bundle_links(environment: &dyn AssetEnvironment, logical_path: &str) -> AssetResult<Vec<String>> {
  Ok(
    dependency_closure(environment, logical_path)?
      .into_iter()
      .flat_map(|asset| asset.links)
      .collect(),
  )
}

fn render_tags(tags: &[AssetTag]) -> String {
  tags
    .iter()
    .map(AssetTag::to_html)
    .collect::<Vec<_>>()
    .join("\n")
}
