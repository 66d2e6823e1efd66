//! Boot-time wiring: one environment and one manifest per process, shared by every helper.

use std::fmt;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use tracing::debug;

use crate::config::AssetConfig;
use crate::environment::{AssetEnvironment, CachedEnvironment, DirectoryEnvironment, UrlContext};
use crate::helper::AssetHelper;
use crate::lookup::SourceLookup;
use crate::manifest::Manifest;

type EnvironmentFactory =
  Box<dyn Fn(&AssetConfig, &str) -> Arc<dyn AssetEnvironment> + Send + Sync>;

/// Process-wide asset state.
///
/// The environment and manifest are built lazily on first use and then reused, so every helper
/// created from the same pipeline observes the same instances.
pub struct AssetPipeline {
  config: Arc<AssetConfig>,
  version: String,
  factory: EnvironmentFactory,
  environment: OnceLock<Arc<dyn AssetEnvironment>>,
  manifest: OnceLock<Arc<Manifest>>,
}

impl AssetPipeline {
  /// Pipeline compiling from the configured source roots.
  pub fn new(config: AssetConfig) -> Self {
    Self::with_factory(config, |config, version| {
      let environment: Arc<dyn AssetEnvironment> = Arc::new(
        DirectoryEnvironment::new(config.paths.clone())
          .with_version(version)
          .with_url_context(UrlContext::from_config(config)),
      );
      environment
    })
  }

  /// Pipeline backed by a caller-supplied environment.
  pub fn with_environment(config: AssetConfig, environment: Arc<dyn AssetEnvironment>) -> Self {
    Self::with_factory(config, move |_, _| environment.clone())
  }

  fn with_factory<F>(config: AssetConfig, factory: F) -> Self
  where
    F: Fn(&AssetConfig, &str) -> Arc<dyn AssetEnvironment> + Send + Sync + 'static,
  {
    let version = cache_version(&config);
    Self {
      config: Arc::new(config),
      version,
      factory: Box::new(factory),
      environment: OnceLock::new(),
      manifest: OnceLock::new(),
    }
  }

  /// Configuration shared with every helper.
  pub fn config(&self) -> &Arc<AssetConfig> {
    &self.config
  }

  /// Cache version stamped on the environment.
  pub fn version(&self) -> &str {
    &self.version
  }

  /// The live environment, wrapped in a read-through cache when `cache_classes` is set.
  pub fn environment(&self) -> &Arc<dyn AssetEnvironment> {
    self.environment.get_or_init(|| {
      let environment = (self.factory)(&self.config, &self.version);
      if self.config.cache_classes {
        debug!(version = %self.version, "caching asset environment");
        Arc::new(CachedEnvironment::new(environment))
      } else {
        environment
      }
    })
  }

  /// The precompiled manifest, loaded once from the public asset directory.
  pub fn manifest(&self) -> Result<&Arc<Manifest>> {
    if let Some(manifest) = self.manifest.get() {
      return Ok(manifest);
    }

    let manifest = Manifest::open(&self.config.manifest_dir(), self.config.manifest.as_deref())?;
    debug!(entries = manifest.len(), "resolving from precompiled manifest");
    Ok(self.manifest.get_or_init(|| Arc::new(manifest)))
  }

  /// Helper for one rendering context; compiles live when `compile` is set, otherwise reads
  /// the manifest.
  pub fn helper(&self) -> Result<AssetHelper> {
    let source = if self.config.compile {
      SourceLookup::Live(self.environment().clone())
    } else {
      SourceLookup::Manifest(self.manifest()?.clone())
    };
    Ok(AssetHelper::new(self.config.clone(), source))
  }
}

impl fmt::Debug for AssetPipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AssetPipeline")
      .field("config", &self.config)
      .field("version", &self.version)
      .field("environment_loaded", &self.environment.get().is_some())
      .field("manifest_loaded", &self.manifest.get().is_some())
      .finish()
  }
}

/// `<environment>-<asset version>[-<static host>]-<crate version>`.
///
/// Request-dependent hosts are left out since they have no fixed value.
pub fn cache_version(config: &AssetConfig) -> String {
  let mut parts = vec![config.environment_name.as_str(), config.version.as_str()];
  if let Some(host) = config.host.static_value() {
    parts.push(host);
  }
  parts.push(env!("CARGO_PKG_VERSION"));
  parts.join("-")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  use tempfile::tempdir;

  use crate::environment::{MemoryAsset, MemoryEnvironment};
  use crate::host::AssetHost;
  use crate::precompile::PrecompileList;

  fn memory() -> Arc<dyn AssetEnvironment> {
    Arc::new(MemoryEnvironment::new().with(MemoryAsset::new("foo.js", "var foo;")))
  }

  #[test]
  fn cache_version_includes_static_hosts_only() {
    let config = AssetConfig {
      version: "1.0".into(),
      ..AssetConfig::for_root("/project")
    };
    let crate_version = env!("CARGO_PKG_VERSION");
    assert_eq!(cache_version(&config), format!("development-1.0-{crate_version}"));

    let hosted = AssetConfig {
      host: AssetHost::from_config(Some("cdn.example.com")),
      ..config.clone()
    };
    assert_eq!(
      cache_version(&hosted),
      format!("development-1.0-cdn.example.com-{crate_version}")
    );

    let dynamic = AssetConfig {
      host: AssetHost::request(),
      ..config
    };
    assert_eq!(cache_version(&dynamic), format!("development-1.0-{crate_version}"));
  }

  #[test]
  fn environment_is_built_once() {
    let pipeline = AssetPipeline::with_environment(AssetConfig::for_root("/project"), memory());
    assert!(Arc::ptr_eq(pipeline.environment(), pipeline.environment()));
    assert!(!pipeline.environment().is_cached());

    let first = pipeline.helper().unwrap();
    let second = pipeline.helper().unwrap();
    assert!(Arc::ptr_eq(
      first.assets_environment().unwrap(),
      second.assets_environment().unwrap()
    ));
  }

  #[test]
  fn cache_classes_wraps_the_environment() {
    let config = AssetConfig {
      cache_classes: true,
      ..AssetConfig::for_root("/project")
    };
    let pipeline = AssetPipeline::with_environment(config, memory());
    assert!(pipeline.environment().is_cached());
  }

  #[test]
  fn compile_mode_resolves_live() {
    let config = AssetConfig {
      precompile: PrecompileList::from_names(["foo.js"]),
      ..AssetConfig::for_root("/project")
    };
    let helper = AssetPipeline::with_environment(config, memory()).helper().unwrap();
    assert!(helper.source().is_live());
    assert_eq!(helper.javascript_path("foo").unwrap(), "/assets/foo.js");
  }

  #[test]
  fn precompiled_mode_reads_the_manifest_from_disk() {
    let dir = tempdir().unwrap();
    let assets = dir.path().join("public/assets");
    fs::create_dir_all(&assets).unwrap();
    fs::write(
      assets.join("manifest-abc.json"),
      r#"{"assets": {"foo.js": "foo-ABC123.js"}, "files": {}}"#,
    )
    .unwrap();

    let config = AssetConfig {
      compile: false,
      digest: true,
      ..AssetConfig::for_root(dir.path())
    };
    let pipeline = AssetPipeline::new(config);
    let helper = pipeline.helper().unwrap();
    assert!(helper.assets_environment().is_none());
    assert_eq!(helper.javascript_path("foo").unwrap(), "/assets/foo-ABC123.js");
    assert!(Arc::ptr_eq(pipeline.manifest().unwrap(), pipeline.manifest().unwrap()));
  }

  #[test]
  fn missing_explicit_manifest_is_an_error() {
    let dir = tempdir().unwrap();
    let config = AssetConfig {
      compile: false,
      manifest: Some(dir.path().join("nope.json")),
      ..AssetConfig::for_root(dir.path())
    };
    assert!(AssetPipeline::new(config).helper().is_err());
  }

  #[test]
  fn compiled_stylesheets_follow_the_configured_host() {
    let dir = tempdir().unwrap();
    let styles = dir.path().join("app/assets/stylesheets");
    let images = dir.path().join("app/assets/images");
    fs::create_dir_all(&styles).unwrap();
    fs::create_dir_all(&images).unwrap();
    fs::write(styles.join("url.css"), "p { background: url(logo.png); }\n").unwrap();
    fs::write(images.join("logo.png"), "png").unwrap();

    let config = AssetConfig {
      host: AssetHost::from_config(Some("assets.example.com")),
      ..AssetConfig::for_root(dir.path())
    };
    let pipeline = AssetPipeline::new(config);
    assert_eq!(
      pipeline.environment().compile("url.css").unwrap(),
      "p { background: url(//assets.example.com/assets/logo.png); }\n"
    );
  }

  #[test]
  fn directory_environment_compiles_from_source_roots() {
    let dir = tempdir().unwrap();
    let scripts = dir.path().join("app/assets/javascripts");
    fs::create_dir_all(&scripts).unwrap();
    fs::write(scripts.join("application.js"), "//= require util\nvar app;\n").unwrap();
    fs::write(scripts.join("util.js"), "var util;\n").unwrap();

    let config = AssetConfig {
      debug: true,
      ..AssetConfig::for_root(dir.path())
    };
    let helper = AssetPipeline::new(config).helper().unwrap();
    assert_eq!(
      helper
        .javascript_include_tag(&["application"], &crate::helper::TagOptions::new())
        .unwrap(),
      "<script src=\"/assets/util.js?body=1\"></script>\n<script src=\"/assets/application.js?body=1\"></script>"
    );
  }
}
