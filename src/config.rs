//! Asset configuration: the immutable runtime value and the JSON file it is loaded from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::host::AssetHost;
use crate::precompile::{PrecompileList, PrecompileRule};

const DEFAULT_CONFIG_FILE: &str = "assets.config.json";
pub(crate) const DEFAULT_PREFIX: &str = "/assets";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_ASSET_DIRS: [&str; 3] = [
    "app/assets/javascripts",
    "app/assets/stylesheets",
    "app/assets/images",
];

/// Resolution settings, built once before any helper is created and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Project root the relative paths below were resolved against.
    pub root: PathBuf,
    /// URL prefix pipeline assets are served under.
    pub prefix: String,
    /// Embed digests in pipeline URLs.
    pub digest: bool,
    /// Expand bundles into their individual sources in include tags.
    pub debug: bool,
    /// Compile on demand; when off, resolve from the precompiled manifest.
    pub compile: bool,
    /// Wrap the live environment in a read-through cache at boot.
    pub cache_classes: bool,
    /// Application asset version mixed into the cache version.
    pub version: String,
    /// Deployment environment name (`development`, `production`, ...).
    pub environment_name: String,
    /// Source roots of the live environment, searched in order.
    pub paths: Vec<PathBuf>,
    /// Public directory precompiled assets are written to.
    pub public_dir: PathBuf,
    /// Explicit manifest file; otherwise searched under the public asset directory.
    pub manifest: Option<PathBuf>,
    /// Asset host.
    pub host: AssetHost,
    /// Precompile allow-list.
    pub precompile: PrecompileList,
    /// Serve unknown relative references from the public directory instead of failing.
    pub public_fallback: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::for_root(".")
    }
}

impl AssetConfig {
    /// Default configuration for a project root.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            prefix: DEFAULT_PREFIX.into(),
            digest: false,
            debug: false,
            compile: true,
            cache_classes: false,
            version: String::new(),
            environment_name: DEFAULT_ENVIRONMENT.into(),
            paths: DEFAULT_ASSET_DIRS.iter().map(|dir| root.join(dir)).collect(),
            public_dir: root.join(DEFAULT_PUBLIC_DIR),
            manifest: None,
            host: AssetHost::None,
            precompile: PrecompileList::defaults(&root),
            public_fallback: false,
            root,
        }
    }

    /// Directory holding precompiled assets and their manifest.
    pub fn manifest_dir(&self) -> PathBuf {
        self.public_dir.join(self.prefix.trim_matches('/'))
    }
}

/// Discoverable configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// URL prefix for pipeline assets.
    pub prefix: String,
    /// Embed digests in URLs.
    pub digest: bool,
    /// Expand bundles in include tags.
    pub debug: bool,
    /// Compile on demand instead of reading the manifest.
    pub compile: bool,
    /// Cache the live environment.
    pub cache_classes: bool,
    /// Application asset version.
    pub version: String,
    /// Deployment environment name.
    pub environment: String,
    /// Source roots relative to the project root; defaults to the app asset directories.
    pub paths: Vec<String>,
    /// Public directory relative to the project root.
    pub public_dir: String,
    /// Explicit manifest path relative to the project root.
    pub manifest: Option<String>,
    /// Fixed asset host.
    pub host: Option<String>,
    /// Exact logical names allowed to be served.
    pub precompile: Vec<String>,
    /// Regular expressions over logical paths allowed to be served.
    pub precompile_patterns: Vec<String>,
    /// Keep the default loose-asset and application-bundle rules.
    pub default_precompile: bool,
    /// Fall back to the public directory for unknown references.
    pub public_fallback: bool,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            digest: false,
            debug: false,
            compile: true,
            cache_classes: false,
            version: String::new(),
            environment: DEFAULT_ENVIRONMENT.into(),
            paths: Vec::new(),
            public_dir: DEFAULT_PUBLIC_DIR.into(),
            manifest: None,
            host: None,
            precompile: Vec::new(),
            precompile_patterns: Vec::new(),
            default_precompile: true,
            public_fallback: false,
        }
    }
}

impl ConfigFile {
    /// Load `assets.config.json` from the project root; defaults when it is missing or malformed.
    pub fn discover(root: &Path) -> Self {
        let candidate = root.join(DEFAULT_CONFIG_FILE);
        Self::from_path(&candidate).unwrap_or_default()
    }

    /// Read configuration from a specific JSON file, if it exists and parses.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Read configuration from a specific JSON file, reporting why it could not be used.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Resolve paths against `root` and compile the precompile rules.
    pub fn into_config(self, root: &Path) -> Result<AssetConfig> {
        let mut precompile = if self.default_precompile {
            PrecompileList::defaults(root)
        } else {
            PrecompileList::default()
        };
        for name in self.precompile {
            precompile.push(PrecompileRule::name(name));
        }
        for pattern in &self.precompile_patterns {
            let rule = PrecompileRule::pattern(pattern)
                .with_context(|| format!("invalid precompile pattern '{pattern}'"))?;
            precompile.push(rule);
        }

        let paths = if self.paths.is_empty() {
            DEFAULT_ASSET_DIRS.iter().map(|dir| root.join(dir)).collect()
        } else {
            self.paths.iter().map(|dir| root.join(dir)).collect()
        };

        Ok(AssetConfig {
            root: root.to_path_buf(),
            prefix: self.prefix,
            digest: self.digest,
            debug: self.debug,
            compile: self.compile,
            cache_classes: self.cache_classes,
            version: self.version,
            environment_name: self.environment,
            paths,
            public_dir: root.join(self.public_dir),
            manifest: self.manifest.map(|path| root.join(path)),
            host: AssetHost::from_config(self.host.as_deref()),
            precompile,
            public_fallback: self.public_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_pipeline_conventions() {
        let config = AssetConfig::for_root("/project");
        assert_eq!(config.prefix, "/assets");
        assert!(!config.digest);
        assert!(!config.debug);
        assert!(config.compile);
        assert_eq!(config.paths[0], PathBuf::from("/project/app/assets/javascripts"));
        assert_eq!(config.manifest_dir(), PathBuf::from("/project/public/assets"));
        assert_eq!(config.precompile.rules().len(), 2);
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let file = ConfigFile::discover(dir.path());
        assert_eq!(file.prefix, "/assets");
        assert!(file.default_precompile);

        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{broken").unwrap();
        let file = ConfigFile::discover(dir.path());
        assert!(file.compile);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, "{broken").unwrap();
        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn converts_file_into_config() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{
              "digest": true,
              "host": "assets.example.com",
              "paths": ["assets"],
              "precompile": ["foo.js"],
              "precompile_patterns": ["^admin/"],
              "default_precompile": false
            }"#,
        )
        .unwrap();

        let config = ConfigFile::discover(dir.path())
            .into_config(dir.path())
            .unwrap();
        assert!(config.digest);
        assert_eq!(config.host.static_value(), Some("assets.example.com"));
        assert_eq!(config.paths, vec![dir.path().join("assets")]);
        assert!(config.precompile.authorized("foo.js", Path::new("foo.js")));
        assert!(config.precompile.authorized("admin/app.js", Path::new("x")));
        assert!(!config.precompile.authorized("application.js", Path::new("x")));
    }

    #[test]
    fn rejects_invalid_patterns() {
        let file = ConfigFile {
            precompile_patterns: vec!["(".into()],
            ..ConfigFile::default()
        };
        let err = file.into_config(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("invalid precompile pattern '('"));
    }
}
