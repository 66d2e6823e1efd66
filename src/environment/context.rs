//! URL settings applied when a compiled stylesheet points at another asset.

use super::Asset;
use crate::asset_paths::join_url_path;
use crate::config::{AssetConfig, DEFAULT_PREFIX};
use crate::host::AssetHost;

/// Prefix, digest and host used for `url(...)` targets rewritten during compilation.
///
/// Compilation happens outside any request, so request-dependent hosts are asked without one.
#[derive(Debug, Clone)]
pub struct UrlContext {
  /// Prefix pipeline assets are served under.
  pub prefix: String,
  /// Point at digest-qualified file names.
  pub digest: bool,
  /// Host prepended to every rewritten URL.
  pub host: AssetHost,
}

impl Default for UrlContext {
  fn default() -> Self {
    Self {
      prefix: DEFAULT_PREFIX.into(),
      digest: false,
      host: AssetHost::None,
    }
  }
}

impl UrlContext {
  /// The URL settings of a configuration.
  pub fn from_config(config: &AssetConfig) -> Self {
    Self {
      prefix: config.prefix.clone(),
      digest: config.digest,
      host: config.host.clone(),
    }
  }

  /// URL a compiled source should use to reference `asset`.
  pub fn asset_url(&self, asset: &Asset) -> String {
    let served = if self.digest {
      asset.digest_path()
    } else {
      asset.logical_path.clone()
    };
    format!("{}{}", self.host.prefix(None), join_url_path(&self.prefix, &served))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn logo() -> Asset {
    Asset {
      logical_path: "images/logo.png".into(),
      filename: PathBuf::from("/project/app/assets/images/logo.png"),
      digest: "abc123".into(),
      dependencies: Vec::new(),
      links: Vec::new(),
    }
  }

  #[test]
  fn follows_prefix_digest_and_host() {
    assert_eq!(UrlContext::default().asset_url(&logo()), "/assets/images/logo.png");

    let context = UrlContext {
      prefix: "/static/".into(),
      digest: true,
      host: AssetHost::from_config(Some("cdn.example.com")),
    };
    assert_eq!(
      context.asset_url(&logo()),
      "//cdn.example.com/static/images/logo-abc123.png"
    );
  }

  #[test]
  fn takes_settings_from_config() {
    let config = AssetConfig {
      digest: true,
      host: AssetHost::from_config(Some("https://assets.example.com/")),
      ..AssetConfig::for_root("/project")
    };
    assert_eq!(
      UrlContext::from_config(&config).asset_url(&logo()),
      "https://assets.example.com/assets/images/logo-abc123.png"
    );
  }
}
