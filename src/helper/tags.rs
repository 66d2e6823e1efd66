use std::collections::BTreeMap;
use std::fmt;

use crate::asset_paths::AssetType;

/// Caller options for include-tag builders.
#[derive(Debug, Clone, Default)]
pub struct TagOptions {
  /// Attributes merged over the per-type defaults.
  pub attributes: BTreeMap<String, String>,
  /// `Some(false)` disables debug expansion for this call.
  pub debug: Option<bool>,
}

impl TagOptions {
  /// Options without overrides.
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace an attribute.
  pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(name.into(), value.into());
    self
  }

  /// Force debug expansion on or off for this call.
  pub fn debug(mut self, enabled: bool) -> Self {
    self.debug = Some(enabled);
    self
  }
}

/// One rendered include tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTag {
  /// Asset type the tag was built for.
  pub asset_type: AssetType,
  /// Resolved URL.
  pub url: String,
  /// Attributes other than the URL, defaults already merged.
  pub attributes: BTreeMap<String, String>,
}

impl AssetTag {
  /// Tag for `url`, with `overrides` merged over the type's default attributes.
  pub fn new(asset_type: AssetType, url: String, overrides: &BTreeMap<String, String>) -> Self {
    let mut attributes = default_attributes(asset_type);
    for (name, value) in overrides {
      attributes.insert(name.clone(), value.clone());
    }
    attributes.remove(url_attribute(asset_type));

    Self {
      asset_type,
      url,
      attributes,
    }
  }

  /// HTML markup with attributes sorted by name and values escaped.
  pub fn to_html(&self) -> String {
    let mut attributes = self.attributes.clone();
    attributes.insert(url_attribute(self.asset_type).to_string(), self.url.clone());

    let rendered: String = attributes
      .iter()
      .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
      .collect();

    match self.asset_type {
      AssetType::Javascript => format!("<script{rendered}></script>"),
      AssetType::Image => format!("<img{rendered} />"),
      AssetType::Stylesheet | AssetType::Other => format!("<link{rendered} />"),
    }
  }
}

impl fmt::Display for AssetTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_html())
  }
}

/// Attribute carrying the URL for each tag kind.
pub fn url_attribute(asset_type: AssetType) -> &'static str {
  match asset_type {
    AssetType::Javascript | AssetType::Image => "src",
    AssetType::Stylesheet | AssetType::Other => "href",
  }
}

fn default_attributes(asset_type: AssetType) -> BTreeMap<String, String> {
  let mut attributes = BTreeMap::new();
  if asset_type == AssetType::Stylesheet {
    attributes.insert("media".to_string(), "screen".to_string());
    attributes.insert("rel".to_string(), "stylesheet".to_string());
  }
  attributes
}

fn escape_html(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#39;"),
      other => escaped.push(other),
    }
  }
  escaped
}
