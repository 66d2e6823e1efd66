//! Allow-list deciding which logical assets may be served at all.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

/// Pattern matching the top-level application bundles.
pub const APPLICATION_BUNDLE_PATTERN: &str = r"(?:/|\\|\A)application\.(css|js)$";

/// Directory, relative to the project root, holding the primary asset sources.
pub const APP_ASSETS_DIR: &str = "app/assets";

/// Callable rule receiving the logical path and the full filesystem path of an asset.
pub type PrecompilePredicate = Arc<dyn Fn(&str, &Path) -> bool + Send + Sync>;

/// A single precompile rule.
#[derive(Clone)]
pub enum PrecompileRule {
  /// Exact logical path, extension included.
  Name(String),
  /// Regular expression over the extension-normalised logical path.
  Pattern(Regex),
  /// Arbitrary predicate over the logical path and the underlying file.
  Predicate(PrecompilePredicate),
}

impl PrecompileRule {
  /// Exact-name rule.
  pub fn name(name: impl Into<String>) -> Self {
    Self::Name(name.into())
  }

  /// Compile a pattern rule.
  pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
    Regex::new(pattern).map(Self::Pattern)
  }

  /// Wrap a closure as a predicate rule.
  pub fn predicate<F>(predicate: F) -> Self
  where
    F: Fn(&str, &Path) -> bool + Send + Sync + 'static,
  {
    Self::Predicate(Arc::new(predicate))
  }

  /// Evaluate the rule for one asset.
  pub fn matches(&self, logical_path: &str, filename: &Path) -> bool {
    match self {
      Self::Name(name) => name == logical_path,
      Self::Pattern(pattern) => pattern.is_match(logical_path),
      Self::Predicate(predicate) => predicate(logical_path, filename),
    }
  }
}

impl fmt::Debug for PrecompileRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
      Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
      Self::Predicate(_) => f.write_str("Predicate(..)"),
    }
  }
}

/// Catch-all rule admitting everything physically under `<root>/app/assets` except scripts and
/// stylesheets, which must be listed explicitly.
pub fn loose_app_assets(root: impl AsRef<Path>) -> PrecompileRule {
  let app_assets: PathBuf = root.as_ref().join(APP_ASSETS_DIR);
  PrecompileRule::predicate(move |logical_path, filename| {
    let extension = Path::new(logical_path)
      .extension()
      .and_then(|ext| ext.to_str())
      .unwrap_or_default();
    filename.starts_with(&app_assets) && !matches!(extension, "js" | "css")
  })
}

/// Ordered rule set evaluated with OR semantics.
#[derive(Debug, Clone, Default)]
pub struct PrecompileList {
  rules: Vec<PrecompileRule>,
}

impl PrecompileList {
  /// Build a list from explicit rules.
  pub fn new(rules: Vec<PrecompileRule>) -> Self {
    Self { rules }
  }

  /// The default rules: loose files under the app asset tree plus the application bundles.
  pub fn defaults(root: impl AsRef<Path>) -> Self {
    let application = Regex::new(APPLICATION_BUNDLE_PATTERN).expect("invalid application regex");
    Self::new(vec![
      loose_app_assets(root),
      PrecompileRule::Pattern(application),
    ])
  }

  /// Build a list of exact-name rules.
  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    names.into_iter().map(PrecompileRule::name).collect()
  }

  /// Append a rule.
  pub fn push(&mut self, rule: PrecompileRule) {
    self.rules.push(rule);
  }

  /// Configured rules in evaluation order.
  pub fn rules(&self) -> &[PrecompileRule] {
    &self.rules
  }

  /// Returns `true` when any rule admits the asset.
  pub fn authorized(&self, logical_path: &str, filename: &Path) -> bool {
    self
      .rules
      .iter()
      .any(|rule| rule.matches(logical_path, filename))
  }
}

impl FromIterator<PrecompileRule> for PrecompileList {
  fn from_iter<T: IntoIterator<Item = PrecompileRule>>(iter: T) -> Self {
    Self::new(iter.into_iter().collect())
  }
}
