//! Expansion of a bundle into its individually served sources.

use crate::environment::{AssetEnvironment, dependency_closure};
use crate::error::AssetResult;

/// Query parameter marking a request for one raw source file rather than the bundle.
pub const DEBUG_BODY_PARAM: &str = "body=1";

/// Fans a bundle out to its dependency closure for debug rendering.
pub struct DebugExpander<'a> {
  environment: &'a dyn AssetEnvironment,
}

impl<'a> DebugExpander<'a> {
  /// Expander over a live environment.
  pub fn new(environment: &'a dyn AssetEnvironment) -> Self {
    Self { environment }
  }

  /// Logical paths making up `logical_path`, dependencies first and the bundle itself last.
  ///
  /// An asset without dependencies expands to just itself. Links are not followed.
  pub fn expand(&self, logical_path: &str) -> AssetResult<Vec<String>> {
    Ok(
      dependency_closure(self.environment, logical_path)?
        .into_iter()
        .map(|asset| asset.logical_path)
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::environment::{MemoryAsset, MemoryEnvironment};
  use crate::error::AssetError;

  fn environment() -> MemoryEnvironment {
    MemoryEnvironment::new()
      .with(MemoryAsset::new("foo.js", "var foo;"))
      .with(MemoryAsset::new("bar.js", "var bar;").requires(["foo.js"]).links(["logo.png"]))
      .with(MemoryAsset::new("logo.png", "png"))
  }

  #[test]
  fn expands_dependencies_before_bundle() {
    let env = environment();
    let expander = DebugExpander::new(&env);
    assert_eq!(expander.expand("bar.js").unwrap(), vec!["foo.js", "bar.js"]);
  }

  #[test]
  fn leaf_assets_expand_to_themselves() {
    let env = environment();
    assert_eq!(DebugExpander::new(&env).expand("foo.js").unwrap(), vec!["foo.js"]);
  }

  #[test]
  fn unknown_bundles_are_not_found() {
    let env = environment();
    assert_eq!(
      DebugExpander::new(&env).expand("nope.js"),
      Err(AssetError::NotFound {
        path: "nope.js".into()
      })
    );
  }
}
