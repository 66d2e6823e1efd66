//! Errors raised while resolving a logical asset into a URL.

use thiserror::Error;

/// Result alias used by every resolution operation.
pub type AssetResult<T> = Result<T, AssetError>;

/// Failure kinds surfaced to the rendering layer.
///
/// None of these are recovered internally: a single asset resolution either produces a URL or
/// returns one of these to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
  /// The logical path is known to neither the manifest nor the compilation environment.
  #[error("asset '{path}' was not found")]
  NotFound {
    /// Logical path that failed to resolve.
    path: String,
  },

  /// The asset exists but is excluded from the servable set by the precompile rules.
  #[error("asset '{path}' is not present in the precompile list")]
  NotPrecompiled {
    /// Logical path that failed authorization.
    path: String,
  },

  /// The compilation environment failed to build the asset.
  #[error("failed to compile '{path}': {message}")]
  CompilationFailed {
    /// Logical path being compiled when the failure occurred.
    path: String,
    /// Message reported by the environment.
    message: String,
  },

  /// The reference could not be classified unambiguously.
  #[error("invalid asset reference '{reference}': {reason}")]
  InvalidReference {
    /// Raw reference as supplied by the caller.
    reference: String,
    /// Why the reference was rejected.
    reason: &'static str,
  },
}

impl AssetError {
  pub(crate) fn not_found(path: impl Into<String>) -> Self {
    Self::NotFound { path: path.into() }
  }

  pub(crate) fn not_precompiled(path: impl Into<String>) -> Self {
    Self::NotPrecompiled { path: path.into() }
  }

  pub(crate) fn compilation(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self::CompilationFailed {
      path: path.into(),
      message: message.into(),
    }
  }

  /// Logical path or raw reference the error is about.
  pub fn path(&self) -> &str {
    match self {
      Self::NotFound { path }
      | Self::NotPrecompiled { path }
      | Self::CompilationFailed { path, .. } => path,
      Self::InvalidReference { reference, .. } => reference,
    }
  }
}
