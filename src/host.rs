//! URL prefix computation for asset hosts.

use std::fmt;
use std::sync::Arc;

/// Protocol and host of the request being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
  /// Request scheme, with or without the trailing `://` (`"https"`, `"https://"`).
  pub protocol: String,
  /// Request host, including any port.
  pub host: String,
}

impl RequestContext {
  /// Context for a request.
  pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
    Self {
      protocol: protocol.into(),
      host: host.into(),
    }
  }

  /// `<protocol>://<host>`.
  pub fn base_url(&self) -> String {
    let scheme = self.protocol.trim_end_matches("://").trim_end_matches(':');
    format!("{scheme}://{}", self.host)
  }
}

/// Callable host computed from the current request.
pub type HostCallable = Arc<dyn Fn(Option<&RequestContext>) -> Option<String> + Send + Sync>;

/// Configured asset host.
#[derive(Clone, Default)]
pub enum AssetHost {
  /// URLs stay root-relative.
  #[default]
  None,
  /// A fixed host name or URL.
  Fixed(String),
  /// A host derived from the request; its output is used verbatim.
  Dynamic(HostCallable),
}

impl AssetHost {
  /// Host from optional configuration text; blank values mean no host.
  pub fn from_config(value: Option<&str>) -> Self {
    match value.map(str::trim) {
      Some(host) if !host.is_empty() => Self::Fixed(host.to_string()),
      _ => Self::None,
    }
  }

  /// Request-dependent host.
  pub fn dynamic<F>(host: F) -> Self
  where
    F: Fn(Option<&RequestContext>) -> Option<String> + Send + Sync + 'static,
  {
    Self::Dynamic(Arc::new(host))
  }

  /// Host mirroring the request's own protocol and host; empty without a request.
  pub fn request() -> Self {
    Self::dynamic(|request| request.map(RequestContext::base_url))
  }

  /// Returns `true` for request-dependent hosts.
  pub fn is_dynamic(&self) -> bool {
    matches!(self, Self::Dynamic(_))
  }

  /// The configured text of a fixed host.
  pub fn static_value(&self) -> Option<&str> {
    match self {
      Self::Fixed(host) => Some(host),
      Self::None | Self::Dynamic(_) => None,
    }
  }

  /// Prefix prepended to absolute and pipeline URLs.
  ///
  /// Fixed hosts without a scheme become protocol-relative (`//host`); fixed hosts that already
  /// carry a scheme, and everything a dynamic host returns, are used as-is.
  pub fn prefix(&self, request: Option<&RequestContext>) -> String {
    match self {
      Self::None => String::new(),
      Self::Fixed(host) => {
        let host = host.trim_end_matches('/');
        if host.contains("://") || host.starts_with("//") {
          host.to_string()
        } else {
          format!("//{host}")
        }
      }
      Self::Dynamic(host) => host(request)
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_default(),
    }
  }
}

impl fmt::Debug for AssetHost {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::None => f.write_str("None"),
      Self::Fixed(host) => f.debug_tuple("Fixed").field(host).finish(),
      Self::Dynamic(_) => f.write_str("Dynamic(..)"),
    }
  }
}
