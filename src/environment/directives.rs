//! Directive and link extraction for source files served by [`super::DirectoryEnvironment`].

use std::sync::OnceLock;

use regex::Regex;

use crate::asset_paths::{AssetReference, ReferenceKind};
use crate::error::AssetResult;

fn directive_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"^\s*(?://|/?\*|#)=\s*(require|link)\s+['"]?([^'"\s]+)['"]?\s*(?:\*/)?\s*$"#)
      .expect("invalid directive regex")
  })
}

fn css_url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#).expect("invalid css url regex")
  })
}

/// Directives and runtime references collected from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
  /// `require` arguments in declaration order.
  pub requires: Vec<String>,
  /// `link` arguments in declaration order.
  pub links: Vec<String>,
  /// Relative CSS `url(...)` targets, without query or fragment.
  pub url_references: Vec<String>,
  /// Source with directive lines removed.
  pub body: String,
}

/// Parse the comment header of a source file.
///
/// Directives are only honoured in the leading block of blank and comment lines
/// (`//= require foo`, ` *= require foo`, `#= link logo.png`); the first line of real code ends
/// the header. Stylesheets additionally report every relative `url(...)` target.
pub fn parse_directives(source: &str, is_stylesheet: bool) -> Directives {
  let mut directives = Directives::default();
  let mut in_header = true;

  for line in source.lines() {
    if in_header {
      if let Some(captures) = directive_pattern().captures(line) {
        let argument = captures[2].to_string();
        match &captures[1] {
          "require" => directives.requires.push(argument),
          _ => directives.links.push(argument),
        }
        continue;
      }
      in_header = is_header_line(line);
    }

    directives.body.push_str(line);
    directives.body.push('\n');
  }

  if is_stylesheet {
    for captures in css_url_pattern().captures_iter(&directives.body) {
      let Ok(reference) = AssetReference::parse(&captures[1]) else {
        continue;
      };
      if reference.kind() == ReferenceKind::Relative
        && !directives
          .url_references
          .iter()
          .any(|existing| existing == reference.base())
      {
        directives.url_references.push(reference.base().to_string());
      }
    }
  }

  directives
}

/// Replace relative `url(...)` targets of a stylesheet body.
///
/// `resolve` returns the replacement for a target, or `None` to keep it as written. Quotes
/// around the target are preserved.
pub(super) fn rewrite_url_references<F>(body: &str, mut resolve: F) -> AssetResult<String>
where
  F: FnMut(&AssetReference) -> AssetResult<Option<String>>,
{
  let mut rewritten = String::with_capacity(body.len());
  let mut copied = 0;
  for captures in css_url_pattern().captures_iter(body) {
    let Some(target) = captures.get(1) else {
      continue;
    };
    let Ok(reference) = AssetReference::parse(target.as_str()) else {
      continue;
    };
    if reference.kind() != ReferenceKind::Relative {
      continue;
    }
    if let Some(url) = resolve(&reference)? {
      rewritten.push_str(&body[copied..target.start()]);
      rewritten.push_str(&url);
      copied = target.end();
    }
  }
  rewritten.push_str(&body[copied..]);
  Ok(rewritten)
}

fn is_header_line(line: &str) -> bool {
  let trimmed = line.trim();
  trimmed.is_empty()
    || trimmed.starts_with("//")
    || trimmed.starts_with("/*")
    || trimmed.starts_with('*')
    || trimmed.starts_with('#')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collects_requires_from_line_comments() {
    let parsed = parse_directives("//= require foo\n//= require 'sub/bar.js'\nvar app;\n", false);
    assert_eq!(parsed.requires, vec!["foo", "sub/bar.js"]);
    assert_eq!(parsed.body, "var app;\n");
  }

  #[test]
  fn collects_requires_from_block_comments() {
    let source = "/*\n *= require dependency\n *= link logo.png\n */\nbody { color: red; }\n";
    let parsed = parse_directives(source, true);
    assert_eq!(parsed.requires, vec!["dependency"]);
    assert_eq!(parsed.links, vec!["logo.png"]);
    assert_eq!(parsed.body, "/*\n */\nbody { color: red; }\n");
  }

  #[test]
  fn ignores_directives_after_code() {
    let parsed = parse_directives("var a;\n//= require late\n", false);
    assert!(parsed.requires.is_empty());
    assert_eq!(parsed.body, "var a;\n//= require late\n");
  }

  #[test]
  fn stylesheets_link_relative_urls_only() {
    let source = "p { background: url(logo.png); }\n\
                  a { background: url('http://example.com/x.png'); }\n\
                  b { background: url(\"/public/y.png\"); }\n\
                  i { background: url(icons/z.svg?v=2#frag); }\n";
    let parsed = parse_directives(source, true);
    assert_eq!(parsed.url_references, vec!["logo.png", "icons/z.svg"]);
    assert!(parsed.links.is_empty());
  }

  #[test]
  fn rewrites_relative_url_targets() {
    let body = "p { background: url(logo.png); }\n\
                a { background: url('http://example.com/x.png'); }\n\
                i { background: url(\"icons/z.svg?v=2#frag\"); }\n\
                b { background: url(missing.png); }\n";
    let rewritten = rewrite_url_references(body, |reference| {
      Ok(match reference.base() {
        "logo.png" => Some("/assets/logo.png".to_string()),
        "icons/z.svg" => Some(reference.attach_tail("/assets/icons/z.svg", None)),
        _ => None,
      })
    })
    .unwrap();
    assert_eq!(
      rewritten,
      "p { background: url(/assets/logo.png); }\n\
       a { background: url('http://example.com/x.png'); }\n\
       i { background: url(\"/assets/icons/z.svg?v=2#frag\"); }\n\
       b { background: url(missing.png); }\n"
    );
  }

  #[test]
  fn scripts_do_not_scan_urls() {
    let parsed = parse_directives("var u = 'url(logo.png)';\n", false);
    assert!(parsed.url_references.is_empty());
  }
}
