use regex::Regex;

use crate::error::{AssetError, AssetResult};

fn external_reference_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^[-a-z]+://").expect("invalid scheme regex"),
                Regex::new(r"(?i)^(?:cid|data):").expect("invalid inline URI regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
            ]
        })
        .as_slice()
}

fn malformed_reference_patterns() -> &'static [(Regex, &'static str)] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                (
                    Regex::new(r"^:/").expect("invalid missing scheme regex"),
                    "missing scheme before ':/'",
                ),
                (
                    Regex::new(r"^///").expect("invalid empty host regex"),
                    "protocol-relative reference has no host",
                ),
                (
                    Regex::new(r"(?i)^[a-z][-a-z0-9+.]*:/(?:[^/]|$)")
                        .expect("invalid single slash scheme regex"),
                    "scheme must be followed by '//'",
                ),
                (
                    Regex::new(r"(?i)^[-a-z]+://(?:[/?#]|$)").expect("invalid empty authority regex"),
                    "scheme is not followed by a host",
                ),
            ]
        })
        .as_slice()
}

/// Determine whether a reference points outside the asset pipeline.
///
/// Full URIs, inline `data:`/`cid:` URIs and protocol-relative `//host/...` references are
/// returned to the caller untouched, so they never take part in extension inference, digesting
/// or host prefixing.
pub fn is_external_reference(value: &str) -> bool {
    external_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

/// Reject references whose scheme or authority cannot be classified unambiguously.
pub fn check_reference_syntax(value: &str) -> AssetResult<()> {
    if value.trim().is_empty() {
        return Err(AssetError::InvalidReference {
            reference: value.to_string(),
            reason: "reference is empty",
        });
    }

    for (pattern, reason) in malformed_reference_patterns() {
        if pattern.is_match(value) {
            return Err(AssetError::InvalidReference {
                reference: value.to_string(),
                reason: *reason,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scheme_urls() {
        assert!(is_external_reference("http://example.com/script"));
        assert!(is_external_reference("HTTPS://example.com/style.css"));
        assert!(is_external_reference("chrome-extension://abc/app.js"));
    }

    #[test]
    fn detects_protocol_relative_and_inline_uris() {
        assert!(is_external_reference("//example.com/script.js"));
        assert!(is_external_reference("data:image/png;base64,abc"));
        assert!(is_external_reference("cid:logo"));
    }

    #[test]
    fn keeps_pipeline_paths() {
        assert!(!is_external_reference("xmlhr.js"));
        assert!(!is_external_reference("/super/xmlhr"));
        assert!(!is_external_reference("sub/bar.css?x=1#y"));
    }

    #[test]
    fn rejects_empty_references() {
        let err = check_reference_syntax("  ").unwrap_err();
        assert!(matches!(err, AssetError::InvalidReference { reason: "reference is empty", .. }));
    }

    #[test]
    fn rejects_ambiguous_schemes() {
        assert!(check_reference_syntax("://example.com/app.js").is_err());
        assert!(check_reference_syntax("http:/example.com/app.js").is_err());
        assert!(check_reference_syntax("///app.js").is_err());
        assert!(check_reference_syntax("http://").is_err());
    }

    #[test]
    fn accepts_well_formed_references() {
        assert!(check_reference_syntax("http://example.com/app.js").is_ok());
        assert!(check_reference_syntax("//example.com/app.js").is_ok());
        assert!(check_reference_syntax("/elsewhere.js").is_ok());
        assert!(check_reference_syntax("foo.js?x=1").is_ok());
    }
}
