use crate::error::AssetResult;

use super::filters::{check_reference_syntax, is_external_reference};

/// Classification of a reference, computed once when it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Full URI or protocol-relative `//host/...`; returned untouched.
    External,
    /// Root-relative path served as-is apart from host prefixing.
    Absolute,
    /// Logical path resolved through the pipeline.
    Relative,
}

/// A raw reference split into its path and its verbatim query/fragment tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    kind: ReferenceKind,
    base: String,
    query: String,
    fragment: String,
}

impl AssetReference {
    /// Classify `raw` and split off its query string and fragment.
    ///
    /// External references keep the whole input as their base so they can be handed back
    /// byte-identical.
    pub fn parse(raw: &str) -> AssetResult<Self> {
        check_reference_syntax(raw)?;

        if is_external_reference(raw) {
            return Ok(Self {
                kind: ReferenceKind::External,
                base: raw.to_string(),
                query: String::new(),
                fragment: String::new(),
            });
        }

        let (base, query, fragment) = split_tail(raw);
        let kind = if base.starts_with('/') {
            ReferenceKind::Absolute
        } else {
            ReferenceKind::Relative
        };

        Ok(Self {
            kind,
            base: base.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        })
    }

    /// Reference classification.
    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Path portion without query or fragment.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Query string including its leading `?`, or empty.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fragment including its leading `#`, or empty.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Base path with `extension` appended unless it already ends with it.
    ///
    /// `xmlhr` and `xmlhr.js` both become `xmlhr.js`; `jquery.min` becomes `jquery.min.js`
    /// because its own extension is not the one expected for the asset type.
    pub fn with_default_extension(&self, extension: Option<&str>) -> String {
        match extension {
            Some(ext) if self.kind != ReferenceKind::External && !self.base.ends_with(ext) => {
                format!("{}{}", self.base, ext)
            }
            _ => self.base.clone(),
        }
    }

    /// Reattach the original query and fragment, optionally merging an extra query parameter.
    pub fn attach_tail(&self, path: &str, extra_param: Option<&str>) -> String {
        let query = match extra_param {
            Some(param) if self.query.is_empty() => format!("?{param}"),
            Some(param) if self.query == "?" => format!("?{param}"),
            Some(param) => format!("?{param}&{}", &self.query[1..]),
            None => self.query.clone(),
        };
        format!("{path}{query}{}", self.fragment)
    }
}

fn split_tail(raw: &str) -> (&str, &str, &str) {
    let Some(start) = raw.find(['?', '#']) else {
        return (raw, "", "");
    };

    let (base, tail) = raw.split_at(start);
    if tail.starts_with('#') {
        return (base, "", tail);
    }

    match tail.find('#') {
        Some(hash) => (base, &tail[..hash], &tail[hash..]),
        None => (base, tail, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_references() {
        let kind = |raw: &str| AssetReference::parse(raw).unwrap().kind();
        assert_eq!(kind("http://example.com/script"), ReferenceKind::External);
        assert_eq!(kind("//example.com/script.js"), ReferenceKind::External);
        assert_eq!(kind("/elsewhere.js"), ReferenceKind::Absolute);
        assert_eq!(kind("super/xmlhr"), ReferenceKind::Relative);
    }

    #[test]
    fn splits_query_and_fragment() {
        let reference = AssetReference::parse("sub/bar.css?x=1#y").unwrap();
        assert_eq!(reference.base(), "sub/bar.css");
        assert_eq!(reference.query(), "?x=1");
        assert_eq!(reference.fragment(), "#y");

        let reference = AssetReference::parse("xmlhr#hash?not-a-query").unwrap();
        assert_eq!(reference.base(), "xmlhr");
        assert_eq!(reference.query(), "");
        assert_eq!(reference.fragment(), "#hash?not-a-query");
    }

    #[test]
    fn external_references_are_not_split() {
        let reference = AssetReference::parse("http://example.com/a.js?v=1#top").unwrap();
        assert_eq!(reference.base(), "http://example.com/a.js?v=1#top");
        assert_eq!(reference.with_default_extension(Some(".js")), reference.base());
    }

    #[test]
    fn infers_extension_once() {
        let bare = AssetReference::parse("xmlhr").unwrap();
        let explicit = AssetReference::parse("xmlhr.js").unwrap();
        assert_eq!(bare.with_default_extension(Some(".js")), "xmlhr.js");
        assert_eq!(explicit.with_default_extension(Some(".js")), "xmlhr.js");

        let dotted = AssetReference::parse("jquery.min").unwrap();
        assert_eq!(dotted.with_default_extension(Some(".js")), "jquery.min.js");
        assert_eq!(dotted.with_default_extension(None), "jquery.min");
    }

    #[test]
    fn reattaches_tail_with_extra_parameter() {
        let reference = AssetReference::parse("foo?x=1#top").unwrap();
        assert_eq!(reference.attach_tail("/assets/foo.js", None), "/assets/foo.js?x=1#top");
        assert_eq!(
            reference.attach_tail("/assets/foo.js", Some("body=1")),
            "/assets/foo.js?body=1&x=1#top"
        );

        let plain = AssetReference::parse("foo").unwrap();
        assert_eq!(plain.attach_tail("/assets/foo.js", Some("body=1")), "/assets/foo.js?body=1");
    }
}
