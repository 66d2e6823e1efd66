/// Join a URL prefix and an asset path into a root-relative URL path.
///
/// The generated path always uses forward slashes and exactly one separator between the two
/// halves, regardless of how the prefix was configured (`"/assets"`, `"assets/"`, `""`, `"/"`).
pub fn join_url_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    let path = path.replace('\\', "/");
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');

    if prefix.is_empty() {
        format!("/{path}")
    } else {
        format!("/{prefix}/{path}")
    }
}

/// Insert a digest between a logical path's stem and its extension.
///
/// `foo.js` with digest `abc` becomes `foo-abc.js`; only the final extension is kept after the
/// digest, so `jquery.min.js` becomes `jquery.min-abc.js`.
pub fn digest_file_name(logical_path: &str, digest: &str) -> String {
    let file_start = logical_path.rfind('/').map_or(0, |index| index + 1);
    match logical_path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let split = file_start + dot;
            format!(
                "{}-{}{}",
                &logical_path[..split],
                digest,
                &logical_path[split..]
            )
        }
        _ => format!("{logical_path}-{digest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_prefix_and_path() {
        assert_eq!(join_url_path("/assets", "foo.js"), "/assets/foo.js");
        assert_eq!(join_url_path("/assets/", "/foo.js"), "/assets/foo.js");
        assert_eq!(join_url_path("assets", "sub/bar.css"), "/assets/sub/bar.css");
    }

    #[test]
    fn empty_prefix_yields_root_relative_path() {
        assert_eq!(join_url_path("", "foo.js"), "/foo.js");
        assert_eq!(join_url_path("/", "foo.js"), "/foo.js");
    }

    #[test]
    fn normalises_backslashes_from_windows_inputs() {
        assert_eq!(join_url_path("\\assets", "sub\\foo.js"), "/assets/sub/foo.js");
    }

    #[test]
    fn digests_before_final_extension() {
        assert_eq!(digest_file_name("foo.js", "abc"), "foo-abc.js");
        assert_eq!(digest_file_name("jquery.min.js", "abc"), "jquery.min-abc.js");
        assert_eq!(digest_file_name("sub.dir/logo", "abc"), "sub.dir/logo-abc");
        assert_eq!(digest_file_name(".hidden", "abc"), ".hidden-abc");
    }
}
