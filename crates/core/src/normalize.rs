use url::Url;

/// Strips the fragment and any path-segment parameters, collapses an empty
/// path to "/", and trims exactly one trailing slash (unless the path is
/// already just "/"). Host is lowercased; path case is preserved.
pub fn normalize(url: &Url) -> Url {
    let mut out = url.clone();
    out.set_fragment(None);

    if let Some(host) = out.host_str() {
        let lowered = host.to_ascii_lowercase();
        if lowered != host {
            let _ = out.set_host(Some(&lowered));
        }
    }

    let path = strip_path_params(out.path());
    let normalized_path = if path.is_empty() {
        "/".to_string()
    } else if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    };
    out.set_path(&normalized_path);

    out
}

fn strip_path_params(path: &str) -> &str {
    match path.find(';') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Resolves `href` against `base`, then normalizes. Returns `None` if `href`
/// does not parse as a relative or absolute reference.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    base.join(href).ok().map(|u| normalize(&u))
}

/// hrefs that never denote a fetchable page on this origin.
pub fn is_rejected_href(href: &str) -> bool {
    let trimmed = href.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("javascript:")
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("tel:")
        || trimmed.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn strips_fragment() {
        let n = normalize(&u("https://example.com/page#section"));
        assert_eq!(n.as_str(), "https://example.com/page");
    }

    #[test]
    fn collapses_empty_path() {
        let n = normalize(&u("https://example.com"));
        assert_eq!(n.path(), "/");
    }

    #[test]
    fn strips_trailing_slash() {
        let n = normalize(&u("https://example.com/dir/"));
        assert_eq!(n.path(), "/dir");
    }

    #[test]
    fn keeps_root_slash() {
        let n = normalize(&u("https://example.com/"));
        assert_eq!(n.path(), "/");
    }

    #[test]
    fn lowercases_host_preserves_path_case() {
        let n = normalize(&u("https://Example.COM/Page"));
        assert_eq!(n.host_str(), Some("example.com"));
        assert_eq!(n.path(), "/Page");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize(&u("https://Example.com/Dir/?q=1#frag"));
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_path_params() {
        let n = normalize(&u("https://example.com/page;jsessionid=123"));
        assert_eq!(n.path(), "/page");
    }

    #[test]
    fn absolutize_resolves_relative() {
        let base = u("https://example.com/dir/page.html");
        let resolved = absolutize(&base, "other.html").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/dir/other.html");
    }

    #[test]
    fn absolutize_passes_through_absolute_normalized() {
        let base = u("https://example.com/dir/page.html");
        let href = "https://example.com/elsewhere";
        let resolved = absolutize(&base, href).unwrap();
        assert_eq!(resolved.as_str(), href);
    }

    #[test]
    fn rejects_non_page_schemes() {
        assert!(is_rejected_href("#top"));
        assert!(is_rejected_href("javascript:void(0)"));
        assert!(is_rejected_href("mailto:a@b.com"));
        assert!(is_rejected_href("tel:+1234"));
        assert!(is_rejected_href("data:image/png;base64,abc"));
        assert!(is_rejected_href(""));
        assert!(!is_rejected_href("/page"));
    }
}
