//! Small helpers for target and URL handling.

/// Successively shorter registry suffixes of a domain, longest first.
///
/// `"shop.example.co.uk"` yields `["example.co.uk", "co.uk", "uk"]`; routing
/// tries them in order so multi-label registries win over their parent TLD.
pub fn suffix_chain(domain: &str) -> Vec<&str> {
    let mut chain = Vec::new();
    let mut rest = domain;
    while let Some((_, tail)) = rest.split_once('.') {
        if !tail.is_empty() {
            chain.push(tail);
        }
        rest = tail;
    }
    chain
}

/// The last label of a domain, i.e. its top-level domain.
pub fn last_label(domain: &str) -> &str {
    domain.rsplit('.').next().unwrap_or(domain)
}

/// Extract the host portion of an http(s) URL, without port or path.
///
/// Enough for forward-DNS liveness checks; not a general URL parser.
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.split('@').next_back()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_chain_order() {
        assert_eq!(
            suffix_chain("shop.example.co.uk"),
            vec!["example.co.uk", "co.uk", "uk"]
        );
        assert_eq!(suffix_chain("example.com"), vec!["com"]);
        assert!(suffix_chain("localhost").is_empty());
    }

    #[test]
    fn test_last_label() {
        assert_eq!(last_label("example.co.uk"), "uk");
        assert_eq!(last_label("com"), "com");
    }

    #[test]
    fn test_url_host() {
        assert_eq!(
            url_host("https://rdap.verisign.com/com/v1"),
            Some("rdap.verisign.com")
        );
        assert_eq!(url_host("https://example.net:8443/x?q=1"), Some("example.net"));
        assert_eq!(url_host("ftp://example.net"), None);
        assert_eq!(url_host("https:///nope"), None);
    }
}
