use url::Url;

/// Checks if a host matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "cdn.example.com" matches only "cdn.example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "img.example.com" (single subdomain)
///    - "a.b.example.com" (nested subdomains)
///
/// Both sides are expected in lowercase.
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.com", "img.example.com"));
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(!matches_wildcard("*.example.com", "notexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if the URL's host is on the asset-host allow-list
///
/// An empty allow-list accepts every host.
pub fn is_allowed_asset(url: &Url, allow_list: &[String]) -> bool {
    if allow_list.is_empty() {
        return true;
    }

    let Some(host) = url.host_str().map(str::to_lowercase) else {
        return false;
    };

    allow_list
        .iter()
        .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &host))
}
