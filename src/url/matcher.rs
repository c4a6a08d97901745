/// Checks if a host matches an allow-list pattern
///
/// Supported patterns:
/// 1. Exact match: "github.com" matches only "github.com"
/// 2. Wildcard match: "*.github.com" matches "github.com" and any subdomain
///
/// Comparison is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use doc_harvest::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("github.com", "GitHub.com"));
/// assert!(!matches_host_pattern("github.com", "gist.github.com"));
///
/// assert!(matches_host_pattern("*.github.com", "github.com"));
/// assert!(matches_host_pattern("*.github.com", "raw.github.com"));
/// assert!(!matches_host_pattern("*.github.com", "notgithub.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        host == pattern
    }
}
