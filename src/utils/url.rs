//! Endpoint URL helpers.
//!
//! Base URLs come from user configuration and may carry trailing slashes;
//! these helpers keep endpoint construction free of double slashes.

/// Endpoint path for chat completions, relative to the base URL.
pub const CHAT_COMPLETIONS_ENDPOINT: &str = "chat/completions";

/// Strip trailing slashes from a base URL.
///
/// # Examples
///
/// ```
/// use causerie::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.x.ai/v1"), "https://api.x.ai/v1");
/// assert_eq!(normalize_base_url("https://api.x.ai/v1//"), "https://api.x.ai/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use causerie::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.x.ai/v1/", "/chat/completions"),
///     "https://api.x.ai/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Check that a user-supplied base URL is an absolute http(s) URL.
///
/// Returns the normalized form on success.
pub fn validate_base_url(candidate: &str) -> Result<String, String> {
    let normalized = normalize_base_url(candidate);
    let rest = normalized
        .strip_prefix("https://")
        .or_else(|| normalized.strip_prefix("http://"))
        .ok_or_else(|| format!("'{}' must start with http:// or https://", candidate.trim()))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("'{}' has no host", candidate.trim()));
    }
    Ok(normalized)
}
