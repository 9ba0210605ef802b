//! Header helpers for API requests.

/// Add the bearer credential and the no-cache headers every API call carries.
pub fn add_request_headers(
    request: reqwest::RequestBuilder,
    api_key: &str,
) -> reqwest::RequestBuilder {
    request
        .header("Authorization", format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache, no-store, must-revalidate")
        .header("Pragma", "no-cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_bearer_and_cache_headers() {
        let client = reqwest::Client::new();
        let request = add_request_headers(client.post("https://example.com"), "xai-test")
            .build()
            .expect("request should build");

        let headers = request.headers();
        assert_eq!(headers["authorization"], "Bearer xai-test");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(
            headers["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(headers["pragma"], "no-cache");
    }
}
