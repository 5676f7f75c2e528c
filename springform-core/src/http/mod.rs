//! HTTP client abstraction for the two upstream APIs.
//!
//! All outgoing requests go through the [`HttpClient`] trait so fetch logic
//! is testable against [`MockClient`] without network access.

mod client;

pub use client::{ApiClient, ApiClientBuilder, HttpClient, MockClient, MockResponse};

/// Render a path plus query pairs into the request key used by both the
/// real client and the mock.
pub(crate) fn render_request(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let qs = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{qs}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request_no_query() {
        assert_eq!(render_request("/categories", &[]), "/categories");
    }

    #[test]
    fn test_render_request_with_query() {
        let key = render_request(
            "/recipes",
            &[("page", "2".to_string()), ("pageSize", "100".to_string())],
        );
        assert_eq!(key, "/recipes?page=2&pageSize=100");
    }
}
