//! HTTP client trait and implementations.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;

use super::render_request;

/// Trait for JSON API clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a JSON document from `path` (relative to the client's base URL).
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError>;
}

/// Configuration for [`ApiClient`].
#[derive(Clone)]
pub struct ApiClientBuilder {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    user_agent: String,
}

impl ApiClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(30),
            user_agent: "Springform/0.3 (+https://springform.app)".to_string(),
        }
    }

    /// Set the bearer token sent with every request.
    pub fn bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn build(self) -> Result<ApiClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(ApiClient {
            inner,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            bearer_token: self.bearer_token,
        })
    }
}

/// Production client: base URL and auth token are constructor parameters,
/// never globals.
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        ApiClientBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }
}

#[async_trait]
impl HttpClient for ApiClient {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let parsed =
            reqwest::Url::parse(&url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let mut request = self.inner.get(parsed);
        for (k, v) in query {
            request = request.query(&[(k, v)]);
        }
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(path, "fetching");
        let response = request.send().await?.error_for_status()?;
        let value = response.json::<Value>().await?;
        Ok(value)
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Json(Value),
    Error(String),
}

/// Mock API client for testing, keyed by rendered path + query string.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a request key, e.g. `/recipes?page=1&pageSize=100`.
    pub fn with_response(mut self, key: &str, response: MockResponse) -> Self {
        self.responses.insert(key.to_string(), response);
        self
    }

    pub fn with_json(self, key: &str, json: Value) -> Self {
        self.with_response(key, MockResponse::Json(json))
    }

    pub fn with_error(self, key: &str, error: &str) -> Self {
        self.with_response(key, MockResponse::Error(error.to_string()))
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let key = render_request(path, query);
        match self.responses.get(&key) {
            Some(MockResponse::Json(v)) => Ok(v.clone()),
            Some(MockResponse::Error(e)) => Err(FetchError::Upstream(e.clone())),
            None => Err(FetchError::InvalidUrl(format!(
                "No mock response for request: {key}"
            ))),
        }
    }
}
