//! HTTP API client with bearer-token authentication.
//!
//! Screens use it through [`ApiClient::call`]; the realtime transport uses
//! [`ApiClient::post_form`] for the private-channel authorization handshake.

use lexdesk_shared::ApiError;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// `{endpoint, method, data?, params?, headers?}` as accepted by [`ApiClient::call`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    pub endpoint: String,
    pub method: String,
    pub data: Option<Value>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: "GET".to_string(),
            ..Self::default()
        }
    }

    pub fn post(endpoint: impl Into<String>, data: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: "POST".to_string(),
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// HTTP client for the case-management API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: String::new(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    /// Set the base URL for API requests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {}", token))
    }

    /// Add a header to every request, replacing one with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let base = self.base_url.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.headers
            .iter()
            .fold(self.client.request(method, self.url(path)), |rb, (name, value)| {
                rb.header(name.as_str(), value.as_str())
            })
    }

    async fn send<TRes: DeserializeOwned>(rb: RequestBuilder) -> Result<TRes, ApiError> {
        let resp = rb.send().await.map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let is_success = resp.status().is_success();

        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !is_success {
            return Err(ApiError::Http { status, body: text });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        Self::send(self.request(Method::GET, path)).await
    }

    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    pub async fn post_form<TRes: DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<TRes, ApiError> {
        Self::send(self.request(Method::POST, path).form(fields)).await
    }

    /// Generic call returning the decoded JSON envelope.
    pub async fn call(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| ApiError::Network(format!("invalid method {}: {e}", request.method)))?;

        let mut rb = self.request(method, &request.endpoint);
        if !request.params.is_empty() {
            rb = rb.query(&request.params);
        }
        for (name, value) in &request.headers {
            rb = rb.header(name.as_str(), value.as_str());
        }
        if let Some(data) = &request.data {
            rb = rb.json(data);
        }

        Self::send(rb).await
    }
}
