// Admin API HTTP client.
// Attaches the bearer token at request time and converts HTTP failures into errors.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::TokenSource;
use crate::config::Config;
use crate::error::{AdminError, Result};

/// Query parameters as owned key/value pairs.
pub type Query = Vec<(String, String)>;

/// JSON request seam over the admin API.
///
/// The loader and the auth flows only depend on this trait, so they can be
/// exercised without a live server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value>;
}

/// Admin API client with request-time bearer authentication.
pub struct AdminClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl AdminClient {
    /// Create a new client. The token source is consulted on every request.
    pub fn new(config: &Config, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("sanchara-admin"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(AdminError::Network)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and decode the body as JSON.
    pub async fn get(&self, endpoint: &str, query: &[(String, String)]) -> Result<Value> {
        let request = self.client.get(self.url(endpoint)).query(query);
        let response = self.authorize(request)?.send().await?;
        self.read_json(response).await
    }

    /// Make a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
        let request = self.client.post(self.url(endpoint)).json(body);
        let response = self.authorize(request)?.send().await?;
        self.read_json(response).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Attach the current bearer token, if any.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.tokens.token() {
            Some(token) => Ok(request.header(AUTHORIZATION, bearer(&token)?)),
            None => Ok(request),
        }
    }

    /// Check response status and decode the body.
    ///
    /// A success response whose body is not JSON decodes to `Value::Null`
    /// so normalization can turn it into an empty result.
    async fn read_json(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            info!(%url, %status, "request failed");
            return Err(AdminError::from_status(status, &body));
        }

        debug!(%url, %status, bytes = body.len(), "request succeeded");
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!(%url, error = %e, "response body is not JSON");
            Value::Null
        }))
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| AdminError::Other(e.to_string()))
}

#[async_trait]
impl Transport for AdminClient {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        self.get(path, query).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.post(path, body).await
    }
}
