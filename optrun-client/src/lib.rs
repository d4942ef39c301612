//! Optrun HTTP Client
//!
//! A thin client for the experiment-tracking service. Responses are returned
//! as loosely-typed [`ApiResponse`] values (status code + JSON-or-text body);
//! callers decide how to interpret non-success statuses and body shapes.
//!
//! Request credentials come from an injected [`TokenSource`], normally the
//! refreshing authorizer from `optrun-auth`.

pub mod error;
mod experiments;

pub use error::{ClientError, Result};
pub use experiments::ExperimentApi;

use std::sync::Arc;

use optrun_auth::TokenSource;
use optrun_core::ApiResponse;
use reqwest::Client;
use serde_json::Value;

/// HTTP client for the experiment-tracking service
pub struct ApiClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Produces bearer tokens for each request
    token_source: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Creates a new client for the service at `base_url`
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            token_source,
        }
    }

    /// The base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get(&self, path: &str) -> Result<ApiResponse> {
        let bearer = self.token_source.bearer_token().await?;
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(bearer)
            .send()
            .await?;

        Self::into_api_response(response).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let bearer = self.token_source.bearer_token().await?;
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await?;

        Self::into_api_response(response).await
    }

    /// Converts an HTTP response into the loose response model
    ///
    /// Only transport failures are errors here; any status code and any body
    /// shape are passed through to the caller.
    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status_code = response.status().as_u16();
        let text = response.text().await?;
        Ok(ApiResponse::from_payload(status_code, text))
    }
}
