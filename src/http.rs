//! Thin authenticated-request wrapper around a shared `reqwest::Client`.
//!
//! Every component issues its calls through a [`Gateway`], which owns the
//! base URL, the optional TLS relaxation for self-signed platform
//! certificates, and the response-body debug logging toggle.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{HttpFailure, MigrateError, Result};

pub struct Gateway {
    client: reqwest::Client,
    base: String,
    log_response: bool,
}

impl Gateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.http.insecure_skip_verify)
            .build()
            .map_err(|e| MigrateError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: config.hostname().to_string(),
            log_response: config.log.response,
        })
    }

    /// Absolute URL for a platform path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Start a request against a platform path. Auth and body are added by
    /// the caller.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Check the response status and decode a JSON body, logging the raw
    /// body first when response logging is enabled.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> std::result::Result<T, HttpFailure> {
        let response = check_status(response).await?;
        let body = response.text().await?;
        if self.log_response {
            tracing::debug!("{body}");
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Check the response status and return the raw body bytes. Binary
    /// payloads are logged by size only.
    pub async fn read_bytes(
        &self,
        response: Response,
    ) -> std::result::Result<Vec<u8>, HttpFailure> {
        let response = check_status(response).await?;
        let body = response.bytes().await?.to_vec();
        if self.log_response {
            tracing::debug!("response body: {} byte(s)", body.len());
        }
        Ok(body)
    }
}

/// Turn a non-success response into a failure carrying the status and the
/// response body, which is where the platform puts its diagnostics.
async fn check_status(response: Response) -> std::result::Result<Response, HttpFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HttpFailure::Status { status, body })
}
