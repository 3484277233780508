// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for tubd

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tub_core::TubConfig;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no API token configured")]
    MissingToken,

    #[error("could not reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("request rejected with HTTP {status}: {}", Self::error_message(.body))]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The `error` field of a JSON error body, else the body itself
    pub fn error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string())
    }
}

/// Raw HTTP outcome
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One authenticated request; ureq is blocking, so it runs off the runtime.
pub async fn send(
    method: &str,
    url: &str,
    authorization: &str,
    body: Option<String>,
    timeout: Duration,
) -> Result<HttpResponse, ClientError> {
    let method = method.to_ascii_uppercase();
    let owned_url = url.to_string();
    let authorization = authorization.to_string();

    let outcome = tokio::task::spawn_blocking(move || -> Result<HttpResponse, ureq::Error> {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .http_status_as_error(false)
                .build(),
        );
        let mut response = if method == "GET" {
            agent
                .get(&owned_url)
                .header("Authorization", &authorization)
                .call()?
        } else {
            let request = agent
                .post(&owned_url)
                .header("Authorization", &authorization);
            match body {
                Some(body) => request
                    .header("Content-Type", "application/json")
                    .send(body)?,
                None => request.send_empty()?,
            }
        };
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse { status, body })
    })
    .await;

    match outcome {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(ClientError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        }),
        Err(e) => Err(ClientError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Authenticated JSON client for the heat-to-target API
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout,
        }
    }

    pub fn from_config(config: &TubConfig) -> Result<Self, ClientError> {
        let token = config
            .require_token()
            .map_err(|_| ClientError::MissingToken)?;
        Ok(Self::new(&config.base_url, token, config.runner.timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request("GET", path, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        self.request("POST", path, body).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");
        let response = send(
            method,
            &url,
            &format!("Bearer {}", self.token),
            body.map(|b| b.to_string()),
            self.timeout,
        )
        .await?;
        decode(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ClientError> {
    if !response.is_success() {
        return Err(ClientError::Rejected {
            status: response.status,
            body: response.body,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
