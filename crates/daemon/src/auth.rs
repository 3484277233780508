// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token checks
//!
//! Only SHA-256 digests of the configured credentials are kept in memory;
//! presented tokens are hashed and compared digest to digest.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

use crate::routes::ApiError;

/// Header the ESP32 firmware sends its key in
pub const ESP32_KEY_HEADER: &str = "x-esp32-api-key";

/// Generic alias for [`ESP32_KEY_HEADER`]
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenDigest([u8; 32]);

impl TokenDigest {
    pub fn of(token: &str) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(token.trim().as_bytes()));
        Self(digest)
    }

    pub fn matches(&self, presented: &str) -> bool {
        Self::of(presented) == *self
    }
}

impl std::fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenDigest(..)")
    }
}

/// Token from `Authorization: Bearer <token>`, else from `X-ESP32-API-Key`
/// or `X-API-Key`
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    };
    header(AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_else(|| header(ESP32_KEY_HEADER))
        .or_else(|| header(API_KEY_HEADER))
}

/// Route layer rejecting requests whose token does not match `expected`
pub async fn require_token(
    State(expected): State<TokenDigest>,
    request: Request,
    next: Next,
) -> Response {
    match presented_token(request.headers()) {
        Some(token) if expected.matches(token) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "rejected invalid credential");
            ApiError::Unauthorized.into_response()
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "rejected request without credential");
            ApiError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn digest_matches_only_the_same_token() {
        let digest = TokenDigest::of("svc-token");
        assert!(digest.matches("svc-token"));
        assert!(!digest.matches("svc-token2"));
        assert!(!digest.matches(""));
    }

    #[test]
    fn debug_hides_digest() {
        assert_eq!(format!("{:?}", TokenDigest::of("secret")), "TokenDigest(..)");
    }

    #[test]
    fn bearer_header_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_token(&headers), Some("abc"));
    }

    #[test]
    fn api_key_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_token(&headers), Some("xyz"));
    }

    #[test]
    fn firmware_key_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(ESP32_KEY_HEADER, HeaderValue::from_static("esp-key"));
        assert_eq!(presented_token(&headers), Some("esp-key"));
    }

    #[test]
    fn blank_bearer_falls_through_to_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        headers.insert(ESP32_KEY_HEADER, HeaderValue::from_static("esp-key"));
        assert_eq!(presented_token(&headers), Some("esp-key"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(presented_token(&headers), None);
    }
}
