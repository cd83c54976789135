// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Every variant except [`AuthError::UpstreamUnavailable`] and
/// [`AuthError::Internal`] describes a problem with the presented
/// credential and maps to 401. A failed key-set fetch maps to 503: the
/// client's token may be perfectly valid, we just cannot check it.
#[derive(Debug, PartialEq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is structurally malformed (including a header without `kid`)
    MalformedToken,
    /// No key in the key set matches the token's `kid`, even after a
    /// forced refresh
    KeyNotFound,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired (or carries no expiry at all)
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token issuer is not in the allow-list
    InvalidIssuer,
    /// Neither audience nor authorized party match the expected audience
    InvalidAudience,
    /// Key-set fetch failed (network error, non-2xx, malformed body)
    UpstreamUnavailable(String),
    /// Internal error (e.g. unsupported key material in the key set)
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::KeyNotFound
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience => StatusCode::UNAUTHORIZED,
            AuthError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::KeyNotFound => write!(f, "No matching signing key found in key set"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::UpstreamUnavailable(msg) => write!(f, "Failed to fetch key set: {msg}"),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[test]
    fn credential_problems_are_401() {
        for err in [
            AuthError::MalformedToken,
            AuthError::KeyNotFound,
            AuthError::InvalidSignature,
            AuthError::TokenExpired,
            AuthError::InvalidIssuer,
            AuthError::InvalidAudience,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn keyset_fetch_failure_is_503() {
        let err = AuthError::UpstreamUnavailable("connection refused".into());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "upstream_unavailable");
    }
}
