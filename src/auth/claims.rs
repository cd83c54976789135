// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Verified token claims and the authenticated principal.

use std::collections::HashMap;

use serde::Deserialize;

/// The `aud` claim: a single audience or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::One(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// The decoded body of a verified bearer token.
///
/// Produced fresh per verification call and handed to the caller; nothing
/// here is persisted. `extra` collects provider-specific claims we do not
/// interpret.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    /// Subject, the canonical user identifier.
    pub sub: String,

    /// Issuer. Validated during decoding; retained for logging.
    #[serde(default)]
    pub iss: String,

    /// Expiration timestamp. Validated during decoding.
    #[serde(default)]
    pub exp: i64,

    /// Issued-at timestamp.
    #[serde(default)]
    pub iat: Option<i64>,

    /// Audience, a string or a list of strings depending on the provider.
    #[serde(default)]
    pub aud: Option<Audience>,

    /// Authorized party. Some providers omit the expected audience from
    /// `aud` on access tokens and carry it here instead.
    #[serde(default)]
    pub azp: Option<String>,

    /// Provider-specific token classification (e.g. `access` vs `id`).
    #[serde(default)]
    pub token_use: Option<String>,

    /// Any further claims, passed through uninterpreted.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ClaimSet {
    /// Audience acceptance: `aud` equals or contains the expected value,
    /// or, as a fallback, `azp` equals it.
    pub fn satisfies_audience(&self, expected: &str) -> bool {
        if let Some(aud) = &self.aud {
            if aud.contains(expected) {
                return true;
            }
        }
        self.azp.as_deref() == Some(expected)
    }
}

/// The authenticated principal derived from a verified token.
///
/// Handlers use `user_id` (the subject claim) as the partition key for
/// every todo operation; the full claim set stays available for anything
/// beyond that.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Canonical user id (the `sub` claim).
    pub user_id: String,
    /// The full verified claim set.
    pub claims: ClaimSet,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: ClaimSet) -> Self {
        Self {
            user_id: claims.sub.clone(),
            claims,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_user(user_id: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user_id.to_string(),
        claims: ClaimSet {
            sub: user_id.to_string(),
            iss: "https://idp.test".to_string(),
            exp: i64::MAX,
            iat: None,
            aud: None,
            azp: None,
            token_use: None,
            extra: HashMap::new(),
        },
    }
}
