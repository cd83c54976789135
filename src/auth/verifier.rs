// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Bearer-token verification.
//!
//! Given a raw token string, [`TokenVerifier::verify`] checks structure,
//! signature, expiry, issuer, and audience, returning the decoded claim
//! set or a structured [`AuthError`].
//!
//! A token signed by a key not present in the cached key set triggers
//! exactly one forced cache refresh before failing. This covers
//! provider-side key rotation: a newly introduced signing key becomes
//! usable on first sight without waiting for the cache TTL or any
//! out-of-band invalidation.

use jsonwebtoken::{decode, decode_header, Validation};

use super::claims::ClaimSet;
use super::error::AuthError;
use super::jwks::KeySetCache;
use crate::config::AuthSettings;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies bearer tokens against a provider's published key set.
pub struct TokenVerifier {
    keys: KeySetCache,
    /// Issuer allow-list: the configured issuer plus an optional alias.
    issuers: Vec<String>,
    /// Expected audience; `None` skips audience checking entirely.
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(keys: KeySetCache, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuers: vec![issuer.into()],
            audience: None,
        }
    }

    /// Accept a second issuer value (e.g. an external alias the provider
    /// stamps on tokens minted through a different endpoint).
    pub fn with_secondary_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuers.push(issuer.into());
        self
    }

    /// Require the given audience (or authorized party) on every token.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Build a verifier from startup configuration.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let keys =
            KeySetCache::new(settings.jwks_url.clone()).with_cache_ttl(settings.cache_ttl);
        let mut verifier = Self::new(keys, settings.issuer.clone());
        if let Some(secondary) = &settings.secondary_issuer {
            verifier = verifier.with_secondary_issuer(secondary.clone());
        }
        if let Some(audience) = &settings.audience {
            verifier = verifier.with_audience(audience.clone());
        }
        verifier
    }

    /// Verify a bearer token and return its claim set.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        // Parse the header without verifying anything yet; a token whose
        // header cannot name its signing key is rejected outright.
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        // Select the signing key; on a miss, refresh the key set once and
        // retry before giving up (key rotation).
        let (decoding_key, algorithm) = match self.keys.decoding_key(&kid, false).await {
            Ok(found) => found,
            Err(AuthError::KeyNotFound) => self.keys.decoding_key(&kid, true).await?,
            Err(e) => return Err(e),
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&self.issuers);
        // Audience needs the authorized-party fallback below, which the
        // JWT library's built-in check cannot express.
        validation.validate_aud = false;

        let token_data =
            decode::<ClaimSet>(token, &decoding_key, &validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if let Some(expected) = &self.audience {
            if !claims.satisfies_audience(expected) {
                return Err(AuthError::InvalidAudience);
            }
        }

        Ok(claims)
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        // A token without any expiry is treated the same as an expired one.
        jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => {
            AuthError::TokenExpired
        }
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::{
        jwks_body, now_plus, sign_token, sign_token_without_kid, JwksServer, ROTATED_KID,
        ROTATED_RSA_PEM, TEST_KID, TEST_RSA_PEM,
    };
    use serde_json::json;

    const ISSUER: &str = "https://idp.test";

    async fn verifier_for(server: &JwksServer) -> TokenVerifier {
        TokenVerifier::new(KeySetCache::new(server.url()), ISSUER)
    }

    fn claims(exp: i64) -> serde_json::Value {
        json!({
            "sub": "user-1",
            "iss": ISSUER,
            "iat": now_plus(-10),
            "exp": exp,
        })
    }

    #[tokio::test]
    async fn valid_token_yields_claims() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        let token = sign_token(TEST_KID, TEST_RSA_PEM, &claims(now_plus(3600)));
        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, ISSUER);
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;
        let err = verifier.verify("not.a.jwt").await.unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
        // Rejected before any key-set fetch.
        assert_eq!(server.hit_count(), 0);
    }

    #[tokio::test]
    async fn token_without_kid_is_malformed() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;
        let token = sign_token_without_kid(TEST_RSA_PEM, &claims(now_plus(3600)));
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::MalformedToken);
    }

    #[tokio::test]
    async fn rotation_miss_refreshes_once_and_succeeds() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        // Warm the cache before the provider publishes the new key.
        let old = sign_token(TEST_KID, TEST_RSA_PEM, &claims(now_plus(3600)));
        verifier.verify(&old).await.unwrap();
        assert_eq!(server.hit_count(), 1);

        server.set_body(jwks_body(&[TEST_KID, ROTATED_KID])).await;

        let rotated = sign_token(ROTATED_KID, ROTATED_RSA_PEM, &claims(now_plus(3600)));
        let claims = verifier.verify(&rotated).await.unwrap();
        assert_eq!(claims.sub, "user-1");
        // Exactly one forced refresh.
        assert_eq!(server.hit_count(), 2);
    }

    #[tokio::test]
    async fn unknown_kid_fails_after_single_refresh() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        let token = sign_token("never-published", TEST_RSA_PEM, &claims(now_plus(3600)));
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::KeyNotFound);
        assert_eq!(server.hit_count(), 2);
    }

    #[tokio::test]
    async fn wrong_key_signature_is_invalid() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        // Signed with the rotated private key but claiming the primary kid.
        let token = sign_token(TEST_KID, ROTATED_RSA_PEM, &claims(now_plus(3600)));
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[tokio::test]
    async fn expired_token_fails_even_with_valid_signature() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        // Well past the clock-skew leeway.
        let token = sign_token(TEST_KID, TEST_RSA_PEM, &claims(now_plus(-3600)));
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn token_without_expiry_fails_as_expired() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        let token = sign_token(
            TEST_KID,
            TEST_RSA_PEM,
            &json!({ "sub": "user-1", "iss": ISSUER }),
        );
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn foreign_issuer_is_rejected() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        let token = sign_token(
            TEST_KID,
            TEST_RSA_PEM,
            &json!({ "sub": "user-1", "iss": "https://evil.test", "exp": now_plus(3600) }),
        );
        let err = verifier.verify(&token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidIssuer);
    }

    #[tokio::test]
    async fn secondary_issuer_alias_is_accepted() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier =
            verifier_for(&server).await.with_secondary_issuer("https://alias.idp.test");

        let token = sign_token(
            TEST_KID,
            TEST_RSA_PEM,
            &json!({ "sub": "user-1", "iss": "https://alias.idp.test", "exp": now_plus(3600) }),
        );
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn audience_matrix() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await.with_audience("api-x");

        let sign = |aud_azp: serde_json::Value| {
            let mut body = claims(now_plus(3600));
            for (k, v) in aud_azp.as_object().unwrap() {
                body[k] = v.clone();
            }
            sign_token(TEST_KID, TEST_RSA_PEM, &body)
        };

        // aud as a matching string
        assert!(verifier.verify(&sign(json!({"aud": "api-x"}))).await.is_ok());
        // aud as a list containing the expected value
        assert!(verifier
            .verify(&sign(json!({"aud": ["other", "api-x"]})))
            .await
            .is_ok());
        // authorized-party fallback
        assert!(verifier
            .verify(&sign(json!({"aud": "other", "azp": "api-x"})))
            .await
            .is_ok());
        // no match anywhere
        let err = verifier
            .verify(&sign(json!({"aud": "other"})))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidAudience);
    }

    #[tokio::test]
    async fn no_configured_audience_skips_check() {
        let server = JwksServer::start(jwks_body(&[TEST_KID])).await;
        let verifier = verifier_for(&server).await;

        let mut body = claims(now_plus(3600));
        body["aud"] = json!("whatever");
        let token = sign_token(TEST_KID, TEST_RSA_PEM, &body);
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_key_set_is_upstream_unavailable() {
        let verifier = TokenVerifier::new(
            KeySetCache::new("http://127.0.0.1:9/jwks.json"),
            ISSUER,
        );
        let token = sign_token(TEST_KID, TEST_RSA_PEM, &claims(now_plus(3600)));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::UpstreamUnavailable(_)));
    }
}
