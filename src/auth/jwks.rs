// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! The cache owns the most recently fetched key set together with its
//! fetch timestamp. A set younger than the TTL is served without network
//! I/O; anything else (or a forced refresh) replaces the cached value
//! wholesale. There is no merging of old and new sets and no per-key
//! eviction. Concurrent refreshes interleave safely with last-writer-wins
//! semantics on the cached value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default key-set cache TTL (1 hour).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Bounded timeout for the key-set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache entry: one key set plus when it was fetched.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Caching fetcher for an identity provider's key set.
#[derive(Clone)]
pub struct KeySetCache {
    /// JWKS endpoint URL
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySetCache {
    /// Create a new cache for the given JWKS endpoint.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Return the current key set.
    ///
    /// Serves the cached set while it is younger than the TTL, unless
    /// `force_refresh` is set; otherwise fetches a fresh set and replaces
    /// the cached value and timestamp atomically. Fetch failures surface
    /// as [`AuthError::UpstreamUnavailable`] and are never swallowed.
    pub async fn get_keys(&self, force_refresh: bool) -> Result<JwkSet, AuthError> {
        if !force_refresh {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        let jwks = self.fetch_keys().await?;

        {
            let mut cache = self.cache.write().await;
            *cache = Some(CacheEntry {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
            });
        }

        Ok(jwks)
    }

    /// Select the decoding key whose `kid` matches.
    ///
    /// `force_refresh` is passed through to [`KeySetCache::get_keys`]; the
    /// verifier uses it to retry a miss once after a rotation.
    pub async fn decoding_key(
        &self,
        kid: &str,
        force_refresh: bool,
    ) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_keys(force_refresh).await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or(AuthError::KeyNotFound)?;

        jwk_to_decoding_key(jwk)
    }

    /// Check if a fresh key set is currently cached.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }

    /// Fetch the key set from the endpoint.
    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::UpstreamUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::UpstreamUnavailable(e.to_string()))?;

        Ok(jwks)
    }
}

/// Reconstruct a verification key from a JWK's public fields.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::Internal(format!("Failed to create RSA key: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    jsonwebtoken::jwk::KeyAlgorithm::RS256 => Algorithm::RS256,
                    jsonwebtoken::jwk::KeyAlgorithm::RS384 => Algorithm::RS384,
                    jsonwebtoken::jwk::KeyAlgorithm::RS512 => Algorithm::RS512,
                    _ => Algorithm::RS256, // Default for RSA
                })
                .unwrap_or(Algorithm::RS256);

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::Internal(format!("Failed to create EC key: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    jsonwebtoken::jwk::KeyAlgorithm::ES256 => Algorithm::ES256,
                    jsonwebtoken::jwk::KeyAlgorithm::ES384 => Algorithm::ES384,
                    _ => Algorithm::ES256, // Default for EC
                })
                .unwrap_or(Algorithm::ES256);

            Ok((key, alg))
        }
        _ => Err(AuthError::Internal(
            "Unsupported key type in key set".to_string(),
        )),
    }
}
