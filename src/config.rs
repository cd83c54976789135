// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Missing
//! required values are fatal: the process logs the problem and exits
//! instead of limping along with a half-configured verifier or storage
//! backend.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWKS_URL` | JWKS endpoint for JWT verification | Required |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Required |
//! | `AUTH_SECONDARY_ISSUER` | Additional accepted issuer alias | Optional |
//! | `AUTH_AUDIENCE` | Expected audience / authorized party | Optional |
//! | `JWKS_CACHE_TTL_SECS` | Key-set cache freshness window | `3600` |
//! | `STORAGE_BACKEND` | `local` or `s3` | `local` |
//! | `MEDIA_ROOT` | Root directory for local storage | `/app/uploads` |
//! | `S3_BUCKET` | Bucket name | Required for `s3` |
//! | `S3_REGION` | Bucket region | `us-east-1` |
//! | `S3_ENDPOINT` | Custom endpoint for S3-compatible stores | Optional |
//! | `S3_PUBLIC_ENDPOINT` | Public host for presigned URL rewriting | Optional |
//! | `S3_ACCESS_KEY_ID` | Static access key | Optional |
//! | `S3_SECRET_ACCESS_KEY` | Static secret key | Optional |
//! | `S3_USE_SSL` | Scheme for scheme-less custom endpoints | `true` |
//! | `S3_PRESIGN_TTL_SECS` | Presigned URL lifetime | `900` |
//! | `CLEANUP_INTERVAL_SECS` | Purge sweep interval (unset = disabled) | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default freshness window for the cached key set (1 hour).
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default lifetime for presigned attachment URLs (15 minutes).
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(900);

/// Configuration loading errors. Fatal at startup, never per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value {value:?} for {name}")]
    InvalidVar { name: &'static str, value: String },
}

/// Which attachment storage backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Local,
    S3,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Token verification settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// JWKS endpoint URL.
    pub jwks_url: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Optional additional accepted issuer (e.g. an external alias for
    /// the same provider).
    pub secondary_issuer: Option<String>,
    /// Expected audience; when unset, audience checking is skipped.
    pub audience: Option<String>,
    /// Key-set cache freshness window.
    pub cache_ttl: Duration,
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for non-AWS deployments (MinIO, Ceph, ...).
    pub endpoint: Option<String>,
    /// Public-facing endpoint substituted into presigned URLs, for
    /// deployments where the internal endpoint is not client-reachable.
    pub public_endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Scheme applied to custom endpoints given without one.
    pub use_ssl: bool,
    /// Presigned URL lifetime.
    pub presign_ttl: Duration,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub backend: StorageBackendKind,
    /// Root directory for the local backend.
    pub media_root: PathBuf,
    /// Populated only when `backend` is [`StorageBackendKind::S3`].
    pub s3: Option<S3Settings>,
    /// Interval for the completed-todo purge sweep; `None` disables it.
    pub cleanup_interval: Option<Duration>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", &var, 8080)?;

        let auth = AuthSettings {
            jwks_url: var("AUTH_JWKS_URL").ok_or(ConfigError::MissingVar("AUTH_JWKS_URL"))?,
            issuer: var("AUTH_ISSUER").ok_or(ConfigError::MissingVar("AUTH_ISSUER"))?,
            secondary_issuer: var("AUTH_SECONDARY_ISSUER"),
            audience: var("AUTH_AUDIENCE"),
            cache_ttl: Duration::from_secs(parse_or(
                "JWKS_CACHE_TTL_SECS",
                &var,
                DEFAULT_JWKS_CACHE_TTL.as_secs(),
            )?),
        };

        let backend = match var("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageBackendKind::Local,
            Some("s3") => StorageBackendKind::S3,
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let s3 = if backend == StorageBackendKind::S3 {
            Some(S3Settings {
                bucket: var("S3_BUCKET").ok_or(ConfigError::MissingVar("S3_BUCKET"))?,
                region: var("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: var("S3_ENDPOINT"),
                public_endpoint: var("S3_PUBLIC_ENDPOINT"),
                access_key_id: var("S3_ACCESS_KEY_ID"),
                secret_access_key: var("S3_SECRET_ACCESS_KEY"),
                use_ssl: parse_bool_or("S3_USE_SSL", &var, true)?,
                presign_ttl: Duration::from_secs(parse_or(
                    "S3_PRESIGN_TTL_SECS",
                    &var,
                    DEFAULT_PRESIGN_TTL.as_secs(),
                )?),
            })
        } else {
            None
        };

        let cleanup_interval = match var("CLEANUP_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidVar {
                    name: "CLEANUP_INTERVAL_SECS",
                    value: raw,
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidVar {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host,
            port,
            auth,
            backend,
            media_root: var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/app/uploads")),
            s3,
            cleanup_interval,
            log_format,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    var: impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool_or(
    name: &'static str,
    var: impl Fn(&str) -> Option<String>,
    default: bool,
) -> Result<bool, ConfigError> {
    match var(name).as_deref() {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidVar {
            name,
            value: other.to_string(),
        }),
    }
}
