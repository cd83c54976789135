// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! # Attachment Storage
//!
//! A uniform save/open/delete/url interface over two backends: the local
//! filesystem and any S3-compatible object store. The backend is chosen
//! once at startup from configuration and injected into handlers through
//! `AppState`; nothing downstream knows which variant it is talking to.
//!
//! Object keys are derived from the original filename: a UTC timestamp
//! prefix, a short random token, and the sanitized name. Concurrent
//! uploads of identically named files therefore never collide.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, StorageBackendKind};

pub mod local;
pub mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

/// Storage operation failures.
///
/// `NotFound` is always distinguishable from infrastructure trouble so
/// callers can map it to a 404 instead of a retryable 5xx.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// The configured attachment backend.
///
/// A closed set of variants rather than a trait object: the choice is
/// made exactly once, at startup, and enum dispatch keeps the call sites
/// free of object-safety contortions.
pub enum ObjectStore {
    Local(LocalStorage),
    S3(S3Storage),
}

impl ObjectStore {
    /// Construct the backend selected by configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        match config.backend {
            StorageBackendKind::Local => {
                Ok(Self::Local(LocalStorage::new(&config.media_root)?))
            }
            StorageBackendKind::S3 => {
                let settings = config
                    .s3
                    .as_ref()
                    .ok_or_else(|| StorageError::Unavailable("S3 settings missing".into()))?;
                Ok(Self::S3(S3Storage::from_settings(settings).await))
            }
        }
    }

    /// Store `data` under a freshly derived key and return the key.
    pub async fn save(&self, data: &[u8], filename: &str) -> Result<String, StorageError> {
        match self {
            Self::Local(backend) => backend.save(data, filename).await,
            Self::S3(backend) => backend.save(data, filename).await,
        }
    }

    /// Read the full object at `key`.
    pub async fn open(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::Local(backend) => backend.open(key).await,
            Self::S3(backend) => backend.open(key).await,
        }
    }

    /// Delete the object at `key`. Returns `false` (rather than an error)
    /// when there was nothing to delete or the backend refused, so a
    /// cleanup sweep can carry on past individual failures.
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        match self {
            Self::Local(backend) => backend.delete(key).await,
            Self::S3(backend) => Ok(backend.delete(key).await),
        }
    }

    /// Resolve a URL under which the object can be fetched: an internal
    /// relative path for the local backend, a short-lived presigned URL
    /// for S3.
    pub async fn file_url(&self, key: &str) -> Result<String, StorageError> {
        match self {
            Self::Local(backend) => Ok(backend.file_url(key)),
            Self::S3(backend) => backend.file_url(key).await,
        }
    }
}

/// Strip path components and restrict the name to a safe character set.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let safe: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // ".." would survive the character filter above.
    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        safe
    }
}

/// Derive a collision-resistant storage key for an upload.
pub(crate) fn object_key(filename: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S%6f");
    let token = Uuid::new_v4().simple().to_string();
    format!("{timestamp}_{}_{}", &token[..8], sanitize_filename(filename))
}
