// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! S3-compatible attachment storage.
//!
//! Works against AWS itself or any compatible store (MinIO, Ceph RGW)
//! via a custom endpoint, in which case path-style addressing is forced.
//! Download URLs are presigned GETs so clients fetch objects directly;
//! for deployments where the configured endpoint is only reachable
//! inside the network, the presigned URL's host is rewritten to a
//! public-facing endpoint.

use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::warn;
use url::Url;

use super::{object_key, StorageError};
use crate::config::S3Settings;

/// Bound on any single S3 operation.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct S3Storage {
    client: Client,
    bucket: String,
    presign_ttl: Duration,
    public_endpoint: Option<String>,
}

impl S3Storage {
    /// Build a client from configuration.
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(OPERATION_TIMEOUT)
                    .build(),
            );

        if let (Some(access_key), Some(secret_key)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "static",
            ));
        }

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(normalize_endpoint(endpoint, settings.use_ssl));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if settings.endpoint.is_some() {
            // Virtual-hosted addressing breaks on most non-AWS stores.
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
            presign_ttl: settings.presign_ttl,
            public_endpoint: settings.public_endpoint.clone(),
        }
    }

    pub async fn save(&self, data: &[u8], filename: &str) -> Result<String, StorageError> {
        let key = object_key(filename);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type_for(&key))
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(key)
    }

    pub async fn open(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound
                } else {
                    StorageError::Unavailable(service_error.to_string())
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    /// Unconditional delete. A failure is logged and reported as `false`
    /// rather than raised, so purge sweeps keep going and simply retry the
    /// key on their next pass.
    pub async fn delete(&self, key: &str) -> bool {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to delete object");
                false
            }
        }
    }

    /// Presign a GET for direct client fetch.
    pub async fn file_url(&self, key: &str) -> Result<String, StorageError> {
        let presign = PresigningConfig::expires_in(self.presign_ttl)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        Ok(rewrite_host(
            presigned.uri().to_string(),
            self.public_endpoint.as_deref(),
        ))
    }
}

/// Apply the configured scheme to endpoints given without one.
fn normalize_endpoint(endpoint: &str, use_ssl: bool) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{endpoint}")
    } else {
        format!("http://{endpoint}")
    }
}

/// Swap the scheme/host/port of a presigned URL for the public endpoint.
/// The path and the signed query string are left untouched; S3 signatures
/// over path-style requests stay valid across host rewrites as long as the
/// store is configured to accept the public host.
fn rewrite_host(uri: String, public_endpoint: Option<&str>) -> String {
    let Some(public) = public_endpoint else {
        return uri;
    };
    let (Ok(mut parsed), Ok(target)) = (Url::parse(&uri), Url::parse(public)) else {
        return uri;
    };

    if parsed.set_scheme(target.scheme()).is_err()
        || parsed.set_host(target.host_str()).is_err()
        || parsed.set_port(target.port()).is_err()
    {
        return uri;
    }
    parsed.to_string()
}

/// Infer a content type from the key's extension.
fn content_type_for(key: &str) -> &'static str {
    let extension = key.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
