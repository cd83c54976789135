// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Local filesystem attachment storage.
//!
//! Objects live as flat files under a configured root directory. Download
//! URLs are internal relative paths, so fetches are proxied through the
//! service rather than handed to the client directly.

use std::path::{Path, PathBuf};

use super::{object_key, StorageError};

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open (creating if needed) the storage root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| StorageError::Unavailable(format!("create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub async fn save(&self, data: &[u8], filename: &str) -> Result<String, StorageError> {
        let key = object_key(filename);
        let path = self.root.join(&key);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StorageError::Unavailable(format!("write {}: {e}", path.display())))?;
        Ok(key)
    }

    pub async fn open(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        match tokio::fs::read(self.root.join(key)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    /// Internal download path; fetches go through the files route.
    pub fn file_url(&self, key: &str) -> String {
        format!("/api/files/{key}")
    }
}

/// Stored keys never contain separators, so any key that does is an
/// attempted traversal from the outside and reads as "no such object".
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
        return Err(StorageError::NotFound);
    }
    Ok(())
}
