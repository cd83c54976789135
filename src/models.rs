// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON handling
//! and OpenAPI documentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single todo item owned by one user.
///
/// Items are mutated only by the completion toggle and deleted only by the
/// cleanup sweep; everything else is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Todo {
    /// Unique identifier.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional due date, passed through verbatim from the client.
    pub due_date: Option<String>,
    /// Whether the item has been completed.
    pub completed: bool,
    /// Storage key of the attached image, if any.
    pub image_key: Option<String>,
    /// Owning user (the token's subject claim).
    pub user_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request to create a new todo item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    /// Short title.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional due date string.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Storage key of a previously uploaded attachment.
    #[serde(default)]
    pub image_key: Option<String>,
}

/// Response to a successful file upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Storage key under which the file was saved.
    pub key: String,
}

/// Response carrying a resolved file access URL.
///
/// For the local backend this is an internal relative path; for the S3
/// backend it is a short-lived presigned URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileUrlResponse {
    pub url: String,
}
