// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Todo API Server - Authenticated todo CRUD with attachment storage
//!
//! This crate provides a small REST backend for a todo-list application:
//! per-user todo items behind OIDC bearer-token authentication, with
//! optional file attachments stored on a pluggable backend (local
//! filesystem or S3-compatible object store).
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token verification against a remote JWKS
//! - `storage` - Attachment object storage (local or S3-compatible)
//! - `store` - Owner-scoped todo record store
//! - `cleanup` - Background purge of completed todos and their attachments

pub mod api;
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
