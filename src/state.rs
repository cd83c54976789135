// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TokenVerifier;
use crate::storage::ObjectStore;
use crate::store::TodoStore;

/// Shared application state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<TodoStore>>,
    pub verifier: Arc<TokenVerifier>,
    pub objects: Arc<ObjectStore>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, objects: ObjectStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(TodoStore::new())),
            verifier: Arc::new(verifier),
            objects: Arc::new(objects),
        }
    }
}
