// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{CreateTodoRequest, FileUrlResponse, Todo, UploadResponse},
    state::AppState,
};

pub mod files;
pub mod health;
pub mod todos;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/{todo_id}", get(todos::get_todo))
        .route("/todos/{todo_id}/complete", post(todos::complete_todo))
        .route("/files", post(files::upload_file))
        .route("/files/{key}", get(files::download_file))
        .route("/files/{key}/url", get(files::file_url));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        todos::list_todos,
        todos::create_todo,
        todos::get_todo,
        todos::complete_todo,
        files::upload_file,
        files::download_file,
        files::file_url
    ),
    components(
        schemas(
            health::HealthResponse,
            Todo,
            CreateTodoRequest,
            UploadResponse,
            FileUrlResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Todos", description = "Per-user todo items"),
        (name = "Files", description = "Attachment upload and download")
    )
)]
struct ApiDoc;

#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    use crate::auth::{KeySetCache, TokenVerifier};
    use crate::storage::{LocalStorage, ObjectStore};

    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let objects = ObjectStore::Local(LocalStorage::new(temp_dir.path()).expect("local store"));
    // Port 9 is never listening; nothing in these tests runs the verifier.
    let verifier = TokenVerifier::new(KeySetCache::new("http://127.0.0.1:9/jwks"), "https://idp.test");
    (AppState::new(verifier, objects), temp_dir)
}
