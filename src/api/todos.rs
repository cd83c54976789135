// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateTodoRequest, Todo},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "Todos",
    responses((status = 200, body = [Todo]))
)]
pub async fn list_todos(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list(&user.user_id)))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    tag = "Todos",
    responses((status = 201, body = Todo))
)]
pub async fn create_todo(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let mut store = state.store.write().await;
    let todo = store.insert(&user.user_id, request);
    Ok((StatusCode::CREATED, Json(todo)))
}

#[utoipa::path(
    get,
    path = "/api/todos/{todo_id}",
    params(
        ("todo_id" = i64, Path, description = "Identifier of the todo item")
    ),
    tag = "Todos",
    responses((status = 200, body = Todo), (status = 404))
)]
pub async fn get_todo(
    Path(todo_id): Path<i64>,
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Todo>, ApiError> {
    let store = state.store.read().await;
    let todo = store
        .get(&user.user_id, todo_id)
        .ok_or_else(|| ApiError::not_found("Todo not found"))?;
    Ok(Json(todo))
}

/// Items belonging to other users read as absent, so a foreign id gets the
/// same 404 as a nonexistent one.
#[utoipa::path(
    post,
    path = "/api/todos/{todo_id}/complete",
    params(
        ("todo_id" = i64, Path, description = "Identifier of the todo item")
    ),
    tag = "Todos",
    responses((status = 200, body = Todo), (status = 404))
)]
pub async fn complete_todo(
    Path(todo_id): Path<i64>,
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Todo>, ApiError> {
    let mut store = state.store.write().await;
    let todo = store
        .set_completed(&user.user_id, todo_id, true)
        .ok_or_else(|| ApiError::not_found("Todo not found"))?;
    Ok(Json(todo))
}
