// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! Attachment upload and download handlers.
//!
//! Uploads return a storage key; the client binds that key to a todo via
//! `image_key` at creation time. Downloads either proxy the bytes through
//! the service or hand out a direct-access URL, depending on the route.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{FileUrlResponse, UploadResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/files",
    request_body(content = String, content_type = "multipart/form-data"),
    tag = "Files",
    responses((status = 201, body = UploadResponse), (status = 400))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Auth(_user): Auth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("file").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?;

        let key = state.objects.save(&data, &filename).await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { key })));
    }

    Err(ApiError::bad_request("Missing \"file\" field"))
}

#[utoipa::path(
    get,
    path = "/api/files/{key}",
    params(
        ("key" = String, Path, description = "Storage key returned by the upload endpoint")
    ),
    tag = "Files",
    responses(
        (status = 200, description = "Raw object bytes"),
        (status = 404)
    )
)]
pub async fn download_file(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Auth(_user): Auth,
) -> Result<([(header::HeaderName, &'static str); 1], Vec<u8>), ApiError> {
    let data = state.objects.open(&key).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// Resolve a URL under which the object can be fetched directly: a
/// short-lived presigned URL for S3, the internal download path for the
/// local backend. Resolution never checks existence; a fabricated key
/// yields a URL whose fetch 404s.
#[utoipa::path(
    get,
    path = "/api/files/{key}/url",
    params(
        ("key" = String, Path, description = "Storage key returned by the upload endpoint")
    ),
    tag = "Files",
    responses((status = 200, body = FileUrlResponse))
)]
pub async fn file_url(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Auth(_user): Auth,
) -> Result<Json<FileUrlResponse>, ApiError> {
    let url = state.objects.file_url(&key).await?;
    Ok(Json(FileUrlResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::auth::claims::test_user;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "test-boundary";

    async fn multipart_with(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let (state, _temp_dir) = test_state();
        let multipart = multipart_with(&[("file", Some("photo.jpg"), b"image bytes")]).await;

        let (status, Json(upload)) =
            upload_file(State(state.clone()), Auth(test_user("user-a")), multipart)
                .await
                .expect("upload succeeds");
        assert_eq!(status, StatusCode::CREATED);
        assert!(upload.key.ends_with("_photo.jpg"));

        let (headers, data) = download_file(
            Path(upload.key),
            State(state),
            Auth(test_user("user-a")),
        )
        .await
        .expect("download succeeds");
        assert_eq!(headers[0].1, "application/octet-stream");
        assert_eq!(data, b"image bytes");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_rejected() {
        let (state, _temp_dir) = test_state();
        let multipart = multipart_with(&[("note", None, b"not a file")]).await;

        let err = upload_file(State(state), Auth(test_user("user-a")), multipart)
            .await
            .expect_err("upload without file field is rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_missing_key_is_not_found() {
        let (state, _temp_dir) = test_state();

        let err = download_file(
            Path("20260101000000000000_deadbeef_nope.png".to_string()),
            State(state),
            Auth(test_user("user-a")),
        )
        .await
        .expect_err("missing object is rejected");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn file_url_resolves_internal_path_for_local_backend() {
        let (state, _temp_dir) = test_state();

        let Json(response) = file_url(
            Path("abc_photo.jpg".to_string()),
            State(state),
            Auth(test_user("user-a")),
        )
        .await
        .expect("url resolution succeeds");
        assert_eq!(response.url, "/api/files/abc_photo.jpg");
    }
}
