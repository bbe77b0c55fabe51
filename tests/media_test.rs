//! Image upload behavior: the type/size gate, upload-before-persist
//! ordering, and image handling on updates.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use academy_api::auth;
use academy_api::config::Config;
use academy_api::database::{init_db, AppState};
use academy_api::media::{FailingMediaHost, MediaHost, MemoryMediaHost};
use academy_api::route::create_app;

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: String::new(),
        media_base_url: "https://media.invalid".to_string(),
        media_api_key: String::new(),
        media_api_secret: String::new(),
        max_upload_bytes: 5 * 1024 * 1024,
        upload_timeout: Duration::from_secs(5),
        admin_password: "test-admin".to_string(),
        token_secret: "test-secret".to_string(),
        token_ttl_secs: 3600,
    }
}

fn setup_with_media(media: Arc<dyn MediaHost>) -> (axum::Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to initialize test database");
    let state = AppState {
        db: Arc::new(db),
        media,
        config: Arc::new(test_config()),
    };
    (create_app(state), temp_db)
}

fn setup_test_app() -> (axum::Router, NamedTempFile) {
    setup_with_media(Arc::new(MemoryMediaHost::new()))
}

async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"upload.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn send_multipart(
    app: axum::Router,
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> (StatusCode, Value) {
    let (token, _) = auth::issue_token("test-secret", 3600);
    let (content_type, body) = multipart_body(fields, file);
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", content_type)
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, response_json(response.into_body()).await)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, response_json(response.into_body()).await)
}

#[tokio::test]
async fn test_unsupported_image_type_is_rejected_before_upload() {
    let media = Arc::new(MemoryMediaHost::new());
    let (app, _temp_db) = setup_with_media(media.clone());

    let (status, body) = send_multipart(
        app,
        "POST",
        "/api/home-content",
        &[("title", "Banner")],
        Some(("text/plain", b"definitely not an image")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("type")));

    // The gate fired before anything reached the host.
    assert!(media.uploaded().is_empty());
}

#[tokio::test]
async fn test_oversized_image_is_rejected_before_upload() {
    let media = Arc::new(MemoryMediaHost::new());
    let (app, _temp_db) = setup_with_media(media.clone());

    let oversized = vec![0u8; 6 * 1024 * 1024];
    let (status, body) = send_multipart(
        app,
        "POST",
        "/api/home-content",
        &[("title", "Banner")],
        Some(("image/jpeg", &oversized)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("size")));
    assert!(media.uploaded().is_empty());
}

#[tokio::test]
async fn test_failed_upload_never_creates_a_document() {
    let (app, _temp_db) = setup_with_media(Arc::new(FailingMediaHost));

    let (status, body) = send_multipart(
        app.clone(),
        "POST",
        "/api/home-content",
        &[("title", "Banner")],
        Some(("image/jpeg", b"\xff\xd8\xff\xe0 fake jpeg bytes")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let (_, body) = get(app, "/api/home-content").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_without_file_keeps_previous_image() {
    let (app, _temp_db) = setup_test_app();

    let (_, created) = send_multipart(
        app.clone(),
        "POST",
        "/api/home-content",
        &[("title", "Banner")],
        Some(("image/jpeg", b"\xff\xd8\xff\xe0 fake jpeg bytes")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let original_image = created["data"]["image"].as_str().unwrap().to_string();

    let (status, updated) = send_multipart(
        app.clone(),
        "PUT",
        &format!("/api/home-content/{id}"),
        &[("title", "Renamed banner")],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["title"], "Renamed banner");
    assert_eq!(updated["data"]["image"], original_image.as_str());
}

#[tokio::test]
async fn test_update_with_file_replaces_image() {
    let (app, _temp_db) = setup_test_app();

    let (_, created) = send_multipart(
        app.clone(),
        "POST",
        "/api/home-content",
        &[("title", "Banner")],
        Some(("image/jpeg", b"\xff\xd8\xff\xe0 fake jpeg bytes")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let original_image = created["data"]["image"].as_str().unwrap().to_string();

    let (status, updated) = send_multipart(
        app,
        "PUT",
        &format!("/api/home-content/{id}"),
        &[("title", "Banner")],
        Some(("image/png", b"\x89PNG other bytes")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let new_image = updated["data"]["image"].as_str().unwrap();
    assert_ne!(new_image, original_image);
    assert!(new_image.ends_with(".png"));
}

#[tokio::test]
async fn test_gif_and_png_are_accepted() {
    let (app, _temp_db) = setup_test_app();

    for content_type in ["image/png", "image/gif"] {
        let (status, _) = send_multipart(
            app.clone(),
            "POST",
            "/api/home-content",
            &[("title", "Banner")],
            Some((content_type, b"fake image bytes")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
