//! HTTP request handlers.
//!
//! One generic set of handlers serves every registered collection: the
//! first path segment selects a `ResourceSpec` which supplies the table,
//! the validator and the image policy. The flow for writes is always
//! validate, then upload (when a file is attached), then persist, so a
//! validation or upload failure never leaves a partial document behind.
//! Stats, auth, enrollment count and health have dedicated handlers.

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::auth;
use crate::database::{self, AppState};
use crate::error::ApiError;
use crate::media;
use crate::model::LoginRequest;
use crate::resource::{self, ImagePolicy, ResourceSpec};
use crate::validate::Mode;

/// A file pulled out of a multipart request.
struct UploadFile {
    bytes: Vec<u8>,
    content_type: String,
}

fn lookup(resource: &str) -> Result<&'static ResourceSpec, ApiError> {
    resource::find(resource).ok_or(ApiError::NotFound("Resource"))
}

/// Pull text fields and an optional image file out of the request.
///
/// JSON bodies carry text fields only. Multipart bodies carry text parts
/// plus at most one file part named `image`; array-valued fields arrive
/// JSON-encoded inside text parts and are decoded by the validators.
async fn read_input(
    state: &AppState,
    request: Request,
) -> Result<(Map<String, Value>, Option<UploadFile>), ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::invalid("request body must be valid multipart/form-data"))?;

        let mut fields = Map::new();
        let mut file = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::invalid(format!("malformed multipart body: {err}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" && field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::invalid(format!("could not read image field: {err}")))?;
                file = Some(UploadFile {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::invalid(format!("could not read field {name}: {err}")))?;
                fields.insert(name, Value::String(text));
            }
        }
        Ok((fields, file))
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), state.config.max_upload_bytes)
            .await
            .map_err(|_| ApiError::invalid("request body too large or unreadable"))?;
        if bytes.is_empty() {
            return Ok((Map::new(), None));
        }
        let fields: Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|_| ApiError::invalid("request body must be a JSON object"))?;
        Ok((fields, None))
    }
}

/// Run the type/size gate and forward the file to the media host.
async fn upload_image(state: &AppState, file: UploadFile) -> Result<String, ApiError> {
    media::check_image(&file.content_type, file.bytes.len(), state.config.max_upload_bytes)?;
    Ok(state.media.upload(file.bytes, &file.content_type).await?)
}

/// Remove a just-uploaded asset after the persistence write failed, so it
/// does not sit orphaned on the media host. Cleanup failures are logged
/// and swallowed; the storage error is what the client sees.
async fn discard_upload(state: &AppState, url: &str) {
    if let Err(err) = state.media.delete(url).await {
        tracing::warn!(url = %url, error = %err, "failed to remove uploaded image after storage error");
    }
}

fn as_object(document: Value) -> Result<Map<String, Value>, ApiError> {
    match document {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Internal(format!(
            "expected a JSON object, got: {other}"
        ))),
    }
}

/// `GET /api/{resource}` - all documents, newest first.
pub async fn list_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Response, ApiError> {
    let spec = lookup(&resource)?;
    let documents = database::list_documents(&state.db, spec.table)?;
    Ok(Json(json!({ "success": true, "data": documents })).into_response())
}

/// `GET /api/{resource}/{id}`
pub async fn get_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let spec = lookup(&resource)?;
    let document = database::get_document(&state.db, spec.table, &id)?
        .ok_or(ApiError::NotFound(spec.label))?;
    Ok(Json(json!({ "success": true, "data": document })).into_response())
}

/// `POST /api/{resource}`
pub async fn create_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let spec = lookup(&resource)?;
    let (fields, file) = read_input(&state, request).await?;

    let mut document = as_object((spec.validate)(&fields, Mode::Create)?)?;

    if spec.image == ImagePolicy::Required && file.is_none() {
        return Err(ApiError::invalid("image file is required"));
    }

    let image_url = match (spec.image, file) {
        (ImagePolicy::None, _) | (_, None) => None,
        (_, Some(file)) => Some(upload_image(&state, file).await?),
    };

    let now = Utc::now();
    let id = database::new_doc_id();
    document.insert("id".to_string(), Value::String(id.clone()));
    if let Some(url) = &image_url {
        document.insert("image".to_string(), Value::String(url.clone()));
    }
    document.insert("createdAt".to_string(), json!(now));
    document.insert("updatedAt".to_string(), json!(now));

    let document = Value::Object(document);
    if let Err(err) = database::put_document(&state.db, spec.table, &id, &document) {
        if let Some(url) = &image_url {
            discard_upload(&state, url).await;
        }
        return Err(err);
    }

    if let Some(after_create) = spec.after_create {
        after_create(&state.db);
    }

    tracing::info!(resource = spec.path, id = %id, "document created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("{} created successfully", spec.label),
            "data": document,
        })),
    )
        .into_response())
}

/// `PUT /api/{resource}/{id}`
///
/// Supplied fields are validated under the same rules as creation and
/// merged over the stored document. The image only changes when a new
/// file accompanies the request.
pub async fn update_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    let spec = lookup(&resource)?;
    let existing = database::get_document(&state.db, spec.table, &id)?
        .ok_or(ApiError::NotFound(spec.label))?;
    let (fields, file) = read_input(&state, request).await?;

    let validated = as_object((spec.validate)(&fields, Mode::Update)?)?;

    let mut document = as_object(existing)?;
    for (key, value) in validated {
        document.insert(key, value);
    }

    let image_url = match (spec.image, file) {
        (ImagePolicy::None, _) | (_, None) => None,
        (_, Some(file)) => Some(upload_image(&state, file).await?),
    };
    if let Some(url) = &image_url {
        document.insert("image".to_string(), Value::String(url.clone()));
    }
    document.insert("updatedAt".to_string(), json!(Utc::now()));

    let document = Value::Object(document);
    if let Err(err) = database::put_document(&state.db, spec.table, &id, &document) {
        if let Some(url) = &image_url {
            discard_upload(&state, url).await;
        }
        return Err(err);
    }

    tracing::info!(resource = spec.path, id = %id, "document updated");
    Ok(Json(json!({
        "success": true,
        "message": format!("{} updated successfully", spec.label),
        "data": document,
    }))
    .into_response())
}

/// `DELETE /api/{resource}/{id}`
pub async fn delete_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let spec = lookup(&resource)?;
    if !database::delete_document(&state.db, spec.table, &id)? {
        return Err(ApiError::NotFound(spec.label));
    }

    tracing::info!(resource = spec.path, id = %id, "document deleted");
    Ok(Json(json!({
        "success": true,
        "message": format!("{} deleted successfully", spec.label),
    }))
    .into_response())
}

/// `GET /api/stats` - the counter singleton, seeded on first read.
pub async fn get_stats(State(state): State<AppState>) -> Result<Response, ApiError> {
    let stats = database::load_stats(&state.db)?;
    Ok(Json(json!({ "success": true, "data": stats })).into_response())
}

/// `PUT /api/stats` - overwrite only the supplied counters.
pub async fn update_stats(
    State(state): State<AppState>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Response, ApiError> {
    let updates = crate::validate::stats_update(&fields)?;
    let stats = database::merge_stats(&state.db, &updates)?;
    Ok(Json(json!({
        "success": true,
        "message": "Stats updated successfully",
        "data": stats,
    }))
    .into_response())
}

/// `GET /api/enroll/count` - derived read outside the generic CRUD shape.
pub async fn enroll_count(State(state): State<AppState>) -> Result<Response, ApiError> {
    let count = database::count_documents(&state.db, database::TABLE_ENROLLMENTS)?;
    Ok(Json(json!({ "success": true, "count": count })).into_response())
}

/// `POST /api/auth/login`
///
/// Verifies the admin password server-side and issues a signed, expiring
/// bearer token for the admin routes.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if request.password != state.config.admin_password {
        tracing::warn!("admin login rejected");
        return Err(ApiError::Unauthorized);
    }

    let (token, expires_at) =
        auth::issue_token(&state.config.token_secret, state.config.token_ttl_secs);
    Ok(Json(json!({
        "success": true,
        "token": token,
        "expiresAt": expires_at,
    }))
    .into_response())
}

/// `GET /health` - process and store liveness.
pub async fn health(State(state): State<AppState>) -> Response {
    if database::store_ready(&state.db) {
        Json(json!({ "success": true, "status": "ok", "database": "connected" })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "status": "degraded", "database": "disconnected" })),
        )
            .into_response()
    }
}
