//! Admin authentication layer for the API surface.
//!
//! Reads are public, as are the two lead-submission endpoints and the
//! login route itself. Every other request under `/api` must carry a
//! valid bearer token issued by the login handler. The credential check
//! lives server-side; clients only ever hold the expiring token.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::database::AppState;
use crate::error::ApiError;
use crate::resource;

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if admin_required(request.method(), request.uri().path()) {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        if !auth::verify_token(&state.config.token_secret, token) {
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Mutating requests need a token, except lead submissions and login.
fn admin_required(method: &Method, path: &str) -> bool {
    if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
        return false;
    }

    let path = path.strip_prefix("/api").unwrap_or(path);
    if *method == Method::POST {
        let segment = path.trim_start_matches('/').split('/').next().unwrap_or("");
        if segment == "auth" {
            return false;
        }
        if let Some(spec) = resource::find(segment) {
            return !spec.public_create;
        }
    }

    true
}
