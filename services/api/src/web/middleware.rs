//! services/api/src/web/middleware.rs
//!
//! The shared-passphrase gate for the admin routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Middleware that checks the `x-admin-key` header against the configured
/// admin passphrase.
///
/// This is a single shared key for a single shared screen, not a real
/// security boundary. Missing or wrong key returns 401 Unauthorized.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if provided != state.config.admin_key {
        warn!("rejected admin request with wrong key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}
