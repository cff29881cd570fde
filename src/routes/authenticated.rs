use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints for any signed-in caller. Each handler takes an `Identity` argument, whose
/// extractor rejects missing or invalid tokens with 401 before the handler body runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        .route("/auth/me", get(handlers::get_me))
}
