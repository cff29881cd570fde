use crate::{AppState, auth, handlers};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Moderation and oversight endpoints. The whole router is wrapped in `require_admin`,
/// which authenticates, then checks `Role::Admin`, then hands over to the handler.
/// Unauthenticated callers get 401, other roles 403.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard aggregates, recomputed from the full ledger.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users
        .route("/users", get(handlers::list_users))
        // PUT/DELETE /admin/users/{id}
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        // GET /admin/orders
        .route("/orders", get(handlers::list_orders))
        // PUT /admin/orders/{id}/status
        .route("/orders/{id}/status", put(handlers::update_order_status))
        // POST /admin/products
        .route("/products", post(handlers::create_product))
        // PUT/DELETE /admin/products/{id}
        .route(
            "/products/{id}",
            put(handlers::update_product).delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
