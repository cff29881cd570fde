use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core components.
pub mod auth;
pub mod client_routes;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod repository;
pub mod stats;

// Routing segregated by access level (Public, Authenticated, Admin).
pub mod routes;
use auth::Identity;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use registry::{IdentityRegistry, RegistryConfig, RegistryState};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::get_me,
        handlers::get_admin_stats, handlers::list_users, handlers::update_user,
        handlers::delete_user, handlers::list_orders, handlers::update_order_status,
        handlers::create_product, handlers::update_product, handlers::delete_product,
    ),
    components(
        schemas(
            models::Role, models::OrderStatus, models::UserProfile, models::LineItem,
            models::BuyerSummary, models::Order, models::Product, models::RegisterRequest,
            models::CustomerRegistration, models::SellerRegistration, models::AdminRegistration,
            models::LoginRequest, models::UpdateUserRequest, models::UpdateOrderStatusRequest,
            models::CreateProductRequest, models::UpdateProductRequest, models::AuthResponse,
            models::SalesPoint, models::StatusCount, models::RecentOrder, models::DashboardStats,
            models::MessageResponse, error::ErrorBody,
        )
    ),
    tags(
        (name = "freshora", description = "Freshora marketplace API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single immutable container of every shared service, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence port.
    pub repo: RepositoryState,
    /// Identity & role registry, built over the same repository.
    pub registry: RegistryState,
    /// The loaded environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the registry from the configuration so the admin secret and signing key
    /// reach it as explicit dependencies.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let registry = IdentityRegistry::new(
            repo.clone(),
            RegistryConfig {
                admin_secret: config.admin_secret.clone(),
                jwt_secret: config.jwt_secret.clone(),
                token_ttl: config.token_ttl,
            },
        );
        Self {
            repo,
            registry: std::sync::Arc::new(registry),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. The `Identity` extractor rejects with 401 when the
/// token is missing or invalid; on success the identity is stashed in the request
/// extensions so the handler's own `Identity` argument resolves without re-decoding.
async fn auth_middleware(identity: Identity, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies scoped and global middleware, and registers state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin routes carry their own authenticate-then-authorize layer.
        .nest("/admin", admin::admin_routes(state.clone()))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: every log line of a request carries its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
