use crate::{
    AppState,
    auth::Identity,
    error::{AppError, Result},
    models::{
        AuthResponse, CreateProductRequest, DashboardStats, LoginRequest, MessageResponse, Order,
        Product, RegisterRequest, UpdateOrderStatusRequest, UpdateProductRequest,
        UpdateUserRequest, UserProfile,
    },
    stats,
};
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

// --- Extractors ---

/// AppJson
///
/// `axum::Json` whose rejection is an `AppError`, so malformed bodies get the same
/// `{message}` shape as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// AppPath
///
/// `axum::extract::Path` with the same `{message}` rejection, so a malformed id is a
/// JSON 400 like any other bad input.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// --- Identity Handlers ---

/// register
///
/// [Public Route] Creates an account for the role named in the body and signs it in.
/// Admin registrations must carry the configured admin secret.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or email taken", body = crate::error::ErrorBody),
        (status = 403, description = "Bad admin secret", body = crate::error::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state.registry.register(payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// login
///
/// [Public Route] Exchanges email and password for a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.registry.login(payload).await?))
}

/// get_me
///
/// [Authenticated Route] The caller's own profile.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not signed in", body = crate::error::ErrorBody)
    )
)]
pub async fn get_me(identity: Identity, State(state): State<AppState>) -> Result<Json<UserProfile>> {
    Ok(Json(state.registry.profile(identity.id).await?))
}

// --- Admin Handlers ---
// Every handler below sits behind `require_admin`; none of them runs for a rejected caller.

/// get_admin_stats
///
/// [Admin Route] Recomputes the dashboard from the full order ledger on every call.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 401, description = "Not signed in", body = crate::error::ErrorBody),
        (status = 403, description = "Not an admin", body = crate::error::ErrorBody)
    )
)]
pub async fn get_admin_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let (orders, total_users, total_products) = tokio::try_join!(
        state.repo.list_orders(),
        state.repo.count_users(),
        state.repo.count_products(),
    )?;

    Ok(Json(stats::compute_stats(
        &orders,
        total_users,
        total_products,
        Utc::now(),
    )))
}

/// list_users
///
/// [Admin Route] All accounts, newest first. Hashes never leave the registry.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "Users", body = [UserProfile]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// update_user
///
/// [Admin Route] Edits name, email, role or store name.
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 404, description = "Not Found", body = crate::error::ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.registry.update_user(id, payload).await?))
}

/// delete_user
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.repo.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    tracing::info!(user_id = %id, "Deleted account");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// list_orders
///
/// [Admin Route] The full ledger, newest first, with buyer name and email.
#[utoipa::path(
    get,
    path = "/admin/orders",
    responses((status = 200, description = "Orders", body = [Order]))
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.repo.list_orders().await?))
}

/// update_order_status
///
/// [Admin Route] Moves an order to one of the canonical statuses; anything else is
/// rejected by deserialization.
#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Order),
        (status = 404, description = "Not Found", body = crate::error::ErrorBody)
    )
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    state
        .repo
        .update_order_status(id, payload.status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// create_product
#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody)
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    validate_price(payload.price)?;

    let product = state.repo.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// update_product
#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 404, description = "Not Found", body = crate::error::ErrorBody)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if let Some(price) = payload.price {
        validate_price(price)?;
    }
    state
        .repo
        .update_product(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// delete_product
#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.repo.delete_product(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}
