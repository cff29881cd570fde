use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use freshora_portal::{
    AppConfig, AppError, AppState, MemoryRepository, create_router,
    auth::{Claims, Identity, issue_token},
    models::Role,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_app_state() -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(MemoryRepository::new()), config)
}

fn create_token(user_id: Uuid, role: Role) -> String {
    issue_token(user_id, role, TEST_JWT_SECRET, Duration::from_secs(3600)).unwrap()
}

fn expired_token(user_id: Uuid, role: Role) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        role,
        iat: (now - 7200) as usize,
        exp: (now - 60) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
}

async fn get_status(uri: &str, token: Option<&str>) -> StatusCode {
    let app = create_router(create_app_state());
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_identity_from_valid_jwt() {
    let state = create_app_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &create_token(TEST_USER_ID, Role::Customer));

    let identity = Identity::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(identity.id, TEST_USER_ID);
    assert_eq!(identity.role, Role::Customer);
}

#[tokio::test]
async fn test_identity_missing_header() {
    let state = create_app_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let result = Identity::from_request_parts(&mut parts, &state).await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn test_identity_expired_jwt() {
    let state = create_app_state();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &expired_token(TEST_USER_ID, Role::Admin));

    let result = Identity::from_request_parts(&mut parts, &state).await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn test_identity_rejects_token_signed_with_other_secret() {
    let state = create_app_state();
    let forged = issue_token(
        TEST_USER_ID,
        Role::Admin,
        "attacker-secret",
        Duration::from_secs(3600),
    )
    .unwrap();
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    with_bearer(&mut parts, &forged);

    let result = Identity::from_request_parts(&mut parts, &state).await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
}

// --- Chain Tests Through The Router ---

#[tokio::test]
async fn test_admin_route_without_token_is_401() {
    assert_eq!(get_status("/admin/stats", None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        get_status("/admin/stats", Some("garbage")).await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        get_status("/admin/users", Some(&expired_token(TEST_USER_ID, Role::Admin))).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_admin_route_with_wrong_role_is_403() {
    for role in [Role::Customer, Role::Seller] {
        let token = create_token(TEST_USER_ID, role);
        for uri in ["/admin/stats", "/admin/users", "/admin/orders"] {
            assert_eq!(
                get_status(uri, Some(&token)).await,
                StatusCode::FORBIDDEN,
                "{role} on {uri}"
            );
        }
    }
}

#[tokio::test]
async fn test_admin_route_with_admin_role_passes() {
    let token = create_token(TEST_USER_ID, Role::Admin);
    assert_eq!(get_status("/admin/stats", Some(&token)).await, StatusCode::OK);
    assert_eq!(get_status("/admin/orders", Some(&token)).await, StatusCode::OK);
}

#[tokio::test]
async fn test_forbidden_body_is_structured() {
    let app = create_router(create_app_state());
    let token = create_token(TEST_USER_ID, Role::Customer);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/stats")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Access denied. Admin only.");
}

#[tokio::test]
async fn test_me_requires_authentication() {
    assert_eq!(get_status("/auth/me", None).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    assert_eq!(get_status("/health", None).await, StatusCode::OK);
}
