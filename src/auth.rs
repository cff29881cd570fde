use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::AppError, models::Role};

/// Claims
///
/// The JWT payload. Identity and role both travel in the token, so authenticating a
/// request needs no store lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    pub role: Role,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the epoch. Always validated.
    pub exp: usize,
}

/// Identity
///
/// The resolved caller of one request: who they are and which role they hold.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// issue_token
///
/// Signs an HS256 session token for `user_id` that expires `ttl` from now.
pub fn issue_token(user_id: Uuid, role: Role, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let now = unix_now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now as usize,
        exp: (now + ttl.as_secs()) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Server(format!("token signing failed: {e}")))
}

/// decode_token
///
/// Verifies signature and expiry. Any failure (bad signature, malformed token,
/// expired, unknown role in the claims) is `Unauthenticated`.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    // Tokens are rejected the second they expire.
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::Unauthenticated
    })
}

/// authenticate
///
/// First link of the chain: resolves an [`Identity`] from the `Authorization: Bearer` header.
/// The role comes from the token claims alone, so a role change or account deletion takes
/// effect only once the caller logs in again (or the token expires).
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Identity, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    let claims = decode_token(token, secret)?;
    Ok(Identity {
        id: claims.sub,
        role: claims.role,
    })
}

/// authorize
///
/// Second link of the chain: plain RBAC, the identity's role must equal the required one.
pub fn authorize(identity: &Identity, required: Role) -> Result<(), AppError> {
    let allowed = matches!(
        (identity.role, required),
        (Role::Customer, Role::Customer) | (Role::Seller, Role::Seller) | (Role::Admin, Role::Admin)
    );

    if allowed {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            required = %required,
            "Role check failed"
        );
        Err(AppError::Forbidden(format!(
            "Access denied. {} only.",
            capitalized(required)
        )))
    }
}

fn capitalized(role: Role) -> &'static str {
    match role {
        Role::Customer => "Customer",
        Role::Seller => "Seller",
        Role::Admin => "Admin",
    }
}

/// Identity Extractor Implementation
///
/// Makes `Identity` usable as a handler argument. Rejects with `Unauthenticated` (401)
/// when the token is missing or invalid.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The role middleware may already have resolved the caller.
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(*identity);
        }
        let config = AppConfig::from_ref(state);
        authenticate(&parts.headers, &config.jwt_secret)
    }
}

/// require_role
///
/// The full protected-operation chain: authenticate, then authorize, then run the handler.
/// Stops at the first failure, so the handler never executes for a rejected caller.
/// The resolved identity is stored in the request extensions for downstream extractors.
pub async fn require_role(
    config: &AppConfig,
    required: Role,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(request.headers(), &config.jwt_secret)?;
    authorize(&identity, required)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// require_admin
///
/// `require_role` bound to `Role::Admin`, for `middleware::from_fn_with_state`.
pub async fn require_admin(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&config, Role::Admin, request, next).await
}
