//! Identity & role registry.
//!
//! Creates accounts, gates the Admin role behind the configured secret, verifies
//! logins and issues session tokens. The registry is the only writer of user rows.

use std::{sync::Arc, time::Duration};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

use crate::{
    auth::issue_token,
    client_routes::resolve_landing_route,
    error::{AppError, Result},
    models::{
        AuthResponse, LoginRequest, NewUser, RegisterRequest, Role, UpdateUserRequest,
        UserChanges, UserProfile, UserRecord,
    },
    repository::RepositoryState,
};

/// RegistryConfig
///
/// Process-wide settings handed to the registry at construction. The admin secret lives
/// here and nowhere else.
#[derive(Clone)]
pub struct RegistryConfig {
    pub admin_secret: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

pub struct IdentityRegistry {
    repo: RepositoryState,
    config: RegistryConfig,
}

impl IdentityRegistry {
    pub fn new(repo: RepositoryState, config: RegistryConfig) -> Self {
        Self { repo, config }
    }

    /// register
    ///
    /// Validates input, checks the admin secret before touching the store, then hashes
    /// and inserts. Returns the new profile with a fresh session token.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let role = request.role();
        let (name, email, password) = request.common();
        let name = required_field("Name", name)?;
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let store_name = match &request {
            RegisterRequest::Customer(_) => None,
            RegisterRequest::Seller(seller) => {
                Some(required_field("Store name", &seller.store_name)?)
            }
            RegisterRequest::Admin(admin) => {
                self.check_admin_secret(&admin.admin_secret)?;
                None
            }
        };

        if self.repo.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Validation("User already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        // The store's unique constraint is the real guard; a lost race comes back as Conflict.
        let user = self
            .repo
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role,
                store_name,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Registered account");
        self.session_for(&user)
    }

    /// login
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            // Burn the same Argon2 cost as a real verification.
            let _ = hash_password(&request.password);
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        verify_password(&request.password, &user.password_hash)?;
        tracing::info!(user_id = %user.id, "Login succeeded");
        self.session_for(&user)
    }

    /// profile
    ///
    /// Current public profile of an identity. `NotFound` if the account has been deleted
    /// since the token was issued.
    pub async fn profile(&self, id: Uuid) -> Result<UserProfile> {
        self.repo
            .get_user(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// update_user
    ///
    /// Admin edit. Keeps the Seller invariant: becoming a Seller needs a store name
    /// (supplied or already present), leaving Seller drops it.
    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> Result<UserProfile> {
        let existing = self
            .repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let name = match request.name {
            Some(name) => required_field("Name", &name)?,
            None => existing.name,
        };
        let email = match request.email {
            Some(email) => normalize_email(&email)?,
            None => existing.email,
        };
        let role = request.role.unwrap_or(existing.role);
        let store_name = match role {
            Role::Seller => {
                let candidate = request.store_name.or(existing.store_name).unwrap_or_default();
                Some(required_field("Store name", &candidate)?)
            }
            Role::Customer | Role::Admin => None,
        };

        let updated = self
            .repo
            .update_user(
                id,
                UserChanges {
                    name,
                    email,
                    role,
                    store_name,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %id, role = %updated.role, "Updated account");
        Ok(updated.into())
    }

    fn check_admin_secret(&self, supplied: &str) -> Result<()> {
        if supplied.is_empty() || supplied != self.config.admin_secret {
            tracing::warn!("Admin registration rejected: bad admin secret");
            return Err(AppError::Forbidden("Invalid admin secret".to_string()));
        }
        Ok(())
    }

    fn session_for(&self, user: &UserRecord) -> Result<AuthResponse> {
        let token = issue_token(
            user.id,
            user.role,
            &self.config.jwt_secret,
            self.config.token_ttl,
        )?;
        Ok(AuthResponse {
            token,
            role: user.role,
            user: UserProfile::from(user),
            redirect_to: resolve_landing_route(Some(user.role)).to_string(),
        })
    }
}

/// Shared handle stored in `AppState`.
pub type RegistryState = Arc<IdentityRegistry>;

fn required_field(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = required_field("Email", raw)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation("Email is invalid".to_string())),
    }
}

/// Hash a password using Argon2id with a random salt.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Server(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash).map_err(|_| AppError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &first).is_ok());
        assert!(matches!(
            verify_password("hunter23", &first),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("   ").is_err());
    }
}
