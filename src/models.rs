use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles & Statuses ---

/// Role
///
/// The closed set of account roles. Every authorization decision matches on this
/// enum exhaustively; there is no free-form role string anywhere past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    // Older clients send "user" for shoppers.
    #[serde(alias = "user")]
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" | "user" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// OrderStatus
///
/// The five canonical order-lifecycle states tracked by the dashboard histogram.
/// Stored orders keep their raw status string, so values outside this set can exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Histogram order.
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Exact, case-sensitive match against a stored status value.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

// --- Users ---

/// UserRecord
///
/// The registry-owned account row. Carries the Argon2 hash, so it is deliberately
/// neither `Serialize` nor exposed by any handler; see [`UserProfile`].
#[derive(Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    // Some(non-empty) iff role == Seller.
    pub store_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("store_name", &self.store_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// NewUser
///
/// Validated insert payload. Only the registry builds these.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub store_name: Option<String>,
}

/// UserProfile
///
/// Public projection of a [`UserRecord`]: everything except the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            store_name: user.store_name.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            store_name: user.store_name,
            created_at: user.created_at,
        }
    }
}

/// UserChanges
///
/// Fully resolved admin edit, already checked against the Seller invariant.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub store_name: Option<String>,
}

// --- Orders ---

/// LineItem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// BuyerSummary
///
/// The only user fields an order ever carries outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BuyerSummary {
    pub name: String,
    pub email: String,
}

/// Order
///
/// A ledger entry owned by order management. `status` is the raw stored value and is
/// not guaranteed to be one of the [`OrderStatus`] variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<LineItem>,
    pub total_price: f64,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Resolved by the store; None when the buyer account no longer exists.
    pub buyer: Option<BuyerSummary>,
}

// --- Products ---

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: i32,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CustomerRegistration
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CustomerRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// SellerRegistration
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SellerRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub store_name: String,
}

/// AdminRegistration
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    // Absent decodes as empty, which never matches the configured secret.
    #[serde(default)]
    pub admin_secret: String,
}

/// RegisterRequest
///
/// Input payload for `POST /auth/register`, discriminated by the `role` field. Role-specific
/// fields live only on their own variant: a customer request has nowhere to put an admin secret.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
#[ts(export)]
pub enum RegisterRequest {
    #[serde(alias = "user")]
    Customer(CustomerRegistration),
    Seller(SellerRegistration),
    Admin(AdminRegistration),
}

impl RegisterRequest {
    pub fn role(&self) -> Role {
        match self {
            Self::Customer(_) => Role::Customer,
            Self::Seller(_) => Role::Seller,
            Self::Admin(_) => Role::Admin,
        }
    }

    /// (name, email, password) shared by every variant.
    pub fn common(&self) -> (&str, &str, &str) {
        match self {
            Self::Customer(r) => (&r.name, &r.email, &r.password),
            Self::Seller(r) => (&r.name, &r.email, &r.password),
            Self::Admin(r) => (&r.name, &r.email, &r.password),
        }
    }
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UpdateUserRequest
///
/// Partial admin edit of an account (PUT /admin/users/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
}

/// UpdateOrderStatusRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// CreateProductRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
}

/// UpdateProductRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// --- Auth & Dashboard Schemas (Output) ---

/// AuthResponse
///
/// Returned by register and login. `redirect_to` is the client landing route for the role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub role: Role,
    pub user: UserProfile,
    pub redirect_to: String,
}

/// SalesPoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SalesPoint {
    /// UTC calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub sales: f64,
}

/// StatusCount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// RecentOrder
///
/// Dashboard projection of an order; the buyer is reduced to name and email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecentOrder {
    pub id: Uuid,
    pub user: Option<BuyerSummary>,
    pub items: Vec<LineItem>,
    pub total_price: f64,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// DashboardStats
///
/// Output schema for the administrative statistics dashboard (GET /admin/stats).
/// Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_sales: f64,
    pub total_orders: i64,
    pub total_users: i64,
    pub total_products: i64,
    pub sales_data: Vec<SalesPoint>,
    pub order_status_data: Vec<StatusCount>,
    /// Orders whose stored status is none of the canonical five.
    pub unrecognized_status_count: i64,
    pub recent_orders: Vec<RecentOrder>,
}

/// MessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}
