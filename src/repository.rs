use crate::models::{
    BuyerSummary, CreateProductRequest, LineItem, NewUser, Order, OrderStatus, Product, Role,
    UpdateProductRequest, UserChanges, UserRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Callers map these onto the
/// application taxonomy (`Conflict` becomes a validation error, the rest are server errors).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// A stored row could not be mapped onto the domain model.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

const DUPLICATE_EMAIL: &str = "User already exists";

/// Repository Trait
///
/// Abstract contract for every persistence operation the core needs. Handlers and the
/// registry only ever see `Arc<dyn Repository>`, so Postgres and the in-memory store are
/// interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<UserRecord>>;
    /// Must reject a duplicate email with `RepositoryError::Conflict`.
    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord>;
    /// Newest first.
    async fn list_users(&self) -> RepoResult<Vec<UserRecord>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRecord>>;
    async fn delete_user(&self, id: Uuid) -> RepoResult<bool>;
    async fn count_users(&self) -> RepoResult<i64>;

    // --- Orders ---
    /// Full ledger, newest first, each order joined with its buyer's name and email.
    async fn list_orders(&self) -> RepoResult<Vec<Order>>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus)
    -> RepoResult<Option<Order>>;

    // --- Products ---
    async fn count_products(&self) -> RepoResult<i64>;
    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product>;
    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> RepoResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share persistence access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Row Mappings ---

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    store_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(RepositoryError::Corrupt)?;
        Ok(UserRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            store_name: row.store_name,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    items: Json<Vec<LineItem>>,
    total_price: f64,
    status: String,
    created_at: DateTime<Utc>,
    buyer_name: Option<String>,
    buyer_email: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let buyer = match (row.buyer_name, row.buyer_email) {
            (Some(name), Some(email)) => Some(BuyerSummary { name, email }),
            _ => None,
        };
        Order {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
            buyer,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: f64,
    category: String,
    stock: i32,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            stock: row.stock,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// Maps a unique-constraint violation onto `Conflict`, everything else onto `Database`.
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(DUPLICATE_EMAIL.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, store_name, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, stock, image_url, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Email uniqueness is enforced by the `users_email_key` constraint, not by a read-then-write.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    /// create_user
    ///
    /// Single INSERT; a concurrent registration with the same email loses on the
    /// unique index and comes back as `Conflict`.
    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord> {
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, role, store_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.store_name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.try_into()
    }

    async fn list_users(&self) -> RepoResult<Vec<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserRecord::try_from)
            .collect()
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRecord>> {
        let query = format!(
            "UPDATE users SET name = $2, email = $3, role = $4, store_name = $5 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(changes.role.as_str())
            .bind(&changes.store_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count_users(&self) -> RepoResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    /// list_orders
    ///
    /// LEFT JOIN so orders whose buyer was deleted still appear (with no buyer).
    async fn list_orders(&self) -> RepoResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.id, o.user_id, o.items, o.total_price, o.status, o.created_at,
                   u.name AS buyer_name, u.email AS buyer_email
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            WITH updated AS (
                UPDATE orders SET status = $2 WHERE id = $1
                RETURNING id, user_id, items, total_price, status, created_at
            )
            SELECT o.id, o.user_id, o.items, o.total_price, o.status, o.created_at,
                   u.name AS buyer_name, u.email AS buyer_email
            FROM updated o
            LEFT JOIN users u ON u.id = o.user_id
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    async fn count_products(&self) -> RepoResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product> {
        let query = format!(
            "INSERT INTO products (id, name, description, price, category, stock, image_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(&req.description)
            .bind(req.price)
            .bind(&req.category)
            .bind(req.stock)
            .bind(&req.image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    /// update_product
    ///
    /// Uses `COALESCE` so only the provided fields change.
    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> RepoResult<Option<Product>> {
        let query = format!(
            "UPDATE products SET name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                category = COALESCE($5, category), \
                stock = COALESCE($6, stock), \
                image_url = COALESCE($7, image_url) \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .bind(req.name)
            .bind(req.description)
            .bind(req.price)
            .bind(req.category)
            .bind(req.stock)
            .bind(req.image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

/// MemoryRepository
///
/// In-process implementation used by tests and local demos. Registration uniqueness is
/// checked and written under a single write lock, matching the Postgres unique index.
#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<Vec<UserRecord>>,
    orders: RwLock<Vec<Order>>,
    products: RwLock<Vec<Product>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an order as if another service had written it. The `buyer` field is ignored;
    /// reads resolve it against the current user set.
    pub async fn insert_order(&self, order: Order) {
        self.orders.write().await.push(order);
    }

    fn with_buyer(mut order: Order, users: &[UserRecord]) -> Order {
        order.buyer = users
            .iter()
            .find(|u| u.id == order.user_id)
            .map(|u| BuyerSummary {
                name: u.name.clone(),
                email: u.email.clone(),
            });
        order
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<UserRecord>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            store_name: user.store_name,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> RepoResult<Vec<UserRecord>> {
        let mut users = self.users.read().await.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<UserRecord>> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id != id && u.email == changes.email) {
            return Err(RepositoryError::Conflict(DUPLICATE_EMAIL.to_string()));
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.name = changes.name;
        user.email = changes.email;
        user.role = changes.role;
        user.store_name = changes.store_name;
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn count_users(&self) -> RepoResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn list_orders(&self) -> RepoResult<Vec<Order>> {
        let users = self.users.read().await;
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .iter()
            .cloned()
            .map(|o| Self::with_buyer(o, &users))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> RepoResult<Option<Order>> {
        let users = self.users.read().await;
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status.as_str().to_string();
        Ok(Some(Self::with_buyer(order.clone(), &users)))
    }

    async fn count_products(&self) -> RepoResult<i64> {
        Ok(self.products.read().await.len() as i64)
    }

    async fn create_product(&self, req: CreateProductRequest) -> RepoResult<Product> {
        let product = Product {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            stock: req.stock,
            image_url: req.image_url,
            created_at: Utc::now(),
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> RepoResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            product.name = name;
        }
        if let Some(description) = req.description {
            product.description = description;
        }
        if let Some(price) = req.price {
            product.price = price;
        }
        if let Some(category) = req.category {
            product.category = category;
        }
        if let Some(stock) = req.stock {
            product.stock = stock;
        }
        if let Some(image_url) = req.image_url {
            product.image_url = Some(image_url);
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }
}
