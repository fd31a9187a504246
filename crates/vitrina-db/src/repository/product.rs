//! # Product Repository
//!
//! Products, combo components and stock counters.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, subtract in Rust, write back                      │
//! │     UPDATE products SET stock_qty = 3 WHERE id = ?                 │
//! │                                                                     │
//! │  ✅ CORRECT: conditional delta in one statement                    │
//! │     UPDATE products SET stock_qty = stock_qty - 2                  │
//! │     WHERE id = ? AND stock_qty >= 2                                │
//! │     RETURNING stock_qty                                            │
//! │                                                                     │
//! │  No row back means the stock was taken by someone else first.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::{ComboItem, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, with combo components loaded.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Inserts a product and its combo component list.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, combo = product.is_combo, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, supplier,
                cost_price_cents, price_cents, stock_qty, branch_name,
                is_combo, manager_earnings_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.supplier)
        .bind(product.cost_price_cents)
        .bind(product.price_cents)
        .bind(product.stock_qty)
        .bind(&product.branch_name)
        .bind(product.is_combo)
        .bind(product.manager_earnings_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in product.combo_items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO combo_items (combo_id, product_id, quantity, position) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&product.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(product.clone())
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level Operations (usable inside a transaction)
// =============================================================================

/// Loads a product; combo products come back with their components.
pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match product {
        Some(mut product) => {
            if product.is_combo {
                product.combo_items = fetch_combo_items(conn, &product.id).await?;
            }
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

/// Component list of a combo, in configured order.
pub async fn fetch_combo_items(conn: &mut SqliteConnection, combo_id: &str) -> DbResult<Vec<ComboItem>> {
    let items: Vec<ComboItem> = sqlx::query_as(
        "SELECT product_id, quantity FROM combo_items WHERE combo_id = ?1 ORDER BY position, product_id",
    )
    .bind(combo_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Loads the component products of a combo. Missing ids are simply absent
/// from the result; the allocation planner reports them.
pub async fn fetch_components(conn: &mut SqliteConnection, items: &[ComboItem]) -> DbResult<Vec<Product>> {
    let mut components = Vec::with_capacity(items.len());
    for item in items {
        let component: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = ?1")
            .bind(&item.product_id)
            .fetch_optional(&mut *conn)
            .await?;
        components.extend(component);
    }
    Ok(components)
}

/// Atomically takes `quantity` units off the stock.
///
/// ## Returns
/// * `Ok(Some(stock_after))` - decremented
/// * `Ok(None)` - product missing or stock below `quantity`; nothing changed
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>> {
    debug!(id = %id, quantity, "Decrementing stock");

    let stock_after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_qty = stock_qty - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_qty >= ?2
        RETURNING stock_qty
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock_after)
}

/// Adds `quantity` units to the stock; returns the new level.
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>> {
    debug!(id = %id, quantity, "Incrementing stock");

    let stock_after: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_qty = stock_qty + ?2, updated_at = ?3
        WHERE id = ?1
        RETURNING stock_qty
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock_after)
}

/// Sets the stock to an absolute level (inventory adjustment).
pub async fn set_stock(
    conn: &mut SqliteConnection,
    id: &str,
    stock: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<i64>> {
    debug!(id = %id, stock, "Setting stock");

    let stock_after: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock_qty = ?2, updated_at = ?3 WHERE id = ?1 RETURNING stock_qty",
    )
    .bind(id)
    .bind(stock)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stock_after)
}
