//! # Inventory Movement Repository
//!
//! Append-only stock ledger. Every stock change, from a sale or a manual
//! operation, leaves exactly one row per product touched.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::validation::{clamp_limit, clamp_offset};
use vitrina_core::InventoryMovement;

/// Listing filter for `GET /inventory/movements`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub branch: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Movements newest first.
    pub async fn list(&self, filter: &MovementFilter) -> DbResult<Vec<InventoryMovement>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM inventory_movements WHERE 1 = 1");

        if let Some(product_id) = filter.product_id.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(" AND product_id = ").push_bind(product_id.trim().to_string());
        }
        if let Some(branch) = filter.branch.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(" AND branch_name = ").push_bind(branch.trim().to_string());
        }

        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(clamp_limit(filter.limit))
            .push(" OFFSET ")
            .push_bind(clamp_offset(filter.offset));

        let rows: Vec<InventoryMovement> = query
            .build_query_as::<InventoryMovement>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Movements written by one sale, in insertion order.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let rows: Vec<InventoryMovement> =
            sqlx::query_as("SELECT * FROM inventory_movements WHERE sale_id = ?1 ORDER BY rowid")
                .bind(sale_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }
}

pub async fn insert(conn: &mut SqliteConnection, movement: &InventoryMovement) -> DbResult<()> {
    debug!(
        product_id = %movement.product_id,
        movement_type = ?movement.movement_type,
        quantity = movement.quantity,
        stock_after = movement.stock_after,
        "Appending inventory movement"
    );

    sqlx::query(
        r#"
        INSERT INTO inventory_movements (
            id, product_id, product_name, branch_name, movement_type, operation_type,
            quantity, stock_after, reason, actor_id, actor_name, sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.product_name)
    .bind(&movement.branch_name)
    .bind(movement.movement_type)
    .bind(movement.operation_type)
    .bind(movement.quantity)
    .bind(movement.stock_after)
    .bind(&movement.reason)
    .bind(&movement.actor_id)
    .bind(&movement.actor_name)
    .bind(&movement.sale_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
