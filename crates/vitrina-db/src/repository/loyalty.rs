//! # Loyalty Ledger Repository
//!
//! Append-only `client_loyalty_transactions`. Rows are inserted by the sale
//! engine and never updated or deleted.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::ClientLoyaltyTransaction;

#[derive(Debug, Clone)]
pub struct LoyaltyTransactionRepository {
    pool: SqlitePool,
}

impl LoyaltyTransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyTransactionRepository { pool }
    }

    /// Ledger of one client, newest first.
    pub async fn list_by_client(&self, client_id: &str, limit: i64) -> DbResult<Vec<ClientLoyaltyTransaction>> {
        let rows: Vec<ClientLoyaltyTransaction> = sqlx::query_as(
            r#"
            SELECT * FROM client_loyalty_transactions
            WHERE client_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Ledger rows written by one sale, in insertion order.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<ClientLoyaltyTransaction>> {
        let rows: Vec<ClientLoyaltyTransaction> = sqlx::query_as(
            "SELECT * FROM client_loyalty_transactions WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

pub async fn insert(conn: &mut SqliteConnection, row: &ClientLoyaltyTransaction) -> DbResult<()> {
    debug!(
        client_id = %row.client_id,
        kind = ?row.kind,
        amount = row.amount_cents,
        "Appending loyalty transaction"
    );

    sqlx::query(
        r#"
        INSERT INTO client_loyalty_transactions (
            id, client_id, sale_id, kind, amount_cents, expires_at, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&row.id)
    .bind(&row.client_id)
    .bind(&row.sale_id)
    .bind(row.kind)
    .bind(row.amount_cents)
    .bind(row.expires_at)
    .bind(&row.note)
    .bind(row.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
