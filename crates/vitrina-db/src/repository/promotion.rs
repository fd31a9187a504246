//! # Promotion Repository
//!
//! Client discount windows. Window matching against the sale date happens in
//! `vitrina_core::loyalty`; this module only narrows by status and scope.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::ClientPromotion;

#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    pub async fn insert(&self, promotion: &ClientPromotion) -> DbResult<ClientPromotion> {
        debug!(id = %promotion.id, title = %promotion.title, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO client_promotions (
                id, client_id, title, discount_bps, starts_at, ends_at, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.client_id)
        .bind(&promotion.title)
        .bind(promotion.discount_bps)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.is_active)
        .bind(promotion.created_at)
        .execute(&self.pool)
        .await?;

        Ok(promotion.clone())
    }

    /// Global promotions plus those scoped to `client_id`, newest first.
    ///
    /// Without a client every promotion is listed.
    pub async fn list(&self, client_id: Option<&str>, limit: i64) -> DbResult<Vec<ClientPromotion>> {
        let promotions: Vec<ClientPromotion> = match client_id {
            Some(client_id) => {
                sqlx::query_as(
                    r#"
                    SELECT * FROM client_promotions
                    WHERE client_id IS NULL OR client_id = ?1
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?2
                    "#,
                )
                .bind(client_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM client_promotions ORDER BY created_at DESC, rowid DESC LIMIT ?1")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(promotions)
    }
}

/// Active promotions that are global or scoped to `client_id`.
pub async fn fetch_active_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> DbResult<Vec<ClientPromotion>> {
    let promotions: Vec<ClientPromotion> = sqlx::query_as(
        r#"
        SELECT * FROM client_promotions
        WHERE is_active = 1 AND (client_id IS NULL OR client_id = ?1)
        ORDER BY created_at
        "#,
    )
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(promotions)
}
