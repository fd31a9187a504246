//! # Settings Repository
//!
//! Tenant settings the sale engine reads: the manual payment label list.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use vitrina_core::payment::normalize_manual_labels;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Configured manual payment labels, in display order.
    pub async fn manual_labels(&self) -> DbResult<Vec<String>> {
        let labels: Vec<String> =
            sqlx::query_scalar("SELECT label FROM manual_payment_types ORDER BY position, label")
                .fetch_all(&self.pool)
                .await?;

        Ok(labels)
    }

    /// Replaces the label list. Input is normalized first (trimmed, blanks and
    /// reserved hybrid names dropped, case-insensitive duplicates removed).
    pub async fn replace_manual_labels(&self, labels: &[String]) -> DbResult<Vec<String>> {
        let labels = normalize_manual_labels(labels);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM manual_payment_types")
            .execute(&mut *tx)
            .await?;
        for (position, label) in labels.iter().enumerate() {
            sqlx::query("INSERT INTO manual_payment_types (label, position) VALUES (?1, ?2)")
                .bind(label)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!(count = labels.len(), "Manual payment labels replaced");
        Ok(labels)
    }
}
