//! # Cash Shift Repository
//!
//! Storage for cash shifts. Lifecycle rules (one open shift per cashier,
//! carried debt, reconciliation) live in `engine::shift`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::shift::Reconciliation;
use vitrina_core::CashShift;

#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashShift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// The cashier's open shift, if any.
    pub async fn current_for_cashier(&self, cashier_id: &str) -> DbResult<Option<CashShift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open_for_cashier(&mut conn, cashier_id).await
    }

    /// Shifts newest first, optionally for one cashier.
    pub async fn list(&self, cashier_id: Option<&str>, limit: i64) -> DbResult<Vec<CashShift>> {
        let shifts: Vec<CashShift> = sqlx::query_as(
            r#"
            SELECT * FROM cash_shifts
            WHERE (?1 IS NULL OR cashier_id = ?1)
            ORDER BY opened_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(cashier_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }
}

// =============================================================================
// Connection-level Operations
// =============================================================================

pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<CashShift>> {
    let shift: Option<CashShift> = sqlx::query_as("SELECT * FROM cash_shifts WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(shift)
}

pub async fn fetch_open_for_cashier(
    conn: &mut SqliteConnection,
    cashier_id: &str,
) -> DbResult<Option<CashShift>> {
    let shift: Option<CashShift> = sqlx::query_as(
        "SELECT * FROM cash_shifts WHERE cashier_id = ?1 AND status = 'open' ORDER BY opened_at DESC LIMIT 1",
    )
    .bind(cashier_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

/// Closed shifts of a cashier, oldest first (the order debt is folded in).
pub async fn fetch_closed_for_cashier(
    conn: &mut SqliteConnection,
    cashier_id: &str,
) -> DbResult<Vec<CashShift>> {
    let shifts: Vec<CashShift> = sqlx::query_as(
        r#"
        SELECT * FROM cash_shifts
        WHERE cashier_id = ?1 AND status = 'closed'
        ORDER BY opened_at ASC, rowid ASC
        "#,
    )
    .bind(cashier_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(shifts)
}

pub async fn insert(conn: &mut SqliteConnection, shift: &CashShift) -> DbResult<()> {
    debug!(id = %shift.id, cashier_id = %shift.cashier_id, "Opening cash shift");

    sqlx::query(
        r#"
        INSERT INTO cash_shifts (
            id, cashier_id, cashier_name, branch_name, status,
            opened_at, closed_at, opening_cash_cents, closing_cash_cents,
            expected_cash_cents, difference_cents, debt_before_cents,
            shortage_cents, overage_cents, debt_after_cents,
            note_open, note_close, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14, ?15,
            ?16, ?17, ?18, ?19
        )
        "#,
    )
    .bind(&shift.id)
    .bind(&shift.cashier_id)
    .bind(&shift.cashier_name)
    .bind(&shift.branch_name)
    .bind(shift.status)
    .bind(shift.opened_at)
    .bind(shift.closed_at)
    .bind(shift.opening_cash_cents)
    .bind(shift.closing_cash_cents)
    .bind(shift.expected_cash_cents)
    .bind(shift.difference_cents)
    .bind(shift.debt_before_cents)
    .bind(shift.shortage_cents)
    .bind(shift.overage_cents)
    .bind(shift.debt_after_cents)
    .bind(&shift.note_open)
    .bind(&shift.note_close)
    .bind(shift.created_at)
    .bind(shift.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the reconciliation and flips the shift to closed.
///
/// Returns `false` when the shift was not open (nothing written).
pub async fn close(
    conn: &mut SqliteConnection,
    id: &str,
    reconciliation: &Reconciliation,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, closing = reconciliation.closing_cash.cents(), "Closing cash shift");

    let result = sqlx::query(
        r#"
        UPDATE cash_shifts SET
            status = 'closed',
            closed_at = ?2,
            closing_cash_cents = ?3,
            expected_cash_cents = ?4,
            difference_cents = ?5,
            shortage_cents = ?6,
            overage_cents = ?7,
            debt_after_cents = ?8,
            note_close = ?9,
            updated_at = ?2
        WHERE id = ?1 AND status = 'open'
        "#,
    )
    .bind(id)
    .bind(now)
    .bind(reconciliation.closing_cash.cents())
    .bind(reconciliation.expected_cash.cents())
    .bind(reconciliation.difference.cents())
    .bind(reconciliation.shortage.cents())
    .bind(reconciliation.overage.cents())
    .bind(reconciliation.debt_after.cents())
    .bind(note)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
