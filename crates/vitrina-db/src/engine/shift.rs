//! # Cash Shift Service
//!
//! Open, report and close cash shifts. Sales bind to an open shift through
//! `SaleEngine`; this service owns the rest of the lifecycle.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::{EngineError, EngineResult};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{generate_id, sale, shift};
use vitrina_core::shift::{build_report, expected_cash, outstanding_debt, reconcile, ShiftReport, ShiftTotals};
use vitrina_core::validation::{normalize_optional_text, require_text, validate_non_negative};
use vitrina_core::{CashShift, CoreError, Money, ShiftStatus};

/// Default number of shifts returned by a listing.
pub const DEFAULT_SHIFT_LIMIT: i64 = 50;

/// Upper bound for a shift listing.
pub const MAX_SHIFT_LIMIT: i64 = 200;

/// Body of `POST /cash-shifts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    pub cashier_id: String,
    pub cashier_name: String,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub opening_cash: Money,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /cash-shifts/{id}/close`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub closing_cash: Money,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ShiftService {
    db: Database,
}

impl ShiftService {
    pub fn new(db: Database) -> Self {
        ShiftService { db }
    }

    pub async fn open(&self, request: OpenShiftRequest) -> EngineResult<CashShift> {
        self.open_at(request, Utc::now()).await
    }

    /// Opens a shift, carrying the cashier's outstanding debt into it.
    pub async fn open_at(&self, request: OpenShiftRequest, now: DateTime<Utc>) -> EngineResult<CashShift> {
        let cashier_id = require_text("cashierId", &request.cashier_id)?;
        let cashier_name = require_text("cashierName", &request.cashier_name)?;
        validate_non_negative("openingCash", request.opening_cash)?;

        let mut tx = self.db.pool().begin().await?;

        if shift::fetch_open_for_cashier(&mut tx, &cashier_id).await?.is_some() {
            return Err(CoreError::ShiftAlreadyOpen(cashier_id).into());
        }

        let closed = shift::fetch_closed_for_cashier(&mut tx, &cashier_id).await?;
        let debt_before = outstanding_debt(&closed);

        let opened = CashShift {
            id: generate_id(),
            cashier_id: cashier_id.clone(),
            cashier_name,
            branch_name: normalize_optional_text(request.branch_name.as_deref()),
            status: ShiftStatus::Open,
            opened_at: now,
            closed_at: None,
            opening_cash_cents: request.opening_cash.cents(),
            closing_cash_cents: None,
            expected_cash_cents: None,
            difference_cents: None,
            debt_before_cents: Some(debt_before.cents()),
            shortage_cents: None,
            overage_cents: None,
            debt_after_cents: None,
            note_open: normalize_optional_text(request.note.as_deref()),
            note_close: None,
            created_at: now,
            updated_at: now,
        };

        // The partial unique index catches a concurrent open.
        match shift::insert(&mut tx, &opened).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CoreError::ShiftAlreadyOpen(cashier_id).into());
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        info!(
            shift_id = %opened.id,
            cashier_id = %opened.cashier_id,
            opening_cash = opened.opening_cash_cents,
            debt_before = debt_before.cents(),
            "Cash shift opened"
        );
        Ok(opened)
    }

    /// The cashier's open shift, if any.
    pub async fn current(&self, cashier_id: &str) -> EngineResult<Option<CashShift>> {
        let cashier_id = require_text("cashierId", cashier_id)?;
        Ok(self.db.shifts().current_for_cashier(&cashier_id).await?)
    }

    pub async fn get(&self, id: &str) -> EngineResult<CashShift> {
        self.db
            .shifts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::ShiftNotFound(id.to_string())))
    }

    /// Shifts newest first; limit defaults to 50 and is clamped to 1..=200.
    pub async fn list(&self, cashier_id: Option<&str>, limit: Option<i64>) -> EngineResult<Vec<CashShift>> {
        let cashier_id = normalize_optional_text(cashier_id);
        let limit = limit.unwrap_or(DEFAULT_SHIFT_LIMIT).clamp(1, MAX_SHIFT_LIMIT);
        Ok(self.db.shifts().list(cashier_id.as_deref(), limit).await?)
    }

    /// Revenue breakdown and expected cash for a shift, open or closed.
    pub async fn report(&self, id: &str) -> EngineResult<ShiftReport> {
        let current = self.get(id).await?;
        let sales = self.db.sales().list_by_shift(id).await?;
        Ok(build_report(current, sales))
    }

    pub async fn close(&self, id: &str, request: CloseShiftRequest) -> EngineResult<ShiftReport> {
        self.close_at(id, request, Utc::now()).await
    }

    /// Counts the drawer against expected cash and closes the shift.
    pub async fn close_at(
        &self,
        id: &str,
        request: CloseShiftRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<ShiftReport> {
        validate_non_negative("closingCash", request.closing_cash)?;

        let mut tx = self.db.pool().begin().await?;

        let current = shift::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(id.to_string()))?;
        if !current.is_open() {
            return Err(CoreError::ShiftClosed(id.to_string()).into());
        }

        let sales = sale::fetch_by_shift(&mut tx, id).await?;
        let totals = ShiftTotals::from_sales(&sales);
        let debt_before = Money::from_cents(current.debt_before_cents.unwrap_or(0));
        let reconciliation = reconcile(request.closing_cash, expected_cash(&current, &totals), debt_before);

        let note = normalize_optional_text(request.note.as_deref());
        if !shift::close(&mut tx, id, &reconciliation, note.as_deref(), now).await? {
            return Err(CoreError::ShiftClosed(id.to_string()).into());
        }

        let closed = shift::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ShiftNotFound(id.to_string()))?;

        tx.commit().await?;

        if reconciliation.shortage.is_positive() {
            warn!(
                shift_id = %id,
                shortage = reconciliation.shortage.cents(),
                debt_after = reconciliation.debt_after.cents(),
                "Cash shift closed short"
            );
        }
        info!(
            shift_id = %id,
            orders = totals.total_orders,
            expected = reconciliation.expected_cash.cents(),
            closing = reconciliation.closing_cash.cents(),
            "Cash shift closed"
        );

        Ok(build_report(closed, sales))
    }
}
