//! # Sale Repository
//!
//! Storage for sales: insert (engine only), lookup, filtered listing and the
//! restricted detail update.
//!
//! ## Payment Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PaymentDetails variant      columns written (others stay NULL)        │
//! │  ──────────────────────      ─────────────────────────────────────     │
//! │  Cash                        payment_type                              │
//! │  Installment                 payment_label (provider), installment_months│
//! │  Hybrid                      hybrid_cash/card/transfer_cents           │
//! │  Booking                     booking_deposit/buyout_cents, deadline    │
//! │  Manual                      payment_label                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrina_core::validation::{clamp_limit, clamp_offset, normalize_optional_text};
use vitrina_core::{
    DeliveryStatus, Money, PaymentDetails, PaymentType, PricedSnapshot, Sale, SaleType,
};

// =============================================================================
// Filters & Updates
// =============================================================================

/// Listing filter for `GET /sales`.
///
/// Date bounds apply to the business date (manual date, else creation time).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub manager_id: Option<String>,
    pub branch: Option<String>,
    pub shift_id: Option<String>,
    pub payment_type: Option<PaymentType>,
    /// Free text over product name, client name and comment.
    pub q: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Fields a persisted sale may still change. Financial fields are not here.
///
/// A provided text field replaces the stored value; blank text clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaleDetailsUpdate {
    pub comment: Option<String>,
    pub client_address: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
    pub booking_deadline: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl SaleDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none()
            && self.client_address.is_none()
            && self.delivery_status.is_none()
            && self.booking_deadline.is_none()
            && self.updated_by.is_none()
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat `sales` row; [`SaleRow::into_sale`] rebuilds the tagged payment.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    product_id: String,
    product_name: String,
    supplier_snapshot: Option<String>,
    unit_price_cents: i64,
    cost_price_cents: i64,
    quantity: i64,
    client_id: Option<String>,
    client_name: String,
    client_phone: Option<String>,
    client_address: Option<String>,
    comment: Option<String>,
    total_cents: i64,
    discount_cents: i64,
    loyalty_discount_bps: u32,
    cashback_used_cents: i64,
    cashback_accrued_cents: i64,
    payment_type: PaymentType,
    payment_label: Option<String>,
    installment_months: Option<i64>,
    hybrid_cash_cents: Option<i64>,
    hybrid_card_cents: Option<i64>,
    hybrid_transfer_cents: Option<i64>,
    booking_deposit_cents: Option<i64>,
    booking_buyout_cents: Option<i64>,
    booking_deadline: Option<DateTime<Utc>>,
    sale_type: SaleType,
    delivery_status: DeliveryStatus,
    delivery_cost_cents: i64,
    delivery_paid_by_company: bool,
    branch: String,
    shift_id: Option<String>,
    manager_id: Option<String>,
    manager_name: String,
    manager_earnings_cents: i64,
    manual_date: Option<DateTime<Utc>>,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(mut self) -> DbResult<Sale> {
        let cents = |value: Option<i64>| Money::from_cents(value.unwrap_or(0));

        let payment = match self.payment_type {
            PaymentType::Cash => PaymentDetails::Cash,
            PaymentType::Installment => {
                let months = self.installment_months.unwrap_or(0);
                PaymentDetails::Installment {
                    provider: self
                        .payment_label
                        .take()
                        .ok_or_else(|| DbError::corrupt("Sale", &self.id, "installment without provider"))?,
                    months: u32::try_from(months)
                        .map_err(|_| DbError::corrupt("Sale", &self.id, "invalid installment months"))?,
                }
            }
            PaymentType::Hybrid => PaymentDetails::Hybrid {
                cash: cents(self.hybrid_cash_cents),
                card: cents(self.hybrid_card_cents),
                transfer: cents(self.hybrid_transfer_cents),
            },
            PaymentType::Booking => PaymentDetails::Booking {
                deposit: cents(self.booking_deposit_cents),
                buyout: cents(self.booking_buyout_cents),
                deadline: self.booking_deadline,
            },
            PaymentType::Manual => PaymentDetails::Manual {
                label: self
                    .payment_label
                    .take()
                    .ok_or_else(|| DbError::corrupt("Sale", &self.id, "manual payment without label"))?,
            },
        };

        Ok(Sale {
            id: self.id,
            product_id: self.product_id,
            snapshot: PricedSnapshot {
                product_name: self.product_name,
                supplier: self.supplier_snapshot,
                unit_price_cents: self.unit_price_cents,
                cost_price_cents: self.cost_price_cents,
            },
            quantity: self.quantity,
            client_id: self.client_id,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_address: self.client_address,
            comment: self.comment,
            total_cents: self.total_cents,
            discount_cents: self.discount_cents,
            loyalty_discount_bps: self.loyalty_discount_bps,
            cashback_used_cents: self.cashback_used_cents,
            cashback_accrued_cents: self.cashback_accrued_cents,
            payment,
            sale_type: self.sale_type,
            delivery_status: self.delivery_status,
            delivery_cost_cents: self.delivery_cost_cents,
            delivery_paid_by_company: self.delivery_paid_by_company,
            branch: self.branch,
            shift_id: self.shift_id,
            manager_id: self.manager_id,
            manager_name: self.manager_name,
            manager_earnings_cents: self.manager_earnings_cents,
            manual_date: self.manual_date,
            updated_by: self.updated_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Variant columns of a payment, NULL where the variant has no such field.
#[derive(Debug, Default)]
struct PaymentColumns {
    label: Option<String>,
    installment_months: Option<i64>,
    hybrid_cash: Option<i64>,
    hybrid_card: Option<i64>,
    hybrid_transfer: Option<i64>,
    booking_deposit: Option<i64>,
    booking_buyout: Option<i64>,
    booking_deadline: Option<DateTime<Utc>>,
}

impl From<&PaymentDetails> for PaymentColumns {
    fn from(payment: &PaymentDetails) -> Self {
        match payment {
            PaymentDetails::Cash => PaymentColumns::default(),
            PaymentDetails::Installment { provider, months } => PaymentColumns {
                label: Some(provider.clone()),
                installment_months: Some(i64::from(*months)),
                ..Default::default()
            },
            PaymentDetails::Hybrid {
                cash,
                card,
                transfer,
            } => PaymentColumns {
                hybrid_cash: Some(cash.cents()),
                hybrid_card: Some(card.cents()),
                hybrid_transfer: Some(transfer.cents()),
                ..Default::default()
            },
            PaymentDetails::Booking {
                deposit,
                buyout,
                deadline,
            } => PaymentColumns {
                booking_deposit: Some(deposit.cents()),
                booking_buyout: Some(buyout.cents()),
                booking_deadline: *deadline,
                ..Default::default()
            },
            PaymentDetails::Manual { label } => PaymentColumns {
                label: Some(label.clone()),
                ..Default::default()
            },
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Sales bound to a cash shift, oldest first.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_shift(&mut conn, shift_id).await
    }

    /// Filtered listing, newest first.
    ///
    /// ## Limits
    /// `limit` is clamped to 1..=500 (default 200), `offset` to ≥ 0.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM sales WHERE 1 = 1");

        let text = |value: &Option<String>| normalize_optional_text(value.as_deref());

        if let Some(manager_id) = text(&filter.manager_id) {
            query.push(" AND manager_id = ").push_bind(manager_id);
        }
        if let Some(branch) = text(&filter.branch) {
            query.push(" AND branch = ").push_bind(branch);
        }
        if let Some(shift_id) = text(&filter.shift_id) {
            query.push(" AND shift_id = ").push_bind(shift_id);
        }
        if let Some(payment_type) = filter.payment_type {
            query.push(" AND payment_type = ").push_bind(payment_type);
        }
        if let Some(q) = text(&filter.q) {
            query
                .push(" AND search_text LIKE ")
                .push_bind(like_pattern(&q))
                .push(" ESCAPE '\\'");
        }
        if let Some(from) = filter.date_from {
            query.push(" AND COALESCE(manual_date, created_at) >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            query.push(" AND COALESCE(manual_date, created_at) <= ").push_bind(to);
        }

        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(clamp_limit(filter.limit))
            .push(" OFFSET ")
            .push_bind(clamp_offset(filter.offset));

        debug!(sql = %query.sql(), "Listing sales");

        let rows: Vec<SaleRow> = query.build_query_as::<SaleRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(SaleRow::into_sale).collect()
    }
}

// =============================================================================
// Search Text
// =============================================================================

/// Lowercased haystack stored in `sales.search_text`.
///
/// Fields are joined by a newline so a query cannot match across two of them.
pub(crate) fn search_text(product_name: &str, client_name: &str, comment: Option<&str>) -> String {
    [product_name, client_name, comment.unwrap_or_default()]
        .join("\n")
        .to_lowercase()
}

/// `%q%` pattern over [`search_text`] with LIKE metacharacters escaped.
fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Connection-level Operations
// =============================================================================

pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let row: Option<SaleRow> = sqlx::query_as("SELECT * FROM sales WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(SaleRow::into_sale).transpose()
}

pub async fn fetch_by_shift(conn: &mut SqliteConnection, shift_id: &str) -> DbResult<Vec<Sale>> {
    let rows: Vec<SaleRow> =
        sqlx::query_as("SELECT * FROM sales WHERE shift_id = ?1 ORDER BY created_at, rowid")
            .bind(shift_id)
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter().map(SaleRow::into_sale).collect()
}

/// Inserts a fully computed sale.
pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total = sale.total_cents, payment = ?sale.payment.payment_type(), "Inserting sale");

    let payment = PaymentColumns::from(&sale.payment);

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, product_id, product_name, supplier_snapshot, unit_price_cents,
            cost_price_cents, quantity, client_id, client_name, client_phone,
            client_address, comment, total_cents, discount_cents, loyalty_discount_bps,
            cashback_used_cents, cashback_accrued_cents, payment_type, payment_label,
            installment_months, hybrid_cash_cents, hybrid_card_cents, hybrid_transfer_cents,
            booking_deposit_cents, booking_buyout_cents, booking_deadline, sale_type,
            delivery_status, delivery_cost_cents, delivery_paid_by_company, branch,
            shift_id, manager_id, manager_name, manager_earnings_cents, manual_date,
            updated_by, created_at, updated_at, search_text
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19,
            ?20, ?21, ?22, ?23,
            ?24, ?25, ?26, ?27,
            ?28, ?29, ?30, ?31,
            ?32, ?33, ?34, ?35, ?36,
            ?37, ?38, ?39, ?40
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.product_id)
    .bind(&sale.snapshot.product_name)
    .bind(&sale.snapshot.supplier)
    .bind(sale.snapshot.unit_price_cents)
    .bind(sale.snapshot.cost_price_cents)
    .bind(sale.quantity)
    .bind(&sale.client_id)
    .bind(&sale.client_name)
    .bind(&sale.client_phone)
    .bind(&sale.client_address)
    .bind(&sale.comment)
    .bind(sale.total_cents)
    .bind(sale.discount_cents)
    .bind(sale.loyalty_discount_bps)
    .bind(sale.cashback_used_cents)
    .bind(sale.cashback_accrued_cents)
    .bind(sale.payment.payment_type())
    .bind(payment.label)
    .bind(payment.installment_months)
    .bind(payment.hybrid_cash)
    .bind(payment.hybrid_card)
    .bind(payment.hybrid_transfer)
    .bind(payment.booking_deposit)
    .bind(payment.booking_buyout)
    .bind(payment.booking_deadline)
    .bind(sale.sale_type)
    .bind(sale.delivery_status)
    .bind(sale.delivery_cost_cents)
    .bind(sale.delivery_paid_by_company)
    .bind(&sale.branch)
    .bind(&sale.shift_id)
    .bind(&sale.manager_id)
    .bind(&sale.manager_name)
    .bind(sale.manager_earnings_cents)
    .bind(sale.manual_date)
    .bind(&sale.updated_by)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(search_text(
        &sale.snapshot.product_name,
        &sale.client_name,
        sale.comment.as_deref(),
    ))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Applies a restricted detail update. Returns `false` when no row matched.
pub async fn update_details(
    conn: &mut SqliteConnection,
    id: &str,
    update: &SaleDetailsUpdate,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    debug!(id = %id, "Updating sale details");

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE sales SET updated_at = ");
    query.push_bind(now);

    if let Some(comment) = &update.comment {
        query
            .push(", comment = ")
            .push_bind(normalize_optional_text(Some(comment.as_str())));
    }
    if let Some(address) = &update.client_address {
        query
            .push(", client_address = ")
            .push_bind(normalize_optional_text(Some(address.as_str())));
    }
    if let Some(status) = update.delivery_status {
        query.push(", delivery_status = ").push_bind(status);
    }
    if let Some(deadline) = update.booking_deadline {
        query.push(", booking_deadline = ").push_bind(deadline);
    }
    if let Some(updated_by) = &update.updated_by {
        query
            .push(", updated_by = ")
            .push_bind(normalize_optional_text(Some(updated_by.as_str())));
    }

    query.push(" WHERE id = ").push_bind(id.to_string());

    let result = query.build().execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    if update.comment.is_some() {
        refresh_search_text(conn, id).await?;
    }
    Ok(true)
}

async fn refresh_search_text(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let fields: Option<(String, String, Option<String>)> =
        sqlx::query_as("SELECT product_name, client_name, comment FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some((product_name, client_name, comment)) = fields {
        sqlx::query("UPDATE sales SET search_text = ?1 WHERE id = ?2")
            .bind(search_text(&product_name, &client_name, comment.as_deref()))
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_text_folds_cyrillic() {
        assert_eq!(
            search_text("Кресло ОФИСНОЕ", "Айгерим", Some("Доставка")),
            "кресло офисное\nайгерим\nдоставка"
        );
        assert_eq!(search_text("Стол", "", None), "стол\n\n");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("КРЕСЛО"), "%кресло%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
