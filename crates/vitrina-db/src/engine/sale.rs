//! # Sale Persister
//!
//! Turns a sale request into a persisted sale with its stock movements and
//! loyalty ledger rows, all inside one SQLite transaction.
//!
//! ## Stages
//! ```text
//! Validated ──► StockReserved ──► TotalsFinalized ──► Persisted ──► LoyaltySettled
//!     │               │                  │                │               │
//!  payment,        decrements        discount,        sale row,      ledger rows,
//!  quantity,       succeeded        cashback,        movements      client state
//!  shift bound                    payment re-check
//! ```
//! A failure at any stage drops the transaction before COMMIT.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::{inventory, loyalty, EngineConfig, EngineResult};
use crate::pool::Database;
use crate::repository::{generate_id, product, sale, shift, SaleDetailsUpdate};
use vitrina_core::inventory::{check_branch, plan_allocation, resolve_branch};
use vitrina_core::pricing::{compute_totals, delivery_paid_by_company, manager_earnings, TotalsInput};
use vitrina_core::shift::check_binding;
use vitrina_core::validation::{
    normalize_optional_text, require_text, validate_non_negative, validate_optional_non_negative,
    validate_quantity,
};
use vitrina_core::{
    CoreError, DeliveryStatus, Money, PaymentDetails, Percent, PricedSnapshot, Sale, SaleType,
    ValidationError, UNKNOWN_MANAGER,
};

// =============================================================================
// Request
// =============================================================================

/// Body of `POST /sales`.
///
/// Money fields are minor units. Missing optional amounts fall back to the
/// product (price, cost, earnings) or are computed (total, discount).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,

    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub total: Option<Money>,

    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,

    /// Cashback the client wants to spend.
    #[serde(default)]
    pub use_cashback: Money,

    #[serde(default)]
    pub payment: PaymentDetails,
    #[serde(default)]
    pub sale_type: SaleType,
    #[serde(default)]
    pub delivery_status: Option<DeliveryStatus>,
    #[serde(default)]
    pub delivery_cost: Option<Money>,
    #[serde(default)]
    pub delivery_paid_by_company: Option<bool>,

    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub shift_id: Option<String>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub manager_name: Option<String>,
    #[serde(default)]
    pub manager_earnings: Option<Money>,
    #[serde(default)]
    pub manual_date: Option<DateTime<Utc>>,
}

impl SaleRequest {
    /// Stateless field checks.
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("productId", &self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_optional_non_negative("unitPrice", self.unit_price)?;
        validate_optional_non_negative("costPrice", self.cost_price)?;
        validate_optional_non_negative("discount", self.discount)?;
        validate_optional_non_negative("total", self.total)?;
        validate_optional_non_negative("deliveryCost", self.delivery_cost)?;
        validate_optional_non_negative("managerEarnings", self.manager_earnings)?;
        validate_non_negative("useCashback", self.use_cashback)?;
        Ok(())
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Progress of one sale through the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SaleStage {
    Validated,
    StockReserved,
    TotalsFinalized,
    Persisted,
    LoyaltySettled,
}

impl SaleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStage::Validated => "validated",
            SaleStage::StockReserved => "stock-reserved",
            SaleStage::TotalsFinalized => "totals-finalized",
            SaleStage::Persisted => "persisted",
            SaleStage::LoyaltySettled => "loyalty-settled",
        }
    }
}

fn reached(sale_id: &str, stage: SaleStage) {
    debug!(sale_id = %sale_id, stage = stage.as_str(), "Sale stage reached");
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleEngine {
    db: Database,
    config: EngineConfig,
}

impl SaleEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        SaleEngine { db, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn create_sale(&self, request: SaleRequest) -> EngineResult<Sale> {
        self.create_sale_at(request, Utc::now()).await
    }

    /// Creates a sale as of `now`.
    ///
    /// ## Errors
    /// - Validation: request fields, payment rules, hybrid/booking sums
    /// - NotFound: product, client by explicit id, shift
    /// - Conflict: stock, branch, shift closed or owned by someone else
    /// - Fatal: storage failures
    pub async fn create_sale_at(&self, request: SaleRequest, now: DateTime<Utc>) -> EngineResult<Sale> {
        request.validate()?;

        let product_id = request.product_id.trim().to_string();
        let manager_id = normalize_optional_text(request.manager_id.as_deref());
        let shift_id = normalize_optional_text(request.shift_id.as_deref());
        let requested_branch = normalize_optional_text(request.branch.as_deref());

        // Labels saved in settings extend the configured ones.
        let stored_labels = self.db.settings().manual_labels().await?;
        let rules = self.config.payment_rules.clone().with_manual_labels(
            self.config
                .payment_rules
                .manual_labels()
                .iter()
                .chain(stored_labels.iter()),
        );
        let payment = rules.validate_intake(&request.payment)?;

        let staff = match &manager_id {
            Some(id) => self.db.staff().get_by_id(id).await?,
            None => None,
        };

        let sale_id = generate_id();
        let sale_date = request.manual_date.unwrap_or(now);

        let mut tx = self.db.pool().begin().await?;

        if let Some(shift_id) = &shift_id {
            let bound = shift::fetch_by_id(&mut tx, shift_id)
                .await?
                .ok_or_else(|| CoreError::ShiftNotFound(shift_id.clone()))?;
            check_binding(&bound, manager_id.as_deref())?;
        }

        let client = loyalty::resolve_client(
            &mut tx,
            request.client_id.as_deref(),
            request.client_phone.as_deref(),
        )
        .await?;
        let quote = match &client {
            Some(client) => Some(loyalty::quote(&mut tx, client, sale_date, now).await?),
            None => None,
        };

        let item = product::fetch_by_id(&mut tx, &product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
        check_branch(&item, requested_branch.as_deref())?;

        reached(&sale_id, SaleStage::Validated);

        let components = if item.is_combo {
            product::fetch_components(&mut tx, &item.combo_items).await?
        } else {
            Vec::new()
        };
        let allocation = plan_allocation(&item, request.quantity, &components, request.cost_price)?;
        let reserved = inventory::reserve_stock(&mut tx, &allocation, now).await?;

        reached(&sale_id, SaleStage::StockReserved);

        let unit_price = request.unit_price.unwrap_or_else(|| item.price());
        let loyalty_percent = quote
            .as_ref()
            .map(|q| q.percent.total)
            .unwrap_or_else(Percent::zero);
        let totals = compute_totals(&TotalsInput {
            unit_price,
            quantity: request.quantity,
            requested_discount: request.discount,
            requested_total: request.total,
            loyalty_percent,
            cashback_requested: request.use_cashback,
            cashback_spendable: quote.as_ref().map(|q| q.spendable).unwrap_or_default(),
        })?;
        rules.verify_settlement(&payment, request.sale_type, totals.total)?;

        let settlement = match &client {
            Some(client) => Some(
                loyalty::plan(
                    &mut tx,
                    client,
                    totals.cashback_applied,
                    totals.total,
                    now,
                    &self.config.loyalty,
                )
                .await?,
            ),
            None => None,
        };

        reached(&sale_id, SaleStage::TotalsFinalized);

        let manager_name = normalize_optional_text(request.manager_name.as_deref())
            .or_else(|| staff.as_ref().map(|s| s.name.clone()))
            .unwrap_or_else(|| UNKNOWN_MANAGER.to_string());
        let client_name = normalize_optional_text(request.client_name.as_deref())
            .or_else(|| client.as_ref().map(|c| c.full_name.clone()))
            .unwrap_or_default();
        let client_phone = normalize_optional_text(request.client_phone.as_deref())
            .or_else(|| client.as_ref().and_then(|c| c.phone.clone()));
        let earnings = manager_earnings(
            staff.as_ref(),
            request.manager_earnings,
            item.manager_earnings(),
            request.quantity,
        )?;

        let record = Sale {
            id: sale_id.clone(),
            product_id: item.id.clone(),
            snapshot: PricedSnapshot {
                product_name: item.name.clone(),
                supplier: item.supplier.clone(),
                unit_price_cents: unit_price.cents(),
                cost_price_cents: allocation.cost_per_unit.cents(),
            },
            quantity: request.quantity,
            client_id: client.as_ref().map(|c| c.id.clone()),
            client_name,
            client_phone,
            client_address: normalize_optional_text(request.client_address.as_deref()),
            comment: normalize_optional_text(request.comment.as_deref()),
            total_cents: totals.total.cents(),
            discount_cents: totals.discount.cents(),
            loyalty_discount_bps: loyalty_percent.bps(),
            cashback_used_cents: totals.cashback_applied.cents(),
            cashback_accrued_cents: settlement.as_ref().map(|p| p.accrued.cents()).unwrap_or(0),
            payment,
            sale_type: request.sale_type,
            delivery_status: request.delivery_status.unwrap_or_default(),
            delivery_cost_cents: request.delivery_cost.unwrap_or_default().cents(),
            delivery_paid_by_company: delivery_paid_by_company(
                request.sale_type,
                request.delivery_paid_by_company,
                &totals,
            ),
            branch: resolve_branch(requested_branch.as_deref(), &item, &self.config.default_branch),
            shift_id,
            manager_id,
            manager_name,
            manager_earnings_cents: earnings.cents(),
            manual_date: request.manual_date,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        sale::insert(&mut tx, &record).await?;
        let reason = allocation.movement_reason(&record.id);
        inventory::record_sale_movements(&mut tx, &reserved, &reason, &record).await?;

        reached(&sale_id, SaleStage::Persisted);

        if let (Some(plan), Some(client)) = (&settlement, &client) {
            loyalty::settle(&mut tx, plan, &client.full_name, &record.id, now).await?;
        }

        reached(&sale_id, SaleStage::LoyaltySettled);

        tx.commit().await?;

        info!(
            sale_id = %record.id,
            product_id = %record.product_id,
            quantity = record.quantity,
            total = record.total_cents,
            payment = record.payment.payment_type().as_str(),
            client_id = ?record.client_id,
            shift_id = ?record.shift_id,
            "Sale created"
        );
        Ok(record)
    }

    pub async fn update_sale(&self, id: &str, update: SaleDetailsUpdate) -> EngineResult<Sale> {
        self.update_sale_at(id, update, Utc::now()).await
    }

    /// Applies a restricted update and returns the stored sale.
    ///
    /// A booking deadline is only accepted on booking sales.
    pub async fn update_sale_at(
        &self,
        id: &str,
        update: SaleDetailsUpdate,
        now: DateTime<Utc>,
    ) -> EngineResult<Sale> {
        let mut tx = self.db.pool().begin().await?;

        let current = sale::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        if update.booking_deadline.is_some() && !matches!(current.payment, PaymentDetails::Booking { .. }) {
            return Err(ValidationError::InvalidFormat {
                field: "bookingDeadline".to_string(),
                reason: "only booking sales have a deadline".to_string(),
            }
            .into());
        }
        if update.is_empty() {
            return Ok(current);
        }

        sale::update_details(&mut tx, id, &update, now).await?;
        let updated = sale::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        tx.commit().await?;

        info!(sale_id = %id, delivery_status = ?updated.delivery_status, "Sale details updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(SaleStage::Validated < SaleStage::StockReserved);
        assert!(SaleStage::Persisted < SaleStage::LoyaltySettled);
        assert_eq!(SaleStage::TotalsFinalized.as_str(), "totals-finalized");
    }

    #[test]
    fn test_request_validation() {
        let mut request = SaleRequest {
            product_id: "p1".into(),
            quantity: 1,
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.quantity = 0;
        assert!(request.validate().is_err());

        request.quantity = -3;
        assert!(request.validate().is_err());

        request.quantity = 10_000;
        assert!(request.validate().is_ok());

        request.quantity = 2;
        request.use_cashback = Money::from_cents(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_wire_defaults() {
        let request: SaleRequest =
            serde_json::from_str(r#"{"productId":"p1","quantity":2}"#).unwrap();
        assert_eq!(request.payment, PaymentDetails::Cash);
        assert_eq!(request.sale_type, SaleType::Office);
        assert!(request.use_cashback.is_zero());
    }
}
