//! # Pricing Module
//!
//! Sale total computation, manager earnings and delivery payer inference.
//!
//! ## Total Computation Order
//! ```text
//! subtotal            = unit price × quantity
//! loyalty discount    = round(subtotal × loyalty percent)
//! effective discount  = max(requested discount, loyalty discount)
//! incoming total      = requested total  OR  max(0, subtotal − requested discount)
//! before cashback     = max(0, incoming total − (effective − requested))
//! cashback applied    = min(requested cashback, spendable, before cashback)
//! final total         = max(0, before cashback − cashback applied)
//! ```
//!
//! The loyalty discount is a floor, never added on top of a manual discount.
//! A caller-supplied total is respected except that any shortfall the floor
//! creates is taken off it.

use crate::error::{CoreResult, ValidationError};
use crate::loyalty::usable_cashback;
use crate::money::Money;
use crate::payment::PAYMENT_TOLERANCE;
use crate::types::{Percent, SaleType, Staff};

/// Inputs to [`compute_totals`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalsInput {
    pub unit_price: Money,
    pub quantity: i64,
    pub requested_discount: Option<Money>,
    pub requested_total: Option<Money>,
    pub loyalty_percent: Percent,
    pub cashback_requested: Money,
    /// Balance the matched client may spend (zero without a client).
    pub cashback_spendable: Money,
}

/// Computed monetary fields of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub loyalty_discount: Money,
    pub requested_discount: Money,
    /// Effective discount stored on the sale.
    pub discount: Money,
    pub total_before_cashback: Money,
    pub cashback_applied: Money,
    /// Final amount charged. Never negative.
    pub total: Money,
}

impl SaleTotals {
    /// Subtotal minus the effective discount, clamped at zero.
    pub fn base_total(&self) -> Money {
        (self.subtotal - self.discount).non_negative()
    }
}

/// Computes sale totals.
///
/// ## Errors
/// `ValidationError::Overflow` when price × quantity leaves the `i64` range.
///
/// ## Example
/// ```rust
/// use vitrina_core::money::Money;
/// use vitrina_core::pricing::{compute_totals, TotalsInput};
/// use vitrina_core::types::Percent;
///
/// // 10% base + 5% birthday on 1000.00, caller asked for 50.00 off
/// let totals = compute_totals(&TotalsInput {
///     unit_price: Money::from_major(1_000),
///     quantity: 1,
///     requested_discount: Some(Money::from_major(50)),
///     loyalty_percent: Percent::from_whole(15),
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(totals.discount, Money::from_major(150));
/// assert_eq!(totals.total_before_cashback, Money::from_major(850));
/// ```
pub fn compute_totals(input: &TotalsInput) -> CoreResult<SaleTotals> {
    let subtotal = input
        .unit_price
        .checked_mul(input.quantity)
        .ok_or_else(|| ValidationError::overflow("subtotal"))?
        .non_negative();
    let loyalty_discount = subtotal.percent_of(input.loyalty_percent);
    let requested_discount = input
        .requested_discount
        .unwrap_or_default()
        .non_negative();
    let discount = requested_discount.max(loyalty_discount);
    let floor_shortfall = (discount - requested_discount).non_negative();

    let incoming_total = input
        .requested_total
        .unwrap_or_else(|| (subtotal - requested_discount).non_negative());
    let total_before_cashback = (incoming_total - floor_shortfall).non_negative();

    let cashback_applied = usable_cashback(
        input.cashback_requested,
        input.cashback_spendable,
        total_before_cashback,
    );
    let total = (total_before_cashback - cashback_applied).non_negative();

    Ok(SaleTotals {
        subtotal,
        loyalty_discount,
        requested_discount,
        discount,
        total_before_cashback,
        cashback_applied,
        total,
    })
}

/// Manager earnings for a sale.
///
/// Fixed-salary staff earn nothing; otherwise an explicit override wins over
/// the product's per-unit earning × quantity.
pub fn manager_earnings(
    staff: Option<&Staff>,
    override_amount: Option<Money>,
    per_unit: Money,
    quantity: i64,
) -> CoreResult<Money> {
    if staff.is_some_and(Staff::is_fixed_salary) {
        return Ok(Money::zero());
    }
    match override_amount {
        Some(amount) => Ok(amount),
        None => per_unit
            .checked_mul(quantity)
            .ok_or_else(|| ValidationError::overflow("managerEarnings").into()),
    }
}

/// Who pays delivery.
///
/// Office sales never bill delivery to the company. For delivery sales an
/// explicit answer wins; otherwise the company pays unless the client was
/// charged more than subtotal minus discount (one minor unit of slack).
pub fn delivery_paid_by_company(sale_type: SaleType, explicit: Option<bool>, totals: &SaleTotals) -> bool {
    match sale_type {
        SaleType::Office => false,
        SaleType::Delivery => {
            explicit.unwrap_or_else(|| totals.total <= totals.base_total() + PAYMENT_TOLERANCE)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
