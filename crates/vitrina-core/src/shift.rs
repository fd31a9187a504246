//! # Cash Shift Module
//!
//! Shift binding for sales and cash reconciliation for the shift lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cash Shift Lifecycle                             │
//! │                                                                         │
//! │   open(opening cash ≥ 0)                                               │
//! │     debt_before = fold over closed shifts: max(0, d + short − over)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   ┌────────┐   sales bind via shift_id                                 │
//! │   │  OPEN  │◄── check_binding(): open + same cashier                   │
//! │   └───┬────┘                                                            │
//! │       │ close(closing cash ≥ 0)                                        │
//! │       ▼                                                                 │
//! │   expected  = opening + cash revenue                                   │
//! │   shortage  = max(0, expected − closing)                               │
//! │   overage   = max(0, closing − expected)                               │
//! │   debt_after = max(0, debt_before + shortage − overage)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   ┌────────┐                                                            │
//! │   │ CLOSED │                                                            │
//! │   └────────┘                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CashShift, PaymentType, Sale};

// =============================================================================
// Sale Binding
// =============================================================================

/// Checks that a sale may be attributed to `shift`.
///
/// The shift must be open and, when the sale names a manager, owned by that
/// manager.
pub fn check_binding(shift: &CashShift, manager_id: Option<&str>) -> CoreResult<()> {
    if !shift.is_open() {
        return Err(CoreError::ShiftClosed(shift.id.clone()));
    }
    if let Some(manager_id) = manager_id {
        if shift.cashier_id != manager_id {
            return Err(CoreError::ShiftCashierMismatch {
                shift_id: shift.id.clone(),
                cashier_id: shift.cashier_id.clone(),
                manager_id: manager_id.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Debt
// =============================================================================

/// Debt carried into a new shift.
///
/// `closed_shifts` must be ordered by `opened_at` ascending.
///
/// ## Example
/// ```text
/// shift 1: shortage 100          → debt 100
/// shift 2: overage   30          → debt  70
/// shift 3: overage  200          → debt   0 (never negative)
/// ```
pub fn outstanding_debt(closed_shifts: &[CashShift]) -> Money {
    closed_shifts.iter().fold(Money::zero(), |debt, shift| {
        let shortage = Money::from_cents(shift.shortage_cents.unwrap_or(0)).non_negative();
        let overage = Money::from_cents(shift.overage_cents.unwrap_or(0)).non_negative();
        (debt + shortage - overage).non_negative()
    })
}

// =============================================================================
// Report
// =============================================================================

/// Revenue per payment type for one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    pub total_orders: i64,
    pub total_revenue: Money,
    pub cash_revenue: Money,
    pub manual_revenue: Money,
    pub installment_revenue: Money,
    pub hybrid_revenue: Money,
    pub booking_revenue: Money,
}

impl ShiftTotals {
    /// Sums sale totals per payment type.
    pub fn from_sales(sales: &[Sale]) -> Self {
        sales.iter().fold(ShiftTotals::default(), |mut acc, sale| {
            let total = sale.total();
            acc.total_orders += 1;
            acc.total_revenue += total;
            match sale.payment.payment_type() {
                PaymentType::Cash => acc.cash_revenue += total,
                PaymentType::Manual => acc.manual_revenue += total,
                PaymentType::Installment => acc.installment_revenue += total,
                PaymentType::Hybrid => acc.hybrid_revenue += total,
                PaymentType::Booking => acc.booking_revenue += total,
            }
            acc
        })
    }
}

/// A shift with its sales and reconciliation figures.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub shift: CashShift,
    pub totals: ShiftTotals,
    pub expected_cash: Money,
    /// Zero while the shift is open.
    pub shortage: Money,
    /// Zero while the shift is open.
    pub overage: Money,
    pub debt_before: Money,
    pub debt_after: Money,
    pub sales: Vec<Sale>,
}

/// Expected drawer cash: opening cash plus cash-sale revenue.
pub fn expected_cash(shift: &CashShift, totals: &ShiftTotals) -> Money {
    Money::from_cents(shift.opening_cash_cents) + totals.cash_revenue
}

/// Builds the report for a shift and the sales bound to it.
pub fn build_report(shift: CashShift, sales: Vec<Sale>) -> ShiftReport {
    let totals = ShiftTotals::from_sales(&sales);
    let expected = expected_cash(&shift, &totals);
    let debt_before = Money::from_cents(shift.debt_before_cents.unwrap_or(0));
    let debt_after = shift
        .debt_after_cents
        .map(Money::from_cents)
        .unwrap_or(debt_before);

    let (shortage, overage) = match shift.closing_cash_cents {
        Some(closing) if !shift.is_open() => {
            let closing = Money::from_cents(closing);
            (
                (expected - closing).non_negative(),
                (closing - expected).non_negative(),
            )
        }
        _ => (Money::zero(), Money::zero()),
    };

    ShiftReport {
        shift,
        totals,
        expected_cash: expected,
        shortage,
        overage,
        debt_before,
        debt_after,
        sales,
    }
}

// =============================================================================
// Close Reconciliation
// =============================================================================

/// Figures written onto a shift when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub closing_cash: Money,
    pub expected_cash: Money,
    /// closing − expected (negative when short).
    pub difference: Money,
    pub shortage: Money,
    pub overage: Money,
    pub debt_after: Money,
}

/// Reconciles counted cash against the expected amount.
///
/// ## Example
/// ```rust
/// use vitrina_core::money::Money;
/// use vitrina_core::shift::reconcile;
///
/// let r = reconcile(Money::from_major(900), Money::from_major(1_000), Money::from_major(50));
/// assert_eq!(r.shortage, Money::from_major(100));
/// assert_eq!(r.difference, Money::from_major(-100));
/// assert_eq!(r.debt_after, Money::from_major(150));
/// ```
pub fn reconcile(closing_cash: Money, expected_cash: Money, debt_before: Money) -> Reconciliation {
    let shortage = (expected_cash - closing_cash).non_negative();
    let overage = (closing_cash - expected_cash).non_negative();
    Reconciliation {
        closing_cash,
        expected_cash,
        difference: closing_cash - expected_cash,
        shortage,
        overage,
        debt_after: (debt_before.non_negative() + shortage - overage).non_negative(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentDetails;
    use crate::types::{DeliveryStatus, PricedSnapshot, SaleType, ShiftStatus};
    use chrono::Utc;

    fn shift(status: ShiftStatus) -> CashShift {
        CashShift {
            id: "shift-1".into(),
            cashier_id: "cashier-1".into(),
            cashier_name: "Nurlan".into(),
            branch_name: None,
            status,
            opened_at: Utc::now(),
            closed_at: None,
            opening_cash_cents: 10_000,
            closing_cash_cents: None,
            expected_cash_cents: None,
            difference_cents: None,
            debt_before_cents: Some(0),
            shortage_cents: None,
            overage_cents: None,
            debt_after_cents: None,
            note_open: None,
            note_close: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sale(total: i64, payment: PaymentDetails) -> Sale {
        Sale {
            id: "s".into(),
            product_id: "p".into(),
            snapshot: PricedSnapshot {
                product_name: "Phone".into(),
                supplier: None,
                unit_price_cents: total,
                cost_price_cents: 0,
            },
            quantity: 1,
            client_id: None,
            client_name: String::new(),
            client_phone: None,
            client_address: None,
            comment: None,
            total_cents: total,
            discount_cents: 0,
            loyalty_discount_bps: 0,
            cashback_used_cents: 0,
            cashback_accrued_cents: 0,
            payment,
            sale_type: SaleType::Office,
            delivery_status: DeliveryStatus::Reserved,
            delivery_cost_cents: 0,
            delivery_paid_by_company: false,
            branch: "Центральный".into(),
            shift_id: Some("shift-1".into()),
            manager_id: None,
            manager_name: "Unknown".into(),
            manager_earnings_cents: 0,
            manual_date: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_binding_rules() {
        let open = shift(ShiftStatus::Open);
        assert!(check_binding(&open, None).is_ok());
        assert!(check_binding(&open, Some("cashier-1")).is_ok());
        assert!(matches!(
            check_binding(&open, Some("cashier-2")),
            Err(CoreError::ShiftCashierMismatch { .. })
        ));
        assert!(matches!(
            check_binding(&shift(ShiftStatus::Closed), None),
            Err(CoreError::ShiftClosed(_))
        ));
    }

    #[test]
    fn test_outstanding_debt_fold() {
        let closed = |short: i64, over: i64| CashShift {
            shortage_cents: Some(short),
            overage_cents: Some(over),
            ..shift(ShiftStatus::Closed)
        };
        let history = vec![closed(100, 0), closed(0, 30), closed(0, 200), closed(40, 0)];
        assert_eq!(outstanding_debt(&history).cents(), 40);
        assert!(outstanding_debt(&[]).is_zero());
    }

    #[test]
    fn test_report_totals() {
        let sales = vec![
            sale(1_000, PaymentDetails::Cash),
            sale(2_000, PaymentDetails::Cash),
            sale(
                500,
                PaymentDetails::Manual {
                    label: "Kaspi".into(),
                },
            ),
            sale(
                700,
                PaymentDetails::Installment {
                    provider: "МКК".into(),
                    months: 3,
                },
            ),
        ];
        let report = build_report(shift(ShiftStatus::Open), sales);
        assert_eq!(report.totals.total_orders, 4);
        assert_eq!(report.totals.total_revenue.cents(), 4_200);
        assert_eq!(report.totals.cash_revenue.cents(), 3_000);
        assert_eq!(report.expected_cash.cents(), 13_000);
        assert!(report.shortage.is_zero());
    }

    #[test]
    fn test_report_for_closed_shift() {
        let closed = CashShift {
            closing_cash_cents: Some(9_000),
            debt_before_cents: Some(500),
            debt_after_cents: Some(1_500),
            ..shift(ShiftStatus::Closed)
        };
        let report = build_report(closed, vec![]);
        assert_eq!(report.expected_cash.cents(), 10_000);
        assert_eq!(report.shortage.cents(), 1_000);
        assert!(report.overage.is_zero());
        assert_eq!(report.debt_after.cents(), 1_500);
    }

    #[test]
    fn test_reconcile_overage_pays_down_debt() {
        let r = reconcile(Money::from_major(1_100), Money::from_major(1_000), Money::from_major(30));
        assert_eq!(r.overage, Money::from_major(100));
        assert!(r.shortage.is_zero());
        assert!(r.debt_after.is_zero());
        assert_eq!(r.difference, Money::from_major(100));
    }
}
