//! # Domain Types
//!
//! Core domain types used throughout the Vitrina back-office.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │     Client      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price_cents    │──►│ PricedSnapshot  │   │ cashback_*      │       │
//! │  │  stock_qty      │   │ PaymentDetails  │◄──│ discount_bps    │       │
//! │  │  combo_items    │   │ total_cents     │   │ level           │       │
//! │  └────────┬────────┘   └───────┬─────────┘   └────────┬────────┘       │
//! │           │                    │                      │                 │
//! │           ▼                    ▼                      ▼                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │InventoryMovement│   │   CashShift     │   │ClientLoyalty-   │       │
//! │  │ (append-only)   │   │ open → closed   │   │ Transaction     │       │
//! │  └─────────────────┘   └─────────────────┘   │ (append-only)   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Convention
//! Monetary columns end in `_cents` (i64 minor units) and percentage columns
//! end in `_bps` (basis points). Accessors return [`Money`] / [`Percent`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::payment::PaymentDetails;

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (base 10% + birthday 5%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percent from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percent from whole percentage points (10 → 10%).
    #[inline]
    pub const fn from_whole(pct: u32) -> Self {
        Percent(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if the percent is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two percents, capping the result at 100%.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::types::Percent;
    ///
    /// let sum = Percent::from_whole(70).capped_add(Percent::from_whole(50));
    /// assert_eq!(sum, Percent::FULL);
    /// ```
    #[inline]
    pub fn capped_add(self, other: Percent) -> Percent {
        Percent(self.0.saturating_add(other.0).min(Self::FULL.0))
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// How a sale was paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Installment,
    Hybrid,
    Booking,
    Manual,
}

impl PaymentType {
    /// Lowercase wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Installment => "installment",
            PaymentType::Hybrid => "hybrid",
            PaymentType::Booking => "booking",
            PaymentType::Manual => "manual",
        }
    }
}

/// Where the sale is fulfilled.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Picked up at the store.
    #[default]
    Office,
    /// Shipped to the client.
    Delivery,
}

/// Fulfilment progress of a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Reserved,
    Ready,
    OnWay,
    PickedUp,
    Delivered,
    Canceled,
}

/// Client loyalty tier, derived from lifetime spend.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyLevel {
    #[default]
    Silver,
    Gold,
    Vip,
}

/// Kind of entry in the client loyalty ledger.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTransactionType {
    CashbackAccrual,
    CashbackSpend,
    CashbackExpire,
    ReferralBonus,
    ManualAdjust,
}

/// Direction of a stock change.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    /// Sets the stock to an absolute value.
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
        }
    }
}

/// Business cause of a stock change.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Sale,
    Purchase,
    Writeoff,
    ReturnIn,
    ReturnOut,
    TransferIn,
    TransferOut,
    Adjustment,
    ManualIn,
    ManualOut,
    #[default]
    Other,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Sale => "sale",
            OperationType::Purchase => "purchase",
            OperationType::Writeoff => "writeoff",
            OperationType::ReturnIn => "return_in",
            OperationType::ReturnOut => "return_out",
            OperationType::TransferIn => "transfer_in",
            OperationType::TransferOut => "transfer_out",
            OperationType::Adjustment => "adjustment",
            OperationType::ManualIn => "manual_in",
            OperationType::ManualOut => "manual_out",
            OperationType::Other => "other",
        }
    }
}

/// Cash shift lifecycle state.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// Staff role as stored on the user record.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Superadmin,
    Admin,
    Manager,
    Storekeeper,
    Cashier,
}

/// How a staff member is paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SalaryType {
    /// Earns a per-sale commission.
    #[default]
    Commission,
    /// Fixed salary, no per-sale earnings.
    Fixed,
}

// =============================================================================
// Product
// =============================================================================

/// One component of a combo product.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ComboItem {
    pub product_id: String,
    /// Units of the component consumed per unit of the combo.
    pub quantity: i64,
}

/// A product available for sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, snapshotted onto sales.
    pub name: String,

    pub category: Option<String>,

    /// Supplier name, snapshotted onto sales.
    pub supplier: Option<String>,

    /// Purchase cost per unit in minor units.
    pub cost_price_cents: i64,

    /// Selling price per unit in minor units.
    pub price_cents: i64,

    /// Units on hand. Always ≥ 0; combos carry 0.
    pub stock_qty: i64,

    /// Branch that owns the stock; `None` means sellable from any branch.
    pub branch_name: Option<String>,

    pub is_combo: bool,

    /// Manager commission per unit sold, in minor units.
    pub manager_earnings_cents: i64,

    /// Components of a combo product (loaded from `combo_items`).
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub combo_items: Vec<ComboItem>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Returns the per-unit manager earning as Money.
    #[inline]
    pub fn manager_earnings(&self) -> Money {
        Money::from_cents(self.manager_earnings_cents)
    }
}

// =============================================================================
// Staff
// =============================================================================

/// A staff member as seen by the sale engine (read-only).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    pub salary_type: SalaryType,
    pub is_active: bool,
}

impl Staff {
    /// Fixed-salary staff earn nothing per sale.
    ///
    /// Cashiers and storekeepers are always fixed-salary regardless of the
    /// stored salary type.
    pub fn is_fixed_salary(&self) -> bool {
        self.salary_type == SalaryType::Fixed
            || matches!(self.role, StaffRole::Cashier | StaffRole::Storekeeper)
    }
}

// =============================================================================
// Client & Loyalty
// =============================================================================

/// A loyalty-program client.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub full_name: String,
    pub phone: Option<String>,

    #[ts(as = "Option<String>")]
    pub birth_date: Option<NaiveDate>,

    /// Standing discount.
    pub discount_bps: u32,

    /// Extra discount on the client's birthday.
    pub birthday_discount_bps: u32,

    pub level: LoyaltyLevel,

    /// Lifetime spend in minor units.
    pub total_spent_cents: i64,

    /// Cashback accrual rate.
    pub cashback_rate_bps: u32,

    /// Spendable cashback in minor units. Never negative.
    pub cashback_balance_cents: i64,

    /// Days an accrual stays valid.
    pub cashback_expiry_days: i64,

    #[ts(as = "Option<String>")]
    pub cashback_expires_at: Option<DateTime<Utc>>,

    /// Blocks both spending and accruing cashback.
    pub bonuses_blocked: bool,

    pub referral_code: Option<String>,
    pub referred_by_client_id: Option<String>,
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn cashback_balance(&self) -> Money {
        Money::from_cents(self.cashback_balance_cents)
    }

    #[inline]
    pub fn discount(&self) -> Percent {
        Percent::from_bps(self.discount_bps)
    }

    #[inline]
    pub fn birthday_discount(&self) -> Percent {
        Percent::from_bps(self.birthday_discount_bps)
    }

    #[inline]
    pub fn cashback_rate(&self) -> Percent {
        Percent::from_bps(self.cashback_rate_bps)
    }
}

/// A discount window, global (`client_id = None`) or scoped to one client.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientPromotion {
    pub id: String,
    pub client_id: Option<String>,
    pub title: String,
    pub discount_bps: u32,

    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Append-only loyalty ledger row.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientLoyaltyTransaction {
    pub id: String,
    pub client_id: String,
    pub sale_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: LoyaltyTransactionType,
    pub amount_cents: i64,

    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    pub note: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Shift
// =============================================================================

/// A cashier work session with cash reconciliation.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashShift {
    pub id: String,
    pub cashier_id: String,
    pub cashier_name: String,
    pub branch_name: Option<String>,
    pub status: ShiftStatus,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    pub opening_cash_cents: i64,
    pub closing_cash_cents: Option<i64>,
    pub expected_cash_cents: Option<i64>,
    pub difference_cents: Option<i64>,

    /// Debt carried in from earlier shifts.
    pub debt_before_cents: Option<i64>,
    pub shortage_cents: Option<i64>,
    pub overage_cents: Option<i64>,
    pub debt_after_cents: Option<i64>,

    pub note_open: Option<String>,
    pub note_close: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashShift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// Append-only record of one stock change.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub branch_name: Option<String>,
    pub movement_type: MovementType,
    pub operation_type: OperationType,
    /// Units moved (always positive; adjustments record the new level).
    pub quantity: i64,
    /// Stock level right after this movement.
    pub stock_after: i64,
    pub reason: Option<String>,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    pub sale_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// Product fields frozen onto a sale at creation time.
///
/// Later product edits never change a persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedSnapshot {
    pub product_name: String,
    pub supplier: Option<String>,
    /// Unit selling price actually charged.
    pub unit_price_cents: i64,
    /// Effective cost per unit (sum of components for combos).
    pub cost_price_cents: i64,
}

impl PricedSnapshot {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// A persisted sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub snapshot: PricedSnapshot,
    pub quantity: i64,

    pub client_id: Option<String>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub client_address: Option<String>,
    pub comment: Option<String>,

    /// Final amount charged after discount and cashback.
    pub total_cents: i64,
    /// Effective discount (manual or loyalty floor, whichever is larger).
    pub discount_cents: i64,
    pub loyalty_discount_bps: u32,
    pub cashback_used_cents: i64,
    pub cashback_accrued_cents: i64,

    pub payment: PaymentDetails,

    pub sale_type: SaleType,
    pub delivery_status: DeliveryStatus,
    pub delivery_cost_cents: i64,
    pub delivery_paid_by_company: bool,

    pub branch: String,
    pub shift_id: Option<String>,
    pub manager_id: Option<String>,
    pub manager_name: String,
    pub manager_earnings_cents: i64,

    /// Backdated sale date, when the sale was rung up after the fact.
    #[ts(as = "Option<String>")]
    pub manual_date: Option<DateTime<Utc>>,

    pub updated_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// The business date of the sale (manual date wins over creation time).
    #[inline]
    pub fn sale_date(&self) -> DateTime<Utc> {
        self.manual_date.unwrap_or(self.created_at)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_from_whole() {
        let pct = Percent::from_whole(15);
        assert_eq!(pct.bps(), 1_500);
        assert!((pct.percentage() - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_percent_capped_add() {
        let a = Percent::from_whole(60);
        assert_eq!(a.capped_add(Percent::from_whole(30)).bps(), 9_000);
        assert_eq!(a.capped_add(Percent::from_whole(60)), Percent::FULL);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SaleType::default(), SaleType::Office);
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::Reserved);
        assert_eq!(LoyaltyLevel::default(), LoyaltyLevel::Silver);
        assert_eq!(OperationType::default(), OperationType::Other);
    }

    #[test]
    fn test_fixed_salary_roles() {
        let mut staff = Staff {
            id: "u1".into(),
            name: "Aida".into(),
            role: StaffRole::Manager,
            salary_type: SalaryType::Commission,
            is_active: true,
        };
        assert!(!staff.is_fixed_salary());

        staff.salary_type = SalaryType::Fixed;
        assert!(staff.is_fixed_salary());

        staff.salary_type = SalaryType::Commission;
        staff.role = StaffRole::Cashier;
        assert!(staff.is_fixed_salary());

        staff.role = StaffRole::Storekeeper;
        assert!(staff.is_fixed_salary());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::OnWay).unwrap(),
            "\"on_way\""
        );
        assert_eq!(
            serde_json::to_string(&LoyaltyTransactionType::ReferralBonus).unwrap(),
            "\"referral_bonus\""
        );
        assert_eq!(OperationType::TransferOut.as_str(), "transfer_out");
    }
}
