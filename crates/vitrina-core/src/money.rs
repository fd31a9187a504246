//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Hybrid payment: cash 333.33 + card 333.33 + transfer 333.34           │
//! │    as f64: 999.9999999999999 != 1000.00  ❌                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    33333 + 33333 + 33334 = 100000  ✅                                   │
//! │    Tolerances are whole minor units (1 = 0.01)                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrina_core::money::Money;
//!
//! let price = Money::from_cents(100_000); // 1000.00
//! let subtotal = price.checked_mul(2);     // 2000.00
//! assert_eq!(subtotal.map(|m| m.cents()), Some(200_000));
//! ```
//!
//! ## Overflow
//! Amounts that come from a request body go through the `checked_*`
//! methods; `None` becomes a validation error at the call site. The
//! operator impls saturate at the `i64` bounds and never wrap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor currency units (kopecks, cents, tyiyn).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as shift overage/shortage can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as a bare integer**: the API speaks minor units
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► subtotal ──► loyalty floor ──► total before cashback
///                                                               │
///                     cashback applied ◄────────────────────────┤
///                                                               ▼
///                           Sale.total ──► accrual ──► referral bonus
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-10).non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(10).non_negative().cents(), 10);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Calculates a percentage of this amount, rounded half up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`
    /// The +5000 provides rounding (5000/10000 = 0.5)
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::money::Money;
    /// use vitrina_core::types::Percent;
    ///
    /// let subtotal = Money::from_cents(100_000);   // 1000.00
    /// let loyalty = Percent::from_bps(1_500);      // 15%
    /// assert_eq!(subtotal.percent_of(loyalty).cents(), 15_000);
    ///
    /// // 0.05 × 10% = 0.005 → rounds up to 0.01
    /// assert_eq!(Money::from_cents(5).percent_of(Percent::from_bps(1_000)).cents(), 1);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Final total: 1000.00, accrual rate 10%
    ///      │
    ///      ▼
    /// percent_of(10%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Cashback accrued: 100.00 ──► referral bonus percent_of(10%) = 10.00
    /// ```
    pub fn percent_of(&self, percent: Percent) -> Money {
        // i128 prevents overflow on large amounts
        let cents = self.0 as i128 * percent.bps() as i128;
        let rounded = if cents >= 0 {
            (cents + 5000) / 10000
        } else {
            (cents - 5000) / 10000
        };
        Money::from_cents(rounded as i64)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_mul(4), Some(Money::from_cents(1_000)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, `None` if any partial sum overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Checks whether two amounts differ by at most `tolerance`.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::money::Money;
    ///
    /// let total = Money::from_cents(100_000);
    /// assert!(total.within(Money::from_cents(99_999), Money::from_cents(1)));
    /// assert!(!total.within(Money::from_cents(99_998), Money::from_cents(1)));
    /// ```
    #[inline]
    pub fn within(&self, other: Money, tolerance: Money) -> bool {
        (self.0 as i128 - other.0 as i128).abs() <= tolerance.0 as i128
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with two decimals and no currency sign.
///
/// ## Note
/// This is for logs and error messages. The frontend formats for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
