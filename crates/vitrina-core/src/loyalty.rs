//! # Loyalty Module
//!
//! Discount resolution and cashback settlement planning.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Loyalty in a Sale                                │
//! │                                                                         │
//! │  matched Client + promotions + sale date                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quote()  ← base + birthday + best promotion (≤ 100%)                  │
//! │       │     expired balance detected, treated as zero                  │
//! │       ▼                                                                 │
//! │  pricing::compute_totals()  ← loyalty floor, cashback cap              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_settlement()  ← expire / spend / accrue / level / referral       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  vitrina-db writes the plan: ledger rows + client aggregates           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches the clock: the caller passes `sale_date` (may be
//! backdated) for discounts and `now` for expiry decisions.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Client, ClientPromotion, LoyaltyLevel, Percent};
use crate::DEFAULT_CASHBACK_EXPIRY_DAYS;

// =============================================================================
// Configuration
// =============================================================================

/// Static loyalty program parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    /// Lifetime spend at which a client becomes gold.
    pub gold_threshold: Money,
    /// Lifetime spend at which a client becomes vip.
    pub vip_threshold: Money,
    /// Share of the client's accrual credited to the referrer.
    pub referral_share: Percent,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        LoyaltyConfig {
            gold_threshold: Money::from_major(400_000),
            vip_threshold: Money::from_major(1_200_000),
            referral_share: Percent::from_whole(10),
        }
    }
}

impl LoyaltyConfig {
    /// Tier for a lifetime spend.
    ///
    /// ## Example
    /// ```rust
    /// use vitrina_core::loyalty::LoyaltyConfig;
    /// use vitrina_core::money::Money;
    /// use vitrina_core::types::LoyaltyLevel;
    ///
    /// let config = LoyaltyConfig::default();
    /// assert_eq!(config.level_for(Money::from_major(399_999)), LoyaltyLevel::Silver);
    /// assert_eq!(config.level_for(Money::from_major(400_000)), LoyaltyLevel::Gold);
    /// assert_eq!(config.level_for(Money::from_major(1_200_000)), LoyaltyLevel::Vip);
    /// ```
    pub fn level_for(&self, total_spent: Money) -> LoyaltyLevel {
        if total_spent >= self.vip_threshold {
            LoyaltyLevel::Vip
        } else if total_spent >= self.gold_threshold {
            LoyaltyLevel::Gold
        } else {
            LoyaltyLevel::Silver
        }
    }
}

/// Effective accrual window in days.
///
/// Unset (0) falls back to the default; anything else is at least one day.
pub fn expiry_window_days(configured: i64) -> i64 {
    if configured == 0 {
        DEFAULT_CASHBACK_EXPIRY_DAYS
    } else {
        configured.max(1)
    }
}

// =============================================================================
// Discount Resolution
// =============================================================================

/// Calendar match on month and day (UTC), ignoring the year.
pub fn is_birthday(birth_date: NaiveDate, sale_date: DateTime<Utc>) -> bool {
    birth_date.month() == sale_date.month() && birth_date.day() == sale_date.day()
}

/// Whether a promotion is active and its window contains `sale_date`.
///
/// Missing bounds are open-ended.
pub fn promotion_applies(promotion: &ClientPromotion, sale_date: DateTime<Utc>) -> bool {
    if !promotion.is_active {
        return false;
    }
    if promotion.starts_at.is_some_and(|start| sale_date < start) {
        return false;
    }
    if promotion.ends_at.is_some_and(|end| sale_date > end) {
        return false;
    }
    true
}

/// Highest applicable promotion percent, or zero.
pub fn best_promotion(promotions: &[ClientPromotion], sale_date: DateTime<Utc>) -> Percent {
    promotions
        .iter()
        .filter(|promo| promotion_applies(promo, sale_date))
        .map(|promo| Percent::from_bps(promo.discount_bps))
        .max()
        .unwrap_or_default()
}

/// The parts of a client's loyalty discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoyaltyBreakdown {
    pub base: Percent,
    pub birthday: Percent,
    pub promotion: Percent,
    /// Sum of the parts, capped at 100%.
    pub total: Percent,
}

/// Result of resolving a matched client against a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyQuote {
    pub client_id: String,
    pub percent: LoyaltyBreakdown,
    /// The stored balance expired before this sale.
    pub expired: bool,
    /// Balance the client may spend on this sale (zero when blocked or expired).
    pub spendable: Money,
}

/// Whether the client's cashback has lapsed at `now`.
///
/// Only a positive balance can expire.
pub fn cashback_expired(client: &Client, now: DateTime<Utc>) -> bool {
    client.cashback_balance_cents > 0 && client.cashback_expires_at.is_some_and(|at| now > at)
}

/// Resolves discount percent and spendable cashback for a matched client.
pub fn quote(
    client: &Client,
    promotions: &[ClientPromotion],
    sale_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> LoyaltyQuote {
    let base = client.discount();
    let birthday = match client.birth_date {
        Some(birth_date) if is_birthday(birth_date, sale_date) => client.birthday_discount(),
        _ => Percent::zero(),
    };
    let promotion = best_promotion(promotions, sale_date);
    let total = base.capped_add(birthday).capped_add(promotion);

    let expired = cashback_expired(client, now);
    let spendable = if expired || client.bonuses_blocked {
        Money::zero()
    } else {
        client.cashback_balance().non_negative()
    };

    LoyaltyQuote {
        client_id: client.id.clone(),
        percent: LoyaltyBreakdown {
            base,
            birthday,
            promotion,
            total,
        },
        expired,
        spendable,
    }
}

/// Cashback actually usable: the smallest of request, spendable balance and
/// the pre-cashback total.
///
/// ## Example
/// ```rust
/// use vitrina_core::loyalty::usable_cashback;
/// use vitrina_core::money::Money;
///
/// // balance 100, request 150, total 120 → 100
/// let used = usable_cashback(
///     Money::from_major(150),
///     Money::from_major(100),
///     Money::from_major(120),
/// );
/// assert_eq!(used, Money::from_major(100));
/// ```
pub fn usable_cashback(requested: Money, spendable: Money, total_before_cashback: Money) -> Money {
    requested
        .non_negative()
        .min(spendable.non_negative())
        .min(total_before_cashback.non_negative())
}

// =============================================================================
// Settlement Planning
// =============================================================================

/// Referral credit for the client's referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralCredit {
    pub referrer_id: String,
    pub amount: Money,
    pub balance_after: Money,
    pub expires_at_after: DateTime<Utc>,
}

/// Everything the ledger updater must write for one matched client.
///
/// Each non-zero amount becomes one append-only ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub client_id: String,
    /// Balance written off as expired (zero when nothing lapsed).
    pub expired: Money,
    pub spent: Money,
    pub accrued: Money,
    pub accrual_expires_at: Option<DateTime<Utc>>,
    pub balance_after: Money,
    pub expires_at_after: Option<DateTime<Utc>>,
    pub total_spent_after: Money,
    pub level_after: LoyaltyLevel,
    pub referral: Option<ReferralCredit>,
}

/// Plans the ledger effects of a sale for a matched client.
///
/// ## Steps
/// 1. Expired balance is written off first
/// 2. Applied cashback is spent
/// 3. Unblocked clients accrue `round(final × rate)`; the accrual extends expiry
/// 4. Lifetime spend grows by the final total; level is recomputed
/// 5. An active, unblocked referrer (not the client) gets the referral share
pub fn plan_settlement(
    client: &Client,
    referrer: Option<&Client>,
    cashback_applied: Money,
    final_total: Money,
    now: DateTime<Utc>,
    config: &LoyaltyConfig,
) -> SettlementPlan {
    let was_expired = cashback_expired(client, now);
    let expired = if was_expired {
        client.cashback_balance()
    } else {
        Money::zero()
    };
    let mut balance = if was_expired {
        Money::zero()
    } else {
        client.cashback_balance().non_negative()
    };

    let spent = cashback_applied.non_negative().min(balance);
    balance = (balance - spent).non_negative();

    let accrued = if client.bonuses_blocked {
        Money::zero()
    } else {
        final_total.non_negative().percent_of(client.cashback_rate())
    };

    let accrual_expires_at = accrued
        .is_positive()
        .then(|| now + Duration::days(expiry_window_days(client.cashback_expiry_days)));
    balance += accrued;

    let expires_at_after = if accrual_expires_at.is_some() {
        accrual_expires_at
    } else if was_expired {
        None
    } else {
        client.cashback_expires_at
    };

    let total_spent_after =
        (Money::from_cents(client.total_spent_cents) + final_total.non_negative()).non_negative();

    let referral = referrer
        .filter(|r| r.id != client.id && r.is_active && !r.bonuses_blocked)
        .and_then(|r| {
            let amount = accrued.percent_of(config.referral_share);
            amount.is_positive().then(|| ReferralCredit {
                referrer_id: r.id.clone(),
                amount,
                balance_after: r.cashback_balance().non_negative() + amount,
                expires_at_after: now + Duration::days(expiry_window_days(r.cashback_expiry_days)),
            })
        });

    SettlementPlan {
        client_id: client.id.clone(),
        expired,
        spent,
        accrued,
        accrual_expires_at,
        balance_after: balance,
        expires_at_after,
        total_spent_after,
        level_after: config.level_for(total_spent_after),
        referral,
    }
}

// =============================================================================
// Manual Adjustments
// =============================================================================

/// Ledger effects of a back-office cashback correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualAdjustmentPlan {
    pub client_id: String,
    /// Lapsed balance written off before the correction.
    pub expired: Money,
    /// Signed correction; becomes the `manual_adjust` row.
    pub amount: Money,
    pub balance_after: Money,
    pub expires_at_after: Option<DateTime<Utc>>,
}

/// Plans a signed correction of the client's cashback balance.
///
/// A lapsed balance is written off first, like in a sale. A credit restarts
/// the expiry window; a debit keeps the current expiry.
///
/// ## Errors
/// - `Validation` for a zero amount or one that overflows the balance
/// - `InsufficientCashback` when a debit exceeds the live balance
pub fn plan_manual_adjustment(client: &Client, amount: Money, now: DateTime<Utc>) -> CoreResult<ManualAdjustmentPlan> {
    if amount.is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must not be zero".to_string(),
        }
        .into());
    }

    let was_expired = cashback_expired(client, now);
    let (expired, balance) = if was_expired {
        (client.cashback_balance(), Money::zero())
    } else {
        (Money::zero(), client.cashback_balance().non_negative())
    };

    let balance_after = balance
        .checked_add(amount)
        .ok_or_else(|| ValidationError::overflow("amount"))?;
    if balance_after.is_negative() {
        return Err(CoreError::InsufficientCashback {
            client_id: client.id.clone(),
            balance_cents: balance.cents(),
            amount_cents: amount.cents(),
        });
    }

    let expires_at_after = if amount.is_positive() {
        Some(now + Duration::days(expiry_window_days(client.cashback_expiry_days)))
    } else if was_expired {
        None
    } else {
        client.cashback_expires_at
    };

    Ok(ManualAdjustmentPlan {
        client_id: client.id.clone(),
        expired,
        amount,
        balance_after,
        expires_at_after,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn client(id: &str) -> Client {
        Client {
            id: id.to_string(),
            full_name: "Aigerim".to_string(),
            phone: Some("+996 555 123 456".to_string()),
            birth_date: None,
            discount_bps: 0,
            birthday_discount_bps: 0,
            level: LoyaltyLevel::Silver,
            total_spent_cents: 0,
            cashback_rate_bps: 0,
            cashback_balance_cents: 0,
            cashback_expiry_days: 180,
            cashback_expires_at: None,
            bonuses_blocked: false,
            referral_code: None,
            referred_by_client_id: None,
            is_active: true,
            created_at: at(2024, 1, 1),
            updated_at: at(2024, 1, 1),
        }
    }

    fn promo(bps: u32, starts: Option<DateTime<Utc>>, ends: Option<DateTime<Utc>>) -> ClientPromotion {
        ClientPromotion {
            id: format!("promo-{bps}"),
            client_id: None,
            title: "Spring".to_string(),
            discount_bps: bps,
            starts_at: starts,
            ends_at: ends,
            is_active: true,
            created_at: at(2024, 1, 1),
        }
    }

    #[test]
    fn test_birthday_ignores_year() {
        let birth = NaiveDate::from_ymd_opt(1990, 3, 14).unwrap();
        assert!(is_birthday(birth, at(2025, 3, 14)));
        assert!(!is_birthday(birth, at(2025, 3, 15)));
    }

    #[test]
    fn test_best_promotion_respects_window() {
        let sale_date = at(2025, 5, 10);
        let promos = vec![
            promo(500, Some(at(2025, 5, 1)), Some(at(2025, 5, 31))),
            promo(2_000, Some(at(2025, 6, 1)), None),
            promo(700, None, None),
            ClientPromotion {
                is_active: false,
                ..promo(9_000, None, None)
            },
        ];
        assert_eq!(best_promotion(&promos, sale_date), Percent::from_bps(700));
        assert_eq!(best_promotion(&[], sale_date), Percent::zero());
    }

    #[test]
    fn test_quote_birthday_plus_base() {
        let mut c = client("c1");
        c.discount_bps = 1_000;
        c.birthday_discount_bps = 500;
        c.birth_date = NaiveDate::from_ymd_opt(1992, 7, 1);
        let today = at(2025, 7, 1);

        let q = quote(&c, &[], today, today);
        assert_eq!(q.percent.total, Percent::from_whole(15));
        assert_eq!(q.percent.birthday, Percent::from_whole(5));
    }

    #[test]
    fn test_quote_caps_at_full() {
        let mut c = client("c1");
        c.discount_bps = 8_000;
        let today = at(2025, 7, 1);
        let q = quote(&c, &[promo(5_000, None, None)], today, today);
        assert_eq!(q.percent.total, Percent::FULL);
    }

    #[test]
    fn test_quote_expired_and_blocked_balances() {
        let now = at(2025, 7, 1);
        let mut c = client("c1");
        c.cashback_balance_cents = 10_000;
        c.cashback_expires_at = Some(at(2025, 6, 30));
        let q = quote(&c, &[], now, now);
        assert!(q.expired);
        assert!(q.spendable.is_zero());

        c.cashback_expires_at = Some(at(2025, 12, 31));
        c.bonuses_blocked = true;
        let q = quote(&c, &[], now, now);
        assert!(!q.expired);
        assert!(q.spendable.is_zero());
    }

    #[test]
    fn test_usable_cashback_capping() {
        let used = usable_cashback(
            Money::from_major(150),
            Money::from_major(100),
            Money::from_major(120),
        );
        assert_eq!(used, Money::from_major(100));

        let used = usable_cashback(
            Money::from_major(150),
            Money::from_major(500),
            Money::from_major(120),
        );
        assert_eq!(used, Money::from_major(120));

        assert!(usable_cashback(Money::from_cents(-5), Money::from_major(1), Money::from_major(1)).is_zero());
    }

    #[test]
    fn test_plan_accrual_and_referral() {
        let now = at(2025, 7, 1);
        let mut buyer = client("buyer");
        buyer.cashback_rate_bps = 1_000;
        buyer.referred_by_client_id = Some("ref".to_string());
        let mut referrer = client("ref");
        referrer.cashback_expiry_days = 30;
        referrer.cashback_balance_cents = 500;

        let plan = plan_settlement(
            &buyer,
            Some(&referrer),
            Money::zero(),
            Money::from_major(1_000),
            now,
            &LoyaltyConfig::default(),
        );

        assert_eq!(plan.accrued, Money::from_major(100));
        assert_eq!(plan.balance_after, Money::from_major(100));
        assert_eq!(plan.accrual_expires_at, Some(now + Duration::days(180)));
        assert_eq!(plan.expires_at_after, plan.accrual_expires_at);

        let referral = plan.referral.unwrap();
        assert_eq!(referral.amount, Money::from_major(10));
        assert_eq!(referral.balance_after.cents(), 1_500);
        assert_eq!(referral.expires_at_after, now + Duration::days(30));
    }

    #[test]
    fn test_plan_expire_then_spend_nothing() {
        let now = at(2025, 7, 1);
        let mut c = client("c1");
        c.cashback_balance_cents = 4_000;
        c.cashback_expires_at = Some(at(2025, 1, 1));

        let plan = plan_settlement(&c, None, Money::zero(), Money::from_major(50), now, &LoyaltyConfig::default());
        assert_eq!(plan.expired.cents(), 4_000);
        assert!(plan.spent.is_zero());
        assert!(plan.accrued.is_zero());
        assert!(plan.balance_after.is_zero());
        assert_eq!(plan.expires_at_after, None);
    }

    #[test]
    fn test_plan_spend_and_level() {
        let now = at(2025, 7, 1);
        let mut c = client("c1");
        c.cashback_balance_cents = 10_000;
        c.total_spent_cents = Money::from_major(399_900).cents();
        c.cashback_expires_at = Some(at(2025, 12, 1));

        let plan = plan_settlement(
            &c,
            None,
            Money::from_major(100),
            Money::from_major(200),
            now,
            &LoyaltyConfig::default(),
        );
        assert_eq!(plan.spent, Money::from_major(100));
        assert!(plan.balance_after.is_zero());
        assert_eq!(plan.expires_at_after, c.cashback_expires_at);
        assert_eq!(plan.level_after, LoyaltyLevel::Gold);
    }

    #[test]
    fn test_referral_skipped_for_blocked_or_self() {
        let now = at(2025, 7, 1);
        let mut buyer = client("buyer");
        buyer.cashback_rate_bps = 1_000;
        let mut referrer = client("ref");
        referrer.bonuses_blocked = true;

        let cfg = LoyaltyConfig::default();
        let plan = plan_settlement(&buyer, Some(&referrer), Money::zero(), Money::from_major(1_000), now, &cfg);
        assert!(plan.referral.is_none());

        let plan = plan_settlement(&buyer, Some(&buyer.clone()), Money::zero(), Money::from_major(1_000), now, &cfg);
        assert!(plan.referral.is_none());
    }

    #[test]
    fn test_manual_adjustment_credit_and_debit() {
        let now = at(2025, 3, 1);
        let mut c = client("c1");
        c.cashback_balance_cents = 10_000;
        c.cashback_expires_at = Some(at(2025, 6, 1));

        let credit = plan_manual_adjustment(&c, Money::from_cents(2_500), now).unwrap();
        assert_eq!(credit.balance_after, Money::from_cents(12_500));
        assert_eq!(credit.expired, Money::zero());
        assert_eq!(credit.expires_at_after, Some(now + Duration::days(180)));

        let debit = plan_manual_adjustment(&c, Money::from_cents(-10_000), now).unwrap();
        assert_eq!(debit.balance_after, Money::zero());
        assert_eq!(debit.expires_at_after, Some(at(2025, 6, 1)));

        assert!(matches!(
            plan_manual_adjustment(&c, Money::from_cents(-10_001), now),
            Err(CoreError::InsufficientCashback { balance_cents: 10_000, .. })
        ));
        assert!(matches!(
            plan_manual_adjustment(&c, Money::zero(), now),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            plan_manual_adjustment(&c, Money::from_cents(i64::MAX), now),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_manual_adjustment_writes_off_lapsed_balance() {
        let mut c = client("c1");
        c.cashback_balance_cents = 4_000;
        c.cashback_expires_at = Some(at(2025, 1, 1));
        let now = at(2025, 2, 1);

        let plan = plan_manual_adjustment(&c, Money::from_cents(1_000), now).unwrap();
        assert_eq!(plan.expired, Money::from_cents(4_000));
        assert_eq!(plan.balance_after, Money::from_cents(1_000));

        // The lapsed balance cannot be spent by a debit
        assert!(matches!(
            plan_manual_adjustment(&c, Money::from_cents(-1), now),
            Err(CoreError::InsufficientCashback { balance_cents: 0, .. })
        ));
    }

    #[test]
    fn test_expiry_window_days() {
        assert_eq!(expiry_window_days(0), 180);
        assert_eq!(expiry_window_days(-3), 1);
        assert_eq!(expiry_window_days(30), 30);
    }
}
