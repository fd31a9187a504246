//! # Client Service
//!
//! Back-office management of loyalty clients and their promotions.
//!
//! ## Cashback Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Who writes clients.cashback_balance_cents                             │
//! │                                                                         │
//! │  SaleEngine ──► loyalty::settle ──► expire / spend / accrual / referral │
//! │  ClientService::adjust_cashback ──► loyalty::adjust ──► manual_adjust   │
//! │  ClientService::create (opening balance) ──► loyalty::adjust            │
//! │                                                                         │
//! │  Profile edits never touch the balance, so the ledger always sums to   │
//! │  it.                                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::info;

use super::{loyalty, EngineResult};
use crate::pool::Database;
use crate::repository::{client, generate_id};
use vitrina_core::loyalty::{expiry_window_days, plan_manual_adjustment};
use vitrina_core::validation::{
    normalize_optional_text, normalize_referral_code, require_text, validate_non_negative, validate_percent,
};
use vitrina_core::{Client, ClientPromotion, CoreError, LoyaltyLevel, Money, ValidationError};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /clients`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub birthday_discount_bps: u32,
    #[serde(default)]
    pub level: LoyaltyLevel,
    #[serde(default)]
    pub cashback_rate_bps: u32,
    /// Opening balance, booked as a `manual_adjust` ledger row.
    #[serde(default)]
    pub cashback_balance: Money,
    #[serde(default)]
    pub cashback_expiry_days: Option<i64>,
    #[serde(default)]
    pub bonuses_blocked: bool,
    /// Generated when absent.
    #[serde(default)]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub referred_by_client_id: Option<String>,
    /// Resolved to the active client carrying the code.
    #[serde(default)]
    pub referred_by_code: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Body of `PATCH /clients/{id}`.
///
/// Absent fields keep their value. The cashback balance is not editable
/// here; corrections go through [`CashbackAdjustment`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientUpdate {
    pub full_name: Option<String>,
    /// Blank clears the phone.
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub discount_bps: Option<u32>,
    pub birthday_discount_bps: Option<u32>,
    pub level: Option<LoyaltyLevel>,
    pub cashback_rate_bps: Option<u32>,
    pub cashback_expiry_days: Option<i64>,
    pub bonuses_blocked: Option<bool>,
    /// Blank keeps the current code.
    pub referral_code: Option<String>,
    /// Blank clears the referrer; wins over `referred_by_code`.
    pub referred_by_client_id: Option<String>,
    /// Blank clears the referrer.
    pub referred_by_code: Option<String>,
    pub is_active: Option<bool>,
}

/// Body of `POST /clients/{id}/cashback-adjustments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackAdjustment {
    /// Signed correction in minor units.
    pub amount: Money,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /promotions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    /// `None` makes the promotion global.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Public view of a referral code owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralMatch {
    pub id: String,
    pub full_name: String,
    pub referral_code: String,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClientService {
    db: Database,
}

impl ClientService {
    pub fn new(db: Database) -> Self {
        ClientService { db }
    }

    pub async fn create(&self, request: NewClient) -> EngineResult<Client> {
        self.create_at(request, Utc::now()).await
    }

    /// Creates a client, resolving the referrer and booking any opening
    /// balance through the ledger.
    pub async fn create_at(&self, request: NewClient, now: DateTime<Utc>) -> EngineResult<Client> {
        let full_name = require_text("fullName", &request.full_name)?;
        validate_percent("discountBps", request.discount_bps)?;
        validate_percent("birthdayDiscountBps", request.birthday_discount_bps)?;
        validate_percent("cashbackRateBps", request.cashback_rate_bps)?;
        validate_non_negative("cashbackBalance", request.cashback_balance)?;

        let mut tx = self.db.pool().begin().await?;

        let referred_by = match resolve_referrer(
            &mut tx,
            request.referred_by_client_id.as_deref(),
            request.referred_by_code.as_deref(),
        )
        .await?
        {
            ReferrerChange::Set(id) => Some(id),
            ReferrerChange::Keep | ReferrerChange::Clear => None,
        };

        let mut record = Client {
            id: generate_id(),
            full_name,
            phone: normalize_optional_text(request.phone.as_deref()),
            birth_date: request.birth_date,
            discount_bps: request.discount_bps,
            birthday_discount_bps: request.birthday_discount_bps,
            level: request.level,
            total_spent_cents: 0,
            cashback_rate_bps: request.cashback_rate_bps,
            cashback_balance_cents: 0,
            cashback_expiry_days: expiry_window_days(request.cashback_expiry_days.unwrap_or(0)),
            cashback_expires_at: None,
            bonuses_blocked: request.bonuses_blocked,
            referral_code: Some(
                request
                    .referral_code
                    .as_deref()
                    .and_then(normalize_referral_code)
                    .unwrap_or_else(client::generate_referral_code),
            ),
            referred_by_client_id: referred_by,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        client::insert(&mut tx, &record).await?;

        if request.cashback_balance.is_positive() {
            let plan = plan_manual_adjustment(&record, request.cashback_balance, now)?;
            loyalty::adjust(&mut tx, &plan, Some("Opening balance".to_string()), now).await?;
            record.cashback_balance_cents = plan.balance_after.cents();
            record.cashback_expires_at = plan.expires_at_after;
        }

        tx.commit().await?;

        info!(
            client_id = %record.id,
            referral_code = ?record.referral_code,
            referred_by = ?record.referred_by_client_id,
            "Client created"
        );
        Ok(record)
    }

    pub async fn update(&self, id: &str, update: ClientUpdate) -> EngineResult<Client> {
        self.update_at(id, update, Utc::now()).await
    }

    /// Applies a profile update and returns the stored client.
    pub async fn update_at(&self, id: &str, update: ClientUpdate, now: DateTime<Utc>) -> EngineResult<Client> {
        let mut tx = self.db.pool().begin().await?;

        let mut current = client::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))?;

        if let Some(name) = &update.full_name {
            current.full_name = require_text("fullName", name)?;
        }
        if let Some(phone) = &update.phone {
            current.phone = normalize_optional_text(Some(phone.as_str()));
        }
        if let Some(birth_date) = update.birth_date {
            current.birth_date = Some(birth_date);
        }
        if let Some(bps) = update.discount_bps {
            validate_percent("discountBps", bps)?;
            current.discount_bps = bps;
        }
        if let Some(bps) = update.birthday_discount_bps {
            validate_percent("birthdayDiscountBps", bps)?;
            current.birthday_discount_bps = bps;
        }
        if let Some(level) = update.level {
            current.level = level;
        }
        if let Some(bps) = update.cashback_rate_bps {
            validate_percent("cashbackRateBps", bps)?;
            current.cashback_rate_bps = bps;
        }
        if let Some(days) = update.cashback_expiry_days {
            current.cashback_expiry_days = expiry_window_days(days);
        }
        if let Some(blocked) = update.bonuses_blocked {
            current.bonuses_blocked = blocked;
        }
        if let Some(code) = update.referral_code.as_deref().and_then(normalize_referral_code) {
            current.referral_code = Some(code);
        }
        if let Some(active) = update.is_active {
            current.is_active = active;
        }

        match resolve_referrer(
            &mut tx,
            update.referred_by_client_id.as_deref(),
            update.referred_by_code.as_deref(),
        )
        .await?
        {
            ReferrerChange::Keep => {}
            ReferrerChange::Clear => current.referred_by_client_id = None,
            ReferrerChange::Set(referrer_id) if referrer_id == current.id => {
                return Err(ValidationError::InvalidFormat {
                    field: "referredBy".to_string(),
                    reason: "a client cannot refer themselves".to_string(),
                }
                .into());
            }
            ReferrerChange::Set(referrer_id) => current.referred_by_client_id = Some(referrer_id),
        }

        current.updated_at = now;
        client::update_profile(&mut tx, &current).await?;

        tx.commit().await?;

        info!(client_id = %id, "Client updated");
        Ok(current)
    }

    pub async fn adjust_cashback(&self, id: &str, request: CashbackAdjustment) -> EngineResult<Client> {
        self.adjust_cashback_at(id, request, Utc::now()).await
    }

    /// Corrects an active client's cashback balance through the ledger.
    pub async fn adjust_cashback_at(
        &self,
        id: &str,
        request: CashbackAdjustment,
        now: DateTime<Utc>,
    ) -> EngineResult<Client> {
        let mut tx = self.db.pool().begin().await?;

        let current = client::fetch_active_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))?;

        let plan = plan_manual_adjustment(&current, request.amount, now)?;
        loyalty::adjust(&mut tx, &plan, normalize_optional_text(request.note.as_deref()), now).await?;

        let updated = client::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Owner of an active referral code.
    pub async fn find_by_referral_code(&self, code: &str) -> EngineResult<ReferralMatch> {
        let normalized = normalize_referral_code(code).ok_or_else(|| ValidationError::required("code"))?;

        let owner = self
            .db
            .clients()
            .find_by_referral_code(&normalized)
            .await?
            .ok_or(CoreError::ReferralCodeNotFound(normalized.clone()))?;

        Ok(ReferralMatch {
            id: owner.id,
            full_name: owner.full_name,
            referral_code: owner.referral_code.unwrap_or(normalized),
        })
    }

    pub async fn create_promotion(&self, request: NewPromotion) -> EngineResult<ClientPromotion> {
        self.create_promotion_at(request, Utc::now()).await
    }

    /// Creates a global or client-scoped discount window.
    pub async fn create_promotion_at(&self, request: NewPromotion, now: DateTime<Utc>) -> EngineResult<ClientPromotion> {
        let title = require_text("title", &request.title)?;
        validate_percent("discountBps", request.discount_bps)?;
        if let (Some(starts), Some(ends)) = (request.starts_at, request.ends_at) {
            if ends < starts {
                return Err(ValidationError::InvalidFormat {
                    field: "endsAt".to_string(),
                    reason: "must not be before startsAt".to_string(),
                }
                .into());
            }
        }

        let client_id = normalize_optional_text(request.client_id.as_deref());
        if let Some(client_id) = &client_id {
            if self.db.clients().get_by_id(client_id).await?.is_none() {
                return Err(CoreError::ClientNotFound(client_id.clone()).into());
            }
        }

        let promotion = ClientPromotion {
            id: generate_id(),
            client_id,
            title,
            discount_bps: request.discount_bps,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
        };
        let stored = self.db.promotions().insert(&promotion).await?;

        info!(promotion_id = %stored.id, client_id = ?stored.client_id, bps = stored.discount_bps, "Promotion created");
        Ok(stored)
    }
}

// =============================================================================
// Referrer Resolution
// =============================================================================

/// What a request asks for the `referred_by_client_id` column.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReferrerChange {
    Keep,
    Clear,
    Set(String),
}

/// An explicit id wins over a referral code; both must name an active client.
async fn resolve_referrer(
    conn: &mut SqliteConnection,
    client_id: Option<&str>,
    code: Option<&str>,
) -> EngineResult<ReferrerChange> {
    if let Some(id) = client_id {
        let Some(id) = normalize_optional_text(Some(id)) else {
            return Ok(ReferrerChange::Clear);
        };
        let referrer = client::fetch_active_by_id(conn, &id)
            .await?
            .ok_or(CoreError::ClientNotFound(id))?;
        return Ok(ReferrerChange::Set(referrer.id));
    }

    if let Some(code) = code {
        let Some(code) = normalize_referral_code(code) else {
            return Ok(ReferrerChange::Clear);
        };
        let referrer = client::find_active_by_referral_code(conn, &code)
            .await?
            .ok_or(CoreError::ReferralCodeNotFound(code))?;
        return Ok(ReferrerChange::Set(referrer.id));
    }

    Ok(ReferrerChange::Keep)
}
