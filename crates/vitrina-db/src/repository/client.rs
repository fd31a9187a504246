//! # Client Repository
//!
//! Loyalty clients. Profiles are created and edited through
//! `ClientService`; the balance, expiry and lifetime spend columns are only
//! written by the loyalty ledger updater through the crate-private functions
//! below.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use vitrina_core::validation::{normalize_phone, normalize_referral_code};
use vitrina_core::{Client, LoyaltyLevel, Money};

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Gets a client by ID regardless of status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Inserts a new client.
    pub async fn insert(&self, client: &Client) -> DbResult<Client> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, client).await?;
        Ok(client.clone())
    }

    /// Active client carrying a (normalized) referral code.
    pub async fn find_by_referral_code(&self, code: &str) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        find_active_by_referral_code(&mut conn, code).await
    }
}

/// Fresh referral code, `CL-` and six uppercase hex digits.
pub fn generate_referral_code() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("CL-{}", id[..6].to_uppercase())
}

// =============================================================================
// Connection-level Operations
// =============================================================================

pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
    let client: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(client)
}

/// Gets an active client by ID.
pub async fn fetch_active_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
    let client: Option<Client> = sqlx::query_as("SELECT * FROM clients WHERE id = ?1 AND is_active = 1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(client)
}

pub async fn insert(conn: &mut SqliteConnection, client: &Client) -> DbResult<()> {
    debug!(id = %client.id, name = %client.full_name, "Inserting client");

    sqlx::query(
        r#"
        INSERT INTO clients (
            id, full_name, phone, birth_date,
            discount_bps, birthday_discount_bps, level, total_spent_cents,
            cashback_rate_bps, cashback_balance_cents, cashback_expiry_days,
            cashback_expires_at, bonuses_blocked, referral_code,
            referred_by_client_id, is_active, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11,
            ?12, ?13, ?14,
            ?15, ?16, ?17, ?18
        )
        "#,
    )
    .bind(&client.id)
    .bind(&client.full_name)
    .bind(&client.phone)
    .bind(client.birth_date)
    .bind(client.discount_bps)
    .bind(client.birthday_discount_bps)
    .bind(client.level)
    .bind(client.total_spent_cents)
    .bind(client.cashback_rate_bps)
    .bind(client.cashback_balance_cents)
    .bind(client.cashback_expiry_days)
    .bind(client.cashback_expires_at)
    .bind(client.bonuses_blocked)
    .bind(&client.referral_code)
    .bind(&client.referred_by_client_id)
    .bind(client.is_active)
    .bind(client.created_at)
    .bind(client.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the profile columns of a client.
///
/// Cashback balance, expiry and lifetime spend are left alone; they belong
/// to the ledger updater.
pub async fn update_profile(conn: &mut SqliteConnection, client: &Client) -> DbResult<()> {
    debug!(id = %client.id, "Updating client profile");

    sqlx::query(
        r#"
        UPDATE clients SET
            full_name = ?2,
            phone = ?3,
            birth_date = ?4,
            discount_bps = ?5,
            birthday_discount_bps = ?6,
            level = ?7,
            cashback_rate_bps = ?8,
            cashback_expiry_days = ?9,
            bonuses_blocked = ?10,
            referral_code = ?11,
            referred_by_client_id = ?12,
            is_active = ?13,
            updated_at = ?14
        WHERE id = ?1
        "#,
    )
    .bind(&client.id)
    .bind(&client.full_name)
    .bind(&client.phone)
    .bind(client.birth_date)
    .bind(client.discount_bps)
    .bind(client.birthday_discount_bps)
    .bind(client.level)
    .bind(client.cashback_rate_bps)
    .bind(client.cashback_expiry_days)
    .bind(client.bonuses_blocked)
    .bind(&client.referral_code)
    .bind(&client.referred_by_client_id)
    .bind(client.is_active)
    .bind(client.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Active client by referral code; the code is normalized before matching.
pub async fn find_active_by_referral_code(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Client>> {
    let Some(code) = normalize_referral_code(code) else {
        return Ok(None);
    };

    let client: Option<Client> =
        sqlx::query_as("SELECT * FROM clients WHERE referral_code = ?1 AND is_active = 1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(client)
}

/// Finds the first active client whose phone has the same digits.
///
/// Stored phones are free-form ("+7 (701) 000-11-22"), so the comparison is
/// done on normalized digits over a linear scan of active clients.
pub async fn find_active_by_phone(conn: &mut SqliteConnection, phone: &str) -> DbResult<Option<Client>> {
    let digits = normalize_phone(phone);
    if digits.is_empty() {
        return Ok(None);
    }

    let candidates: Vec<Client> = sqlx::query_as(
        r#"
        SELECT * FROM clients
        WHERE is_active = 1 AND phone IS NOT NULL
        ORDER BY created_at, rowid
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(candidates
        .into_iter()
        .find(|c| c.phone.as_deref().map(normalize_phone).as_deref() == Some(digits.as_str())))
}

/// Writes the loyalty aggregate of a client after a settled sale.
pub(crate) async fn write_loyalty_state(
    conn: &mut SqliteConnection,
    id: &str,
    balance: Money,
    expires_at: Option<DateTime<Utc>>,
    total_spent: Money,
    level: LoyaltyLevel,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, balance = balance.cents(), level = ?level, "Writing client loyalty state");

    sqlx::query(
        r#"
        UPDATE clients SET
            cashback_balance_cents = ?2,
            cashback_expires_at = ?3,
            total_spent_cents = ?4,
            level = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(balance.cents())
    .bind(expires_at)
    .bind(total_spent.cents())
    .bind(level)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the cashback balance and expiry after a manual adjustment.
pub(crate) async fn write_cashback(
    conn: &mut SqliteConnection,
    id: &str,
    balance: Money,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, balance = balance.cents(), "Writing client cashback");

    sqlx::query(
        r#"
        UPDATE clients SET
            cashback_balance_cents = ?2,
            cashback_expires_at = ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(balance.cents())
    .bind(expires_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Credits a referral bonus and extends the referrer's expiry.
pub(crate) async fn credit_cashback(
    conn: &mut SqliteConnection,
    id: &str,
    amount: Money,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, amount = amount.cents(), "Crediting cashback");

    sqlx::query(
        r#"
        UPDATE clients SET
            cashback_balance_cents = cashback_balance_cents + ?2,
            cashback_expires_at = ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(amount.cents())
    .bind(expires_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
