//! # Loyalty Resolver & Ledger Updater (storage side)
//!
//! Finds the client for a sale, quotes its discount and spendable cashback,
//! and writes the settlement planned by `vitrina_core::loyalty`.
//!
//! ## Ledger Rows Per Sale
//! ```text
//! expired balance   → cashback_expire  (old balance)
//! cashback applied  → cashback_spend   (applied amount)
//! accrual > 0       → cashback_accrual (expires now + window)
//! referral > 0      → referral_bonus   (on the referrer)
//! ```
//! Every row carries the sale id. Zero amounts write nothing.
//!
//! A manual adjustment writes `cashback_expire` (if the balance lapsed) and
//! one signed `manual_adjust` row, neither bound to a sale.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::EngineResult;
use crate::repository::{client, generate_id, loyalty, promotion};
use vitrina_core::loyalty::{self as rules, LoyaltyConfig, LoyaltyQuote, ManualAdjustmentPlan, SettlementPlan};
use vitrina_core::validation::normalize_optional_text;
use vitrina_core::{Client, ClientLoyaltyTransaction, CoreError, LoyaltyTransactionType, Money};

/// Matches the sale to a client.
///
/// An explicit id must name an active client; otherwise the phone (if any)
/// is matched on digits against active clients. No match is not an error.
pub async fn resolve_client(
    conn: &mut SqliteConnection,
    client_id: Option<&str>,
    phone: Option<&str>,
) -> EngineResult<Option<Client>> {
    if let Some(id) = normalize_optional_text(client_id) {
        let client = client::fetch_active_by_id(conn, &id)
            .await?
            .ok_or(CoreError::ClientNotFound(id))?;
        return Ok(Some(client));
    }

    match normalize_optional_text(phone) {
        Some(phone) => {
            let client = client::find_active_by_phone(conn, &phone).await?;
            debug!(matched = client.is_some(), "Client lookup by phone");
            Ok(client)
        }
        None => Ok(None),
    }
}

/// Discount percent and spendable cashback for a matched client.
pub async fn quote(
    conn: &mut SqliteConnection,
    client: &Client,
    sale_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EngineResult<LoyaltyQuote> {
    let promotions = promotion::fetch_active_for_client(conn, &client.id).await?;
    let quote = rules::quote(client, &promotions, sale_date, now);

    debug!(
        client_id = %client.id,
        percent_bps = quote.percent.total.bps(),
        spendable = quote.spendable.cents(),
        expired = quote.expired,
        "Loyalty quote"
    );
    Ok(quote)
}

/// Plans the settlement, loading the client's referrer when one is set.
pub async fn plan(
    conn: &mut SqliteConnection,
    client: &Client,
    cashback_applied: Money,
    final_total: Money,
    now: DateTime<Utc>,
    config: &LoyaltyConfig,
) -> EngineResult<SettlementPlan> {
    let referrer = match normalize_optional_text(client.referred_by_client_id.as_deref()) {
        Some(referrer_id) => client::fetch_by_id(conn, &referrer_id).await?,
        None => None,
    };

    Ok(rules::plan_settlement(
        client,
        referrer.as_ref(),
        cashback_applied,
        final_total,
        now,
        config,
    ))
}

/// Writes ledger rows and client aggregates for a planned settlement.
///
/// Returns the ledger rows in insertion order.
pub async fn settle(
    conn: &mut SqliteConnection,
    plan: &SettlementPlan,
    client_name: &str,
    sale_id: &str,
    now: DateTime<Utc>,
) -> EngineResult<Vec<ClientLoyaltyTransaction>> {
    let mut rows = Vec::new();

    let entry = |client_id: &str,
                 kind: LoyaltyTransactionType,
                 amount: Money,
                 expires_at: Option<DateTime<Utc>>,
                 note: String| ClientLoyaltyTransaction {
        id: generate_id(),
        client_id: client_id.to_string(),
        sale_id: Some(sale_id.to_string()),
        kind,
        amount_cents: amount.cents(),
        expires_at,
        note: Some(note),
        created_at: now,
    };

    if plan.expired.is_positive() {
        rows.push(entry(
            &plan.client_id,
            LoyaltyTransactionType::CashbackExpire,
            plan.expired,
            Some(now),
            "Cashback expired".to_string(),
        ));
    }
    if plan.spent.is_positive() {
        rows.push(entry(
            &plan.client_id,
            LoyaltyTransactionType::CashbackSpend,
            plan.spent,
            None,
            "Cashback spent on sale".to_string(),
        ));
    }
    if plan.accrued.is_positive() {
        rows.push(entry(
            &plan.client_id,
            LoyaltyTransactionType::CashbackAccrual,
            plan.accrued,
            plan.accrual_expires_at,
            "Cashback accrual".to_string(),
        ));
    }

    for row in &rows {
        loyalty::insert(conn, row).await?;
    }

    client::write_loyalty_state(
        conn,
        &plan.client_id,
        plan.balance_after,
        plan.expires_at_after,
        plan.total_spent_after,
        plan.level_after,
        now,
    )
    .await?;

    if let Some(referral) = &plan.referral {
        let row = entry(
            &referral.referrer_id,
            LoyaltyTransactionType::ReferralBonus,
            referral.amount,
            Some(referral.expires_at_after),
            format!("Referral bonus for client {client_name}"),
        );
        loyalty::insert(conn, &row).await?;
        client::credit_cashback(
            conn,
            &referral.referrer_id,
            referral.amount,
            referral.expires_at_after,
            now,
        )
        .await?;
        rows.push(row);
    }

    info!(
        client_id = %plan.client_id,
        sale_id = %sale_id,
        spent = plan.spent.cents(),
        accrued = plan.accrued.cents(),
        level = ?plan.level_after,
        "Loyalty settled"
    );

    Ok(rows)
}

/// Writes a planned manual adjustment: ledger rows first, then the balance.
pub async fn adjust(
    conn: &mut SqliteConnection,
    plan: &ManualAdjustmentPlan,
    note: Option<String>,
    now: DateTime<Utc>,
) -> EngineResult<Vec<ClientLoyaltyTransaction>> {
    let mut rows = Vec::with_capacity(2);

    if plan.expired.is_positive() {
        rows.push(ClientLoyaltyTransaction {
            id: generate_id(),
            client_id: plan.client_id.clone(),
            sale_id: None,
            kind: LoyaltyTransactionType::CashbackExpire,
            amount_cents: plan.expired.cents(),
            expires_at: Some(now),
            note: Some("Cashback expired".to_string()),
            created_at: now,
        });
    }
    rows.push(ClientLoyaltyTransaction {
        id: generate_id(),
        client_id: plan.client_id.clone(),
        sale_id: None,
        kind: LoyaltyTransactionType::ManualAdjust,
        amount_cents: plan.amount.cents(),
        expires_at: plan.amount.is_positive().then_some(plan.expires_at_after).flatten(),
        note: Some(note.unwrap_or_else(|| "Manual adjustment".to_string())),
        created_at: now,
    });

    for row in &rows {
        loyalty::insert(conn, row).await?;
    }
    client::write_cashback(conn, &plan.client_id, plan.balance_after, plan.expires_at_after, now).await?;

    info!(
        client_id = %plan.client_id,
        amount = plan.amount.cents(),
        balance = plan.balance_after.cents(),
        "Cashback adjusted"
    );

    Ok(rows)
}
