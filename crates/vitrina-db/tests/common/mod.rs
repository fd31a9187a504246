//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use vitrina_core::{
    Client, ComboItem, LoyaltyLevel, Money, Product, SalaryType, Staff, StaffRole,
};
use vitrina_db::repository::generate_id;
use vitrina_db::{Database, DbConfig};

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// 2026-03-14 12:00 UTC, the fixed "now" of the scenarios.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

pub fn major(amount: i64) -> Money {
    Money::from_major(amount)
}

pub async fn product(db: &Database, name: &str, price: i64, stock: i64, branch: Option<&str>) -> Product {
    let now = now();
    let product = Product {
        id: generate_id(),
        name: name.to_string(),
        category: None,
        supplier: Some("Ала-Тоо Вуд".to_string()),
        cost_price_cents: price * 60,
        price_cents: price * 100,
        stock_qty: stock,
        branch_name: branch.map(str::to_string),
        is_combo: false,
        manager_earnings_cents: 0,
        combo_items: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap()
}

pub async fn combo(db: &Database, name: &str, price: i64, items: &[(&Product, i64)]) -> Product {
    let now = now();
    let combo = Product {
        id: generate_id(),
        name: name.to_string(),
        category: None,
        supplier: None,
        cost_price_cents: 0,
        price_cents: price * 100,
        stock_qty: 0,
        branch_name: None,
        is_combo: true,
        manager_earnings_cents: 0,
        combo_items: items
            .iter()
            .map(|(p, quantity)| ComboItem {
                product_id: p.id.clone(),
                quantity: *quantity,
            })
            .collect(),
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&combo).await.unwrap()
}

/// A plain client with no discount and no cashback; tweak before insert.
pub async fn client(db: &Database, name: &str, tweak: impl FnOnce(&mut Client)) -> Client {
    let now = now();
    let mut client = Client {
        id: generate_id(),
        full_name: name.to_string(),
        phone: None,
        birth_date: None,
        discount_bps: 0,
        birthday_discount_bps: 0,
        level: LoyaltyLevel::Silver,
        total_spent_cents: 0,
        cashback_rate_bps: 0,
        cashback_balance_cents: 0,
        cashback_expiry_days: 30,
        cashback_expires_at: None,
        bonuses_blocked: false,
        referral_code: None,
        referred_by_client_id: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    tweak(&mut client);
    db.clients().insert(&client).await.unwrap()
}

pub fn birthday(month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1990, month, day)
}

pub async fn staff(db: &Database, name: &str, role: StaffRole, salary_type: SalaryType) -> Staff {
    let staff = Staff {
        id: generate_id(),
        name: name.to_string(),
        role,
        salary_type,
        is_active: true,
    };
    db.staff().insert(&staff).await.unwrap()
}

pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products().get_by_id(product_id).await.unwrap().unwrap().stock_qty
}

pub async fn sale_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(db.pool())
        .await
        .unwrap()
}
