//! # Seed Data Generator
//!
//! Populates a development database with staff, products, a combo, loyalty
//! clients, promotions and manual payment labels.
//!
//! ## Usage
//! ```bash
//! # Seed ./vitrina_dev.db with 10 products per branch (default)
//! cargo run -p vitrina-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p vitrina-db --bin seed -- --count 40 --db ./data/vitrina.db
//! ```
//!
//! ## Generated Data
//! - staff: one commission manager, one cashier (fixed), one admin
//! - products: `{name} #{n}` per branch, stock 0 - 24
//! - one combo built from the first three products of the default branch
//! - clients: a referrer and a referred client with a birthday today
//! - one global promotion and the "Kaspi QR" / "Элсом" manual labels

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;
use vitrina_core::{
    Client, ClientPromotion, ComboItem, LoyaltyLevel, Product, SalaryType, Staff, StaffRole, DEFAULT_BRANCH,
};
use vitrina_db::{Database, DbConfig};

/// Branches products are spread over.
const BRANCHES: &[&str] = &[DEFAULT_BRANCH, "Восток-5"];

/// Product name, category, supplier, price in major units.
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("Диван угловой", "Мебель", "Кыргызмебель", 48_000),
    ("Кресло", "Мебель", "Кыргызмебель", 14_500),
    ("Журнальный столик", "Мебель", "Ала-Тоо Вуд", 7_900),
    ("Шкаф-купе", "Мебель", "Ала-Тоо Вуд", 36_000),
    ("Матрас 160x200", "Спальня", "Sleep KG", 22_000),
    ("Кровать двуспальная", "Спальня", "Sleep KG", 41_000),
    ("Тумба прикроватная", "Спальня", "Ала-Тоо Вуд", 5_600),
    ("Стул обеденный", "Кухня", "Домино", 3_200),
    ("Стол обеденный", "Кухня", "Домино", 18_700),
    ("Комод", "Мебель", "Кыргызмебель", 12_300),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 10;
    let mut db_path = String::from("./vitrina_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vitrina Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Products per branch (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./vitrina_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vitrina Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products per branch: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Staff
    for (name, role, salary_type) in [
        ("Айгерим", StaffRole::Manager, SalaryType::Commission),
        ("Бакыт", StaffRole::Cashier, SalaryType::Fixed),
        ("Эрлан", StaffRole::Admin, SalaryType::Fixed),
    ] {
        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            salary_type,
            is_active: true,
        };
        db.staff().insert(&staff).await?;
        println!("  staff {:<10} {:?} {}", name, role, staff.id);
    }

    // Products
    let mut default_branch_ids = Vec::new();
    let mut generated = 0;
    for branch in BRANCHES {
        for n in 0..count {
            let product = generate_product(branch, n);
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            if *branch == DEFAULT_BRANCH {
                default_branch_ids.push(product.id.clone());
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    if default_branch_ids.len() >= 3 {
        let now = Utc::now();
        let combo = Product {
            id: Uuid::new_v4().to_string(),
            name: "Гостиная комплект".to_string(),
            category: Some("Комплекты".to_string()),
            supplier: None,
            cost_price_cents: 0,
            price_cents: 65_000_00,
            stock_qty: 0,
            branch_name: Some(DEFAULT_BRANCH.to_string()),
            is_combo: true,
            manager_earnings_cents: 1_500_00,
            combo_items: default_branch_ids
                .iter()
                .take(3)
                .map(|id| ComboItem {
                    product_id: id.clone(),
                    quantity: 1,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&combo).await?;
        println!("✓ Combo '{}' ({})", combo.name, combo.id);
    }

    // Clients
    let now = Utc::now();
    let referrer = client("Нургуль Асанова", "+996 555 100 200", None, now);
    db.clients().insert(&referrer).await?;

    let mut referred = client("Тимур Жумабаев", "+996 700 300 400", Some(referrer.id.clone()), now);
    referred.birth_date = Some(now.date_naive());
    referred.cashback_balance_cents = 500_00;
    referred.cashback_expires_at = Some(now + Duration::days(30));
    db.clients().insert(&referred).await?;
    println!("✓ Clients: {} (referrer), {} (referred)", referrer.id, referred.id);

    let promotion = ClientPromotion {
        id: Uuid::new_v4().to_string(),
        client_id: None,
        title: "Осенняя распродажа".to_string(),
        discount_bps: 500,
        starts_at: Some(now - Duration::days(1)),
        ends_at: Some(now + Duration::days(14)),
        is_active: true,
        created_at: now,
    };
    db.promotions().insert(&promotion).await?;

    let labels = db
        .settings()
        .replace_manual_labels(&["Kaspi QR".to_string(), "Элсом".to_string()])
        .await?;
    println!("✓ Manual payment labels: {:?}", labels);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a product for `branch` with deterministic pseudo-random data.
fn generate_product(branch: &str, n: usize) -> Product {
    let now = Utc::now();
    let (name, category, supplier, price) = CATALOG[n % CATALOG.len()];

    let price_cents = price * 100;
    // Cost is 55-74% of price
    let cost_cents = price_cents * (55 + (n * 7 % 20) as i64) / 100;

    Product {
        id: Uuid::new_v4().to_string(),
        name: format!("{} #{}", name, n + 1),
        category: Some(category.to_string()),
        supplier: Some(supplier.to_string()),
        cost_price_cents: cost_cents,
        price_cents,
        stock_qty: ((n * 13) % 25) as i64,
        branch_name: Some(branch.to_string()),
        is_combo: false,
        manager_earnings_cents: price_cents / 50,
        combo_items: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn client(name: &str, phone: &str, referred_by: Option<String>, now: chrono::DateTime<Utc>) -> Client {
    Client {
        id: Uuid::new_v4().to_string(),
        full_name: name.to_string(),
        phone: Some(phone.to_string()),
        birth_date: None,
        discount_bps: 300,
        birthday_discount_bps: 500,
        level: LoyaltyLevel::Silver,
        total_spent_cents: 0,
        cashback_rate_bps: 200,
        cashback_balance_cents: 0,
        cashback_expiry_days: 180,
        cashback_expires_at: None,
        bonuses_blocked: false,
        referral_code: Some(format!("REF-{}", &name.chars().take(3).collect::<String>())),
        referred_by_client_id: referred_by,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
