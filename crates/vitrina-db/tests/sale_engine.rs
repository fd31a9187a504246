//! Sale transaction scenarios against an in-memory database.

mod common;

use chrono::Duration;
use common::{birthday, client, combo, major, now, product, sale_count, setup, staff, stock_of};
use vitrina_core::{
    CoreError, ErrorKind, LoyaltyTransactionType, Money, MovementType, OperationType, PaymentDetails, SalaryType,
    SaleType, StaffRole, ValidationError, DEFAULT_BRANCH, UNKNOWN_MANAGER,
};
use vitrina_db::{
    Database, EngineConfig, EngineError, OpenShiftRequest, SaleDetailsUpdate, SaleEngine, SaleRequest, ShiftService,
};

fn engine(db: &Database) -> SaleEngine {
    SaleEngine::new(db.clone(), EngineConfig::default())
}

fn request(product_id: &str, quantity: i64) -> SaleRequest {
    SaleRequest {
        product_id: product_id.to_string(),
        quantity,
        ..Default::default()
    }
}

async fn movement_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM inventory_movements")
        .fetch_one(db.pool())
        .await
        .unwrap()
}

// =============================================================================
// Simple sales
// =============================================================================

#[tokio::test]
async fn test_cash_sale_end_to_end() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;

    let sale = engine(&db).create_sale_at(request(&chair.id, 2), now()).await.unwrap();

    assert_eq!(sale.total(), major(2_000));
    assert_eq!(sale.discount_cents, 0);
    assert_eq!(sale.payment, PaymentDetails::Cash);
    assert_eq!(sale.branch, DEFAULT_BRANCH);
    assert_eq!(sale.manager_name, UNKNOWN_MANAGER);
    assert_eq!(sale.snapshot.product_name, "Кресло");
    assert_eq!(sale.snapshot.unit_price_cents, 100_000);
    assert_eq!(sale.snapshot.cost_price_cents, 60_000);
    assert_eq!(stock_of(&db, &chair.id).await, 3);

    let movements = db.movements().list_by_sale(&sale.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Out);
    assert_eq!(movements[0].operation_type, OperationType::Sale);
    assert_eq!(movements[0].quantity, 2);
    assert_eq!(movements[0].stock_after, 3);
    assert_eq!(movements[0].reason.as_deref(), Some(format!("Sale {}", sale.id).as_str()));

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.total_cents, 200_000);
    assert_eq!(stored.created_at, now());
}

#[tokio::test]
async fn test_insufficient_stock_is_conflict() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 1, None).await;

    let err = engine(&db).create_sale_at(request(&chair.id, 2), now()).await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock { available: 1, requested: 2, .. })
    ));
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
    assert_eq!(stock_of(&db, &chair.id).await, 1);
    assert_eq!(sale_count(&db).await, 0);
}

#[tokio::test]
async fn test_unknown_product_and_bad_quantity() {
    let db = setup().await;

    let err = engine(&db).create_sale_at(request("missing", 1), now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let err = engine(&db).create_sale_at(request(&chair.id, 0), now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert_eq!(stock_of(&db, &chair.id).await, 5);
}

#[tokio::test]
async fn test_bulk_quantity_is_limited_by_stock_only() {
    let db = setup().await;
    let screws = product(&db, "Шуруп", 1, 20_000, None).await;

    let sale = engine(&db).create_sale_at(request(&screws.id, 10_000), now()).await.unwrap();

    assert_eq!(sale.quantity, 10_000);
    assert_eq!(sale.total(), major(10_000));
    assert_eq!(stock_of(&db, &screws.id).await, 10_000);
}

#[tokio::test]
async fn test_overflowing_amounts_are_rejected() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 3, None).await;

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Hybrid {
        cash: Money::from_cents(i64::MAX),
        card: Money::from_cents(i64::MAX),
        transfer: Money::from_cents(100_002),
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Validation(ValidationError::Overflow { .. }))
    ));
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Hybrid {
        cash: Money::from_cents(i64::MAX),
        card: Money::from_cents(1),
        transfer: Money::zero(),
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let mut req = request(&chair.id, 2);
    req.unit_price = Some(Money::from_cents(i64::MAX / 2 + 1));
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    assert_eq!(stock_of(&db, &chair.id).await, 3);
    assert_eq!(sale_count(&db).await, 0);
    assert_eq!(movement_count(&db).await, 0);
}

#[tokio::test]
async fn test_branch_rules() {
    let db = setup().await;
    let sofa = product(&db, "Диван", 2_000, 3, Some("Восток-5")).await;

    let mut req = request(&sofa.id, 1);
    req.branch = Some(DEFAULT_BRANCH.to_string());
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::BranchMismatch { .. })));
    assert_eq!(stock_of(&db, &sofa.id).await, 3);

    let sale = engine(&db).create_sale_at(request(&sofa.id, 1), now()).await.unwrap();
    assert_eq!(sale.branch, "Восток-5");

    let config = EngineConfig::default().with_default_branch("Запад");
    let table = product(&db, "Стол", 500, 3, None).await;
    let sale = SaleEngine::new(db.clone(), config)
        .create_sale_at(request(&table.id, 1), now())
        .await
        .unwrap();
    assert_eq!(sale.branch, "Запад");
}

// =============================================================================
// Combos
// =============================================================================

#[tokio::test]
async fn test_combo_sale_deducts_each_component() {
    let db = setup().await;
    let chair = product(&db, "Стул", 100, 10, None).await;
    let table = product(&db, "Стол", 500, 3, None).await;
    let set = combo(&db, "Обеденная группа", 1_000, &[(&chair, 4), (&table, 1)]).await;

    let sale = engine(&db).create_sale_at(request(&set.id, 2), now()).await.unwrap();

    assert_eq!(stock_of(&db, &chair.id).await, 2);
    assert_eq!(stock_of(&db, &table.id).await, 1);
    // 4 × 60.00 + 1 × 300.00
    assert_eq!(sale.snapshot.cost_price_cents, 54_000);
    assert_eq!(sale.total(), major(2_000));

    let movements = db.movements().list_by_sale(&sale.id).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].product_id, chair.id);
    assert_eq!(movements[0].quantity, 8);
    assert_eq!(movements[0].stock_after, 2);
    assert_eq!(movements[1].product_id, table.id);
    assert_eq!(movements[1].quantity, 2);
    assert_eq!(movements[1].stock_after, 1);
    for movement in &movements {
        assert_eq!(movement.reason.as_deref(), Some("Combo sale Обеденная группа"));
        assert_eq!(movement.operation_type, OperationType::Sale);
    }
}

#[tokio::test]
async fn test_combo_is_all_or_nothing() {
    let db = setup().await;
    let chair = product(&db, "Стул", 100, 5, None).await;
    let table = product(&db, "Стол", 500, 1, None).await;
    let set = combo(&db, "Обеденная группа", 1_000, &[(&chair, 4), (&table, 2)]).await;

    let err = engine(&db).create_sale_at(request(&set.id, 1), now()).await.unwrap_err();

    assert!(matches!(err, EngineError::Core(CoreError::InsufficientStock { .. })));
    assert_eq!(stock_of(&db, &chair.id).await, 5);
    assert_eq!(stock_of(&db, &table.id).await, 1);
    assert_eq!(sale_count(&db).await, 0);
    assert_eq!(movement_count(&db).await, 0);
}

#[tokio::test]
async fn test_empty_combo_is_conflict() {
    let db = setup().await;
    let set = combo(&db, "Пустой набор", 1_000, &[]).await;

    let err = engine(&db).create_sale_at(request(&set.id, 1), now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::EmptyCombo(_))));
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn test_hybrid_within_one_minor_unit() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 3, None).await;

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Hybrid {
        cash: major(500),
        card: major(300),
        transfer: Money::from_cents(19_999),
    };
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.payment.payment_type().as_str(), "hybrid");
    assert_eq!(stock_of(&db, &chair.id).await, 2);

    // Off by two minor units: rolled back after stock was reserved.
    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Hybrid {
        cash: major(500),
        card: major(300),
        transfer: Money::from_cents(19_998),
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::HybridMismatch { .. })));
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert_eq!(stock_of(&db, &chair.id).await, 2);
    assert_eq!(sale_count(&db).await, 1);
    assert_eq!(movement_count(&db).await, 1);
}

#[tokio::test]
async fn test_installment_terms() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Installment {
        provider: "МКК".to_string(),
        months: 6,
    };
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(
        stored.payment,
        PaymentDetails::Installment {
            provider: "МКК".to_string(),
            months: 6
        }
    );

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Installment {
        provider: "МКК".to_string(),
        months: 12,
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::InvalidInstallmentTerm { months: 12, .. })));

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Installment {
        provider: "Банк Х".to_string(),
        months: 3,
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::UnknownInstallmentProvider(_))));

    assert_eq!(stock_of(&db, &chair.id).await, 4);
}

#[tokio::test]
async fn test_manual_label_from_settings() {
    let db = setup().await;
    db.settings().replace_manual_labels(&["Kaspi QR".to_string()]).await.unwrap();
    let chair = product(&db, "Кресло", 1_000, 5, None).await;

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Manual {
        label: "  kaspi qr ".to_string(),
    };
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(
        stored.payment,
        PaymentDetails::Manual {
            label: "Kaspi QR".to_string()
        }
    );

    let mut req = request(&chair.id, 1);
    req.payment = PaymentDetails::Manual {
        label: "Bitcoin".to_string(),
    };
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::UnknownManualPayment(_))));
    assert_eq!(stock_of(&db, &chair.id).await, 4);
}

#[tokio::test]
async fn test_delivery_booking_must_match_total() {
    let db = setup().await;
    let sofa = product(&db, "Диван", 1_000, 5, None).await;

    let mut req = request(&sofa.id, 1);
    req.sale_type = SaleType::Delivery;
    req.payment = PaymentDetails::Booking {
        deposit: major(200),
        buyout: major(700),
        deadline: None,
    };
    let err = engine(&db).create_sale_at(req.clone(), now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::BookingMismatch { .. })));
    assert_eq!(stock_of(&db, &sofa.id).await, 5);

    req.payment = PaymentDetails::Booking {
        deposit: major(200),
        buyout: major(800),
        deadline: Some(now() + Duration::days(3)),
    };
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert!(sale.delivery_paid_by_company);
    assert_eq!(stock_of(&db, &sofa.id).await, 4);
}

// =============================================================================
// Loyalty
// =============================================================================

#[tokio::test]
async fn test_birthday_and_base_discount_floor() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let buyer = client(&db, "Айгуль", |c| {
        c.discount_bps = 1_000;
        c.birthday_discount_bps = 500;
        c.birth_date = birthday(3, 14);
    })
    .await;

    let mut req = request(&chair.id, 1);
    req.client_id = Some(buyer.id.clone());
    req.discount = Some(major(50));
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();

    assert_eq!(sale.loyalty_discount_bps, 1_500);
    assert_eq!(sale.discount_cents, 15_000);
    assert_eq!(sale.total(), major(850));
    assert_eq!(sale.client_name, "Айгуль");

    let stored = db.clients().get_by_id(&buyer.id).await.unwrap().unwrap();
    assert_eq!(stored.total_spent_cents, 85_000);
}

#[tokio::test]
async fn test_cashback_is_capped_by_balance() {
    let db = setup().await;
    let lamp = product(&db, "Торшер", 120, 5, None).await;
    let expires = now() + Duration::days(10);
    let buyer = client(&db, "Марат", |c| {
        c.cashback_balance_cents = 10_000;
        c.cashback_expires_at = Some(expires);
    })
    .await;

    let mut req = request(&lamp.id, 1);
    req.client_id = Some(buyer.id.clone());
    req.use_cashback = major(150);
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();

    assert_eq!(sale.cashback_used_cents, 10_000);
    assert_eq!(sale.total(), major(20));

    let rows = db.loyalty_transactions().list_by_sale(&sale.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, LoyaltyTransactionType::CashbackSpend);
    assert_eq!(rows[0].amount_cents, 10_000);

    let stored = db.clients().get_by_id(&buyer.id).await.unwrap().unwrap();
    assert_eq!(stored.cashback_balance_cents, 0);
    assert_eq!(stored.cashback_expires_at, Some(expires));
}

#[tokio::test]
async fn test_expired_cashback_is_written_off() {
    let db = setup().await;
    let lamp = product(&db, "Торшер", 120, 5, None).await;
    let buyer = client(&db, "Марат", |c| {
        c.cashback_balance_cents = 5_000;
        c.cashback_expires_at = Some(now() - Duration::days(1));
    })
    .await;

    let mut req = request(&lamp.id, 1);
    req.client_id = Some(buyer.id.clone());
    req.use_cashback = major(50);
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();

    assert_eq!(sale.cashback_used_cents, 0);
    assert_eq!(sale.total(), major(120));

    let rows = db.loyalty_transactions().list_by_sale(&sale.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, LoyaltyTransactionType::CashbackExpire);
    assert_eq!(rows[0].amount_cents, 5_000);
    assert_eq!(rows[0].expires_at, Some(now()));

    let stored = db.clients().get_by_id(&buyer.id).await.unwrap().unwrap();
    assert_eq!(stored.cashback_balance_cents, 0);
    assert_eq!(stored.cashback_expires_at, None);
}

#[tokio::test]
async fn test_accrual_and_referral_bonus() {
    let db = setup().await;
    let sofa = product(&db, "Диван", 1_000, 5, None).await;
    let referrer = client(&db, "Нургуль", |_| {}).await;
    let buyer = client(&db, "Тимур", |c| {
        c.cashback_rate_bps = 1_000;
        c.referred_by_client_id = Some(referrer.id.clone());
    })
    .await;

    let mut req = request(&sofa.id, 1);
    req.client_id = Some(buyer.id.clone());
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();

    assert_eq!(sale.cashback_accrued_cents, 10_000);

    let rows = db.loyalty_transactions().list_by_sale(&sale.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].kind, LoyaltyTransactionType::CashbackAccrual);
    assert_eq!(rows[0].client_id, buyer.id);
    assert_eq!(rows[0].amount_cents, 10_000);
    assert_eq!(rows[0].expires_at, Some(now() + Duration::days(30)));
    assert_eq!(rows[1].kind, LoyaltyTransactionType::ReferralBonus);
    assert_eq!(rows[1].client_id, referrer.id);
    assert_eq!(rows[1].amount_cents, 1_000);
    assert_eq!(rows[1].note.as_deref(), Some("Referral bonus for client Тимур"));

    let stored = db.clients().get_by_id(&buyer.id).await.unwrap().unwrap();
    assert_eq!(stored.cashback_balance_cents, 10_000);
    assert_eq!(stored.total_spent_cents, 100_000);

    let stored = db.clients().get_by_id(&referrer.id).await.unwrap().unwrap();
    assert_eq!(stored.cashback_balance_cents, 1_000);

    let history = db.loyalty_transactions().list_by_client(&referrer.id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sale_id.as_deref(), Some(sale.id.as_str()));
}

#[tokio::test]
async fn test_client_resolution() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let buyer = client(&db, "Айбек", |c| c.phone = Some("+996 (555) 100-200".to_string())).await;

    let mut req = request(&chair.id, 1);
    req.client_id = Some("no-such-client".to_string());
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ClientNotFound(_))));
    assert_eq!(stock_of(&db, &chair.id).await, 5);

    let mut req = request(&chair.id, 1);
    req.client_phone = Some("996555100200".to_string());
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.client_id.as_deref(), Some(buyer.id.as_str()));
    assert_eq!(sale.client_phone.as_deref(), Some("996555100200"));

    let mut req = request(&chair.id, 1);
    req.client_phone = Some("0000".to_string());
    req.client_name = Some("Прохожий".to_string());
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.client_id, None);
    assert_eq!(sale.client_name, "Прохожий");
}

// =============================================================================
// Staff and shifts
// =============================================================================

#[tokio::test]
async fn test_manager_earnings() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let manager = staff(&db, "Айгерим", StaffRole::Manager, SalaryType::Commission).await;
    let cashier = staff(&db, "Бакыт", StaffRole::Cashier, SalaryType::Commission).await;

    let mut req = request(&chair.id, 1);
    req.manager_id = Some(manager.id.clone());
    req.manager_earnings = Some(major(25));
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.manager_name, "Айгерим");
    assert_eq!(sale.manager_earnings_cents, 2_500);

    let mut req = request(&chair.id, 1);
    req.manager_id = Some(cashier.id.clone());
    req.manager_name = Some("Бакыт Т.".to_string());
    req.manager_earnings = Some(major(25));
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.manager_name, "Бакыт Т.");
    assert_eq!(sale.manager_earnings_cents, 0);
}

#[tokio::test]
async fn test_shift_binding() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;
    let shifts = ShiftService::new(db.clone());
    let shift = shifts
        .open_at(
            OpenShiftRequest {
                cashier_id: "cashier-1".to_string(),
                cashier_name: "Бакыт".to_string(),
                branch_name: None,
                opening_cash: major(100),
                note: None,
            },
            now(),
        )
        .await
        .unwrap();

    let mut req = request(&chair.id, 1);
    req.shift_id = Some(shift.id.clone());
    req.manager_id = Some("cashier-1".to_string());
    let sale = engine(&db).create_sale_at(req, now()).await.unwrap();
    assert_eq!(sale.shift_id.as_deref(), Some(shift.id.as_str()));

    let mut req = request(&chair.id, 1);
    req.shift_id = Some(shift.id.clone());
    req.manager_id = Some("cashier-2".to_string());
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ShiftCashierMismatch { .. })));

    let mut req = request(&chair.id, 1);
    req.shift_id = Some("no-such-shift".to_string());
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    shifts
        .close_at(
            &shift.id,
            vitrina_db::CloseShiftRequest {
                closing_cash: major(1_100),
                note: None,
            },
            now(),
        )
        .await
        .unwrap();

    let mut req = request(&chair.id, 1);
    req.shift_id = Some(shift.id.clone());
    let err = engine(&db).create_sale_at(req, now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ShiftClosed(_))));

    assert_eq!(stock_of(&db, &chair.id).await, 9);
}

// =============================================================================
// Restricted update
// =============================================================================

#[tokio::test]
async fn test_update_sale_details() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let sale = engine(&db).create_sale_at(request(&chair.id, 1), now()).await.unwrap();

    let later = now() + Duration::hours(2);
    let updated = engine(&db)
        .update_sale_at(
            &sale.id,
            SaleDetailsUpdate {
                comment: Some("Позвонить после 18:00".to_string()),
                delivery_status: Some(vitrina_core::DeliveryStatus::OnWay),
                updated_by: Some("admin".to_string()),
                ..Default::default()
            },
            later,
        )
        .await
        .unwrap();
    assert_eq!(updated.comment.as_deref(), Some("Позвонить после 18:00"));
    assert_eq!(updated.delivery_status, vitrina_core::DeliveryStatus::OnWay);
    assert_eq!(updated.updated_by.as_deref(), Some("admin"));
    assert_eq!(updated.updated_at, later);
    assert_eq!(updated.total_cents, sale.total_cents);

    let err = engine(&db)
        .update_sale_at(
            &sale.id,
            SaleDetailsUpdate {
                booking_deadline: Some(later),
                ..Default::default()
            },
            later,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let err = engine(&db)
        .update_sale_at("missing", SaleDetailsUpdate::default(), later)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));
}

#[tokio::test]
async fn test_update_with_only_author_is_recorded() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 5, None).await;
    let sale = engine(&db).create_sale_at(request(&chair.id, 1), now()).await.unwrap();

    let later = now() + Duration::minutes(5);
    let updated = engine(&db)
        .update_sale_at(
            &sale.id,
            SaleDetailsUpdate {
                updated_by: Some("senior-cashier".to_string()),
                ..Default::default()
            },
            later,
        )
        .await
        .unwrap();
    assert_eq!(updated.updated_by.as_deref(), Some("senior-cashier"));
    assert_eq!(updated.updated_at, later);

    let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(stored.updated_by.as_deref(), Some("senior-cashier"));
}
