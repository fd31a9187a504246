//! Cash shift open / report / close with carried debt.

mod common;

use chrono::Duration;
use common::{major, now, product, setup};
use vitrina_core::{CoreError, ErrorKind, Money, PaymentDetails, ShiftStatus};
use vitrina_db::{
    CloseShiftRequest, Database, EngineConfig, EngineError, OpenShiftRequest, SaleEngine, SaleRequest, ShiftService,
};

fn open_request(cashier_id: &str, opening_cash: Money) -> OpenShiftRequest {
    OpenShiftRequest {
        cashier_id: cashier_id.to_string(),
        cashier_name: "Бакыт".to_string(),
        branch_name: Some("Центральный".to_string()),
        opening_cash,
        note: Some("утро".to_string()),
    }
}

fn close_request(closing_cash: Money) -> CloseShiftRequest {
    CloseShiftRequest {
        closing_cash,
        note: None,
    }
}

async fn sell(db: &Database, product_id: &str, shift_id: &str, payment: PaymentDetails) {
    let request = SaleRequest {
        product_id: product_id.to_string(),
        quantity: 1,
        payment,
        shift_id: Some(shift_id.to_string()),
        manager_id: Some("c1".to_string()),
        ..Default::default()
    };
    SaleEngine::new(db.clone(), EngineConfig::default())
        .create_sale_at(request, now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_one_open_shift_per_cashier() {
    let db = setup().await;
    let shifts = ShiftService::new(db.clone());

    let shift = shifts.open_at(open_request("c1", major(100)), now()).await.unwrap();
    assert_eq!(shift.status, ShiftStatus::Open);
    assert_eq!(shift.debt_before_cents, Some(0));
    assert_eq!(shift.note_open.as_deref(), Some("утро"));

    let err = shifts.open_at(open_request("c1", major(100)), now()).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ShiftAlreadyOpen(_))));
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));

    // Another cashier is independent.
    shifts.open_at(open_request("c2", Money::zero()), now()).await.unwrap();

    let current = shifts.current("c1").await.unwrap().unwrap();
    assert_eq!(current.id, shift.id);
    assert!(shifts.current("c3").await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_validation() {
    let db = setup().await;
    let shifts = ShiftService::new(db.clone());

    let mut request = open_request("c1", major(100));
    request.cashier_name = "  ".to_string();
    let err = shifts.open_at(request, now()).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let err = shifts
        .open_at(open_request("c1", Money::from_cents(-1)), now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn test_report_and_close_with_shortage() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;
    let shifts = ShiftService::new(db.clone());
    let shift = shifts.open_at(open_request("c1", major(100)), now()).await.unwrap();

    sell(&db, &chair.id, &shift.id, PaymentDetails::Cash).await;
    sell(
        &db,
        &chair.id,
        &shift.id,
        PaymentDetails::Installment {
            provider: "Зеро".to_string(),
            months: 8,
        },
    )
    .await;

    let report = shifts.report(&shift.id).await.unwrap();
    assert_eq!(report.totals.total_orders, 2);
    assert_eq!(report.totals.total_revenue, major(2_000));
    assert_eq!(report.totals.cash_revenue, major(1_000));
    assert_eq!(report.totals.installment_revenue, major(1_000));
    assert_eq!(report.expected_cash, major(1_100));
    assert_eq!(report.sales.len(), 2);

    let closed = shifts
        .close_at(&shift.id, close_request(major(900)), now() + Duration::hours(8))
        .await
        .unwrap();
    assert_eq!(closed.shift.status, ShiftStatus::Closed);
    assert_eq!(closed.shift.closed_at, Some(now() + Duration::hours(8)));
    assert_eq!(closed.shift.expected_cash_cents, Some(110_000));
    assert_eq!(closed.shift.difference_cents, Some(-20_000));
    assert_eq!(closed.shortage, major(200));
    assert_eq!(closed.overage, Money::zero());
    assert_eq!(closed.debt_after, major(200));

    let err = shifts
        .close_at(&shift.id, close_request(major(900)), now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ShiftClosed(_))));
}

#[tokio::test]
async fn test_debt_carries_across_shifts() {
    let db = setup().await;
    let shifts = ShiftService::new(db.clone());

    let first = shifts.open_at(open_request("c1", major(300)), now()).await.unwrap();
    shifts
        .close_at(&first.id, close_request(major(100)), now() + Duration::hours(1))
        .await
        .unwrap();

    let second = shifts
        .open_at(open_request("c1", Money::zero()), now() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(second.debt_before_cents, Some(20_000));

    let closed = shifts
        .close_at(&second.id, close_request(major(50)), now() + Duration::hours(3))
        .await
        .unwrap();
    assert_eq!(closed.overage, major(50));
    assert_eq!(closed.debt_after, major(150));

    let third = shifts
        .open_at(open_request("c1", Money::zero()), now() + Duration::hours(4))
        .await
        .unwrap();
    assert_eq!(third.debt_before_cents, Some(15_000));

    let listed = shifts.list(Some("c1"), None).await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, third.id);
    assert_eq!(listed[2].id, first.id);

    let limited = shifts.list(None, Some(0)).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_unknown_shift() {
    let db = setup().await;
    let shifts = ShiftService::new(db.clone());

    let err = shifts.get("missing").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    let err = shifts.report("missing").await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    let err = shifts
        .close_at("missing", close_request(Money::zero()), now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
}
