//! Sale listing filters, paging and ordering.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::{major, now, product, setup};
use vitrina_core::Sale;
use vitrina_db::{Database, EngineConfig, OpenShiftRequest, SaleEngine, SaleFilter, SaleRequest, ShiftService};

fn engine(db: &Database) -> SaleEngine {
    SaleEngine::new(db.clone(), EngineConfig::default())
}

async fn sell(db: &Database, at: DateTime<Utc>, tweak: impl FnOnce(&mut SaleRequest)) -> Sale {
    let mut request = SaleRequest {
        quantity: 1,
        ..Default::default()
    };
    tweak(&mut request);
    engine(db).create_sale_at(request, at).await.unwrap()
}

async fn list(db: &Database, filter: SaleFilter) -> Vec<String> {
    db.sales()
        .list(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|sale| sale.id)
        .collect()
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn test_filters_by_manager_branch_and_shift() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;
    let sofa = product(&db, "Диван", 2_000, 10, Some("Восток-5")).await;

    let shift = ShiftService::new(db.clone())
        .open_at(
            OpenShiftRequest {
                cashier_id: "m-1".to_string(),
                cashier_name: "Айгерим".to_string(),
                branch_name: None,
                opening_cash: major(100),
                note: None,
            },
            now() - Duration::hours(4),
        )
        .await
        .unwrap();

    let first = sell(&db, now() - Duration::hours(3), |r| {
        r.product_id = chair.id.clone();
        r.manager_id = Some("m-1".to_string());
    })
    .await;
    let second = sell(&db, now() - Duration::hours(2), |r| {
        r.product_id = sofa.id.clone();
        r.manager_id = Some("m-2".to_string());
    })
    .await;
    let third = sell(&db, now() - Duration::hours(1), |r| {
        r.product_id = chair.id.clone();
        r.manager_id = Some("m-1".to_string());
        r.shift_id = Some(shift.id.clone());
    })
    .await;

    let by_manager = list(
        &db,
        SaleFilter {
            manager_id: Some("m-1".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(by_manager, vec![third.id.clone(), first.id.clone()]);

    let by_branch = list(
        &db,
        SaleFilter {
            branch: Some("Восток-5".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(by_branch, vec![second.id.clone()]);

    let by_shift = list(
        &db,
        SaleFilter {
            shift_id: Some(shift.id.clone()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(by_shift, vec![third.id.clone()]);

    // Blank filters are ignored
    let blank = list(
        &db,
        SaleFilter {
            manager_id: Some("  ".to_string()),
            branch: Some(String::new()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(blank, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn test_free_text_is_case_insensitive_for_cyrillic() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;
    let table = product(&db, "Стол", 500, 10, None).await;

    let chair_sale = sell(&db, now() - Duration::hours(2), |r| {
        r.product_id = chair.id.clone();
        r.client_name = Some("Айгерим".to_string());
    })
    .await;
    let table_sale = sell(&db, now() - Duration::hours(1), |r| {
        r.product_id = table.id.clone();
        r.comment = Some("Доставка в пятницу, скидка 50%".to_string());
    })
    .await;

    let q = |text: &str| SaleFilter {
        q: Some(text.to_string()),
        ..Default::default()
    };

    assert_eq!(list(&db, q("кресло")).await, vec![chair_sale.id.clone()]);
    assert_eq!(list(&db, q("КРЕСЛО")).await, vec![chair_sale.id.clone()]);
    assert_eq!(list(&db, q("айГЕРИМ")).await, vec![chair_sale.id.clone()]);
    assert_eq!(list(&db, q("ДОСТАВКА")).await, vec![table_sale.id.clone()]);
    assert_eq!(list(&db, q("50%")).await, vec![table_sale.id.clone()]);
    assert!(list(&db, q("5_%")).await.is_empty());
    assert!(list(&db, q("шкаф")).await.is_empty());

    // A comment written later is searchable too
    engine(&db)
        .update_sale_at(
            &chair_sale.id,
            vitrina_db::SaleDetailsUpdate {
                comment: Some("Подарочная УПАКОВКА".to_string()),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap();
    assert_eq!(list(&db, q("упаковка")).await, vec![chair_sale.id]);
}

#[tokio::test]
async fn test_date_bounds_use_manual_date_when_present() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;

    let backdated = sell(&db, now(), |r| {
        r.product_id = chair.id.clone();
        r.manual_date = Some(now() - Duration::days(10));
    })
    .await;
    let today = sell(&db, now() - Duration::minutes(30), |r| {
        r.product_id = chair.id.clone();
    })
    .await;

    let recent = list(
        &db,
        SaleFilter {
            date_from: Some(now() - Duration::days(1)),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(recent, vec![today.id.clone()]);

    let older = list(
        &db,
        SaleFilter {
            date_to: Some(now() - Duration::days(5)),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(older, vec![backdated.id.clone()]);

    // Bounds are inclusive
    let exact = list(
        &db,
        SaleFilter {
            date_from: Some(now() - Duration::days(10)),
            date_to: Some(now() - Duration::days(10)),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(exact, vec![backdated.id]);
}

// =============================================================================
// Paging & ordering
// =============================================================================

#[tokio::test]
async fn test_newest_first_with_offset() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 10, None).await;

    let mut ids = Vec::new();
    for hours in [5, 1, 3] {
        let sale = sell(&db, now() - Duration::hours(hours), |r| r.product_id = chair.id.clone()).await;
        ids.push(sale.id);
    }
    // Same timestamp: the later insert comes first
    let tie = sell(&db, now() - Duration::hours(1), |r| r.product_id = chair.id.clone()).await;

    let all = list(&db, SaleFilter::default()).await;
    assert_eq!(all, vec![tie.id.clone(), ids[1].clone(), ids[2].clone(), ids[0].clone()]);

    let page = list(
        &db,
        SaleFilter {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(page, vec![ids[1].clone(), ids[2].clone()]);

    let negative = list(
        &db,
        SaleFilter {
            offset: Some(-3),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(negative, all);
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let db = setup().await;
    let chair = product(&db, "Кресло", 1_000, 600, None).await;

    for i in 0..501 {
        sell(&db, now() - Duration::seconds(i), |r| r.product_id = chair.id.clone()).await;
    }

    let limited = |limit: Option<i64>| SaleFilter {
        limit,
        ..Default::default()
    };

    assert_eq!(list(&db, limited(Some(0))).await.len(), 1);
    assert_eq!(list(&db, limited(Some(-10))).await.len(), 1);
    assert_eq!(list(&db, limited(Some(3))).await.len(), 3);
    assert_eq!(list(&db, limited(None)).await.len(), 200);
    assert_eq!(list(&db, limited(Some(10_000))).await.len(), 500);
}
