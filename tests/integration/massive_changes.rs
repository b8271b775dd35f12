use hotel_pms::error::PmsError;
use hotel_pms::models::availability::{CreateAvailabilityPlan, RuleQuery, RuleValues};
use hotel_pms::models::wizard::{MassiveChangeTarget, MassiveChanges, MassiveChangesResult};
use hotel_pms::services::{availability, massive_changes, pricing};

use crate::common::{d, TestHarness};

fn price_changes(harness: &TestHarness, price: f64) -> MassiveChanges {
    MassiveChanges {
        target: MassiveChangeTarget::Pricelist,
        property_id: harness.property.id,
        date_from: d("2030-06-01"),
        date_to: d("2030-06-07"),
        // Saturdays and Sundays; 2030-06-01 is a Saturday.
        weekdays: vec![5, 6],
        room_type_ids: Vec::new(),
        pricelist_id: Some(harness.pricelist.id),
        price: Some(price),
        availability_plan_id: None,
        rules: RuleValues::default(),
    }
}

#[actix_web::test]
async fn weekend_prices_are_created_then_updated() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let first = massive_changes::apply_massive_changes(&mut conn, &price_changes(&harness, 120.0))
        .await
        .unwrap();
    assert_eq!(first, MassiveChangesResult { created: 4, updated: 0 });

    let second = massive_changes::apply_massive_changes(&mut conn, &price_changes(&harness, 130.0))
        .await
        .unwrap();
    assert_eq!(second, MassiveChangesResult { created: 0, updated: 4 });

    let prices = pricing::nightly_prices(
        &mut conn,
        Some(harness.pricelist.id),
        harness.double.id,
        harness.property.id,
        d("2030-06-01"),
        d("2030-06-05"),
    )
    .await
    .unwrap();
    let prices: Vec<f64> = prices.iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![130.0, 130.0, 100.0, 100.0]);
}

#[actix_web::test]
async fn restrictions_keep_values_not_sent() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;
    let plan = availability::create_plan(
        &mut conn,
        &CreateAvailabilityPlan {
            name: "Summer".into(),
        },
    )
    .await
    .unwrap();

    let mut changes = MassiveChanges {
        target: MassiveChangeTarget::AvailabilityPlan,
        property_id: harness.property.id,
        date_from: d("2030-06-01"),
        date_to: d("2030-06-03"),
        weekdays: Vec::new(),
        room_type_ids: vec![harness.double.id],
        pricelist_id: None,
        price: None,
        availability_plan_id: Some(plan.id),
        rules: RuleValues {
            closed: Some(true),
            ..Default::default()
        },
    };
    let created = massive_changes::apply_massive_changes(&mut conn, &changes).await.unwrap();
    assert_eq!(created, MassiveChangesResult { created: 3, updated: 0 });

    changes.rules = RuleValues {
        min_stay: Some(2),
        ..Default::default()
    };
    let updated = massive_changes::apply_massive_changes(&mut conn, &changes).await.unwrap();
    assert_eq!(updated, MassiveChangesResult { created: 0, updated: 3 });

    let rules = availability::list_rules(
        &mut conn,
        plan.id,
        &RuleQuery {
            room_type_id: Some(harness.double.id),
            property_id: Some(harness.property.id),
            date_from: d("2030-06-01"),
            date_to: d("2030-06-30"),
        },
    )
    .await
    .unwrap();
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().all(|r| r.closed && r.min_stay == 2));
}

#[actix_web::test]
async fn incomplete_changes_are_rejected() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut changes = price_changes(&harness, 120.0);
    changes.price = None;
    let err = massive_changes::apply_massive_changes(&mut conn, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");

    let mut changes = price_changes(&harness, 120.0);
    changes.date_to = d("2030-05-01");
    let err = massive_changes::apply_massive_changes(&mut conn, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");

    let changes = MassiveChanges {
        target: MassiveChangeTarget::AvailabilityPlan,
        availability_plan_id: None,
        ..price_changes(&harness, 120.0)
    };
    let err = massive_changes::apply_massive_changes(&mut conn, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");
}
