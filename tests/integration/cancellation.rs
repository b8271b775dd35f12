use hotel_pms::error::PmsError;
use hotel_pms::models::cancelation_rule::{ApplyOn, CancelReason, CreateCancelationRule};
use hotel_pms::models::folio::{CreateFolio, FolioState};
use hotel_pms::models::pricelist::CreatePricelist;
use hotel_pms::models::reservation::ReservationState;
use hotel_pms::services::{folio, pricing, reservation};

use crate::common::{d, stay, TestHarness};

/// Free until 7 days before arrival, then the first night at 50%; no-shows
/// pay every night.
async fn strict_folio(harness: &TestHarness) -> CreateFolio {
    let mut conn = harness.conn().await;
    let rule = pricing::create_cancelation_rule(
        &mut conn,
        &CreateCancelationRule {
            name: "Strict".into(),
            days_intime: 7,
            penalty_late: 50.0,
            apply_on_late: ApplyOn::First,
            days_late: 0,
            penalty_noshow: 100.0,
            apply_on_noshow: ApplyOn::All,
            days_noshow: 0,
        },
    )
    .await
    .unwrap();
    let pricelist = pricing::create_pricelist(
        &mut conn,
        &CreatePricelist {
            name: "Non refundable".into(),
            property_id: Some(harness.property.id),
            cancelation_rule_id: Some(rule.id),
            availability_plan_id: None,
        },
    )
    .await
    .unwrap();

    let mut input = harness.folio("Jane Roe", vec![stay(harness.double.id, "2030-06-10", "2030-06-13")]);
    input.pricelist_id = Some(pricelist.id);
    input
}

#[actix_web::test]
async fn early_cancellation_is_free() {
    let harness = TestHarness::new().await;
    let input = strict_folio(&harness).await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();
    let id = created.reservations[0].reservation.id;

    let cancelled = reservation::cancel_reservation(&mut conn, id, d("2030-05-01")).await.unwrap();
    assert_eq!(cancelled.state, ReservationState::Cancel);
    assert_eq!(cancelled.cancelled_reason, Some(CancelReason::Intime));
    assert_eq!(cancelled.price_total, 0.0);

    let refreshed = folio::get_folio(&mut conn, created.folio.id).await.unwrap();
    assert_eq!(refreshed.state, FolioState::Cancel);
    assert_eq!(refreshed.amount_total, 0.0);
}

#[actix_web::test]
async fn late_cancellation_charges_the_first_night() {
    let harness = TestHarness::new().await;
    let input = strict_folio(&harness).await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();
    let id = created.reservations[0].reservation.id;

    let cancelled = reservation::cancel_reservation(&mut conn, id, d("2030-06-05")).await.unwrap();
    assert_eq!(cancelled.cancelled_reason, Some(CancelReason::Late));
    assert_eq!(cancelled.price_subtotal, 50.0);

    let lines = reservation::reservation_lines(&mut conn, id).await.unwrap();
    let discounts: Vec<f64> = lines.iter().map(|l| l.cancel_discount).collect();
    assert_eq!(discounts, vec![50.0, 100.0, 100.0]);

    let refreshed = folio::get_folio(&mut conn, created.folio.id).await.unwrap();
    assert_eq!(refreshed.amount_total, 55.0);
}

#[actix_web::test]
async fn no_show_pays_the_whole_stay() {
    let harness = TestHarness::new().await;
    let input = strict_folio(&harness).await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();
    let id = created.reservations[0].reservation.id;

    let cancelled = reservation::cancel_reservation(&mut conn, id, d("2030-06-10")).await.unwrap();
    assert_eq!(cancelled.cancelled_reason, Some(CancelReason::Noshow));
    assert_eq!(cancelled.price_subtotal, 300.0);
}

#[actix_web::test]
async fn without_rule_cancelling_is_free() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-10", "2030-06-13")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let cancelled = reservation::cancel_reservation(
        &mut conn,
        created.reservations[0].reservation.id,
        d("2030-06-10"),
    )
    .await
    .unwrap();
    assert_eq!(cancelled.cancelled_reason, None);
    assert_eq!(cancelled.price_subtotal, 0.0);
}

#[actix_web::test]
async fn reconfirming_restores_prices_and_room() {
    let harness = TestHarness::new().await;
    let input = strict_folio(&harness).await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();
    let id = created.reservations[0].reservation.id;
    reservation::cancel_reservation(&mut conn, id, d("2030-06-05")).await.unwrap();

    let confirmed = reservation::confirm_reservation(&mut conn, id).await.unwrap();
    assert_eq!(confirmed.state, ReservationState::Confirm);
    assert_eq!(confirmed.cancelled_reason, None);
    assert_eq!(confirmed.price_subtotal, 300.0);

    let refreshed = folio::get_folio(&mut conn, created.folio.id).await.unwrap();
    assert_eq!(refreshed.state, FolioState::Confirm);
}

#[actix_web::test]
async fn reconfirming_fails_once_the_rooms_are_sold() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let booking = stay(harness.single.id, "2030-06-10", "2030-06-12");
    let created = folio::create_folio(&mut conn, &harness.folio("A", vec![booking.clone()]), d("2030-01-15"))
        .await
        .unwrap();
    let id = created.reservations[0].reservation.id;
    reservation::cancel_reservation(&mut conn, id, d("2030-05-01")).await.unwrap();

    // The cancelled stay released the only single room.
    folio::create_folio(&mut conn, &harness.folio("B", vec![booking]), d("2030-01-15"))
        .await
        .unwrap();

    let err = reservation::confirm_reservation(&mut conn, id).await.unwrap_err();
    assert!(matches!(err, PmsError::Conflict(_)), "got {err:?}");
}

#[actix_web::test]
async fn cancelled_reservations_cannot_be_cancelled_again() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-10", "2030-06-12")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let id = created.reservations[0].reservation.id;
    reservation::cancel_reservation(&mut conn, id, d("2030-05-01")).await.unwrap();
    let err = reservation::cancel_reservation(&mut conn, id, d("2030-05-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}
