use chrono::NaiveDateTime;

use hotel_pms::error::PmsError;
use hotel_pms::models::checkin_partner::{CheckinState, GuestData};
use hotel_pms::models::folio::FolioState;
use hotel_pms::models::reservation::{ReservationState, ReservationType};
use hotel_pms::services::{checkin, folio, reservation};

use crate::common::{d, stay, TestHarness};

fn at(date: &str, hour: u32) -> NaiveDateTime {
    d(date).and_hms_opt(hour, 0, 0).unwrap()
}

fn guest(first: &str, last: &str, document: &str) -> GuestData {
    GuestData {
        firstname: Some(first.into()),
        lastname: Some(last.into()),
        document_type: Some("passport".into()),
        document_number: Some(document.into()),
        ..Default::default()
    }
}

/// Confirmed two-adult stay from 2030-06-01 to 2030-06-03.
async fn confirmed_stay(harness: &TestHarness) -> (i64, i64) {
    let mut conn = harness.conn().await;
    let mut booking = stay(harness.double.id, "2030-06-01", "2030-06-03");
    booking.adults = 2;
    let created = folio::create_folio(&mut conn, &harness.folio("Jane Roe", vec![booking]), d("2030-01-15"))
        .await
        .unwrap();
    folio::confirm_folio(&mut conn, created.folio.id).await.unwrap();
    (created.folio.id, created.reservations[0].reservation.id)
}

#[actix_web::test]
async fn guest_data_completeness_drives_precheckin() {
    let harness = TestHarness::new().await;
    let (_, reservation_id) = confirmed_stay(&harness).await;
    let mut conn = harness.conn().await;

    let partial = checkin::register_guest(
        &mut conn,
        reservation_id,
        GuestData {
            firstname: Some("Jane".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(partial.state, CheckinState::Draft);

    let completed = checkin::update_guest(&mut conn, partial.id, guest("Jane", "Roe", "X123"))
        .await
        .unwrap();
    assert_eq!(completed.state, CheckinState::Precheckin);
    assert_eq!(completed.firstname.as_deref(), Some("Jane"));
}

#[actix_web::test]
async fn guests_are_limited_to_the_adults_booked() {
    let harness = TestHarness::new().await;
    let (_, reservation_id) = confirmed_stay(&harness).await;
    let mut conn = harness.conn().await;

    checkin::register_guest(&mut conn, reservation_id, guest("Jane", "Roe", "X1")).await.unwrap();
    let err = checkin::register_guest(&mut conn, reservation_id, guest("John", "Roe", "X1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::Conflict(_)), "got {err:?}");

    checkin::register_guest(&mut conn, reservation_id, guest("John", "Roe", "X2")).await.unwrap();
    let err = checkin::register_guest(&mut conn, reservation_id, guest("Baby", "Roe", "X3"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn onboarding_requires_complete_data_and_the_stay_window() {
    let harness = TestHarness::new().await;
    let (_, reservation_id) = confirmed_stay(&harness).await;
    let mut conn = harness.conn().await;

    let draft = checkin::register_guest(
        &mut conn,
        reservation_id,
        GuestData {
            firstname: Some("Jane".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let err = checkin::onboard_guest(&mut conn, draft.id, d("2030-06-01"), at("2030-06-01", 15))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");

    let ready = checkin::register_guest(&mut conn, reservation_id, guest("John", "Roe", "X2"))
        .await
        .unwrap();
    let err = checkin::onboard_guest(&mut conn, ready.id, d("2030-05-30"), at("2030-05-30", 15))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn draft_reservations_cannot_check_in() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let ready = checkin::register_guest(
        &mut conn,
        created.reservations[0].reservation.id,
        guest("Jane", "Roe", "X1"),
    )
    .await
    .unwrap();
    let err = checkin::onboard_guest(&mut conn, ready.id, d("2030-06-01"), at("2030-06-01", 15))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn full_stay_from_arrival_to_departure() {
    let harness = TestHarness::new().await;
    let (folio_id, reservation_id) = confirmed_stay(&harness).await;
    let mut conn = harness.conn().await;

    let jane = checkin::register_guest(&mut conn, reservation_id, guest("Jane", "Roe", "X1"))
        .await
        .unwrap();
    let onboard = checkin::onboard_guest(&mut conn, jane.id, d("2030-06-01"), at("2030-06-01", 15))
        .await
        .unwrap();
    assert_eq!(onboard.state, CheckinState::Onboard);
    assert_eq!(onboard.arrival, Some(at("2030-06-01", 15)));

    let booked = reservation::get_reservation(&mut conn, reservation_id).await.unwrap();
    assert_eq!(booked.state, ReservationState::Onboard);

    // Guests on board block cancellation.
    let err = folio::cancel_folio(&mut conn, folio_id, d("2030-06-01")).await.unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");

    let done = reservation::checkout_reservation(&mut conn, reservation_id, at("2030-06-03", 11))
        .await
        .unwrap();
    assert_eq!(done.state, ReservationState::Done);

    let guests = checkin::list_guests(&mut conn, reservation_id).await.unwrap();
    assert_eq!(guests[0].state, CheckinState::Done);
    assert_eq!(guests[0].departure, Some(at("2030-06-03", 11)));

    let closed = folio::get_folio(&mut conn, folio_id).await.unwrap();
    assert_eq!(closed.state, FolioState::Done);

    let err = checkin::update_guest(&mut conn, jane.id, GuestData::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn out_of_service_blocks_take_no_guests() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut input = harness.folio("x", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]);
    input.partner_name = None;
    input.reservation_type = ReservationType::Out;
    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();

    let err = checkin::register_guest(
        &mut conn,
        created.reservations[0].reservation.id,
        guest("Jane", "Roe", "X1"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn guests_of_cancelled_stays_are_read_only() {
    let harness = TestHarness::new().await;
    let (folio_id, reservation_id) = confirmed_stay(&harness).await;
    let mut conn = harness.conn().await;

    let jane = checkin::register_guest(&mut conn, reservation_id, guest("Jane", "Roe", "X1"))
        .await
        .unwrap();
    folio::cancel_folio(&mut conn, folio_id, d("2030-01-16")).await.unwrap();

    let err = checkin::update_guest(
        &mut conn,
        jane.id,
        GuestData {
            email: Some("jane@example.com".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}
