use hotel_pms::error::PmsError;
use hotel_pms::models::board_service::{AttachBoardService, CreateBoardService, CreateBoardServiceLine};
use hotel_pms::models::folio::{FolioState, PaymentState};
use hotel_pms::models::pricelist::CreatePricelistItem;
use hotel_pms::models::room::CreateRoom;
use hotel_pms::models::reservation::{
    ReservationState, ReservationType, UpdateReservation, UpdateReservationLine,
};
use hotel_pms::services::{folio, inventory, pricing, reservation, service};

use crate::common::{d, stay, TestHarness};

#[actix_web::test]
async fn folio_with_reservation_prices_every_night() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut double = stay(harness.double.id, "2030-06-01", "2030-06-04");
    double.adults = 2;
    let created = folio::create_folio(&mut conn, &harness.folio("Jane Roe", vec![double]), d("2030-01-15"))
        .await
        .unwrap();

    assert_eq!(created.folio.name, "F/3000001");
    assert_eq!(created.folio.state, FolioState::Draft);
    assert_eq!(created.folio.pricelist_id, Some(harness.pricelist.id));
    assert_eq!(created.reservations.len(), 1);

    let detail = &created.reservations[0];
    assert_eq!(detail.reservation.name, "F/3000001/1");
    assert_eq!(detail.reservation.nights, 3);
    assert_eq!(detail.reservation.state, ReservationState::Draft);
    assert_eq!(detail.lines.len(), 3);
    assert!(detail.lines.iter().all(|l| l.price == 100.0));
    assert!(detail.lines.iter().all(|l| l.room_id == detail.reservation.preferred_room_id));
    assert_eq!(detail.reservation.price_subtotal, 300.0);

    assert_eq!(created.folio.amount_untaxed, 300.0);
    assert_eq!(created.folio.amount_tax, 30.0);
    assert_eq!(created.folio.amount_total, 330.0);
    assert_eq!(created.folio.pending_amount, 330.0);
    assert_eq!(created.folio.payment_state, PaymentState::NotPaid);
}

#[actix_web::test]
async fn partner_name_is_required_for_normal_folios() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut input = harness.folio("x", vec![]);
    input.partner_name = None;
    let err = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");
}

#[actix_web::test]
async fn staff_stays_are_free() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut input = harness.folio("x", vec![stay(harness.single.id, "2030-06-01", "2030-06-03")]);
    input.partner_name = None;
    input.reservation_type = ReservationType::Staff;
    let created = folio::create_folio(&mut conn, &input, d("2030-01-15")).await.unwrap();

    assert!(created.reservations[0].lines.iter().all(|l| l.price == 0.0));
    assert_eq!(created.folio.amount_total, 0.0);
    assert_eq!(created.folio.payment_state, PaymentState::NothingToPay);
}

#[actix_web::test]
async fn rooms_are_assigned_until_the_type_is_full() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let booking = stay(harness.double.id, "2030-06-01", "2030-06-03");
    let first = folio::create_folio(&mut conn, &harness.folio("A", vec![booking.clone()]), d("2030-01-15"))
        .await
        .unwrap();
    let second = folio::create_folio(&mut conn, &harness.folio("B", vec![booking.clone()]), d("2030-01-15"))
        .await
        .unwrap();
    assert_ne!(
        first.reservations[0].reservation.preferred_room_id,
        second.reservations[0].reservation.preferred_room_id
    );

    let third = folio::create_folio(&mut conn, &harness.folio("C", vec![]), d("2030-01-15"))
        .await
        .unwrap();
    let err = reservation::create_for_folio(&mut conn, third.folio.id, &booking)
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::Conflict(_)), "got {err:?}");

    let mut overbooked = booking;
    overbooked.overbooking = true;
    let placed = reservation::create_for_folio(&mut conn, third.folio.id, &overbooked)
        .await
        .unwrap();
    assert!(placed.overbooking);
    assert!(placed.preferred_room_id.is_some());
}

#[actix_web::test]
async fn preferred_room_falls_back_when_taken() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;
    let room_101 = harness.rooms[0].id;

    let mut booking = stay(harness.double.id, "2030-06-01", "2030-06-03");
    booking.preferred_room_id = Some(room_101);
    let first = folio::create_folio(&mut conn, &harness.folio("A", vec![booking.clone()]), d("2030-01-15"))
        .await
        .unwrap();
    assert_eq!(first.reservations[0].reservation.preferred_room_id, Some(room_101));

    let second = folio::create_folio(&mut conn, &harness.folio("B", vec![booking]), d("2030-01-15"))
        .await
        .unwrap();
    assert_eq!(
        second.reservations[0].reservation.preferred_room_id,
        Some(harness.rooms[1].id)
    );
}

#[actix_web::test]
async fn guests_must_fit_the_room() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let mut crowded = stay(harness.double.id, "2030-06-01", "2030-06-03");
    crowded.adults = 2;
    crowded.children = 1;
    let err = folio::create_folio(&mut conn, &harness.folio("A", vec![crowded]), d("2030-01-15"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn checkout_must_follow_checkin() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let err = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-03", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");
}

#[actix_web::test]
async fn extending_a_stay_keeps_negotiated_prices() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let detail = &created.reservations[0];

    reservation::update_line(
        &mut conn,
        detail.lines[0].id,
        &UpdateReservationLine {
            price: Some(80.0),
            discount: Some(10.0),
        },
    )
    .await
    .unwrap();

    pricing::add_pricelist_item(
        &mut conn,
        harness.pricelist.id,
        &CreatePricelistItem {
            room_type_id: harness.double.id,
            property_id: None,
            date_start: d("2030-06-03"),
            date_end: d("2030-06-03"),
            fixed_price: 130.0,
        },
    )
    .await
    .unwrap();

    let updated = reservation::update_reservation(
        &mut conn,
        detail.reservation.id,
        &UpdateReservation {
            checkout: Some(d("2030-06-04")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.nights, 3);
    // 80 - 10% + 100 + 130
    assert_eq!(updated.price_subtotal, 302.0);

    let lines = reservation::reservation_lines(&mut conn, updated.id).await.unwrap();
    assert_eq!(lines[0].price_total, 72.0);
    assert_eq!(lines[2].price, 130.0);

    let shortened = reservation::update_reservation(
        &mut conn,
        updated.id,
        &UpdateReservation {
            checkin: Some(d("2030-06-02")),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(shortened.nights, 2);
    assert_eq!(shortened.price_subtotal, 230.0);

    let refreshed = folio::get_folio(&mut conn, created.folio.id).await.unwrap();
    assert_eq!(refreshed.amount_untaxed, 230.0);
}

#[actix_web::test]
async fn moving_a_stay_onto_an_occupied_room_fails() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let booking = stay(harness.single.id, "2030-06-01", "2030-06-03");
    folio::create_folio(&mut conn, &harness.folio("A", vec![booking]), d("2030-01-15"))
        .await
        .unwrap();
    let later = folio::create_folio(
        &mut conn,
        &harness.folio("B", vec![stay(harness.single.id, "2030-06-03", "2030-06-05")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();

    let err = reservation::update_reservation(
        &mut conn,
        later.reservations[0].reservation.id,
        &UpdateReservation {
            checkin: Some(d("2030-06-02")),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::Conflict(_)), "got {err:?}");
}

#[actix_web::test]
async fn default_board_service_is_charged_per_adult_and_night() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let board = inventory::create_board_service(
        &mut conn,
        &CreateBoardService {
            property_id: harness.property.id,
            name: "Bed & Breakfast".into(),
            code: "BB".into(),
            lines: vec![CreateBoardServiceLine {
                name: "Breakfast".into(),
                amount: 8.0,
                per_person: true,
            }],
        },
    )
    .await
    .unwrap();
    assert_eq!(board.amount, 8.0);
    inventory::attach_board_service(
        &mut conn,
        board.board_service.id,
        &AttachBoardService {
            room_type_id: harness.double.id,
            amount_override: None,
            by_default: true,
        },
    )
    .await
    .unwrap();

    let mut booking = stay(harness.double.id, "2030-06-01", "2030-06-04");
    booking.adults = 2;
    let created = folio::create_folio(&mut conn, &harness.folio("A", vec![booking]), d("2030-01-15"))
        .await
        .unwrap();
    let detail = &created.reservations[0];
    assert!(detail.reservation.board_service_room_type_id.is_some());
    assert_eq!(detail.reservation.price_services, 48.0);
    assert_eq!(detail.reservation.price_total, 348.0);
    assert_eq!(created.folio.amount_untaxed, 348.0);

    let board_charge = created.services.iter().find(|s| s.service.is_board_service).unwrap();
    assert_eq!(board_charge.lines.len(), 3);
    let err = service::delete_service(&mut conn, board_charge.service.id).await.unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");

    // One adult less: the charge follows the occupancy.
    let updated = reservation::update_reservation(
        &mut conn,
        detail.reservation.id,
        &UpdateReservation {
            adults: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.price_services, 24.0);

    let removed = reservation::update_reservation(
        &mut conn,
        detail.reservation.id,
        &UpdateReservation {
            remove_board_service: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(removed.board_service_room_type_id, None);
    assert_eq!(removed.price_services, 0.0);
}

#[actix_web::test]
async fn large_parties_get_a_room_that_holds_them() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let family_room = inventory::create_room(
        &mut conn,
        &CreateRoom {
            room_type_id: harness.double.id,
            name: "103".into(),
            capacity: 4,
            extra_beds: 0,
            sequence: 20,
        },
    )
    .await
    .unwrap();

    let mut party = stay(harness.double.id, "2030-06-01", "2030-06-03");
    party.adults = 3;
    let created = folio::create_folio(&mut conn, &harness.folio("A", vec![party.clone()]), d("2030-01-15"))
        .await
        .unwrap();
    let detail = &created.reservations[0];
    assert_eq!(detail.reservation.preferred_room_id, Some(family_room.id));
    assert!(detail.lines.iter().all(|l| l.room_id == Some(family_room.id)));

    // 101 and 102 are still free but hold two guests each.
    let err = folio::create_folio(&mut conn, &harness.folio("B", vec![party]), d("2030-01-15"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}
