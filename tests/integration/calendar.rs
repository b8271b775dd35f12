use hotel_pms::error::PmsError;
use hotel_pms::models::calendar::CalendarQuery;
use hotel_pms::services::{calendar, folio};

use crate::common::{d, stay, TestHarness};

#[actix_web::test]
async fn calendar_shows_occupation_and_free_rooms() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("Jane Roe", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();

    let view = calendar::property_calendar(
        &mut conn,
        harness.property.id,
        &CalendarQuery {
            date_from: d("2030-06-01"),
            date_to: d("2030-06-04"),
            pricelist_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(view.pricelist_id, Some(harness.pricelist.id));
    assert_eq!(view.room_types.len(), 2);

    let double = &view.room_types[0];
    assert_eq!(double.code, "DBL");
    let free: Vec<i64> = double.days.iter().map(|day| day.free_rooms).collect();
    assert_eq!(free, vec![1, 1, 2]);
    assert!(double.days.iter().all(|day| day.price == 100.0 && day.rule.is_none()));

    let booked = &double.rooms[0];
    assert_eq!(booked.name, "101");
    assert_eq!(booked.reservations.len(), 1);
    assert_eq!(booked.reservations[0].reservation_id, created.reservations[0].reservation.id);
    assert_eq!(booked.reservations[0].partner_name.as_deref(), Some("Jane Roe"));
    assert_eq!(booked.reservations[0].nights, vec![d("2030-06-01"), d("2030-06-02")]);
    assert!(double.rooms[1].reservations.is_empty());

    let single = &view.room_types[1];
    assert!(single.days.iter().all(|day| day.free_rooms == 1 && day.price == 60.0));
}

#[actix_web::test]
async fn cancelled_stays_leave_the_calendar() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.single.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    folio::cancel_folio(&mut conn, created.folio.id, d("2030-01-16")).await.unwrap();

    let view = calendar::property_calendar(
        &mut conn,
        harness.property.id,
        &CalendarQuery {
            date_from: d("2030-06-01"),
            date_to: d("2030-06-03"),
            pricelist_id: None,
        },
    )
    .await
    .unwrap();
    let single = &view.room_types[1];
    assert!(single.rooms[0].reservations.is_empty());
    assert!(single.days.iter().all(|day| day.free_rooms == 1));
}

#[actix_web::test]
async fn oversized_windows_are_rejected() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let err = calendar::property_calendar(
        &mut conn,
        harness.property.id,
        &CalendarQuery {
            date_from: d("2030-01-01"),
            date_to: d("2031-06-01"),
            pricelist_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::Validation(_)), "got {err:?}");
}
