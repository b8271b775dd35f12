use hotel_pms::error::PmsError;
use hotel_pms::models::board_service::{AttachBoardService, CreateBoardService, CreateBoardServiceLine};
use hotel_pms::models::folio::InvoiceStatus;
use hotel_pms::models::reservation::{UpdateReservation, UpdateReservationLine};
use hotel_pms::models::service::CreateService;
use hotel_pms::services::{folio, inventory, invoice, reservation, service};

use crate::common::{d, stay, TestHarness};

#[actix_web::test]
async fn draft_folios_are_not_invoiced() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-01", "2030-06-04")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    assert_eq!(created.folio.invoice_status, InvoiceStatus::No);

    let err = invoice::create_invoice(&mut conn, created.folio.id, d("2030-06-04"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn invoice_groups_nights_by_price() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("Jane Roe", vec![stay(harness.double.id, "2030-06-01", "2030-06-04")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let folio_id = created.folio.id;
    let detail = &created.reservations[0];
    reservation::update_line(
        &mut conn,
        detail.lines[2].id,
        &UpdateReservationLine {
            price: Some(120.0),
            discount: None,
        },
    )
    .await
    .unwrap();
    service::add_service(
        &mut conn,
        folio_id,
        &CreateService {
            reservation_id: Some(detail.reservation.id),
            name: "Late checkout".into(),
            price_unit: 15.0,
            quantity: 1,
            per_day: false,
            per_person: false,
            discount: 0.0,
        },
    )
    .await
    .unwrap();

    let confirmed = folio::confirm_folio(&mut conn, folio_id).await.unwrap();
    assert_eq!(confirmed.invoice_status, InvoiceStatus::ToInvoice);

    let issued = invoice::create_invoice(&mut conn, folio_id, d("2030-06-04")).await.unwrap();
    assert_eq!(issued.invoice.name, "INV/2030/00001");
    assert_eq!(issued.invoice.partner_name.as_deref(), Some("Jane Roe"));
    assert_eq!(issued.lines.len(), 3);
    assert_eq!(issued.lines[0].quantity, 2.0);
    assert_eq!(issued.lines[0].price_subtotal, 200.0);
    assert_eq!(issued.lines[1].price_unit, 120.0);
    assert!(issued.lines[2].service_id.is_some());
    assert_eq!(issued.invoice.amount_untaxed, 335.0);
    assert_eq!(issued.invoice.amount_tax, 33.5);
    assert_eq!(issued.invoice.amount_total, 368.5);

    let invoiced = folio::get_folio(&mut conn, folio_id).await.unwrap();
    assert_eq!(invoiced.invoice_status, InvoiceStatus::Invoiced);
    assert_eq!(invoice::list_invoices(&mut conn, folio_id).await.unwrap().len(), 1);

    let err = invoice::create_invoice(&mut conn, folio_id, d("2030-06-04"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn invoiced_nights_are_locked() {
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
    folio::confirm_folio(&mut conn, created.folio.id).await.unwrap();
    invoice::create_invoice(&mut conn, created.folio.id, d("2030-06-03")).await.unwrap();

    let err = reservation::update_line(
        &mut conn,
        detail.lines[0].id,
        &UpdateReservationLine {
            price: Some(1.0),
            discount: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");

    let err = reservation::cancel_reservation(&mut conn, detail.reservation.id, d("2030-05-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, PmsError::UserError(_)), "got {err:?}");
}

#[actix_web::test]
async fn later_charges_go_on_a_new_invoice() {
    let harness = TestHarness::new().await;
    let mut conn = harness.conn().await;

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    folio::confirm_folio(&mut conn, created.folio.id).await.unwrap();
    invoice::create_invoice(&mut conn, created.folio.id, d("2030-06-03")).await.unwrap();

    service::add_service(
        &mut conn,
        created.folio.id,
        &CreateService {
            reservation_id: None,
            name: "Laundry".into(),
            price_unit: 12.0,
            quantity: 2,
            per_day: false,
            per_person: false,
            discount: 0.0,
        },
    )
    .await
    .unwrap();
    let pending = folio::get_folio(&mut conn, created.folio.id).await.unwrap();
    assert_eq!(pending.invoice_status, InvoiceStatus::ToInvoice);

    let second = invoice::create_invoice(&mut conn, created.folio.id, d("2030-06-03")).await.unwrap();
    assert_eq!(second.invoice.name, "INV/2030/00002");
    assert_eq!(second.lines.len(), 1);
    assert_eq!(second.lines[0].quantity, 2.0);
    assert_eq!(second.invoice.amount_untaxed, 24.0);

    let detail = invoice::get_invoice(&mut conn, second.invoice.id).await.unwrap();
    assert_eq!(detail.lines.len(), 1);
}

#[actix_web::test]
async fn extending_an_invoiced_stay_charges_breakfast_once() {
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
                amount: 10.0,
                per_person: true,
            }],
        },
    )
    .await
    .unwrap();
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

    let created = folio::create_folio(
        &mut conn,
        &harness.folio("A", vec![stay(harness.double.id, "2030-06-01", "2030-06-03")]),
        d("2030-01-15"),
    )
    .await
    .unwrap();
    let folio_id = created.folio.id;
    let reservation_id = created.reservations[0].reservation.id;
    folio::confirm_folio(&mut conn, folio_id).await.unwrap();
    let issued = invoice::create_invoice(&mut conn, folio_id, d("2030-06-01")).await.unwrap();
    assert_eq!(issued.invoice.amount_untaxed, 220.0);

    reservation::update_reservation(
        &mut conn,
        reservation_id,
        &UpdateReservation {
            checkout: Some(d("2030-06-04")),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let extended = folio::get_folio(&mut conn, folio_id).await.unwrap();
    assert_eq!(extended.amount_untaxed, 330.0);
    assert_eq!(extended.invoice_status, InvoiceStatus::ToInvoice);

    let services = service::list_services(&mut conn, folio_id).await.unwrap();
    let board_charges: Vec<_> = services.iter().filter(|s| s.service.is_board_service).collect();
    assert_eq!(board_charges.len(), 1);
    let nights: Vec<_> = board_charges[0].lines.iter().map(|l| (l.date, l.invoiced)).collect();
    assert_eq!(
        nights,
        vec![
            (d("2030-06-01"), true),
            (d("2030-06-02"), true),
            (d("2030-06-03"), false),
        ]
    );

    let second = invoice::create_invoice(&mut conn, folio_id, d("2030-06-04")).await.unwrap();
    assert_eq!(second.invoice.amount_untaxed, 110.0);
}
