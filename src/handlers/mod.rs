use actix_web::web;
use chrono::{Local, NaiveDate, NaiveDateTime};

pub mod availability_plans;
pub mod board_services;
pub mod folios;
pub mod pricelists;
pub mod properties;
pub mod reservations;
pub mod rooms;
pub mod sale_channels;
pub mod wizards;

/// Business date used for cancellation penalties, check-in windows and
/// document dates.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/companies")
            .route("", web::post().to(properties::create_company))
            .route("", web::get().to(properties::list_companies)),
    )
    .service(
        web::scope("/properties")
            .route("", web::post().to(properties::create_property))
            .route("", web::get().to(properties::list_properties))
            .route("/{id}", web::get().to(properties::get_property))
            .route(
                "/{id}/default-pricelist",
                web::put().to(properties::set_default_pricelist),
            )
            .route(
                "/{id}/availability",
                web::get().to(properties::search_availability),
            )
            .route("/{id}/calendar", web::get().to(properties::property_calendar)),
    )
    .service(
        web::scope("/sale-channels")
            .route("", web::post().to(sale_channels::create_sale_channel))
            .route("", web::get().to(sale_channels::list_sale_channels)),
    )
    .service(
        web::scope("/agencies")
            .route("", web::post().to(sale_channels::create_agency))
            .route("", web::get().to(sale_channels::list_agencies)),
    )
    .service(
        web::scope("/room-types")
            .route("", web::post().to(rooms::create_room_type))
            .route("", web::get().to(rooms::list_room_types))
            .route("/{id}", web::get().to(rooms::get_room_type)),
    )
    .service(
        web::scope("/rooms")
            .route("", web::post().to(rooms::create_room))
            .route("", web::get().to(rooms::list_rooms))
            .route("/{id}/deactivate", web::post().to(rooms::deactivate_room)),
    )
    .service(
        web::scope("/board-services")
            .route("", web::post().to(board_services::create_board_service))
            .route("", web::get().to(board_services::list_board_services))
            .route(
                "/{id}/room-types",
                web::post().to(board_services::attach_room_type),
            ),
    )
    .service(
        web::scope("/cancelation-rules")
            .route("", web::post().to(pricelists::create_cancelation_rule))
            .route("", web::get().to(pricelists::list_cancelation_rules)),
    )
    .service(
        web::scope("/pricelists")
            .route("", web::post().to(pricelists::create_pricelist))
            .route("", web::get().to(pricelists::list_pricelists))
            .route("/{id}/items", web::post().to(pricelists::add_item))
            .route("/{id}/items", web::get().to(pricelists::list_items))
            .route("/{id}/prices", web::get().to(pricelists::nightly_prices)),
    )
    .service(
        web::scope("/availability-plans")
            .route("", web::post().to(availability_plans::create_plan))
            .route("", web::get().to(availability_plans::list_plans))
            .route("/{id}/rules", web::put().to(availability_plans::upsert_rules))
            .route("/{id}/rules", web::get().to(availability_plans::list_rules)),
    )
    .service(
        web::scope("/folios")
            .route("", web::post().to(folios::create_folio))
            .route("", web::get().to(folios::list_folios))
            .route("/{id}", web::get().to(folios::get_folio))
            .route("/{id}", web::patch().to(folios::update_folio))
            .route("/{id}/confirm", web::post().to(folios::confirm_folio))
            .route("/{id}/cancel", web::post().to(folios::cancel_folio))
            .route("/{id}/payments", web::post().to(folios::register_payment))
            .route("/{id}/payments", web::get().to(folios::list_payments))
            .route("/{id}/services", web::post().to(folios::add_service))
            .route("/{id}/services", web::get().to(folios::list_services))
            .route("/{id}/invoices", web::post().to(folios::create_invoice))
            .route("/{id}/invoices", web::get().to(folios::list_invoices)),
    )
    .service(web::scope("/services").route("/{id}", web::delete().to(folios::delete_service)))
    .service(web::scope("/invoices").route("/{id}", web::get().to(folios::get_invoice)))
    .service(
        web::scope("/reservations")
            .route("", web::post().to(reservations::create_reservation))
            .route("/{id}", web::get().to(reservations::get_reservation))
            .route("/{id}", web::patch().to(reservations::update_reservation))
            .route("/{id}/confirm", web::post().to(reservations::confirm_reservation))
            .route("/{id}/cancel", web::post().to(reservations::cancel_reservation))
            .route("/{id}/checkout", web::post().to(reservations::checkout_reservation))
            .route("/{id}/checkins", web::post().to(reservations::register_guest))
            .route("/{id}/checkins", web::get().to(reservations::list_guests)),
    )
    .service(
        web::scope("/reservation-lines")
            .route("/{id}", web::patch().to(reservations::update_line)),
    )
    .service(
        web::scope("/checkins")
            .route("/{id}", web::patch().to(reservations::update_guest))
            .route("/{id}/onboard", web::post().to(reservations::onboard_guest)),
    )
    .service(
        web::scope("/wizards")
            .route("/massive-changes", web::post().to(wizards::apply_massive_changes)),
    );
}
