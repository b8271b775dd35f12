use actix_web::http::StatusCode;
use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
use actix_web::{web, App};
use serde_json::{json, Value};

use hotel_pms::handlers;

use crate::common::TestHarness;

macro_rules! app {
    ($harness:expr) => {
        init_service(
            App::new()
                .app_data(web::Data::new($harness.pool.clone()))
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn property_is_served_as_json() {
    let harness = TestHarness::new().await;
    let app = app!(harness);

    let req = TestRequest::get()
        .uri(&format!("/properties/{}", harness.property.id))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["code"], "SEA");
    assert_eq!(body["default_pricelist_id"], harness.pricelist.id);
}

#[actix_web::test]
async fn errors_carry_a_stable_code() {
    let harness = TestHarness::new().await;
    let app = app!(harness);

    let resp = call_service(&app, TestRequest::get().uri("/folios/999").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");

    let req = TestRequest::post()
        .uri("/companies")
        .set_json(json!({ "name": "" }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn booking_through_the_api() {
    let harness = TestHarness::new().await;
    let app = app!(harness);

    let req = TestRequest::post()
        .uri("/folios")
        .set_json(json!({
            "property_id": harness.property.id,
            "partner_name": "Jane Roe",
            "reservations": [{
                "room_type_id": harness.single.id,
                "checkin": "2030-06-01",
                "checkout": "2030-06-03"
            }]
        }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let folio: Value = read_body_json(resp).await;
    assert_eq!(folio["amount_total"], 132.0);
    assert_eq!(folio["reservations"][0]["adults"], 1);
    let folio_id = folio["id"].as_i64().unwrap();

    // The only single room is taken for these nights.
    let req = TestRequest::post()
        .uri("/reservations")
        .set_json(json!({
            "folio_id": folio_id,
            "room_type_id": harness.single.id,
            "checkin": "2030-06-02",
            "checkout": "2030-06-04"
        }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["code"], "CONFLICT");

    let req = TestRequest::post()
        .uri(&format!("/folios/{}/confirm", folio_id))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let confirmed: Value = read_body_json(resp).await;
    assert_eq!(confirmed["state"], "confirm");
}
