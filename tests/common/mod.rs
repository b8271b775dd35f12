//! Shared fixtures: a migrated in-memory database holding one property with
//! two room types, three rooms and a default pricelist.

use chrono::NaiveDate;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};

use hotel_pms::db;
use hotel_pms::models::folio::CreateFolio;
use hotel_pms::models::pricelist::{CreatePricelist, Pricelist};
use hotel_pms::models::property::{CreateCompany, CreateProperty, Property};
use hotel_pms::models::reservation::{ReservationInput, ReservationType};
use hotel_pms::models::room::{CreateRoom, CreateRoomType, Room, RoomType};
use hotel_pms::services::{inventory, pricing, property};

pub struct TestHarness {
    pub pool: SqlitePool,
    pub property: Property,
    /// `DBL`, list price 100, rooms 101 and 102 (2 guests each).
    pub double: RoomType,
    /// `SGL`, list price 60, room 201 (1 guest).
    pub single: RoomType,
    pub rooms: Vec<Room>,
    pub pricelist: Pricelist,
}

impl TestHarness {
    pub async fn new() -> Self {
        let pool = db::memory_pool().await.expect("in-memory pool");
        db::run_migrations(&pool).await.expect("migrations");

        let mut conn = pool.acquire().await.expect("connection");
        let company = property::create_company(
            &mut conn,
            &CreateCompany {
                name: "Acme Hotels".into(),
            },
        )
        .await
        .expect("company");
        let seaside = property::create_property(
            &mut conn,
            &CreateProperty {
                company_id: company.id,
                name: "Seaside".into(),
                code: "SEA".into(),
                tax_rate: 10.0,
                default_pricelist_id: None,
            },
        )
        .await
        .expect("property");

        let double = inventory::create_room_type(
            &mut conn,
            &CreateRoomType {
                property_id: seaside.id,
                name: "Double".into(),
                code: "DBL".into(),
                list_price: 100.0,
                sequence: 10,
            },
        )
        .await
        .expect("double room type");
        let single = inventory::create_room_type(
            &mut conn,
            &CreateRoomType {
                property_id: seaside.id,
                name: "Single".into(),
                code: "SGL".into(),
                list_price: 60.0,
                sequence: 20,
            },
        )
        .await
        .expect("single room type");

        let mut rooms = Vec::new();
        for (room_type, name, capacity) in [(&double, "101", 2), (&double, "102", 2), (&single, "201", 1)] {
            let room = inventory::create_room(
                &mut conn,
                &CreateRoom {
                    room_type_id: room_type.id,
                    name: name.into(),
                    capacity,
                    extra_beds: 0,
                    sequence: 10,
                },
            )
            .await
            .expect("room");
            rooms.push(room);
        }

        let pricelist = pricing::create_pricelist(
            &mut conn,
            &CreatePricelist {
                name: "Public".into(),
                property_id: Some(seaside.id),
                cancelation_rule_id: None,
                availability_plan_id: None,
            },
        )
        .await
        .expect("pricelist");
        let seaside = property::set_default_pricelist(&mut conn, seaside.id, pricelist.id)
            .await
            .expect("default pricelist");
        drop(conn);

        Self {
            pool,
            property: seaside,
            double,
            single,
            rooms,
            pricelist,
        }
    }

    /// The pool holds a single connection: release it before acquiring again.
    pub async fn conn(&self) -> PoolConnection<Sqlite> {
        self.pool.acquire().await.expect("connection")
    }

    pub fn folio(&self, partner: &str, stays: Vec<ReservationInput>) -> CreateFolio {
        CreateFolio {
            property_id: self.property.id,
            partner_name: Some(partner.into()),
            email: None,
            phone: None,
            pricelist_id: None,
            agency_id: None,
            sale_channel_id: None,
            reservation_type: ReservationType::Normal,
            internal_comment: None,
            reservations: stays,
        }
    }
}

pub fn d(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date")
}

pub fn stay(room_type_id: i64, checkin: &str, checkout: &str) -> ReservationInput {
    ReservationInput {
        room_type_id,
        preferred_room_id: None,
        checkin: d(checkin),
        checkout: d(checkout),
        adults: 1,
        children: 0,
        board_service_room_type_id: None,
        pricelist_id: None,
        agency_id: None,
        sale_channel_id: None,
        overbooking: false,
    }
}
