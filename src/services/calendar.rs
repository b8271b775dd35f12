use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::PmsError;
use crate::models::calendar::{
    group_room_nights, validate_window, Calendar, CalendarDay, CalendarQuery, CalendarRoom,
    CalendarRoomType, OccupiedNight,
};
use crate::models::reservation::stay_dates;
use crate::models::room::RoomSearch;

use super::availability::rules_by_date;
use super::inventory::{list_room_types, list_rooms};
use super::pricing::{ensure_pricelist_applies, get_pricelist, nightly_prices};
use super::property::get_property;

async fn occupied_nights(
    conn: &mut SqliteConnection,
    property_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<OccupiedNight>, PmsError> {
    let nights = sqlx::query_as::<_, OccupiedNight>(
        r#"
        SELECT l.room_id, l.date, r.id AS reservation_id, r.name AS reservation_name,
               f.name AS folio_name, f.partner_name, r.state, r.checkin, r.checkout
        FROM reservation_lines l
        JOIN reservations r ON r.id = l.reservation_id
        JOIN folios f ON f.id = r.folio_id
        JOIN rooms rm ON rm.id = l.room_id
        WHERE rm.property_id = ? AND l.date >= ? AND l.date < ?
          AND r.state != 'cancel'
        ORDER BY l.room_id, r.checkin, l.date
        "#,
    )
    .bind(property_id)
    .bind(date_from)
    .bind(date_to)
    .fetch_all(&mut *conn)
    .await?;
    Ok(nights)
}

/// Rooms, occupation, prices and restrictions of a property over
/// `[date_from, date_to)`, grouped by room type.
pub async fn property_calendar(
    conn: &mut SqliteConnection,
    property_id: i64,
    query: &CalendarQuery,
) -> Result<Calendar, PmsError> {
    validate_window(query.date_from, query.date_to)?;
    let property = get_property(conn, property_id).await?;

    let pricelist = match query.pricelist_id.or(property.default_pricelist_id) {
        Some(id) => {
            let pricelist = get_pricelist(conn, id).await?;
            ensure_pricelist_applies(&pricelist, property.id)?;
            Some(pricelist)
        }
        None => None,
    };
    let plan_id = pricelist.as_ref().and_then(|p| p.availability_plan_id);

    let mut by_room: HashMap<i64, Vec<OccupiedNight>> = HashMap::new();
    for night in occupied_nights(conn, property.id, query.date_from, query.date_to).await? {
        by_room.entry(night.room_id).or_default().push(night);
    }
    let dates = stay_dates(query.date_from, query.date_to);
    let last_date = dates.last().copied().unwrap_or(query.date_from);

    let mut room_types = Vec::new();
    for room_type in list_room_types(conn, Some(property.id)).await? {
        let search = RoomSearch {
            property_id: Some(property.id),
            room_type_id: Some(room_type.id),
            include_inactive: false,
        };
        let rooms = list_rooms(conn, &search).await?;

        let mut occupied: HashMap<NaiveDate, HashSet<i64>> = HashMap::new();
        let mut calendar_rooms = Vec::with_capacity(rooms.len());
        for room in &rooms {
            let nights = by_room.remove(&room.id).unwrap_or_default();
            for night in &nights {
                occupied.entry(night.date).or_default().insert(room.id);
            }
            calendar_rooms.push(CalendarRoom {
                room_id: room.id,
                name: room.name.clone(),
                capacity: room.max_guests(),
                reservations: group_room_nights(&nights),
            });
        }

        let prices = nightly_prices(
            conn,
            pricelist.as_ref().map(|p| p.id),
            room_type.id,
            property.id,
            query.date_from,
            query.date_to,
        )
        .await?;
        let mut rules = match plan_id {
            Some(plan_id) => {
                rules_by_date(conn, plan_id, room_type.id, property.id, query.date_from, last_date)
                    .await?
            }
            None => HashMap::new(),
        };

        let days = prices
            .into_iter()
            .map(|daily| {
                let taken = occupied.get(&daily.date).map_or(0, |set| set.len());
                CalendarDay {
                    date: daily.date,
                    price: daily.price,
                    free_rooms: (rooms.len() - taken) as i64,
                    rule: rules.remove(&daily.date),
                }
            })
            .collect();

        room_types.push(CalendarRoomType {
            room_type_id: room_type.id,
            name: room_type.name,
            code: room_type.code,
            rooms: calendar_rooms,
            days,
        });
    }

    log::debug!(
        "Calendar of property {} from {} to {}: {} room types",
        property.code,
        query.date_from,
        query.date_to,
        room_types.len()
    );
    Ok(Calendar {
        property_id: property.id,
        date_from: query.date_from,
        date_to: query.date_to,
        pricelist_id: pricelist.map(|p| p.id),
        room_types,
    })
}
