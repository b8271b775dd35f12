use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db::round2;
use crate::error::PmsError;
use crate::models::availability::{
    night_capacity, stay_allowed, AvailabilityPlan, AvailabilityRule, AvailabilitySearch,
    CreateAvailabilityPlan, RoomTypeAvailability, RuleQuery, RuleValues, UpsertRule,
};
use crate::models::reservation::{stay_dates, validate_stay};
use crate::models::room::Room;

use super::inventory::{get_room_type, list_room_types, room_type_capacity};
use super::pricing::{ensure_pricelist_applies, get_pricelist, nightly_prices};
use super::property::get_property;

pub async fn create_plan(
    conn: &mut SqliteConnection,
    input: &CreateAvailabilityPlan,
) -> Result<AvailabilityPlan, PmsError> {
    let plan = sqlx::query_as::<_, AvailabilityPlan>(
        "INSERT INTO availability_plans (name) VALUES (?) RETURNING *",
    )
    .bind(&input.name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(plan)
}

pub async fn get_plan(conn: &mut SqliteConnection, id: i64) -> Result<AvailabilityPlan, PmsError> {
    sqlx::query_as::<_, AvailabilityPlan>("SELECT * FROM availability_plans WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("availability plan", id))
}

pub async fn list_plans(conn: &mut SqliteConnection) -> Result<Vec<AvailabilityPlan>, PmsError> {
    let plans = sqlx::query_as::<_, AvailabilityPlan>("SELECT * FROM availability_plans ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(plans)
}

async fn find_rule(
    conn: &mut SqliteConnection,
    plan_id: i64,
    room_type_id: i64,
    property_id: i64,
    date: NaiveDate,
) -> Result<Option<AvailabilityRule>, PmsError> {
    let rule = sqlx::query_as::<_, AvailabilityRule>(
        r#"
        SELECT * FROM availability_rules
        WHERE plan_id = ? AND room_type_id = ? AND property_id = ? AND date = ?
        "#,
    )
    .bind(plan_id)
    .bind(room_type_id)
    .bind(property_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(rule)
}

/// Writes the given values on the rule for (plan, room type, property, date),
/// creating it when missing. Returns the stored rule and whether it is new.
pub async fn upsert_rule(
    conn: &mut SqliteConnection,
    plan_id: i64,
    room_type_id: i64,
    property_id: i64,
    date: NaiveDate,
    values: &RuleValues,
) -> Result<(AvailabilityRule, bool), PmsError> {
    let existing = find_rule(conn, plan_id, room_type_id, property_id, date).await?;
    let created = existing.is_none();
    let mut rule = existing.unwrap_or(AvailabilityRule {
        id: 0,
        plan_id,
        room_type_id,
        property_id,
        date,
        min_stay: 0,
        min_stay_arrival: 0,
        max_stay: 0,
        max_stay_arrival: 0,
        closed: false,
        closed_arrival: false,
        closed_departure: false,
        quota: -1,
        max_avail: -1,
    });
    values.apply_to(&mut rule);

    let stored = sqlx::query_as::<_, AvailabilityRule>(
        r#"
        INSERT INTO availability_rules
            (plan_id, room_type_id, property_id, date, min_stay, min_stay_arrival,
             max_stay, max_stay_arrival, closed, closed_arrival, closed_departure,
             quota, max_avail)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (plan_id, room_type_id, property_id, date) DO UPDATE SET
            min_stay = excluded.min_stay,
            min_stay_arrival = excluded.min_stay_arrival,
            max_stay = excluded.max_stay,
            max_stay_arrival = excluded.max_stay_arrival,
            closed = excluded.closed,
            closed_arrival = excluded.closed_arrival,
            closed_departure = excluded.closed_departure,
            quota = excluded.quota,
            max_avail = excluded.max_avail
        RETURNING *
        "#,
    )
    .bind(rule.plan_id)
    .bind(rule.room_type_id)
    .bind(rule.property_id)
    .bind(rule.date)
    .bind(rule.min_stay)
    .bind(rule.min_stay_arrival)
    .bind(rule.max_stay)
    .bind(rule.max_stay_arrival)
    .bind(rule.closed)
    .bind(rule.closed_arrival)
    .bind(rule.closed_departure)
    .bind(rule.quota)
    .bind(rule.max_avail)
    .fetch_one(&mut *conn)
    .await?;
    Ok((stored, created))
}

pub async fn upsert_rules(
    conn: &mut SqliteConnection,
    plan_id: i64,
    inputs: &[UpsertRule],
) -> Result<Vec<AvailabilityRule>, PmsError> {
    get_plan(conn, plan_id).await?;
    let mut rules = Vec::with_capacity(inputs.len());
    for input in inputs {
        let room_type = get_room_type(conn, input.room_type_id).await?;
        if room_type.property_id != input.property_id {
            return Err(PmsError::UserError(format!(
                "Room type '{}' does not belong to property {}",
                room_type.code, input.property_id
            )));
        }
        let (rule, _) = upsert_rule(
            conn,
            plan_id,
            input.room_type_id,
            input.property_id,
            input.date,
            &input.values,
        )
        .await?;
        rules.push(rule);
    }
    Ok(rules)
}

pub async fn list_rules(
    conn: &mut SqliteConnection,
    plan_id: i64,
    query: &RuleQuery,
) -> Result<Vec<AvailabilityRule>, PmsError> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM availability_rules WHERE plan_id = ");
    builder.push_bind(plan_id);
    builder.push(" AND date >= ").push_bind(query.date_from);
    builder.push(" AND date <= ").push_bind(query.date_to);
    if let Some(room_type_id) = query.room_type_id {
        builder.push(" AND room_type_id = ").push_bind(room_type_id);
    }
    if let Some(property_id) = query.property_id {
        builder.push(" AND property_id = ").push_bind(property_id);
    }
    builder.push(" ORDER BY date, room_type_id");
    let rules = builder
        .build_query_as::<AvailabilityRule>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rules)
}

/// Rules of one room type keyed by date, over `[date_from, date_to]`.
pub async fn rules_by_date(
    conn: &mut SqliteConnection,
    plan_id: i64,
    room_type_id: i64,
    property_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<HashMap<NaiveDate, AvailabilityRule>, PmsError> {
    let rules = list_rules(
        conn,
        plan_id,
        &RuleQuery {
            room_type_id: Some(room_type_id),
            property_id: Some(property_id),
            date_from,
            date_to,
        },
    )
    .await?;
    Ok(rules.into_iter().map(|rule| (rule.date, rule)).collect())
}

/// Active rooms with no occupying reservation line on any night of
/// `[checkin, checkout)`, ignoring `exclude_reservation`.
pub async fn free_rooms(
    conn: &mut SqliteConnection,
    property_id: i64,
    room_type_id: Option<i64>,
    checkin: NaiveDate,
    checkout: NaiveDate,
    exclude_reservation: Option<i64>,
) -> Result<Vec<Room>, PmsError> {
    let rooms = sqlx::query_as::<_, Room>(
        r#"
        SELECT * FROM rooms r
        WHERE r.property_id = ? AND r.active = 1
          AND (? IS NULL OR r.room_type_id = ?)
          AND NOT EXISTS (
            SELECT 1 FROM reservation_lines l
            JOIN reservations res ON res.id = l.reservation_id
            WHERE l.room_id = r.id
              AND l.date >= ? AND l.date < ?
              AND res.state != 'cancel'
              AND (? IS NULL OR res.id != ?)
          )
        ORDER BY r.sequence, r.id
        "#,
    )
    .bind(property_id)
    .bind(room_type_id)
    .bind(room_type_id)
    .bind(checkin)
    .bind(checkout)
    .bind(exclude_reservation)
    .bind(exclude_reservation)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rooms)
}

/// Nights already sold on `date` for a room type through any pricelist that
/// uses `plan_id`.
async fn sold_through_plan(
    conn: &mut SqliteConnection,
    plan_id: i64,
    room_type_id: i64,
    date: NaiveDate,
    exclude_reservation: Option<i64>,
) -> Result<i64, PmsError> {
    let sold: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM reservation_lines l
        JOIN reservations res ON res.id = l.reservation_id
        JOIN pricelists p ON p.id = res.pricelist_id
        WHERE p.availability_plan_id = ? AND res.room_type_id = ? AND l.date = ?
          AND res.state != 'cancel'
          AND (? IS NULL OR res.id != ?)
        "#,
    )
    .bind(plan_id)
    .bind(room_type_id)
    .bind(date)
    .bind(exclude_reservation)
    .bind(exclude_reservation)
    .fetch_one(&mut *conn)
    .await?;
    Ok(sold)
}

/// Rooms of a type that may still be sold for the stay through `pricelist_id`.
/// `free` is the number of rooms free on every night of the stay.
#[allow(clippy::too_many_arguments)]
pub async fn sellable_count(
    conn: &mut SqliteConnection,
    property_id: i64,
    room_type_id: i64,
    pricelist_id: Option<i64>,
    checkin: NaiveDate,
    checkout: NaiveDate,
    free: i64,
    exclude_reservation: Option<i64>,
) -> Result<i64, PmsError> {
    let plan_id = match pricelist_id {
        Some(id) => get_pricelist(conn, id).await?.availability_plan_id,
        None => None,
    };
    let Some(plan_id) = plan_id else {
        return Ok(free);
    };

    let rules = rules_by_date(conn, plan_id, room_type_id, property_id, checkin, checkout).await?;
    if !stay_allowed(&rules, checkin, checkout) {
        log::debug!(
            "Room type {} closed by plan {} for {}..{}",
            room_type_id,
            plan_id,
            checkin,
            checkout
        );
        return Ok(0);
    }

    let mut sellable = free;
    for date in stay_dates(checkin, checkout) {
        let rule = rules.get(&date);
        let sold = match rule {
            Some(r) if r.quota >= 0 => {
                sold_through_plan(conn, plan_id, room_type_id, date, exclude_reservation).await?
            }
            _ => 0,
        };
        sellable = sellable.min(night_capacity(free, rule, sold));
    }
    Ok(sellable)
}

pub async fn search_availability(
    conn: &mut SqliteConnection,
    property_id: i64,
    search: &AvailabilitySearch,
) -> Result<Vec<RoomTypeAvailability>, PmsError> {
    validate_stay(search.checkin, search.checkout)?;
    let property = get_property(conn, property_id).await?;
    let pricelist_id = search.pricelist_id.or(property.default_pricelist_id);
    if let Some(id) = pricelist_id {
        ensure_pricelist_applies(&get_pricelist(conn, id).await?, property.id)?;
    }

    let room_types = match search.room_type_id {
        Some(id) => {
            let room_type = get_room_type(conn, id).await?;
            if room_type.property_id != property.id {
                return Err(PmsError::UserError(format!(
                    "Room type '{}' does not belong to property {}",
                    room_type.code, property.id
                )));
            }
            vec![room_type]
        }
        None => list_room_types(conn, Some(property.id)).await?,
    };

    let mut result = Vec::with_capacity(room_types.len());
    for room_type in room_types {
        let capacity = room_type_capacity(conn, room_type.id).await?;
        if let Some(adults) = search.adults {
            if capacity < adults {
                continue;
            }
        }
        let rooms = free_rooms(
            conn,
            property.id,
            Some(room_type.id),
            search.checkin,
            search.checkout,
            None,
        )
        .await?;
        let free = rooms.len() as i64;
        let available = sellable_count(
            conn,
            property.id,
            room_type.id,
            pricelist_id,
            search.checkin,
            search.checkout,
            free,
            None,
        )
        .await?;
        let prices = nightly_prices(
            conn,
            pricelist_id,
            room_type.id,
            property.id,
            search.checkin,
            search.checkout,
        )
        .await?;
        let total_price = round2(prices.iter().map(|p| p.price).sum());

        result.push(RoomTypeAvailability {
            room_type_id: room_type.id,
            name: room_type.name,
            code: room_type.code,
            capacity,
            free_rooms: free,
            available,
            free_room_ids: rooms.iter().map(|r| r.id).collect(),
            nightly_prices: prices,
            total_price,
        });
    }
    Ok(result)
}
