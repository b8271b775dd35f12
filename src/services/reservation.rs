use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::db::{next_sequence, round2};
use crate::error::PmsError;
use crate::models::cancelation_rule::free_cancellation;
use crate::models::folio::{Folio, FolioState};
use crate::models::reservation::{
    commission_amount, line_total, stay_dates, validate_stay, Reservation, ReservationDetail,
    ReservationInput, ReservationLine, ReservationState, ReservationType, UpdateReservation,
    UpdateReservationLine,
};
use crate::models::room::{Room, RoomType};

use super::availability::{free_rooms, sellable_count};
use super::checkin::list_guests;
use super::folio::{get_folio, recompute_folio};
use super::inventory::{
    default_board_service, get_board_service_room_type, get_room, get_room_type,
    room_type_capacity,
};
use super::pricing::{ensure_pricelist_applies, get_cancelation_rule, get_pricelist, nightly_prices};
use super::property::get_agency;
use super::service::{sync_board_service, sync_per_day_services};

pub async fn get_reservation(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Reservation, PmsError> {
    sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("reservation", id))
}

pub async fn reservation_lines(
    conn: &mut SqliteConnection,
    reservation_id: i64,
) -> Result<Vec<ReservationLine>, PmsError> {
    let lines = sqlx::query_as::<_, ReservationLine>(
        "SELECT * FROM reservation_lines WHERE reservation_id = ? ORDER BY date",
    )
    .bind(reservation_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub async fn get_reservation_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<ReservationDetail, PmsError> {
    let reservation = get_reservation(conn, id).await?;
    let lines = reservation_lines(conn, id).await?;
    let checkin_partners = list_guests(conn, id).await?;
    Ok(ReservationDetail {
        reservation,
        lines,
        checkin_partners,
    })
}

pub async fn list_folio_reservations(
    conn: &mut SqliteConnection,
    folio_id: i64,
) -> Result<Vec<Reservation>, PmsError> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE folio_id = ? ORDER BY id",
    )
    .bind(folio_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(reservations)
}

/// Stay parameters checked and resolved before a reservation is written.
struct Placement {
    room_id: i64,
    board_service_room_type_id: Option<i64>,
}

/// Picks the room for a stay. The preferred room wins when it is free on
/// every night; otherwise the first free room of the type that holds the
/// party is taken. Overbooking stays always get a room, even an occupied one.
#[allow(clippy::too_many_arguments)]
async fn assign_room(
    conn: &mut SqliteConnection,
    room_type: &RoomType,
    preferred_room_id: Option<i64>,
    checkin: NaiveDate,
    checkout: NaiveDate,
    guests: i64,
    overbooking: bool,
    exclude_reservation: Option<i64>,
) -> Result<i64, PmsError> {
    if let Some(room_id) = preferred_room_id {
        let room = get_room(conn, room_id).await?;
        if room.room_type_id != room_type.id {
            return Err(PmsError::UserError(format!(
                "Room {} is not a '{}' room",
                room.name, room_type.code
            )));
        }
        if !room.active {
            return Err(PmsError::UserError(format!("Room {} is not active", room.name)));
        }
    }

    let free = free_rooms(
        conn,
        room_type.property_id,
        Some(room_type.id),
        checkin,
        checkout,
        exclude_reservation,
    )
    .await?;

    if let Some(room_id) = preferred_room_id {
        if overbooking || free.iter().any(|r| r.id == room_id) {
            return Ok(room_id);
        }
    }
    if let Some(room) = free.iter().find(|r| r.max_guests() >= guests) {
        return Ok(room.id);
    }
    if overbooking {
        let rooms = sqlx::query_as::<_, Room>(
            "SELECT * FROM rooms WHERE room_type_id = ? AND active = 1 ORDER BY sequence, id",
        )
        .bind(room_type.id)
        .fetch_all(&mut *conn)
        .await?;
        return rooms
            .iter()
            .find(|r| r.max_guests() >= guests)
            .or_else(|| rooms.first())
            .map(|r| r.id)
            .ok_or_else(|| {
                PmsError::UserError(format!("Room type '{}' has no rooms", room_type.code))
            });
    }
    if !free.is_empty() {
        return Err(PmsError::UserError(format!(
            "No free '{}' room holds {} guests between {} and {}",
            room_type.code, guests, checkin, checkout
        )));
    }

    log::warn!(
        "No '{}' rooms available for {}..{}",
        room_type.code,
        checkin,
        checkout
    );
    Err(PmsError::Conflict(format!(
        "No rooms available for '{}' between {} and {}",
        room_type.code, checkin, checkout
    )))
}

#[allow(clippy::too_many_arguments)]
async fn place_stay(
    conn: &mut SqliteConnection,
    property_id: i64,
    room_type: &RoomType,
    preferred_room_id: Option<i64>,
    checkin: NaiveDate,
    checkout: NaiveDate,
    guests: i64,
    pricelist_id: Option<i64>,
    board_service_room_type_id: Option<i64>,
    overbooking: bool,
    exclude_reservation: Option<i64>,
) -> Result<Placement, PmsError> {
    validate_stay(checkin, checkout)?;
    if room_type.property_id != property_id {
        return Err(PmsError::UserError(format!(
            "Room type '{}' does not belong to property {}",
            room_type.code, property_id
        )));
    }
    if let Some(link_id) = board_service_room_type_id {
        let link = get_board_service_room_type(conn, link_id).await?;
        if link.room_type_id != room_type.id {
            return Err(PmsError::UserError(format!(
                "Board service {} is not offered on room type '{}'",
                link_id, room_type.code
            )));
        }
    }

    let room_id = assign_room(
        conn,
        room_type,
        preferred_room_id,
        checkin,
        checkout,
        guests,
        overbooking,
        exclude_reservation,
    )
    .await?;

    let room = get_room(conn, room_id).await?;
    if guests > room.max_guests() {
        return Err(PmsError::UserError(format!(
            "Room {} capacity exceeded: {} guests for {} places",
            room.name,
            guests,
            room.max_guests()
        )));
    }

    if !overbooking {
        let free = free_rooms(
            conn,
            property_id,
            Some(room_type.id),
            checkin,
            checkout,
            exclude_reservation,
        )
        .await?
        .len() as i64;
        let sellable = sellable_count(
            conn,
            property_id,
            room_type.id,
            pricelist_id,
            checkin,
            checkout,
            free,
            exclude_reservation,
        )
        .await?;
        if sellable < 1 {
            log::warn!(
                "'{}' closed to sale for {}..{} by its availability plan",
                room_type.code,
                checkin,
                checkout
            );
            return Err(PmsError::Conflict(format!(
                "Room type '{}' is not available for sale between {} and {}",
                room_type.code, checkin, checkout
            )));
        }
    }

    Ok(Placement {
        room_id,
        board_service_room_type_id,
    })
}

pub async fn create_reservation(
    conn: &mut SqliteConnection,
    folio: &Folio,
    input: &ReservationInput,
) -> Result<Reservation, PmsError> {
    if folio.reservation_type == ReservationType::Normal && input.adults < 1 {
        return Err(PmsError::Validation(
            "A reservation needs at least one adult".to_string(),
        ));
    }
    let room_type = get_room_type(conn, input.room_type_id).await?;
    let guests = input.adults + input.children;
    if input.preferred_room_id.is_none() && guests > room_type_capacity(conn, room_type.id).await? {
        return Err(PmsError::UserError(format!(
            "No '{}' room hosts {} guests",
            room_type.code, guests
        )));
    }

    let pricelist_id = input.pricelist_id.or(folio.pricelist_id);
    if let Some(id) = pricelist_id {
        ensure_pricelist_applies(&get_pricelist(conn, id).await?, folio.property_id)?;
    }

    let agency_id = input.agency_id.or(folio.agency_id);
    let agency = match agency_id {
        Some(id) => Some(get_agency(conn, id).await?),
        None => None,
    };
    let sale_channel_id = input
        .sale_channel_id
        .or(folio.sale_channel_id)
        .or(agency.as_ref().and_then(|a| a.sale_channel_id));
    let commission_percent = agency.as_ref().map_or(0.0, |a| a.commission);

    let board_service_room_type_id = match input.board_service_room_type_id {
        Some(id) => Some(id),
        None => default_board_service(conn, room_type.id).await?,
    };

    let placement = place_stay(
        conn,
        folio.property_id,
        &room_type,
        input.preferred_room_id,
        input.checkin,
        input.checkout,
        guests,
        pricelist_id,
        board_service_room_type_id,
        input.overbooking,
        None,
    )
    .await?;

    let prefix = format!("{}/", folio.name);
    let seq = next_sequence(conn, "reservations", &prefix).await?;
    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        INSERT INTO reservations
            (name, folio_id, property_id, room_type_id, preferred_room_id, checkin, checkout,
             adults, children, board_service_room_type_id, pricelist_id, agency_id,
             sale_channel_id, reservation_type, overbooking, state, nights, commission_percent)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'draft', ?, ?)
        RETURNING *
        "#,
    )
    .bind(format!("{}{}", prefix, seq))
    .bind(folio.id)
    .bind(folio.property_id)
    .bind(room_type.id)
    .bind(placement.room_id)
    .bind(input.checkin)
    .bind(input.checkout)
    .bind(input.adults)
    .bind(input.children)
    .bind(placement.board_service_room_type_id)
    .bind(pricelist_id)
    .bind(agency_id)
    .bind(sale_channel_id)
    .bind(folio.reservation_type)
    .bind(input.overbooking)
    .bind((input.checkout - input.checkin).num_days())
    .bind(commission_percent)
    .fetch_one(&mut *conn)
    .await?;

    sync_lines(conn, &reservation, Some(placement.room_id)).await?;
    sync_board_service(conn, &reservation).await?;
    recompute_reservation(conn, reservation.id).await?;
    recompute_folio(conn, folio.id).await?;

    log::info!(
        "Created reservation {} ({} nights, room {})",
        reservation.name,
        reservation.nights,
        placement.room_id
    );
    get_reservation(conn, reservation.id).await
}

/// Brings the reservation lines in line with the stay: nights outside it are
/// dropped, kept nights keep their price and discount, new nights are priced
/// with the reservation pricelist. `room_id` moves every line to that room.
async fn sync_lines(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
    room_id: Option<i64>,
) -> Result<(), PmsError> {
    let dates = stay_dates(reservation.checkin, reservation.checkout);
    let existing = reservation_lines(conn, reservation.id).await?;

    if existing
        .iter()
        .any(|l| l.invoiced && !dates.contains(&l.date))
    {
        return Err(PmsError::UserError(format!(
            "Reservation {} has invoiced nights outside the new stay",
            reservation.name
        )));
    }
    sqlx::query("DELETE FROM reservation_lines WHERE reservation_id = ? AND (date < ? OR date >= ?)")
        .bind(reservation.id)
        .bind(reservation.checkin)
        .bind(reservation.checkout)
        .execute(&mut *conn)
        .await?;

    let room_id = match room_id {
        Some(id) => Some(id),
        None => existing.iter().find_map(|l| l.room_id),
    };
    if let Some(room_id) = room_id {
        sqlx::query("UPDATE reservation_lines SET room_id = ? WHERE reservation_id = ?")
            .bind(room_id)
            .bind(reservation.id)
            .execute(&mut *conn)
            .await?;
    }

    let known: Vec<NaiveDate> = existing.iter().map(|l| l.date).collect();
    let missing: Vec<NaiveDate> = dates.into_iter().filter(|d| !known.contains(d)).collect();
    if missing.is_empty() {
        return ensure_rooms_free(conn, reservation).await;
    }

    let prices: HashMap<NaiveDate, f64> = nightly_prices(
        conn,
        reservation.pricelist_id,
        reservation.room_type_id,
        reservation.property_id,
        reservation.checkin,
        reservation.checkout,
    )
    .await?
    .into_iter()
    .map(|p| (p.date, p.price))
    .collect();

    for date in missing {
        let price = if reservation.reservation_type.is_free() {
            0.0
        } else {
            prices.get(&date).copied().unwrap_or(0.0)
        };
        sqlx::query(
            r#"
            INSERT INTO reservation_lines (reservation_id, date, room_id, price, price_total)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(reservation.id)
        .bind(date)
        .bind(room_id)
        .bind(price)
        .bind(price)
        .execute(&mut *conn)
        .await?;
    }

    ensure_rooms_free(conn, reservation).await
}

/// No room may carry two occupying lines on the same night, unless one of
/// them belongs to an overbooking reservation.
async fn ensure_rooms_free(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
) -> Result<(), PmsError> {
    if reservation.overbooking || !reservation.state.occupies_room() {
        return Ok(());
    }
    let clash: Option<(String, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT other.name, l.date FROM reservation_lines l
        JOIN reservation_lines o ON o.room_id = l.room_id AND o.date = l.date AND o.id != l.id
        JOIN reservations other ON other.id = o.reservation_id
        WHERE l.reservation_id = ? AND other.id != ?
          AND other.state != 'cancel' AND other.overbooking = 0
        LIMIT 1
        "#,
    )
    .bind(reservation.id)
    .bind(reservation.id)
    .fetch_optional(&mut *conn)
    .await?;

    match clash {
        Some((other, date)) => Err(PmsError::Conflict(format!(
            "Room already occupied by {} on {}",
            other, date
        ))),
        None => Ok(()),
    }
}

/// Refreshes line totals and the reservation's aggregated amounts.
pub async fn recompute_reservation(
    conn: &mut SqliteConnection,
    reservation_id: i64,
) -> Result<(), PmsError> {
    let reservation = get_reservation(conn, reservation_id).await?;
    let lines = reservation_lines(conn, reservation_id).await?;

    let mut subtotal = 0.0;
    for line in &lines {
        let total = line_total(line.price, line.discount, line.cancel_discount);
        if (total - line.price_total).abs() > f64::EPSILON {
            sqlx::query("UPDATE reservation_lines SET price_total = ? WHERE id = ?")
                .bind(total)
                .bind(line.id)
                .execute(&mut *conn)
                .await?;
        }
        subtotal += total;
    }
    let subtotal = round2(subtotal);

    let services = if reservation.state == ReservationState::Cancel {
        0.0
    } else {
        sqlx::query_scalar::<_, f64>(
            "SELECT TOTAL(price_total) FROM services WHERE reservation_id = ?",
        )
        .bind(reservation_id)
        .fetch_one(&mut *conn)
        .await?
    };
    let services = round2(services);
    let total = round2(subtotal + services);

    sqlx::query(
        r#"
        UPDATE reservations
        SET nights = ?, price_subtotal = ?, price_services = ?, price_total = ?,
            commission_amount = ?
        WHERE id = ?
        "#,
    )
    .bind(lines.len() as i64)
    .bind(subtotal)
    .bind(services)
    .bind(total)
    .bind(commission_amount(total, reservation.commission_percent))
    .bind(reservation_id)
    .execute(&mut *conn)
    .await?;

    log::debug!("Recomputed reservation {}: total {}", reservation.name, total);
    Ok(())
}

pub async fn update_reservation(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &UpdateReservation,
) -> Result<Reservation, PmsError> {
    let current = get_reservation(conn, id).await?;
    if current.state.is_closed() {
        return Err(PmsError::UserError(format!(
            "Reservation {} can no longer be modified",
            current.name
        )));
    }

    let checkin = changes.checkin.unwrap_or(current.checkin);
    let checkout = changes.checkout.unwrap_or(current.checkout);
    if current.state == ReservationState::Onboard && checkin != current.checkin {
        return Err(PmsError::UserError(format!(
            "Guests of {} are already on board, checkin cannot move",
            current.name
        )));
    }
    let adults = changes.adults.unwrap_or(current.adults);
    let children = changes.children.unwrap_or(current.children);
    if current.reservation_type == ReservationType::Normal && adults < 1 {
        return Err(PmsError::Validation(
            "A reservation needs at least one adult".to_string(),
        ));
    }
    let guests_registered: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM checkin_partners WHERE reservation_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if guests_registered > adults {
        return Err(PmsError::UserError(format!(
            "{} guests are already registered on {}",
            guests_registered, current.name
        )));
    }

    let room_type_id = changes.room_type_id.unwrap_or(current.room_type_id);
    let room_type = get_room_type(conn, room_type_id).await?;
    let preferred_room_id = match (changes.preferred_room_id, changes.room_type_id) {
        (Some(room_id), _) => Some(room_id),
        (None, Some(new_type)) if new_type != current.room_type_id => None,
        (None, _) => current.preferred_room_id,
    };
    let board_service_room_type_id = if changes.remove_board_service {
        None
    } else {
        match (changes.board_service_room_type_id, changes.room_type_id) {
            (Some(link), _) => Some(link),
            (None, Some(new_type)) if new_type != current.room_type_id => {
                default_board_service(conn, new_type).await?
            }
            (None, _) => current.board_service_room_type_id,
        }
    };

    let placement = place_stay(
        conn,
        current.property_id,
        &room_type,
        preferred_room_id,
        checkin,
        checkout,
        adults + children,
        current.pricelist_id,
        board_service_room_type_id,
        current.overbooking,
        Some(id),
    )
    .await?;

    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        UPDATE reservations
        SET checkin = ?, checkout = ?, room_type_id = ?, preferred_room_id = ?,
            adults = ?, children = ?, board_service_room_type_id = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(checkin)
    .bind(checkout)
    .bind(room_type.id)
    .bind(placement.room_id)
    .bind(adults)
    .bind(children)
    .bind(placement.board_service_room_type_id)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    if room_type.id != current.room_type_id {
        // Nights of the old room type were priced for it.
        sqlx::query("DELETE FROM reservation_lines WHERE reservation_id = ? AND invoiced = 0")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    sync_lines(conn, &reservation, Some(placement.room_id)).await?;
    sync_board_service(conn, &reservation).await?;
    sync_per_day_services(conn, &reservation).await?;
    recompute_reservation(conn, id).await?;
    recompute_folio(conn, reservation.folio_id).await?;

    log::info!("Modified reservation {}", reservation.name);
    get_reservation(conn, id).await
}

pub async fn update_line(
    conn: &mut SqliteConnection,
    line_id: i64,
    changes: &UpdateReservationLine,
) -> Result<ReservationLine, PmsError> {
    let line = sqlx::query_as::<_, ReservationLine>("SELECT * FROM reservation_lines WHERE id = ?")
        .bind(line_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("reservation line", line_id))?;
    let reservation = get_reservation(conn, line.reservation_id).await?;
    if reservation.state.is_closed() {
        return Err(PmsError::UserError(format!(
            "Reservation {} can no longer be modified",
            reservation.name
        )));
    }
    if line.invoiced {
        return Err(PmsError::UserError(format!(
            "Night {} of {} is already invoiced",
            line.date, reservation.name
        )));
    }

    sqlx::query("UPDATE reservation_lines SET price = ?, discount = ? WHERE id = ?")
        .bind(changes.price.unwrap_or(line.price))
        .bind(changes.discount.unwrap_or(line.discount))
        .bind(line_id)
        .execute(&mut *conn)
        .await?;
    recompute_reservation(conn, reservation.id).await?;
    recompute_folio(conn, reservation.folio_id).await?;

    let line = sqlx::query_as::<_, ReservationLine>("SELECT * FROM reservation_lines WHERE id = ?")
        .bind(line_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(line)
}

async fn set_state(
    conn: &mut SqliteConnection,
    id: i64,
    state: ReservationState,
) -> Result<(), PmsError> {
    sqlx::query("UPDATE reservations SET state = ? WHERE id = ?")
        .bind(state)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// `draft → confirm`, or back from `cancel`, in which case the stay must
/// still fit and the cancellation penalties are dropped.
pub async fn confirm_reservation(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Reservation, PmsError> {
    let reservation = get_reservation(conn, id).await?;
    match reservation.state {
        ReservationState::Draft => {}
        ReservationState::Cancel => {
            let room_type = get_room_type(conn, reservation.room_type_id).await?;
            let placement = place_stay(
                conn,
                reservation.property_id,
                &room_type,
                reservation.preferred_room_id,
                reservation.checkin,
                reservation.checkout,
                reservation.adults + reservation.children,
                reservation.pricelist_id,
                reservation.board_service_room_type_id,
                reservation.overbooking,
                Some(id),
            )
            .await?;
            sqlx::query(
                "UPDATE reservations SET cancelled_reason = NULL, preferred_room_id = ? WHERE id = ?",
            )
            .bind(placement.room_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            sqlx::query(
                "UPDATE reservation_lines SET cancel_discount = 0, room_id = ? WHERE reservation_id = ?",
            )
            .bind(placement.room_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }
        other => {
            return Err(PmsError::UserError(format!(
                "Reservation {} cannot be confirmed from state {:?}",
                reservation.name, other
            )));
        }
    }

    set_state(conn, id, ReservationState::Confirm).await?;
    let reservation = get_reservation(conn, id).await?;
    sync_board_service(conn, &reservation).await?;
    recompute_reservation(conn, id).await?;
    recompute_folio(conn, reservation.folio_id).await?;
    log::info!("Confirmed reservation {}", reservation.name);
    get_reservation(conn, id).await
}

/// Cancels the stay on `today`, applying the cancellation rule of its
/// pricelist to the nights.
pub async fn cancel_reservation(
    conn: &mut SqliteConnection,
    id: i64,
    today: NaiveDate,
) -> Result<Reservation, PmsError> {
    let reservation = get_reservation(conn, id).await?;
    if !matches!(
        reservation.state,
        ReservationState::Draft | ReservationState::Confirm
    ) {
        return Err(PmsError::UserError(format!(
            "Reservation {} cannot be cancelled from state {:?}",
            reservation.name, reservation.state
        )));
    }
    let lines = reservation_lines(conn, id).await?;
    if lines.iter().any(|l| l.invoiced) {
        return Err(PmsError::UserError(format!(
            "Reservation {} has invoiced nights",
            reservation.name
        )));
    }

    let rule_id = match reservation.pricelist_id {
        Some(pricelist_id) => get_pricelist(conn, pricelist_id).await?.cancelation_rule_id,
        None => None,
    };
    let (reason, discounts) = match rule_id {
        Some(rule_id) => {
            let rule = get_cancelation_rule(conn, rule_id).await?;
            let (reason, discounts) = rule.cancel_discounts(reservation.checkin, lines.len(), today);
            (Some(reason), discounts)
        }
        None => (None, free_cancellation(lines.len())),
    };

    for (line, cancel_discount) in lines.iter().zip(discounts) {
        sqlx::query("UPDATE reservation_lines SET cancel_discount = ? WHERE id = ?")
            .bind(cancel_discount)
            .bind(line.id)
            .execute(&mut *conn)
            .await?;
    }
    sqlx::query("UPDATE reservations SET state = 'cancel', cancelled_reason = ? WHERE id = ?")
        .bind(reason)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let cancelled = get_reservation(conn, id).await?;
    sync_board_service(conn, &cancelled).await?;
    recompute_reservation(conn, id).await?;
    recompute_folio(conn, reservation.folio_id).await?;
    log::info!(
        "Cancelled reservation {} ({:?})",
        reservation.name,
        reason
    );
    get_reservation(conn, id).await
}

/// Moves an on-board stay to `done` and checks out every guest.
pub async fn checkout_reservation(
    conn: &mut SqliteConnection,
    id: i64,
    now: NaiveDateTime,
) -> Result<Reservation, PmsError> {
    let reservation = get_reservation(conn, id).await?;
    if reservation.state != ReservationState::Onboard {
        return Err(PmsError::UserError(format!(
            "Reservation {} has no guests on board",
            reservation.name
        )));
    }

    sqlx::query(
        "UPDATE checkin_partners SET state = 'done', departure = ? WHERE reservation_id = ? AND state = 'onboard'",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    set_state(conn, id, ReservationState::Done).await?;
    recompute_folio(conn, reservation.folio_id).await?;
    log::info!("Checked out reservation {}", reservation.name);
    get_reservation(conn, id).await
}

/// Called when the first guest goes on board.
pub(crate) async fn mark_onboard(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
) -> Result<(), PmsError> {
    if reservation.state != ReservationState::Onboard {
        set_state(conn, reservation.id, ReservationState::Onboard).await?;
        recompute_folio(conn, reservation.folio_id).await?;
    }
    Ok(())
}

pub async fn create_for_folio(
    conn: &mut SqliteConnection,
    folio_id: i64,
    input: &ReservationInput,
) -> Result<Reservation, PmsError> {
    let folio = get_folio(conn, folio_id).await?;
    if folio.state == FolioState::Cancel {
        return Err(PmsError::UserError(format!(
            "Folio {} is cancelled",
            folio.name
        )));
    }
    create_reservation(conn, &folio, input).await
}
