use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::db::round2;
use crate::error::PmsError;
use crate::models::board_service::nightly_board_price;
use crate::models::folio::FolioState;
use crate::models::reservation::{stay_dates, Reservation, ReservationState};
use crate::models::service::{day_quantity, CreateService, Service, ServiceDetail, ServiceLine};

use super::folio::{get_folio, recompute_folio};
use super::inventory::{board_service_lines, get_board_service, get_board_service_room_type};
use super::reservation::{get_reservation, recompute_reservation};

pub async fn get_service(conn: &mut SqliteConnection, id: i64) -> Result<Service, PmsError> {
    sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("service", id))
}

async fn service_lines(
    conn: &mut SqliteConnection,
    service_id: i64,
) -> Result<Vec<ServiceLine>, PmsError> {
    let lines = sqlx::query_as::<_, ServiceLine>(
        "SELECT * FROM service_lines WHERE service_id = ? ORDER BY date, id",
    )
    .bind(service_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub async fn list_services(
    conn: &mut SqliteConnection,
    folio_id: i64,
) -> Result<Vec<ServiceDetail>, PmsError> {
    let services =
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE folio_id = ? ORDER BY id")
            .bind(folio_id)
            .fetch_all(&mut *conn)
            .await?;

    let mut result = Vec::with_capacity(services.len());
    for service in services {
        let lines = service_lines(conn, service.id).await?;
        result.push(ServiceDetail { service, lines });
    }
    Ok(result)
}

async fn insert_line(
    conn: &mut SqliteConnection,
    service: &Service,
    date: NaiveDate,
    day_qty: i64,
) -> Result<(), PmsError> {
    let total = round2(day_qty as f64 * service.price_unit * (1.0 - service.discount / 100.0));
    sqlx::query(
        r#"
        INSERT INTO service_lines (service_id, date, day_qty, price_unit, discount, price_total)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(service.id)
    .bind(date)
    .bind(day_qty)
    .bind(service.price_unit)
    .bind(service.discount)
    .bind(total)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Line totals and the service total.
async fn recompute_service(conn: &mut SqliteConnection, service_id: i64) -> Result<(), PmsError> {
    let total: f64 =
        sqlx::query_scalar("SELECT TOTAL(price_total) FROM service_lines WHERE service_id = ?")
            .bind(service_id)
            .fetch_one(&mut *conn)
            .await?;
    sqlx::query("UPDATE services SET price_total = ? WHERE id = ?")
        .bind(round2(total))
        .bind(service_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn add_service(
    conn: &mut SqliteConnection,
    folio_id: i64,
    input: &CreateService,
) -> Result<ServiceDetail, PmsError> {
    let folio = get_folio(conn, folio_id).await?;
    if folio.state == FolioState::Cancel {
        return Err(PmsError::UserError(format!("Folio {} is cancelled", folio.name)));
    }
    let reservation = match input.reservation_id {
        Some(id) => {
            let reservation = get_reservation(conn, id).await?;
            if reservation.folio_id != folio.id {
                return Err(PmsError::UserError(format!(
                    "Reservation {} does not belong to folio {}",
                    reservation.name, folio.name
                )));
            }
            if reservation.state.is_closed() {
                return Err(PmsError::UserError(format!(
                    "Reservation {} is closed",
                    reservation.name
                )));
            }
            Some(reservation)
        }
        None => None,
    };
    if input.per_day && reservation.is_none() {
        return Err(PmsError::Validation(
            "Per-day services must belong to a reservation".to_string(),
        ));
    }

    let service = sqlx::query_as::<_, Service>(
        r#"
        INSERT INTO services
            (folio_id, reservation_id, name, price_unit, quantity, per_day, per_person, discount)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(folio.id)
    .bind(input.reservation_id)
    .bind(&input.name)
    .bind(input.price_unit)
    .bind(input.quantity)
    .bind(input.per_day)
    .bind(input.per_person)
    .bind(input.discount)
    .fetch_one(&mut *conn)
    .await?;

    match &reservation {
        Some(reservation) if service.per_day => {
            let qty = day_quantity(service.quantity, service.per_person, reservation.adults);
            for date in stay_dates(reservation.checkin, reservation.checkout) {
                insert_line(conn, &service, date, qty).await?;
            }
        }
        Some(reservation) => {
            let qty = day_quantity(service.quantity, service.per_person, reservation.adults);
            insert_line(conn, &service, reservation.checkin, qty).await?;
        }
        None => {
            let qty = day_quantity(service.quantity, service.per_person, 1);
            insert_line(conn, &service, folio.created_at.date(), qty).await?;
        }
    }
    recompute_service(conn, service.id).await?;

    if let Some(reservation) = &reservation {
        recompute_reservation(conn, reservation.id).await?;
    }
    recompute_folio(conn, folio.id).await?;
    log::info!("Added service '{}' to folio {}", service.name, folio.name);

    let service = get_service(conn, service.id).await?;
    let lines = service_lines(conn, service.id).await?;
    Ok(ServiceDetail { service, lines })
}

pub async fn delete_service(conn: &mut SqliteConnection, id: i64) -> Result<(), PmsError> {
    let service = get_service(conn, id).await?;
    if service.is_board_service {
        return Err(PmsError::UserError(
            "Board services are removed from the reservation".to_string(),
        ));
    }
    let invoiced: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM service_lines WHERE service_id = ? AND invoiced = 1",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    if invoiced > 0 {
        return Err(PmsError::UserError(format!(
            "Service '{}' is already invoiced",
            service.name
        )));
    }

    sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if let Some(reservation_id) = service.reservation_id {
        recompute_reservation(conn, reservation_id).await?;
    }
    recompute_folio(conn, service.folio_id).await?;
    Ok(())
}

/// Aligns the board service charge of a reservation with its current board
/// service, stay and occupancy. Invoiced nights stay on their charge; the
/// rest is repriced and only nights no board line covers get a new line.
pub async fn sync_board_service(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
) -> Result<(), PmsError> {
    sqlx::query(
        r#"
        DELETE FROM service_lines
        WHERE invoiced = 0 AND service_id IN (
            SELECT id FROM services WHERE reservation_id = ? AND is_board_service = 1
        )
        "#,
    )
    .bind(reservation.id)
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        r#"
        DELETE FROM services
        WHERE reservation_id = ? AND is_board_service = 1
          AND NOT EXISTS (SELECT 1 FROM service_lines sl WHERE sl.service_id = services.id)
        "#,
    )
    .bind(reservation.id)
    .execute(&mut *conn)
    .await?;

    // Only charges with invoiced nights are left.
    let invoiced = sqlx::query_as::<_, Service>(
        "SELECT * FROM services WHERE reservation_id = ? AND is_board_service = 1 ORDER BY id",
    )
    .bind(reservation.id)
    .fetch_all(&mut *conn)
    .await?;
    let mut covered: Vec<NaiveDate> = Vec::new();
    for service in &invoiced {
        recompute_service(conn, service.id).await?;
        covered.extend(service_lines(conn, service.id).await?.iter().map(|l| l.date));
    }

    if reservation.state == ReservationState::Cancel {
        return Ok(());
    }
    let Some(link_id) = reservation.board_service_room_type_id else {
        return Ok(());
    };
    let missing: Vec<NaiveDate> = stay_dates(reservation.checkin, reservation.checkout)
        .into_iter()
        .filter(|d| !covered.contains(d))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let link = get_board_service_room_type(conn, link_id).await?;
    let board_service = get_board_service(conn, link.board_service_id).await?.board_service;
    let lines = board_service_lines(conn, board_service.id).await?;
    let price = if reservation.reservation_type.is_free() {
        0.0
    } else {
        nightly_board_price(&lines, reservation.adults, link.amount_override)
    };

    let service = match invoiced.iter().rev().find(|s| s.name == board_service.name) {
        Some(existing) => {
            sqlx::query_as::<_, Service>(
                "UPDATE services SET price_unit = ? WHERE id = ? RETURNING *",
            )
            .bind(price)
            .bind(existing.id)
            .fetch_one(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, Service>(
                r#"
                INSERT INTO services
                    (folio_id, reservation_id, name, price_unit, quantity, per_day, per_person,
                     discount, is_board_service)
                VALUES (?, ?, ?, ?, 1, 1, 0, 0, 1)
                RETURNING *
                "#,
            )
            .bind(reservation.folio_id)
            .bind(reservation.id)
            .bind(&board_service.name)
            .bind(price)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    for date in missing {
        insert_line(conn, &service, date, 1).await?;
    }
    recompute_service(conn, service.id).await
}

/// Re-aligns per-day extras with the reservation nights and occupancy.
pub async fn sync_per_day_services(
    conn: &mut SqliteConnection,
    reservation: &Reservation,
) -> Result<(), PmsError> {
    let services = sqlx::query_as::<_, Service>(
        "SELECT * FROM services WHERE reservation_id = ? AND per_day = 1 AND is_board_service = 0",
    )
    .bind(reservation.id)
    .fetch_all(&mut *conn)
    .await?;

    let nights = stay_dates(reservation.checkin, reservation.checkout);
    for service in services {
        sqlx::query(
            "DELETE FROM service_lines WHERE service_id = ? AND invoiced = 0 AND (date < ? OR date >= ?)",
        )
        .bind(service.id)
        .bind(reservation.checkin)
        .bind(reservation.checkout)
        .execute(&mut *conn)
        .await?;

        let qty = day_quantity(service.quantity, service.per_person, reservation.adults);
        let lines = service_lines(conn, service.id).await?;
        for line in lines.iter().filter(|l| !l.invoiced && l.day_qty != qty) {
            sqlx::query("UPDATE service_lines SET day_qty = ?, price_total = ? WHERE id = ?")
                .bind(qty)
                .bind(round2(
                    qty as f64 * line.price_unit * (1.0 - line.discount / 100.0),
                ))
                .bind(line.id)
                .execute(&mut *conn)
                .await?;
        }
        for date in nights.iter().filter(|d| !lines.iter().any(|l| l.date == **d)) {
            insert_line(conn, &service, *date, qty).await?;
        }
        recompute_service(conn, service.id).await?;
    }
    Ok(())
}
