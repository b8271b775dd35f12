use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::error::PmsError;
use crate::models::checkin_partner::{CheckinPartner, CheckinState, GuestData};
use crate::models::reservation::{Reservation, ReservationState, ReservationType};

use super::reservation::{get_reservation, mark_onboard};

pub async fn get_guest(conn: &mut SqliteConnection, id: i64) -> Result<CheckinPartner, PmsError> {
    sqlx::query_as::<_, CheckinPartner>("SELECT * FROM checkin_partners WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("checkin partner", id))
}

pub async fn list_guests(
    conn: &mut SqliteConnection,
    reservation_id: i64,
) -> Result<Vec<CheckinPartner>, PmsError> {
    let guests = sqlx::query_as::<_, CheckinPartner>(
        "SELECT * FROM checkin_partners WHERE reservation_id = ? ORDER BY id",
    )
    .bind(reservation_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(guests)
}

async fn ensure_document_unique(
    conn: &mut SqliteConnection,
    reservation_id: i64,
    document_number: Option<&str>,
    exclude_guest: Option<i64>,
) -> Result<(), PmsError> {
    let Some(document_number) = document_number else {
        return Ok(());
    };
    let taken: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM checkin_partners
        WHERE reservation_id = ? AND document_number = ? AND (? IS NULL OR id != ?)
        "#,
    )
    .bind(reservation_id)
    .bind(document_number)
    .bind(exclude_guest)
    .bind(exclude_guest)
    .fetch_one(&mut *conn)
    .await?;
    if taken > 0 {
        return Err(PmsError::Conflict(format!(
            "Document {} is already registered on this reservation",
            document_number
        )));
    }
    Ok(())
}

fn ensure_open(reservation: &Reservation) -> Result<(), PmsError> {
    if reservation.state.is_closed() {
        return Err(PmsError::UserError(format!(
            "Reservation {} is closed",
            reservation.name
        )));
    }
    Ok(())
}

pub async fn register_guest(
    conn: &mut SqliteConnection,
    reservation_id: i64,
    data: GuestData,
) -> Result<CheckinPartner, PmsError> {
    let reservation = get_reservation(conn, reservation_id).await?;
    ensure_open(&reservation)?;
    if reservation.reservation_type == ReservationType::Out {
        return Err(PmsError::UserError(format!(
            "Reservation {} is an out of service block",
            reservation.name
        )));
    }
    let registered = list_guests(conn, reservation_id).await?.len() as i64;
    if registered >= reservation.adults {
        return Err(PmsError::UserError(format!(
            "Reservation {} already has its {} guests registered",
            reservation.name, reservation.adults
        )));
    }
    ensure_document_unique(conn, reservation_id, data.document_number.as_deref(), None).await?;

    let mut guest = CheckinPartner {
        id: 0,
        reservation_id,
        folio_id: reservation.folio_id,
        firstname: None,
        lastname: None,
        document_type: None,
        document_number: None,
        email: None,
        mobile: None,
        state: CheckinState::Draft,
        arrival: None,
        departure: None,
    };
    guest.merge(data);
    guest.state = guest.derived_state();

    let guest = sqlx::query_as::<_, CheckinPartner>(
        r#"
        INSERT INTO checkin_partners
            (reservation_id, folio_id, firstname, lastname, document_type, document_number,
             email, mobile, state)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(guest.reservation_id)
    .bind(guest.folio_id)
    .bind(&guest.firstname)
    .bind(&guest.lastname)
    .bind(&guest.document_type)
    .bind(&guest.document_number)
    .bind(&guest.email)
    .bind(&guest.mobile)
    .bind(guest.state)
    .fetch_one(&mut *conn)
    .await?;
    Ok(guest)
}

pub async fn update_guest(
    conn: &mut SqliteConnection,
    id: i64,
    data: GuestData,
) -> Result<CheckinPartner, PmsError> {
    let mut guest = get_guest(conn, id).await?;
    if guest.state == CheckinState::Done {
        return Err(PmsError::UserError(
            "Guest has already checked out".to_string(),
        ));
    }
    ensure_open(&get_reservation(conn, guest.reservation_id).await?)?;
    ensure_document_unique(conn, guest.reservation_id, data.document_number.as_deref(), Some(id))
        .await?;
    guest.merge(data);
    guest.state = guest.derived_state();

    let guest = sqlx::query_as::<_, CheckinPartner>(
        r#"
        UPDATE checkin_partners
        SET firstname = ?, lastname = ?, document_type = ?, document_number = ?,
            email = ?, mobile = ?, state = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&guest.firstname)
    .bind(&guest.lastname)
    .bind(&guest.document_type)
    .bind(&guest.document_number)
    .bind(&guest.email)
    .bind(&guest.mobile)
    .bind(guest.state)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(guest)
}

/// Checks a guest in. The reservation goes on board with its first guest.
pub async fn onboard_guest(
    conn: &mut SqliteConnection,
    id: i64,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<CheckinPartner, PmsError> {
    let guest = get_guest(conn, id).await?;
    match guest.state {
        CheckinState::Precheckin => {}
        CheckinState::Draft => {
            return Err(PmsError::UserError(
                "Guest name and document are required to check in".to_string(),
            ))
        }
        CheckinState::Onboard | CheckinState::Done => {
            return Err(PmsError::UserError("Guest is already checked in".to_string()))
        }
    }

    let reservation = get_reservation(conn, guest.reservation_id).await?;
    if !matches!(
        reservation.state,
        ReservationState::Confirm | ReservationState::Onboard
    ) {
        return Err(PmsError::UserError(format!(
            "Reservation {} must be confirmed before checking in",
            reservation.name
        )));
    }
    if today < reservation.checkin || today > reservation.checkout {
        return Err(PmsError::UserError(format!(
            "Reservation {} runs from {} to {}; cannot check in on {}",
            reservation.name, reservation.checkin, reservation.checkout, today
        )));
    }

    let guest = sqlx::query_as::<_, CheckinPartner>(
        "UPDATE checkin_partners SET state = 'onboard', arrival = ? WHERE id = ? RETURNING *",
    )
    .bind(now)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    mark_onboard(conn, &reservation).await?;
    log::info!("Guest {} on board in {}", id, reservation.name);
    Ok(guest)
}
