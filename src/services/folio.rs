use chrono::{Datelike, NaiveDate};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db::{next_sequence, round2};
use crate::error::PmsError;
use crate::models::folio::{
    derive_state, invoice_status, payment_state, CreateFolio, Folio, FolioDetail, FolioSearch,
    FolioState, UpdateFolio,
};
use crate::models::reservation::{ReservationState, ReservationType};

use super::invoice::list_invoices;
use super::payment::list_payments;
use super::pricing::{ensure_pricelist_applies, get_pricelist};
use super::property::{get_agency, get_property, get_sale_channel};
use super::reservation::{
    cancel_reservation, confirm_reservation, create_reservation, get_reservation_detail,
    list_folio_reservations,
};
use super::service::list_services;

pub async fn get_folio(conn: &mut SqliteConnection, id: i64) -> Result<Folio, PmsError> {
    sqlx::query_as::<_, Folio>("SELECT * FROM folios WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("folio", id))
}

pub async fn get_folio_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<FolioDetail, PmsError> {
    let folio = get_folio(conn, id).await?;
    let mut reservations = Vec::new();
    for reservation in list_folio_reservations(conn, id).await? {
        reservations.push(get_reservation_detail(conn, reservation.id).await?);
    }
    let services = list_services(conn, id).await?;
    let payments = list_payments(conn, id).await?;
    let invoices = list_invoices(conn, id).await?;
    Ok(FolioDetail {
        folio,
        reservations,
        services,
        payments,
        invoices,
    })
}

pub async fn list_folios(
    conn: &mut SqliteConnection,
    search: &FolioSearch,
) -> Result<Vec<Folio>, PmsError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM folios WHERE 1=1");
    if let Some(property_id) = search.property_id {
        query.push(" AND property_id = ").push_bind(property_id);
    }
    if let Some(state) = search.state {
        query.push(" AND state = ").push_bind(state);
    }
    if let Some(partner) = &search.partner_name {
        query
            .push(" AND partner_name LIKE ")
            .push_bind(format!("%{}%", partner));
    }
    query.push(" ORDER BY id DESC");
    let folios = query.build_query_as::<Folio>().fetch_all(&mut *conn).await?;
    Ok(folios)
}

pub async fn create_folio(
    conn: &mut SqliteConnection,
    input: &CreateFolio,
    today: NaiveDate,
) -> Result<FolioDetail, PmsError> {
    let property = get_property(conn, input.property_id).await?;
    if input.reservation_type == ReservationType::Normal
        && input
            .partner_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    {
        return Err(PmsError::Validation(
            "A partner name is required for normal folios".to_string(),
        ));
    }

    let pricelist_id = input.pricelist_id.or(property.default_pricelist_id);
    if let Some(id) = pricelist_id {
        ensure_pricelist_applies(&get_pricelist(conn, id).await?, property.id)?;
    }

    let agency = match input.agency_id {
        Some(id) => Some(get_agency(conn, id).await?),
        None => None,
    };
    let sale_channel_id = input
        .sale_channel_id
        .or(agency.as_ref().and_then(|a| a.sale_channel_id));
    if let Some(id) = sale_channel_id {
        get_sale_channel(conn, id).await?;
    }

    let prefix = format!("F/{:02}", today.year() % 100);
    let seq = next_sequence(conn, "folios", &prefix).await?;
    let folio = sqlx::query_as::<_, Folio>(
        r#"
        INSERT INTO folios
            (name, property_id, partner_name, email, phone, pricelist_id, agency_id,
             sale_channel_id, reservation_type, internal_comment)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(format!("{}{:05}", prefix, seq))
    .bind(property.id)
    .bind(&input.partner_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(pricelist_id)
    .bind(input.agency_id)
    .bind(sale_channel_id)
    .bind(input.reservation_type)
    .bind(&input.internal_comment)
    .fetch_one(&mut *conn)
    .await?;
    log::info!("Created folio {} in property {}", folio.name, property.code);

    for stay in &input.reservations {
        create_reservation(conn, &folio, stay).await?;
    }
    recompute_folio(conn, folio.id).await?;
    get_folio_detail(conn, folio.id).await
}

pub async fn update_folio(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &UpdateFolio,
) -> Result<Folio, PmsError> {
    let folio = get_folio(conn, id).await?;
    if folio.state == FolioState::Cancel {
        return Err(PmsError::UserError(format!("Folio {} is cancelled", folio.name)));
    }

    let folio = sqlx::query_as::<_, Folio>(
        r#"
        UPDATE folios
        SET partner_name = ?, email = ?, phone = ?, internal_comment = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(changes.partner_name.clone().or(folio.partner_name))
    .bind(changes.email.clone().or(folio.email))
    .bind(changes.phone.clone().or(folio.phone))
    .bind(changes.internal_comment.clone().or(folio.internal_comment))
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(folio)
}

/// Confirms every draft reservation of the folio.
pub async fn confirm_folio(conn: &mut SqliteConnection, id: i64) -> Result<Folio, PmsError> {
    let folio = get_folio(conn, id).await?;
    let reservations = list_folio_reservations(conn, id).await?;
    let drafts: Vec<i64> = reservations
        .iter()
        .filter(|r| r.state == ReservationState::Draft)
        .map(|r| r.id)
        .collect();
    if drafts.is_empty() {
        return Err(PmsError::UserError(format!(
            "Folio {} has no draft reservations to confirm",
            folio.name
        )));
    }
    for reservation_id in drafts {
        confirm_reservation(conn, reservation_id).await?;
    }
    recompute_folio(conn, id).await?;
    get_folio(conn, id).await
}

/// Cancels every reservation still open. Fails when a guest is already on
/// board or a stay is finished.
pub async fn cancel_folio(
    conn: &mut SqliteConnection,
    id: i64,
    today: NaiveDate,
) -> Result<Folio, PmsError> {
    let folio = get_folio(conn, id).await?;
    let reservations = list_folio_reservations(conn, id).await?;
    if let Some(started) = reservations
        .iter()
        .find(|r| matches!(r.state, ReservationState::Onboard | ReservationState::Done))
    {
        return Err(PmsError::UserError(format!(
            "Folio {} cannot be cancelled: {} has already started",
            folio.name, started.name
        )));
    }
    for reservation in reservations
        .iter()
        .filter(|r| r.state != ReservationState::Cancel)
    {
        cancel_reservation(conn, reservation.id, today).await?;
    }

    if reservations.is_empty() {
        sqlx::query("UPDATE folios SET state = 'cancel' WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    recompute_folio(conn, id).await?;
    get_folio(conn, id).await
}

/// Refreshes every amount and state of the folio derived from its
/// reservations, services, payments and invoices.
pub async fn recompute_folio(conn: &mut SqliteConnection, id: i64) -> Result<(), PmsError> {
    let folio = get_folio(conn, id).await?;
    let property = get_property(conn, folio.property_id).await?;

    let rooms: f64 =
        sqlx::query_scalar("SELECT TOTAL(price_subtotal) FROM reservations WHERE folio_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    let services: f64 = sqlx::query_scalar(
        r#"
        SELECT TOTAL(s.price_total) FROM services s
        LEFT JOIN reservations r ON r.id = s.reservation_id
        WHERE s.folio_id = ? AND (r.id IS NULL OR r.state != 'cancel')
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    let paid: f64 = sqlx::query_scalar("SELECT TOTAL(amount) FROM payments WHERE folio_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    let commission: f64 =
        sqlx::query_scalar("SELECT TOTAL(commission_amount) FROM reservations WHERE folio_id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    let states: Vec<ReservationState> =
        sqlx::query_scalar("SELECT state FROM reservations WHERE folio_id = ?")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
    let (pending_lines, invoiced_lines): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM reservation_lines l
             JOIN reservations r ON r.id = l.reservation_id
             WHERE r.folio_id = ?1 AND l.invoiced = 0 AND l.price_total != 0)
          + (SELECT COUNT(*) FROM service_lines sl
             JOIN services s ON s.id = sl.service_id
             LEFT JOIN reservations r ON r.id = s.reservation_id
             WHERE s.folio_id = ?1 AND sl.invoiced = 0 AND sl.price_total != 0
               AND (r.id IS NULL OR r.state != 'cancel')),
            (SELECT COUNT(*) FROM reservation_lines l
             JOIN reservations r ON r.id = l.reservation_id
             WHERE r.folio_id = ?1 AND l.invoiced = 1)
          + (SELECT COUNT(*) FROM service_lines sl
             JOIN services s ON s.id = sl.service_id
             WHERE s.folio_id = ?1 AND sl.invoiced = 1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    let untaxed = round2(rooms + services);
    let tax = round2(untaxed * property.tax_rate / 100.0);
    let total = round2(untaxed + tax);
    let paid = round2(paid);
    let state = if states.is_empty() {
        folio.state
    } else {
        derive_state(&states)
    };

    sqlx::query(
        r#"
        UPDATE folios
        SET amount_untaxed = ?, amount_tax = ?, amount_total = ?, amount_paid = ?,
            pending_amount = ?, payment_state = ?, invoice_status = ?, commission = ?,
            state = ?
        WHERE id = ?
        "#,
    )
    .bind(untaxed)
    .bind(tax)
    .bind(total)
    .bind(paid)
    .bind(round2(total - paid))
    .bind(payment_state(total, paid))
    .bind(invoice_status(state, pending_lines, invoiced_lines))
    .bind(round2(commission))
    .bind(state)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if state != folio.state {
        log::info!("Folio {} moved from {:?} to {:?}", folio.name, folio.state, state);
    }
    log::debug!("Recomputed folio {}: total {}, paid {}", folio.name, total, paid);
    Ok(())
}
