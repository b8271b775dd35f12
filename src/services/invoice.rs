use chrono::{Datelike, NaiveDate};
use sqlx::{FromRow, SqliteConnection};

use crate::db::{next_sequence, round2};
use crate::error::PmsError;
use crate::models::folio::FolioState;
use crate::models::invoice::{combined_discount, DraftInvoiceLine, Invoice, InvoiceDetail, InvoiceLine};

use super::folio::{get_folio, recompute_folio};
use super::property::get_property;

#[derive(Debug, FromRow)]
struct PendingNight {
    id: i64,
    reservation_id: i64,
    reservation_name: String,
    room_type_name: String,
    price: f64,
    discount: f64,
    cancel_discount: f64,
    price_total: f64,
}

#[derive(Debug, FromRow)]
struct PendingServiceLine {
    id: i64,
    service_id: i64,
    name: String,
    day_qty: i64,
    price_unit: f64,
    discount: f64,
    price_total: f64,
}

/// One line per reservation, price and combined discount. Nights sharing
/// them are counted together wherever they fall in the stay.
fn group_nights(nights: &[PendingNight]) -> Vec<DraftInvoiceLine> {
    let mut lines: Vec<DraftInvoiceLine> = Vec::new();
    let mut keys: Vec<(i64, f64, f64)> = Vec::new();

    for night in nights {
        let discount = combined_discount(night.discount, night.cancel_discount);
        let key = (night.reservation_id, night.price, discount);
        match keys.iter().position(|k| *k == key) {
            Some(idx) => {
                let line = &mut lines[idx];
                line.quantity += 1.0;
                line.price_subtotal = round2(line.price_subtotal + night.price_total);
            }
            None => {
                keys.push(key);
                lines.push(DraftInvoiceLine {
                    description: format!("{} - {}", night.reservation_name, night.room_type_name),
                    quantity: 1.0,
                    price_unit: night.price,
                    discount,
                    price_subtotal: night.price_total,
                    reservation_id: Some(night.reservation_id),
                    service_id: None,
                });
            }
        }
    }
    lines
}

fn group_service_lines(pending: &[PendingServiceLine]) -> Vec<DraftInvoiceLine> {
    let mut lines: Vec<DraftInvoiceLine> = Vec::new();
    for line in pending {
        match lines.iter_mut().find(|l| l.service_id == Some(line.service_id)) {
            Some(existing) => {
                existing.quantity += line.day_qty as f64;
                existing.price_subtotal = round2(existing.price_subtotal + line.price_total);
            }
            None => lines.push(DraftInvoiceLine {
                description: line.name.clone(),
                quantity: line.day_qty as f64,
                price_unit: line.price_unit,
                discount: line.discount,
                price_subtotal: line.price_total,
                reservation_id: None,
                service_id: Some(line.service_id),
            }),
        }
    }
    lines
}

/// Invoices everything the folio has not invoiced yet.
pub async fn create_invoice(
    conn: &mut SqliteConnection,
    folio_id: i64,
    today: NaiveDate,
) -> Result<InvoiceDetail, PmsError> {
    let folio = get_folio(conn, folio_id).await?;
    if !matches!(folio.state, FolioState::Confirm | FolioState::Done) {
        return Err(PmsError::UserError(format!(
            "Folio {} must be confirmed to be invoiced",
            folio.name
        )));
    }
    let property = get_property(conn, folio.property_id).await?;

    let nights = sqlx::query_as::<_, PendingNight>(
        r#"
        SELECT l.id, l.reservation_id, r.name AS reservation_name, rt.name AS room_type_name,
               l.price, l.discount, l.cancel_discount, l.price_total
        FROM reservation_lines l
        JOIN reservations r ON r.id = l.reservation_id
        JOIN room_types rt ON rt.id = r.room_type_id
        WHERE r.folio_id = ? AND l.invoiced = 0 AND l.price_total != 0
        ORDER BY r.id, l.date
        "#,
    )
    .bind(folio.id)
    .fetch_all(&mut *conn)
    .await?;
    let service_lines = sqlx::query_as::<_, PendingServiceLine>(
        r#"
        SELECT sl.id, sl.service_id, s.name, sl.day_qty, sl.price_unit, sl.discount, sl.price_total
        FROM service_lines sl
        JOIN services s ON s.id = sl.service_id
        LEFT JOIN reservations r ON r.id = s.reservation_id
        WHERE s.folio_id = ? AND sl.invoiced = 0 AND sl.price_total != 0
          AND (r.id IS NULL OR r.state != 'cancel')
        ORDER BY s.id, sl.date
        "#,
    )
    .bind(folio.id)
    .fetch_all(&mut *conn)
    .await?;

    if nights.is_empty() && service_lines.is_empty() {
        return Err(PmsError::UserError(format!(
            "Folio {} has nothing to invoice",
            folio.name
        )));
    }

    let mut drafts = group_nights(&nights);
    drafts.extend(group_service_lines(&service_lines));
    let untaxed = round2(drafts.iter().map(|l| l.price_subtotal).sum());
    let tax = round2(untaxed * property.tax_rate / 100.0);

    let prefix = format!("INV/{}/", today.year());
    let seq = next_sequence(conn, "invoices", &prefix).await?;
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (name, folio_id, partner_name, date, amount_untaxed, amount_tax, amount_total)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(format!("{}{:05}", prefix, seq))
    .bind(folio.id)
    .bind(&folio.partner_name)
    .bind(today)
    .bind(untaxed)
    .bind(tax)
    .bind(round2(untaxed + tax))
    .fetch_one(&mut *conn)
    .await?;

    for draft in &drafts {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines
                (invoice_id, description, quantity, price_unit, discount, price_subtotal,
                 reservation_id, service_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice.id)
        .bind(&draft.description)
        .bind(draft.quantity)
        .bind(draft.price_unit)
        .bind(draft.discount)
        .bind(draft.price_subtotal)
        .bind(draft.reservation_id)
        .bind(draft.service_id)
        .execute(&mut *conn)
        .await?;
    }
    for night in &nights {
        sqlx::query("UPDATE reservation_lines SET invoiced = 1 WHERE id = ?")
            .bind(night.id)
            .execute(&mut *conn)
            .await?;
    }
    for line in &service_lines {
        sqlx::query("UPDATE service_lines SET invoiced = 1 WHERE id = ?")
            .bind(line.id)
            .execute(&mut *conn)
            .await?;
    }

    recompute_folio(conn, folio.id).await?;
    log::info!(
        "Invoice {} issued for folio {}: {}",
        invoice.name,
        folio.name,
        invoice.amount_total
    );
    get_invoice(conn, invoice.id).await
}

pub async fn get_invoice(conn: &mut SqliteConnection, id: i64) -> Result<InvoiceDetail, PmsError> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("invoice", id))?;
    let lines = sqlx::query_as::<_, InvoiceLine>(
        "SELECT * FROM invoice_lines WHERE invoice_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(InvoiceDetail { invoice, lines })
}

pub async fn list_invoices(
    conn: &mut SqliteConnection,
    folio_id: i64,
) -> Result<Vec<Invoice>, PmsError> {
    let invoices =
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE folio_id = ? ORDER BY id")
            .bind(folio_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(invoices)
}
