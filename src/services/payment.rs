use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::PmsError;
use crate::models::payment::{CreatePayment, Payment};

use super::folio::{get_folio, recompute_folio};

pub async fn register_payment(
    conn: &mut SqliteConnection,
    folio_id: i64,
    input: &CreatePayment,
    today: NaiveDate,
) -> Result<Payment, PmsError> {
    if input.amount.abs() < 0.005 {
        return Err(PmsError::Validation(
            "Payment amount must not be zero".to_string(),
        ));
    }
    let folio = get_folio(conn, folio_id).await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (folio_id, amount, date, method, reference)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(folio.id)
    .bind(input.amount)
    .bind(input.date.unwrap_or(today))
    .bind(input.method)
    .bind(&input.reference)
    .fetch_one(&mut *conn)
    .await?;

    recompute_folio(conn, folio.id).await?;
    log::info!(
        "Registered {:?} payment of {} on folio {}",
        payment.method,
        payment.amount,
        folio.name
    );
    Ok(payment)
}

pub async fn list_payments(
    conn: &mut SqliteConnection,
    folio_id: i64,
) -> Result<Vec<Payment>, PmsError> {
    let payments =
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE folio_id = ? ORDER BY date, id")
            .bind(folio_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(payments)
}
