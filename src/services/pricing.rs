use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::error::PmsError;
use crate::models::cancelation_rule::{CancelationRule, CreateCancelationRule};
use crate::models::pricelist::{
    select_item, CreatePricelist, CreatePricelistItem, DailyPrice, Pricelist, PricelistItem,
};
use crate::models::reservation::stay_dates;

use super::inventory::get_room_type;
use super::property::get_property;

pub async fn create_cancelation_rule(
    conn: &mut SqliteConnection,
    input: &CreateCancelationRule,
) -> Result<CancelationRule, PmsError> {
    let rule = sqlx::query_as::<_, CancelationRule>(
        r#"
        INSERT INTO cancelation_rules
            (name, days_intime, penalty_late, apply_on_late, days_late,
             penalty_noshow, apply_on_noshow, days_noshow)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.name)
    .bind(input.days_intime)
    .bind(input.penalty_late)
    .bind(input.apply_on_late)
    .bind(input.days_late)
    .bind(input.penalty_noshow)
    .bind(input.apply_on_noshow)
    .bind(input.days_noshow)
    .fetch_one(&mut *conn)
    .await?;
    Ok(rule)
}

pub async fn get_cancelation_rule(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<CancelationRule, PmsError> {
    sqlx::query_as::<_, CancelationRule>("SELECT * FROM cancelation_rules WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("cancelation rule", id))
}

pub async fn list_cancelation_rules(
    conn: &mut SqliteConnection,
) -> Result<Vec<CancelationRule>, PmsError> {
    let rules = sqlx::query_as::<_, CancelationRule>("SELECT * FROM cancelation_rules ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    Ok(rules)
}

pub async fn create_pricelist(
    conn: &mut SqliteConnection,
    input: &CreatePricelist,
) -> Result<Pricelist, PmsError> {
    if let Some(property_id) = input.property_id {
        get_property(conn, property_id).await?;
    }
    if let Some(rule_id) = input.cancelation_rule_id {
        get_cancelation_rule(conn, rule_id).await?;
    }
    if let Some(plan_id) = input.availability_plan_id {
        super::availability::get_plan(conn, plan_id).await?;
    }

    let pricelist = sqlx::query_as::<_, Pricelist>(
        r#"
        INSERT INTO pricelists (name, property_id, cancelation_rule_id, availability_plan_id)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.name)
    .bind(input.property_id)
    .bind(input.cancelation_rule_id)
    .bind(input.availability_plan_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(pricelist)
}

pub async fn get_pricelist(conn: &mut SqliteConnection, id: i64) -> Result<Pricelist, PmsError> {
    sqlx::query_as::<_, Pricelist>("SELECT * FROM pricelists WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("pricelist", id))
}

pub async fn list_pricelists(
    conn: &mut SqliteConnection,
    property_id: Option<i64>,
) -> Result<Vec<Pricelist>, PmsError> {
    let pricelists = sqlx::query_as::<_, Pricelist>(
        r#"
        SELECT * FROM pricelists
        WHERE active = 1 AND (? IS NULL OR property_id IS NULL OR property_id = ?)
        ORDER BY id
        "#,
    )
    .bind(property_id)
    .bind(property_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(pricelists)
}

/// Fails unless `pricelist` may be used to sell in `property_id`.
pub fn ensure_pricelist_applies(pricelist: &Pricelist, property_id: i64) -> Result<(), PmsError> {
    if !pricelist.active {
        return Err(PmsError::UserError(format!(
            "Pricelist '{}' is archived",
            pricelist.name
        )));
    }
    match pricelist.property_id {
        Some(p) if p != property_id => Err(PmsError::UserError(format!(
            "Pricelist '{}' is not available in property {}",
            pricelist.name, property_id
        ))),
        _ => Ok(()),
    }
}

pub async fn add_pricelist_item(
    conn: &mut SqliteConnection,
    pricelist_id: i64,
    input: &CreatePricelistItem,
) -> Result<PricelistItem, PmsError> {
    if input.date_end < input.date_start {
        return Err(PmsError::Validation(
            "Item end date must not precede its start date".to_string(),
        ));
    }
    let pricelist = get_pricelist(conn, pricelist_id).await?;
    let room_type = get_room_type(conn, input.room_type_id).await?;
    if let Some(property_id) = input.property_id {
        if property_id != room_type.property_id {
            return Err(PmsError::UserError(format!(
                "Room type '{}' does not belong to property {}",
                room_type.code, property_id
            )));
        }
    }
    ensure_pricelist_applies(&pricelist, room_type.property_id)?;

    insert_item(
        conn,
        pricelist_id,
        input.room_type_id,
        input.property_id,
        input.date_start,
        input.date_end,
        input.fixed_price,
    )
    .await
}

pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    pricelist_id: i64,
    room_type_id: i64,
    property_id: Option<i64>,
    date_start: NaiveDate,
    date_end: NaiveDate,
    fixed_price: f64,
) -> Result<PricelistItem, PmsError> {
    let item = sqlx::query_as::<_, PricelistItem>(
        r#"
        INSERT INTO pricelist_items
            (pricelist_id, room_type_id, property_id, date_start, date_end, fixed_price)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(pricelist_id)
    .bind(room_type_id)
    .bind(property_id)
    .bind(date_start)
    .bind(date_end)
    .bind(fixed_price)
    .fetch_one(&mut *conn)
    .await?;
    Ok(item)
}

pub async fn list_items(
    conn: &mut SqliteConnection,
    pricelist_id: i64,
) -> Result<Vec<PricelistItem>, PmsError> {
    let items = sqlx::query_as::<_, PricelistItem>(
        "SELECT * FROM pricelist_items WHERE pricelist_id = ? ORDER BY date_start, id",
    )
    .bind(pricelist_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Nightly prices of `room_type_id` for every date in `[date_from, date_to)`.
/// Without a pricelist, or for dates no item covers, the room type list price
/// applies.
pub async fn nightly_prices(
    conn: &mut SqliteConnection,
    pricelist_id: Option<i64>,
    room_type_id: i64,
    property_id: i64,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<DailyPrice>, PmsError> {
    let room_type = get_room_type(conn, room_type_id).await?;
    let dates = stay_dates(date_from, date_to);

    let items = match pricelist_id {
        Some(pricelist_id) if !dates.is_empty() => {
            sqlx::query_as::<_, PricelistItem>(
                r#"
                SELECT * FROM pricelist_items
                WHERE pricelist_id = ? AND room_type_id = ?
                  AND date_start < ? AND date_end >= ?
                  AND (property_id IS NULL OR property_id = ?)
                "#,
            )
            .bind(pricelist_id)
            .bind(room_type_id)
            .bind(date_to)
            .bind(date_from)
            .bind(property_id)
            .fetch_all(&mut *conn)
            .await?
        }
        _ => Vec::new(),
    };

    Ok(dates
        .into_iter()
        .map(|date| DailyPrice {
            date,
            price: select_item(&items, property_id, date)
                .map(|item| item.fixed_price)
                .unwrap_or(room_type.list_price),
        })
        .collect())
}
