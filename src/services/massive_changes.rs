use sqlx::SqliteConnection;

use crate::error::PmsError;
use crate::models::room::RoomType;
use crate::models::wizard::{selected_dates, MassiveChangeTarget, MassiveChanges, MassiveChangesResult};

use super::availability::{get_plan, upsert_rule};
use super::inventory::{get_room_type, list_room_types};
use super::pricing::{ensure_pricelist_applies, get_pricelist, insert_item};
use super::property::get_property;

async fn target_room_types(
    conn: &mut SqliteConnection,
    property_id: i64,
    room_type_ids: &[i64],
) -> Result<Vec<RoomType>, PmsError> {
    if room_type_ids.is_empty() {
        return list_room_types(conn, Some(property_id)).await;
    }
    let mut room_types = Vec::with_capacity(room_type_ids.len());
    for id in room_type_ids {
        let room_type = get_room_type(conn, *id).await?;
        if room_type.property_id != property_id {
            return Err(PmsError::UserError(format!(
                "Room type '{}' does not belong to property {}",
                room_type.code, property_id
            )));
        }
        room_types.push(room_type);
    }
    Ok(room_types)
}

/// Applies one batch of price or restriction changes.
pub async fn apply_massive_changes(
    conn: &mut SqliteConnection,
    input: &MassiveChanges,
) -> Result<MassiveChangesResult, PmsError> {
    if input.date_to < input.date_from {
        return Err(PmsError::Validation(
            "date_to must not precede date_from".to_string(),
        ));
    }
    let property = get_property(conn, input.property_id).await?;
    let room_types = target_room_types(conn, property.id, &input.room_type_ids).await?;
    let dates = selected_dates(input.date_from, input.date_to, &input.weekdays);
    let mut result = MassiveChangesResult::default();

    match input.target {
        MassiveChangeTarget::Pricelist => {
            let (Some(pricelist_id), Some(price)) = (input.pricelist_id, input.price) else {
                return Err(PmsError::Validation(
                    "Price changes need a pricelist and a price".to_string(),
                ));
            };
            let pricelist = get_pricelist(conn, pricelist_id).await?;
            ensure_pricelist_applies(&pricelist, property.id)?;

            for room_type in &room_types {
                for date in &dates {
                    let updated = sqlx::query(
                        r#"
                        UPDATE pricelist_items SET fixed_price = ?
                        WHERE pricelist_id = ? AND room_type_id = ? AND property_id = ?
                          AND date_start = ? AND date_end = ?
                        "#,
                    )
                    .bind(price)
                    .bind(pricelist.id)
                    .bind(room_type.id)
                    .bind(property.id)
                    .bind(date)
                    .bind(date)
                    .execute(&mut *conn)
                    .await?
                    .rows_affected();
                    if updated > 0 {
                        result.updated += updated as i64;
                    } else {
                        insert_item(
                            conn,
                            pricelist.id,
                            room_type.id,
                            Some(property.id),
                            *date,
                            *date,
                            price,
                        )
                        .await?;
                        result.created += 1;
                    }
                }
            }
        }
        MassiveChangeTarget::AvailabilityPlan => {
            let Some(plan_id) = input.availability_plan_id else {
                return Err(PmsError::Validation(
                    "Restriction changes need an availability plan".to_string(),
                ));
            };
            if input.rules.is_empty() {
                return Err(PmsError::Validation(
                    "No restriction values to apply".to_string(),
                ));
            }
            let plan = get_plan(conn, plan_id).await?;

            for room_type in &room_types {
                for date in &dates {
                    let (_, created) =
                        upsert_rule(conn, plan.id, room_type.id, property.id, *date, &input.rules)
                            .await?;
                    if created {
                        result.created += 1;
                    } else {
                        result.updated += 1;
                    }
                }
            }
        }
    }

    log::info!(
        "Massive changes on property {}: {} created, {} updated",
        property.code,
        result.created,
        result.updated
    );
    Ok(result)
}
