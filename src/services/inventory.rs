use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::PmsError;
use crate::models::board_service::{
    board_service_amount, AttachBoardService, BoardService, BoardServiceDetail, BoardServiceLine,
    BoardServiceRoomType, CreateBoardService,
};
use crate::models::room::{CreateRoom, CreateRoomType, Room, RoomSearch, RoomType};

use super::property::get_property;

fn unique_conflict(err: sqlx::Error, message: String) -> PmsError {
    match PmsError::from(err) {
        PmsError::Conflict(_) => PmsError::Conflict(message),
        other => other,
    }
}

pub async fn create_room_type(
    conn: &mut SqliteConnection,
    input: &CreateRoomType,
) -> Result<RoomType, PmsError> {
    get_property(conn, input.property_id).await?;

    let room_type = sqlx::query_as::<_, RoomType>(
        r#"
        INSERT INTO room_types (property_id, name, code, list_price, sequence)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(input.property_id)
    .bind(&input.name)
    .bind(&input.code)
    .bind(input.list_price)
    .bind(input.sequence)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        unique_conflict(
            e,
            format!(
                "Room type code '{}' already exists in property {}",
                input.code, input.property_id
            ),
        )
    })?;
    Ok(room_type)
}

pub async fn get_room_type(conn: &mut SqliteConnection, id: i64) -> Result<RoomType, PmsError> {
    sqlx::query_as::<_, RoomType>("SELECT * FROM room_types WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("room type", id))
}

pub async fn list_room_types(
    conn: &mut SqliteConnection,
    property_id: Option<i64>,
) -> Result<Vec<RoomType>, PmsError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM room_types");
    if let Some(property_id) = property_id {
        query.push(" WHERE property_id = ").push_bind(property_id);
    }
    query.push(" ORDER BY sequence, id");
    let room_types = query
        .build_query_as::<RoomType>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(room_types)
}

/// Largest number of guests any active room of the type can host.
pub async fn room_type_capacity(
    conn: &mut SqliteConnection,
    room_type_id: i64,
) -> Result<i64, PmsError> {
    let capacity: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(capacity + extra_beds), 0) FROM rooms WHERE room_type_id = ? AND active = 1",
    )
    .bind(room_type_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(capacity)
}

pub async fn create_room(conn: &mut SqliteConnection, input: &CreateRoom) -> Result<Room, PmsError> {
    let room_type = get_room_type(conn, input.room_type_id).await?;

    let room = sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (property_id, room_type_id, name, capacity, extra_beds, sequence)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(room_type.property_id)
    .bind(room_type.id)
    .bind(&input.name)
    .bind(input.capacity)
    .bind(input.extra_beds)
    .bind(input.sequence)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        unique_conflict(
            e,
            format!(
                "Room '{}' already exists in property {}",
                input.name, room_type.property_id
            ),
        )
    })?;
    Ok(room)
}

pub async fn get_room(conn: &mut SqliteConnection, id: i64) -> Result<Room, PmsError> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("room", id))
}

pub async fn list_rooms(
    conn: &mut SqliteConnection,
    search: &RoomSearch,
) -> Result<Vec<Room>, PmsError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM rooms WHERE 1=1");
    if let Some(property_id) = search.property_id {
        query.push(" AND property_id = ").push_bind(property_id);
    }
    if let Some(room_type_id) = search.room_type_id {
        query.push(" AND room_type_id = ").push_bind(room_type_id);
    }
    if !search.include_inactive {
        query.push(" AND active = 1");
    }
    query.push(" ORDER BY sequence, id");
    let rooms = query.build_query_as::<Room>().fetch_all(&mut *conn).await?;
    Ok(rooms)
}

/// Takes a room out of inventory. Rooms still holding future occupied nights
/// cannot be deactivated.
pub async fn deactivate_room(
    conn: &mut SqliteConnection,
    id: i64,
    today: chrono::NaiveDate,
) -> Result<Room, PmsError> {
    get_room(conn, id).await?;

    let future_nights: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM reservation_lines l
        JOIN reservations r ON r.id = l.reservation_id
        WHERE l.room_id = ? AND l.date >= ? AND r.state != 'cancel'
        "#,
    )
    .bind(id)
    .bind(today)
    .fetch_one(&mut *conn)
    .await?;
    if future_nights > 0 {
        return Err(PmsError::UserError(format!(
            "Room {} still has {} booked nights",
            id, future_nights
        )));
    }

    let room = sqlx::query_as::<_, Room>("UPDATE rooms SET active = 0 WHERE id = ? RETURNING *")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    log::info!("Deactivated room {}", room.name);
    Ok(room)
}

pub async fn create_board_service(
    conn: &mut SqliteConnection,
    input: &CreateBoardService,
) -> Result<BoardServiceDetail, PmsError> {
    get_property(conn, input.property_id).await?;

    let board_service = sqlx::query_as::<_, BoardService>(
        "INSERT INTO board_services (property_id, name, code) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(input.property_id)
    .bind(&input.name)
    .bind(&input.code)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        unique_conflict(
            e,
            format!(
                "Board service code '{}' already exists in property {}",
                input.code, input.property_id
            ),
        )
    })?;

    for line in &input.lines {
        sqlx::query(
            "INSERT INTO board_service_lines (board_service_id, name, amount, per_person) VALUES (?, ?, ?, ?)",
        )
        .bind(board_service.id)
        .bind(&line.name)
        .bind(line.amount)
        .bind(line.per_person)
        .execute(&mut *conn)
        .await?;
    }

    get_board_service(conn, board_service.id).await
}

pub async fn get_board_service(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<BoardServiceDetail, PmsError> {
    let board_service = sqlx::query_as::<_, BoardService>("SELECT * FROM board_services WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("board service", id))?;
    let lines = board_service_lines(conn, id).await?;
    let room_types = sqlx::query_as::<_, BoardServiceRoomType>(
        "SELECT * FROM board_service_room_types WHERE board_service_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(BoardServiceDetail {
        amount: board_service_amount(&lines),
        board_service,
        lines,
        room_types,
    })
}

pub async fn board_service_lines(
    conn: &mut SqliteConnection,
    board_service_id: i64,
) -> Result<Vec<BoardServiceLine>, PmsError> {
    let lines = sqlx::query_as::<_, BoardServiceLine>(
        "SELECT * FROM board_service_lines WHERE board_service_id = ? ORDER BY id",
    )
    .bind(board_service_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

pub async fn list_board_services(
    conn: &mut SqliteConnection,
    property_id: Option<i64>,
) -> Result<Vec<BoardServiceDetail>, PmsError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM board_services");
    if let Some(property_id) = property_id {
        query.push(" WHERE property_id = ").push_bind(property_id);
    }
    query.push(" ORDER BY id");
    let ids: Vec<i64> = query.build_query_scalar::<i64>().fetch_all(&mut *conn).await?;

    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        result.push(get_board_service(conn, id).await?);
    }
    Ok(result)
}

pub async fn attach_board_service(
    conn: &mut SqliteConnection,
    board_service_id: i64,
    input: &AttachBoardService,
) -> Result<BoardServiceRoomType, PmsError> {
    let board_service = get_board_service(conn, board_service_id).await?.board_service;
    let room_type = get_room_type(conn, input.room_type_id).await?;
    if board_service.property_id != room_type.property_id {
        return Err(PmsError::UserError(format!(
            "Board service '{}' and room type '{}' belong to different properties",
            board_service.code, room_type.code
        )));
    }

    if input.by_default {
        sqlx::query("UPDATE board_service_room_types SET by_default = 0 WHERE room_type_id = ?")
            .bind(room_type.id)
            .execute(&mut *conn)
            .await?;
    }

    let link = sqlx::query_as::<_, BoardServiceRoomType>(
        r#"
        INSERT INTO board_service_room_types (board_service_id, room_type_id, amount_override, by_default)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(board_service_id)
    .bind(room_type.id)
    .bind(input.amount_override)
    .bind(input.by_default)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        unique_conflict(
            e,
            format!(
                "Board service '{}' is already offered on room type '{}'",
                board_service.code, room_type.code
            ),
        )
    })?;
    Ok(link)
}

pub async fn get_board_service_room_type(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<BoardServiceRoomType, PmsError> {
    sqlx::query_as::<_, BoardServiceRoomType>("SELECT * FROM board_service_room_types WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PmsError::not_found("board service room type", id))
}

pub async fn default_board_service(
    conn: &mut SqliteConnection,
    room_type_id: i64,
) -> Result<Option<i64>, PmsError> {
    let id = sqlx::query_scalar(
        "SELECT id FROM board_service_room_types WHERE room_type_id = ? AND by_default = 1",
    )
    .bind(room_type_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}
