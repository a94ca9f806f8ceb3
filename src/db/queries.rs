use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::TS_FORMAT;
use crate::models::{
    Booking, BookingDetail, DetailStatus, Facility, Role, Room, RoomStatus, User,
};

macro_rules! user_columns {
    () => {
        "u.id, u.name, u.division, u.title, u.email, u.password, u.role, u.created_at, u.updated_at"
    };
}

macro_rules! room_columns {
    () => {
        "r.id, r.room_type, r.max_capacity, r.status, r.created_at, r.updated_at, \
         f.id, f.description, f.wifi, f.sound_system, f.projector, f.screen_projector, \
         f.chairs, f.tables, f.sound_proof, f.smoking_area, f.television, f.ac, \
         f.bathroom, f.coffee_maker, f.created_at, f.updated_at"
    };
}

macro_rules! booking_header {
    () => {
        concat!(
            "SELECT b.id, b.created_at, b.updated_at, ",
            user_columns!(),
            " FROM bookings b JOIN users u ON u.id = b.user_id"
        )
    };
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

fn parse_user_row(row: &Row, base: usize) -> rusqlite::Result<User> {
    let role: String = row.get(base + 6)?;
    let created_at: String = row.get(base + 7)?;
    let updated_at: String = row.get(base + 8)?;

    Ok(User {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        division: row.get(base + 2)?,
        title: row.get(base + 3)?,
        email: row.get(base + 4)?,
        password: row.get(base + 5)?,
        role: Role::parse(&role).unwrap_or(Role::Employee),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, division, title, email, password, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id,
            user.name,
            user.division,
            user.title,
            user.email,
            user.password,
            user.role.as_str(),
            fmt_ts(&user.created_at),
            fmt_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        concat!("SELECT ", user_columns!(), " FROM users u WHERE u.id = ?1"),
        params![id],
        |row| parse_user_row(row, 0),
    )
    .optional()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        concat!("SELECT ", user_columns!(), " FROM users u WHERE u.email = ?1"),
        params![email],
        |row| parse_user_row(row, 0),
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(concat!(
        "SELECT ",
        user_columns!(),
        " FROM users u ORDER BY u.created_at ASC, u.rowid ASC"
    ))?;
    let rows = stmt.query_map([], |row| parse_user_row(row, 0))?;
    rows.collect()
}

pub fn update_user(conn: &Connection, user: &User) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET name = ?1, division = ?2, title = ?3, email = ?4, password = ?5,
           role = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            user.name,
            user.division,
            user.title,
            user.email,
            user.password,
            user.role.as_str(),
            fmt_ts(&user.updated_at),
            user.id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_user(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

// ── Rooms ──

fn parse_room_row(row: &Row, base: usize) -> rusqlite::Result<Room> {
    let status: String = row.get(base + 3)?;
    let created_at: String = row.get(base + 4)?;
    let updated_at: String = row.get(base + 5)?;
    let f = base + 6;
    let f_created_at: String = row.get(f + 14)?;
    let f_updated_at: String = row.get(f + 15)?;

    Ok(Room {
        id: row.get(base)?,
        room_type: row.get(base + 1)?,
        max_capacity: row.get(base + 2)?,
        status: RoomStatus::parse(&status),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
        facility: Facility {
            id: row.get(f)?,
            description: row.get(f + 1)?,
            wifi: row.get(f + 2)?,
            sound_system: row.get(f + 3)?,
            projector: row.get(f + 4)?,
            screen_projector: row.get(f + 5)?,
            chairs: row.get(f + 6)?,
            tables: row.get(f + 7)?,
            sound_proof: row.get(f + 8)?,
            smoking_area: row.get(f + 9)?,
            television: row.get(f + 10)?,
            ac: row.get(f + 11)?,
            bathroom: row.get(f + 12)?,
            coffee_maker: row.get(f + 13)?,
            created_at: parse_ts(&f_created_at),
            updated_at: parse_ts(&f_updated_at),
        },
    })
}

/// Writes the facility and then the room that points at it.
pub fn insert_room(conn: &Connection, room: &Room) -> rusqlite::Result<()> {
    let f = &room.facility;
    conn.execute(
        "INSERT INTO facilities (id, description, wifi, sound_system, projector, screen_projector,
           chairs, tables, sound_proof, smoking_area, television, ac, bathroom, coffee_maker,
           created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            f.id,
            f.description,
            f.wifi,
            f.sound_system,
            f.projector,
            f.screen_projector,
            f.chairs,
            f.tables,
            f.sound_proof,
            f.smoking_area,
            f.television,
            f.ac,
            f.bathroom,
            f.coffee_maker,
            fmt_ts(&f.created_at),
            fmt_ts(&f.updated_at),
        ],
    )?;

    conn.execute(
        "INSERT INTO rooms (id, room_type, max_capacity, facility_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            room.id,
            room.room_type,
            room.max_capacity,
            f.id,
            room.status.as_str(),
            fmt_ts(&room.created_at),
            fmt_ts(&room.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_room(conn: &Connection, id: &str) -> rusqlite::Result<Option<Room>> {
    conn.query_row(
        concat!(
            "SELECT ",
            room_columns!(),
            " FROM rooms r JOIN facilities f ON f.id = r.facility_id WHERE r.id = ?1"
        ),
        params![id],
        |row| parse_room_row(row, 0),
    )
    .optional()
}

pub fn get_room_by_type(conn: &Connection, room_type: &str) -> rusqlite::Result<Option<Room>> {
    conn.query_row(
        concat!(
            "SELECT ",
            room_columns!(),
            " FROM rooms r JOIN facilities f ON f.id = r.facility_id
             WHERE r.room_type = ?1 ORDER BY r.rowid ASC LIMIT 1"
        ),
        params![room_type],
        |row| parse_room_row(row, 0),
    )
    .optional()
}

pub fn list_rooms(conn: &Connection, status: Option<RoomStatus>) -> rusqlite::Result<Vec<Room>> {
    let mut stmt = conn.prepare(concat!(
        "SELECT ",
        room_columns!(),
        " FROM rooms r JOIN facilities f ON f.id = r.facility_id
         WHERE (?1 IS NULL OR r.status = ?1)
         ORDER BY r.created_at ASC, r.rowid ASC"
    ))?;
    let rows = stmt.query_map(params![status.map(|s| s.as_str())], |row| {
        parse_room_row(row, 0)
    })?;
    rows.collect()
}

/// Persists every mutable room and facility field.
pub fn update_room(conn: &Connection, room: &Room) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE rooms SET room_type = ?1, max_capacity = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            room.room_type,
            room.max_capacity,
            room.status.as_str(),
            fmt_ts(&room.updated_at),
            room.id,
        ],
    )?;
    if changed == 0 {
        return Ok(false);
    }

    let f = &room.facility;
    conn.execute(
        "UPDATE facilities SET description = ?1, wifi = ?2, sound_system = ?3, projector = ?4,
           screen_projector = ?5, chairs = ?6, tables = ?7, sound_proof = ?8, smoking_area = ?9,
           television = ?10, ac = ?11, bathroom = ?12, coffee_maker = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            f.description,
            f.wifi,
            f.sound_system,
            f.projector,
            f.screen_projector,
            f.chairs,
            f.tables,
            f.sound_proof,
            f.smoking_area,
            f.television,
            f.ac,
            f.bathroom,
            f.coffee_maker,
            fmt_ts(&f.updated_at),
            f.id,
        ],
    )?;
    Ok(true)
}

/// Deletes the room and its facility.
pub fn delete_room(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let facility_id: Option<String> = conn
        .query_row(
            "SELECT facility_id FROM rooms WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(facility_id) = facility_id else {
        return Ok(false);
    };

    conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    conn.execute("DELETE FROM facilities WHERE id = ?1", params![facility_id])?;
    Ok(true)
}

pub fn set_room_status(conn: &Connection, id: &str, status: RoomStatus) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE rooms SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(&super::now()), id],
    )?;
    Ok(changed > 0)
}

/// Moves a room from `from` to `to` only if it is still in `from`.
/// Returns the number of rows changed.
pub fn set_room_status_if(
    conn: &Connection,
    id: &str,
    from: RoomStatus,
    to: RoomStatus,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE rooms SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.as_str(), fmt_ts(&super::now()), id, from.as_str()],
    )
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            booking.id,
            booking.user.id,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn insert_booking_detail(conn: &Connection, detail: &BookingDetail) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO booking_details (id, booking_id, room_id, description, status, booking_date,
           booking_date_end, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            detail.id,
            detail.booking_id,
            detail.room.id,
            detail.description,
            detail.status.as_str(),
            fmt_ts(&detail.booking_date),
            fmt_ts(&detail.booking_date_end),
            fmt_ts(&detail.created_at),
            fmt_ts(&detail.updated_at),
        ],
    )?;
    Ok(())
}

/// Booking row plus owner, without details.
fn parse_booking_header(row: &Row) -> rusqlite::Result<Booking> {
    let created_at: String = row.get(1)?;
    let updated_at: String = row.get(2)?;

    Ok(Booking {
        id: row.get(0)?,
        user: parse_user_row(row, 3)?.without_password(),
        booking_details: vec![],
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

fn hydrate(conn: &Connection, mut bookings: Vec<Booking>) -> rusqlite::Result<Vec<Booking>> {
    for booking in &mut bookings {
        booking.booking_details = get_booking_details(conn, &booking.id)?;
    }
    Ok(bookings)
}

pub fn get_booking(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    let header = conn
        .query_row(
            concat!(booking_header!(), " WHERE b.id = ?1"),
            params![id],
            parse_booking_header,
        )
        .optional()?;

    match header {
        Some(booking) => Ok(hydrate(conn, vec![booking])?.pop()),
        None => Ok(None),
    }
}

pub fn get_booking_for_owner(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> rusqlite::Result<Option<Booking>> {
    let header = conn
        .query_row(
            concat!(booking_header!(), " WHERE b.id = ?1 AND b.user_id = ?2"),
            params![id, user_id],
            parse_booking_header,
        )
        .optional()?;

    match header {
        Some(booking) => Ok(hydrate(conn, vec![booking])?.pop()),
        None => Ok(None),
    }
}

pub fn list_bookings(conn: &Connection) -> rusqlite::Result<Vec<Booking>> {
    let headers = {
        let mut stmt = conn.prepare(concat!(
            booking_header!(),
            " ORDER BY b.created_at ASC, b.rowid ASC"
        ))?;
        let rows = stmt.query_map([], parse_booking_header)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    hydrate(conn, headers)
}

/// Bookings with at least one detail in `status`, each with all of its details.
pub fn list_bookings_by_status(
    conn: &Connection,
    status: DetailStatus,
) -> rusqlite::Result<Vec<Booking>> {
    let headers = {
        let mut stmt = conn.prepare(concat!(
            booking_header!(),
            " WHERE EXISTS (
                SELECT 1 FROM booking_details bd WHERE bd.booking_id = b.id AND bd.status = ?1
              )
              ORDER BY b.created_at ASC, b.rowid ASC"
        ))?;
        let rows = stmt.query_map(params![status.as_str()], parse_booking_header)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };
    hydrate(conn, headers)
}

pub fn get_booking_details(
    conn: &Connection,
    booking_id: &str,
) -> rusqlite::Result<Vec<BookingDetail>> {
    let mut stmt = conn.prepare(concat!(
        "SELECT bd.id, bd.booking_id, bd.description, bd.status, bd.booking_date,
           bd.booking_date_end, bd.created_at, bd.updated_at, ",
        room_columns!(),
        " FROM booking_details bd
          JOIN rooms r ON r.id = bd.room_id
          JOIN facilities f ON f.id = r.facility_id
          WHERE bd.booking_id = ?1
          ORDER BY bd.rowid ASC"
    ))?;

    let rows = stmt.query_map(params![booking_id], |row| {
        let status: String = row.get(3)?;
        let booking_date: String = row.get(4)?;
        let booking_date_end: String = row.get(5)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;

        Ok(BookingDetail {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            description: row.get(2)?,
            status: DetailStatus::parse(&status).unwrap_or(DetailStatus::Pending),
            booking_date: parse_ts(&booking_date),
            booking_date_end: parse_ts(&booking_date_end),
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
            room: parse_room_row(row, 8)?,
        })
    })?;
    rows.collect()
}

/// The parts of a booking detail the approval flow needs.
#[derive(Debug, Clone)]
pub struct DetailRef {
    pub booking_id: String,
    pub room_id: String,
    pub status: DetailStatus,
}

pub fn get_detail_ref(conn: &Connection, detail_id: &str) -> rusqlite::Result<Option<DetailRef>> {
    conn.query_row(
        "SELECT booking_id, room_id, status FROM booking_details WHERE id = ?1",
        params![detail_id],
        |row| {
            let status: String = row.get(2)?;
            Ok(DetailRef {
                booking_id: row.get(0)?,
                room_id: row.get(1)?,
                status: DetailStatus::parse(&status).unwrap_or(DetailStatus::Pending),
            })
        },
    )
    .optional()
}

/// Decides a detail only while it is still pending. Returns rows changed.
pub fn set_detail_status_if_pending(
    conn: &Connection,
    detail_id: &str,
    status: DetailStatus,
) -> rusqlite::Result<usize> {
    let now = fmt_ts(&super::now());
    let changed = conn.execute(
        "UPDATE booking_details SET status = ?1, updated_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        params![status.as_str(), now, detail_id],
    )?;
    if changed > 0 {
        conn.execute(
            "UPDATE bookings SET updated_at = ?1
             WHERE id = (SELECT booking_id FROM booking_details WHERE id = ?2)",
            params![now, detail_id],
        )?;
    }
    Ok(changed)
}
