use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{Facility, NewRoom, Room, RoomPatch, RoomStatus};

fn room_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("room with id {id} not found"))
}

/// Stores a room and its facility together. Status defaults to available.
pub fn create(conn: &mut Connection, new_room: NewRoom) -> AppResult<Room> {
    if new_room.room_type.trim().is_empty() {
        return Err(AppError::InvalidInput("roomType can't be empty".to_string()));
    }

    let now = db::now();
    let f = new_room.facility;
    let room = Room {
        id: Uuid::new_v4().to_string(),
        room_type: new_room.room_type,
        max_capacity: new_room.max_capacity,
        facility: Facility {
            id: Uuid::new_v4().to_string(),
            description: f.description,
            wifi: f.wifi,
            sound_system: f.sound_system,
            projector: f.projector,
            screen_projector: f.screen_projector,
            chairs: f.chairs,
            tables: f.tables,
            sound_proof: f.sound_proof,
            smoking_area: f.smoking_area,
            television: f.television,
            ac: f.ac,
            bathroom: f.bathroom,
            coffee_maker: f.coffee_maker,
            created_at: now,
            updated_at: now,
        },
        status: new_room.status.unwrap_or(RoomStatus::Available),
        created_at: now,
        updated_at: now,
    };

    let tx = conn.transaction()?;
    queries::insert_room(&tx, &room)?;
    tx.commit()?;

    tracing::info!(room_id = %room.id, room_type = %room.room_type, "room created");
    Ok(room)
}

pub fn get_by_id(conn: &Connection, id: &str) -> AppResult<Room> {
    queries::get_room(conn, id)?.ok_or_else(|| room_not_found(id))
}

pub fn get_by_type(conn: &Connection, room_type: &str) -> AppResult<Room> {
    queries::get_room_by_type(conn, room_type)?
        .ok_or_else(|| AppError::NotFound(format!("room with type {room_type} not found")))
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Room>> {
    Ok(queries::list_rooms(conn, None)?)
}

/// Only `available` is a listable status. Asking for anything else,
/// `booked` included, is answered with NotFound.
pub fn list_by_status(conn: &Connection, status: &str) -> AppResult<Vec<Room>> {
    if status != RoomStatus::Available.as_str() {
        return Err(AppError::NotFound(format!(
            "room with status {status} not found"
        )));
    }
    Ok(queries::list_rooms(conn, Some(RoomStatus::Available))?)
}

pub fn update(conn: &mut Connection, id: &str, patch: &RoomPatch) -> AppResult<Room> {
    let tx = conn.transaction()?;

    let mut room = queries::get_room(&tx, id)?.ok_or_else(|| room_not_found(id))?;
    patch.apply(&mut room);
    let now = db::now();
    room.updated_at = now;
    room.facility.updated_at = now;

    queries::update_room(&tx, &room)?;
    tx.commit()?;

    tracing::info!(room_id = %id, "room updated");
    Ok(room)
}

pub fn delete(conn: &mut Connection, id: &str) -> AppResult<()> {
    let tx = conn.transaction()?;
    match queries::delete_room(&tx, id) {
        Ok(true) => {}
        Ok(false) => return Err(room_not_found(id)),
        Err(e) if db::is_constraint_violation(&e) => {
            return Err(AppError::Conflict(format!(
                "room with id {id} is referenced by existing bookings"
            )));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit()?;

    tracing::info!(room_id = %id, "room deleted");
    Ok(())
}

/// Manual release by an approver: the room becomes available regardless of
/// its current status.
pub fn change_status(conn: &Connection, id: &str) -> AppResult<Room> {
    if !queries::set_room_status(conn, id, RoomStatus::Available)? {
        return Err(room_not_found(id));
    }
    tracing::info!(room_id = %id, "room released");
    get_by_id(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFacility;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn new_room(room_type: &str) -> NewRoom {
        NewRoom {
            room_type: room_type.to_string(),
            max_capacity: 8,
            facility: NewFacility {
                wifi: "yes".to_string(),
                chairs: "8".to_string(),
                ..Default::default()
            },
            status: None,
        }
    }

    #[test]
    fn test_create_defaults_to_available() {
        let mut conn = setup_db();
        let room = create(&mut conn, new_room("Meeting")).unwrap();
        assert_eq!(room.status, RoomStatus::Available);

        let stored = get_by_id(&conn, &room.id).unwrap();
        assert_eq!(stored.facility.wifi, "yes");
        assert_eq!(stored.max_capacity, 8);
    }

    #[test]
    fn test_create_requires_room_type() {
        let mut conn = setup_db();
        let err = create(&mut conn, new_room("  ")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_get_by_type() {
        let mut conn = setup_db();
        create(&mut conn, new_room("Meeting")).unwrap();
        let hall = create(&mut conn, new_room("Hall")).unwrap();

        assert_eq!(get_by_type(&conn, "Hall").unwrap().id, hall.id);
        assert!(matches!(
            get_by_type(&conn, "Cellar"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_by_status_only_accepts_available() {
        let mut conn = setup_db();
        let a = create(&mut conn, new_room("Meeting")).unwrap();
        let b = create(&mut conn, new_room("Hall")).unwrap();
        queries::set_room_status(&conn, &b.id, RoomStatus::Booked).unwrap();

        let available = list_by_status(&conn, "available").unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, a.id);

        assert!(matches!(
            list_by_status(&conn, "booked"),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(list_all(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_update_merges_sparse_patch() {
        let mut conn = setup_db();
        let room = create(&mut conn, new_room("Meeting")).unwrap();
        let patch: RoomPatch =
            serde_json::from_str(r#"{"maxCapacity":20,"facility":{"projector":"yes"}}"#).unwrap();

        let updated = update(&mut conn, &room.id, &patch).unwrap();
        assert_eq!(updated.max_capacity, 20);
        assert_eq!(updated.room_type, "Meeting");

        let stored = get_by_id(&conn, &room.id).unwrap();
        assert_eq!(stored.facility.projector, "yes");
        assert_eq!(stored.facility.wifi, "yes");
        assert_eq!(stored.max_capacity, 20);
    }

    #[test]
    fn test_update_missing_room() {
        let mut conn = setup_db();
        let err = update(&mut conn, "nope", &RoomPatch::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_delete() {
        let mut conn = setup_db();
        let room = create(&mut conn, new_room("Meeting")).unwrap();
        delete(&mut conn, &room.id).unwrap();
        assert!(matches!(
            get_by_id(&conn, &room.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete(&mut conn, &room.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_change_status_releases_room() {
        let mut conn = setup_db();
        let room = create(&mut conn, new_room("Meeting")).unwrap();
        queries::set_room_status(&conn, &room.id, RoomStatus::Booked).unwrap();

        let released = change_status(&conn, &room.id).unwrap();
        assert_eq!(released.status, RoomStatus::Available);
        assert!(matches!(
            change_status(&conn, "nope"),
            Err(AppError::NotFound(_))
        ));
    }
}
