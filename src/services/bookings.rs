use std::path::Path;

use chrono::Duration;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Booking, BookingDetail, Decision, DetailStatus, Identity, LineItem, RoomStatus,
    BOOKING_WINDOW_HOURS,
};
use crate::services::mail::{Email, MailAttachment, Mailer};
use crate::services::report;

fn booking_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("booking with id {id} not found"))
}

/// Creates a booking with one pending detail per line item.
///
/// Every room is checked before anything is written, and all reads and
/// writes share one transaction, so a failing line item leaves no trace.
pub fn register_booking(
    conn: &mut Connection,
    owner_id: &str,
    items: &[LineItem],
) -> AppResult<Booking> {
    let tx = conn.transaction()?;

    let owner = queries::get_user(&tx, owner_id)?
        .ok_or_else(|| AppError::NotFound(format!("user with id {owner_id} not found")))?;

    if items.is_empty() {
        return Err(AppError::InvalidInput(
            "bookingDetails must contain at least one room".to_string(),
        ));
    }

    let mut rooms = Vec::with_capacity(items.len());
    for item in items {
        let room = queries::get_room(&tx, &item.room_id)?.ok_or_else(|| {
            AppError::NotFound(format!("room with id {} not found", item.room_id))
        })?;
        if room.status != RoomStatus::Available {
            return Err(AppError::Conflict(format!(
                "room status with id {} is not available",
                room.id
            )));
        }
        rooms.push(room);
    }

    let now = db::now();
    let booking_id = Uuid::new_v4().to_string();
    let details: Vec<BookingDetail> = items
        .iter()
        .zip(rooms)
        .map(|(item, room)| BookingDetail {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.clone(),
            room,
            description: item.description.clone(),
            status: DetailStatus::Pending,
            booking_date: now,
            booking_date_end: now + Duration::hours(BOOKING_WINDOW_HOURS),
            created_at: now,
            updated_at: now,
        })
        .collect();

    let booking = Booking {
        id: booking_id,
        user: owner.without_password(),
        booking_details: details,
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking)?;
    for detail in &booking.booking_details {
        queries::insert_booking_detail(&tx, detail)?;
    }
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        owner = %owner_id,
        details = booking.booking_details.len(),
        "booking registered"
    );
    Ok(booking)
}

/// Admins and approvers may read any booking; everyone else only their own.
/// A booking the caller may not see is reported as missing.
pub fn get_by_id(conn: &Connection, id: &str, identity: &Identity) -> AppResult<Booking> {
    let booking = if identity.role.sees_all_bookings() {
        queries::get_booking(conn, id)?
    } else {
        queries::get_booking_for_owner(conn, id, &identity.user_id)?
    };
    booking.ok_or_else(|| booking_not_found(id))
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Booking>> {
    Ok(queries::list_bookings(conn)?)
}

pub fn list_by_status(conn: &Connection, status: &str) -> AppResult<Vec<Booking>> {
    let status = DetailStatus::parse(status).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "status must be pending, accept or decline, not {status:?}"
        ))
    })?;
    Ok(queries::list_bookings_by_status(conn, status)?)
}

/// Decides a pending booking detail.
///
/// Either decision is refused while the detail's room is booked. The
/// detail and room writes are conditional updates inside one transaction;
/// losing a race to another approver rolls everything back with Conflict.
pub fn update_approval(
    conn: &mut Connection,
    detail_id: &str,
    approval: &str,
) -> AppResult<Booking> {
    let decision = Decision::parse(approval).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "approval must be \"accept\" or \"decline\", not {approval:?}"
        ))
    })?;

    let tx = conn.transaction()?;

    let detail = queries::get_detail_ref(&tx, detail_id)?.ok_or_else(|| {
        AppError::NotFound(format!("booking detail with id {detail_id} not found"))
    })?;

    if detail.status != DetailStatus::Pending {
        return Err(AppError::Conflict(format!(
            "booking detail {detail_id} is already {}, not pending",
            detail.status.as_str()
        )));
    }

    let room_status = queries::get_room(&tx, &detail.room_id)?
        .map(|room| room.status)
        .ok_or_else(|| AppError::NotFound(format!("room with id {} not found", detail.room_id)))?;
    if room_status == RoomStatus::Booked {
        return Err(AppError::Conflict(format!(
            "room {} is already booked",
            detail.room_id
        )));
    }

    if queries::set_detail_status_if_pending(&tx, detail_id, decision.status())? == 0 {
        return Err(AppError::Conflict(format!(
            "booking detail {detail_id} was decided concurrently"
        )));
    }

    // A declined detail leaves its still-available room untouched.
    if decision == Decision::Accept {
        let claimed = queries::set_room_status_if(
            &tx,
            &detail.room_id,
            RoomStatus::Available,
            RoomStatus::Booked,
        )?;
        if claimed == 0 {
            return Err(AppError::Conflict(format!(
                "room {} is already booked",
                detail.room_id
            )));
        }
    }

    tx.commit()?;

    tracing::info!(
        detail_id = %detail_id,
        booking_id = %detail.booking_id,
        decision = decision.status().as_str(),
        "booking detail decided"
    );

    queries::get_booking(conn, &detail.booking_id)?
        .ok_or_else(|| booking_not_found(&detail.booking_id))
}

/// Writes the spreadsheet report for every booking to `path`.
pub fn generate_report(conn: &Connection, path: &Path) -> AppResult<Vec<Booking>> {
    let bookings = queries::list_bookings(conn)?;
    report::write_report(path, &bookings).map_err(|e| {
        AppError::Internal(format!(
            "failed to write report to {}: {e}",
            path.display()
        ))
    })?;

    tracing::info!(path = %path.display(), bookings = bookings.len(), "report generated");
    Ok(bookings)
}

/// Mails the last generated report to `recipient` as an attachment.
pub async fn email_report(mailer: &dyn Mailer, path: &Path, recipient: &str) -> AppResult<()> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(AppError::InvalidInput(
            "recipient email can't be empty".to_string(),
        ));
    }

    let body = tokio::fs::read(path).await.map_err(|e| {
        AppError::Delivery(format!("report {} is unavailable: {e}", path.display()))
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Report.xlsx".to_string());

    mailer
        .send(Email {
            to: recipient.to_string(),
            subject: "Report".to_string(),
            body: "Booking Room Report".to_string(),
            attachment: Some(MailAttachment {
                filename,
                content_type: report::CONTENT_TYPE.to_string(),
                body,
            }),
        })
        .await
        .map_err(|e| AppError::Delivery(format!("failed to send report: {e:#}")))?;

    tracing::info!(to = %recipient, "report sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::{Facility, Role, Room, User};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_user(conn: &Connection, id: &str, role: Role) {
        let ts = db::now();
        queries::insert_user(
            conn,
            &User {
                id: id.to_string(),
                name: "Ann".to_string(),
                division: "Ops".to_string(),
                title: "Lead".to_string(),
                email: format!("{id}@x.com"),
                password: "hash".to_string(),
                role,
                created_at: ts,
                updated_at: ts,
            },
        )
        .unwrap();
    }

    fn seed_room(conn: &Connection, id: &str) {
        let ts = db::now();
        queries::insert_room(
            conn,
            &Room {
                id: id.to_string(),
                room_type: "Meeting".to_string(),
                max_capacity: 6,
                facility: Facility {
                    id: format!("f-{id}"),
                    description: String::new(),
                    wifi: String::new(),
                    sound_system: String::new(),
                    projector: String::new(),
                    screen_projector: String::new(),
                    chairs: String::new(),
                    tables: String::new(),
                    sound_proof: String::new(),
                    smoking_area: String::new(),
                    television: String::new(),
                    ac: String::new(),
                    bathroom: String::new(),
                    coffee_maker: String::new(),
                    created_at: ts,
                    updated_at: ts,
                },
                status: RoomStatus::Available,
                created_at: ts,
                updated_at: ts,
            },
        )
        .unwrap();
    }

    fn item(room_id: &str) -> LineItem {
        LineItem {
            room_id: room_id.to_string(),
            description: "planning".to_string(),
        }
    }

    fn room_status(conn: &Connection, id: &str) -> RoomStatus {
        queries::get_room(conn, id).unwrap().unwrap().status
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_register_creates_pending_details() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");

        let booking = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();
        assert_eq!(booking.user.id, "u1");
        assert!(booking.user.password.is_empty());
        assert_eq!(booking.booking_details.len(), 1);

        let detail = &booking.booking_details[0];
        assert_eq!(detail.status, DetailStatus::Pending);
        assert_eq!(
            detail.booking_date_end - detail.booking_date,
            Duration::hours(3)
        );
        assert_eq!(room_status(&conn, "r1"), RoomStatus::Available);
    }

    #[test]
    fn test_register_rejects_unknown_owner_and_empty_items() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");

        assert!(matches!(
            register_booking(&mut conn, "ghost", &[item("r1")]),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            register_booking(&mut conn, "u1", &[]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_register_persists_nothing_when_any_room_fails() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        seed_room(&conn, "r2");
        queries::set_room_status(&conn, "r2", RoomStatus::Booked).unwrap();

        let err = register_booking(&mut conn, "u1", &[item("r1"), item("r2")]).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = register_booking(&mut conn, "u1", &[item("r1"), item("missing")]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert_eq!(count(&conn, "bookings"), 0);
        assert_eq!(count(&conn, "booking_details"), 0);
    }

    #[test]
    fn test_accept_books_room_and_second_decision_conflicts() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        let booking = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();
        let detail_id = booking.booking_details[0].id.clone();

        let decided = update_approval(&mut conn, &detail_id, "accept").unwrap();
        assert_eq!(decided.booking_details[0].status, DetailStatus::Accept);
        assert_eq!(room_status(&conn, "r1"), RoomStatus::Booked);

        for again in ["decline", "accept"] {
            let err = update_approval(&mut conn, &detail_id, again).unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }
        assert_eq!(room_status(&conn, "r1"), RoomStatus::Booked);
    }

    #[test]
    fn test_decline_keeps_room_available() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        let booking = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();
        let detail_id = booking.booking_details[0].id.clone();

        let decided = update_approval(&mut conn, &detail_id, "decline").unwrap();
        assert_eq!(decided.booking_details[0].status, DetailStatus::Decline);
        assert_eq!(room_status(&conn, "r1"), RoomStatus::Available);
    }

    #[test]
    fn test_decline_on_booked_room_conflicts() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        let first = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();
        let second = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();

        update_approval(&mut conn, &first.booking_details[0].id, "accept").unwrap();
        let err = update_approval(&mut conn, &second.booking_details[0].id, "decline").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let detail = queries::get_detail_ref(&conn, &second.booking_details[0].id)
            .unwrap()
            .unwrap();
        assert_eq!(detail.status, DetailStatus::Pending);
        assert_eq!(room_status(&conn, "r1"), RoomStatus::Booked);
    }

    #[test]
    fn test_accept_when_room_already_booked_rolls_back() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        let first = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();
        let second = register_booking(&mut conn, "u1", &[item("r1")]).unwrap();

        update_approval(&mut conn, &first.booking_details[0].id, "accept").unwrap();
        let err = update_approval(&mut conn, &second.booking_details[0].id, "accept").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let detail = queries::get_detail_ref(&conn, &second.booking_details[0].id)
            .unwrap()
            .unwrap();
        assert_eq!(detail.status, DetailStatus::Pending);
    }

    #[test]
    fn test_invalid_decision_is_rejected_before_lookup() {
        let mut conn = setup_db();
        let err = update_approval(&mut conn, "does-not-exist", "maybe").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = update_approval(&mut conn, "does-not-exist", "accept").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_visibility_by_role() {
        let mut conn = setup_db();
        seed_user(&conn, "a", Role::Employee);
        seed_user(&conn, "b", Role::Employee);
        seed_room(&conn, "r1");
        let booking = register_booking(&mut conn, "b", &[item("r1")]).unwrap();

        let owner = Identity {
            user_id: "b".to_string(),
            role: Role::Employee,
        };
        let stranger = Identity {
            user_id: "a".to_string(),
            role: Role::Employee,
        };
        let admin = Identity {
            user_id: "root".to_string(),
            role: Role::Admin,
        };
        let approver = Identity {
            user_id: "ga".to_string(),
            role: Role::Approver,
        };

        assert!(get_by_id(&conn, &booking.id, &owner).is_ok());
        assert!(matches!(
            get_by_id(&conn, &booking.id, &stranger),
            Err(AppError::NotFound(_))
        ));
        assert!(get_by_id(&conn, &booking.id, &admin).is_ok());
        assert!(get_by_id(&conn, &booking.id, &approver).is_ok());
    }

    #[test]
    fn test_list_by_status_validates_status() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        register_booking(&mut conn, "u1", &[item("r1")]).unwrap();

        assert_eq!(list_by_status(&conn, "pending").unwrap().len(), 1);
        assert!(list_by_status(&conn, "accept").unwrap().is_empty());
        assert!(matches!(
            list_by_status(&conn, "booked"),
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(list_all(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_generate_report_writes_workbook() {
        let mut conn = setup_db();
        seed_user(&conn, "u1", Role::Employee);
        seed_room(&conn, "r1");
        register_booking(&mut conn, "u1", &[item("r1")]).unwrap();

        let path = std::env::temp_dir().join(format!("report-{}.xlsx", Uuid::new_v4()));
        let bookings = generate_report(&conn, &path).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(report::report_rows(&bookings)[0][4], "u1@x.com");

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        std::fs::remove_file(&path).unwrap();
    }

    #[derive(Default)]
    struct MockMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: Email) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: Email) -> anyhow::Result<()> {
            anyhow::bail!("relay refused connection")
        }
    }

    #[tokio::test]
    async fn test_email_report_attaches_file() {
        let path = std::env::temp_dir().join(format!("report-{}.xlsx", Uuid::new_v4()));
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let mailer = MockMailer::default();
        email_report(&mailer, &path, "boss@x.com").await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Report");
        assert_eq!(sent[0].body, "Booking Room Report");
        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.content_type, report::CONTENT_TYPE);
        assert_eq!(attachment.body, b"PK\x03\x04");
        drop(sent);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_email_report_failures() {
        let mailer = MockMailer::default();
        let missing = std::env::temp_dir().join(format!("missing-{}.xlsx", Uuid::new_v4()));

        assert!(matches!(
            email_report(&mailer, &missing, "  ").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            email_report(&mailer, &missing, "boss@x.com").await,
            Err(AppError::Delivery(_))
        ));

        let path = std::env::temp_dir().join(format!("report-{}.xlsx", Uuid::new_v4()));
        std::fs::write(&path, b"PK").unwrap();
        assert!(matches!(
            email_report(&FailingMailer, &path, "boss@x.com").await,
            Err(AppError::Delivery(_))
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
