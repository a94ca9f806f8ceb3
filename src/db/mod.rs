pub mod migrations;
pub mod queries;

use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::{Connection, ErrorCode};

use crate::errors::{AppError, AppResult};

pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

pub fn lock(db: &Mutex<Connection>) -> AppResult<MutexGuard<'_, Connection>> {
    db.lock()
        .map_err(|_| AppError::Internal("database connection lock poisoned".to_string()))
}

/// Current UTC time at the precision the database stores.
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
