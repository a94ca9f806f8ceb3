use std::sync::Mutex;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::{AppError, AppResult};
use crate::models::{NewUser, Role, User, UserUpdate};
use crate::services::mail::{Email, Mailer};
use crate::services::password;

fn user_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("user with id {id} not found"))
}

fn welcome_email(user: &NewUser, role: Role) -> Email {
    Email {
        to: user.email.clone(),
        subject: "Welcome to Room Booking".to_string(),
        body: format!(
            "Hello {},\n\nAn account with the role {} has been created for you.\nSign in with this email address: {}\n",
            user.name,
            role.as_str(),
            user.email
        ),
        attachment: None,
    }
}

/// Registers a user and sends the welcome mail.
///
/// The mail goes out before the row is written, so a delivery failure
/// leaves no account behind. The database lock is released while mailing.
pub async fn register(
    store: &Mutex<Connection>,
    mailer: &dyn Mailer,
    new_user: NewUser,
) -> AppResult<User> {
    let role = Role::parse(&new_user.role).ok_or_else(|| {
        AppError::InvalidInput("invalid role, role must be admin, employee or approver".to_string())
    })?;

    if new_user.has_blank_field() {
        return Err(AppError::InvalidInput(
            "all fields must be filled in".to_string(),
        ));
    }

    {
        let conn = db::lock(store)?;
        if queries::get_user_by_email(&conn, &new_user.email)?.is_some() {
            return Err(AppError::Conflict(format!(
                "email {} is already registered",
                new_user.email
            )));
        }
    }

    let hash = password::hash_password(&new_user.password)?;

    mailer
        .send(welcome_email(&new_user, role))
        .await
        .map_err(|e| AppError::Delivery(format!("failed to send welcome email: {e:#}")))?;

    let now = db::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: new_user.name,
        division: new_user.division,
        title: new_user.title,
        email: new_user.email,
        password: hash,
        role,
        created_at: now,
        updated_at: now,
    };

    {
        let conn = db::lock(store)?;
        queries::insert_user(&conn, &user).map_err(|e| {
            if db::is_constraint_violation(&e) {
                AppError::Conflict(format!("email {} is already registered", user.email))
            } else {
                e.into()
            }
        })?;
    }

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok(user.without_password())
}

/// Checks an email/password pair.
pub fn authenticate(conn: &Connection, email: &str, password_text: &str) -> AppResult<User> {
    let user = queries::get_user_by_email(&conn, email)?
        .ok_or_else(|| AppError::NotFound(format!("user with email {email} not found")))?;

    if !password::verify_password(password_text, &user.password) {
        tracing::warn!(user_id = %user.id, "password mismatch");
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    }

    Ok(user.without_password())
}

/// Updates a user. The password is always re-hashed; profile fields are
/// merged when present. A role change needs `allow_role_change`.
///
/// The hash is computed before the connection lock is taken.
pub fn update(
    store: &Mutex<Connection>,
    id: &str,
    changes: UserUpdate,
    allow_role_change: bool,
) -> AppResult<User> {
    if changes.password.trim().is_empty() {
        return Err(AppError::InvalidInput("password can't be empty".to_string()));
    }
    let password_hash = password::hash_password(&changes.password)?;

    let conn = db::lock(store)?;
    let mut user = queries::get_user(&conn, id)?.ok_or_else(|| user_not_found(id))?;

    if let Some(role) = changes.role.as_deref().filter(|r| !r.trim().is_empty()) {
        let role = Role::parse(role).ok_or_else(|| {
            AppError::InvalidInput(
                "invalid role, role must be admin, employee or approver".to_string(),
            )
        })?;
        if role != user.role {
            if !allow_role_change {
                return Err(AppError::Forbidden(
                    "only an admin can change a role".to_string(),
                ));
            }
            user.role = role;
        }
    }

    if let Some(email) = present(&changes.email) {
        if email != user.email {
            if let Some(other) = queries::get_user_by_email(&conn, email)? {
                if other.id != user.id {
                    return Err(AppError::Conflict(format!(
                        "email {email} is already registered"
                    )));
                }
            }
            user.email = email.to_string();
        }
    }
    if let Some(name) = present(&changes.name) {
        user.name = name.to_string();
    }
    if let Some(division) = present(&changes.division) {
        user.division = division.to_string();
    }
    if let Some(title) = present(&changes.title) {
        user.title = title.to_string();
    }

    user.password = password_hash;
    user.updated_at = db::now();

    if !queries::update_user(&conn, &user)? {
        return Err(user_not_found(id));
    }

    tracing::info!(user_id = %id, "user updated");
    Ok(user.without_password())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
    match queries::delete_user(conn, id) {
        Ok(true) => {
            tracing::info!(user_id = %id, "user deleted");
            Ok(())
        }
        Ok(false) => Err(user_not_found(id)),
        Err(e) if db::is_constraint_violation(&e) => Err(AppError::Conflict(format!(
            "user with id {id} still owns bookings"
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn get_by_id(conn: &Connection, id: &str) -> AppResult<User> {
    queries::get_user(conn, id)?
        .map(User::without_password)
        .ok_or_else(|| user_not_found(id))
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<User>> {
    Ok(queries::list_users(conn)?
        .into_iter()
        .map(User::without_password)
        .collect())
}
