//! Classification of constraint violations reported by the database.
//!
//! Uniqueness and referential integrity are enforced by the schema; callers
//! attempt the write and inspect the error instead of pre-checking.

use inkwell_common::DuplicateField;
use sea_orm::{DbErr, SqlErr};

/// Whether `err` is a unique constraint/index violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => true,
        _ => {
            let message = err.to_string();
            message.contains("duplicate key value") || message.contains("UNIQUE constraint failed")
        }
    }
}

/// Whether `err` is a foreign key violation.
#[must_use]
pub fn is_foreign_key_violation(err: &DbErr) -> bool {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => true,
        _ => {
            let message = err.to_string();
            message.contains("violates foreign key constraint")
                || message.contains("FOREIGN KEY constraint failed")
        }
    }
}

/// Whether `err` means the write lost a lock or serialization race and the
/// whole transaction can be retried.
///
/// SQLite reports `SQLITE_BUSY` (and `SQLITE_BUSY_SNAPSHOT`, which skips the
/// busy handler) as "database is locked". `PostgreSQL` reports serialization
/// failures and deadlocks.
#[must_use]
pub fn is_lock_contention(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("could not serialize access")
        || message.contains("deadlock detected")
}

/// Which `users` key a unique violation hit, if it was one.
///
/// PostgreSQL names the index (`idx_users_email`), SQLite names the column
/// (`users.email`); both mention the column.
#[must_use]
pub fn duplicate_user_field(err: &DbErr) -> Option<DuplicateField> {
    if !is_unique_violation(err) {
        return None;
    }
    let message = err.to_string();
    if message.contains("email") {
        Some(DuplicateField::Email)
    } else if message.contains("username") {
        Some(DuplicateField::Username)
    } else {
        None
    }
}
