use sea_orm::{DbErr, SqlErr};

use crate::error::AppError;

pub mod auth_service;
pub mod cart_service;
pub mod favorite_service;
pub mod order_service;
pub mod product_service;
pub mod profile_service;

/// Turns a unique-constraint violation into a 400 with `message`; other errors pass through.
pub(crate) fn unique_violation(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::BadRequest(message.to_string()),
        _ => AppError::OrmError(err),
    }
}
