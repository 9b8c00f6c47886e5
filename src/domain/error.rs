//! Error types for user and behavior operations.
//!
//! Lookups that find nothing are not errors; they surface as `None`/`false`.
//! Store failures keep the native [`DbErr`] so callers see exactly what the
//! database reported.

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {id} is referenced by {records} behavior record(s)")]
    Referenced { id: i32, records: u64 },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("Invalid behavior record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
