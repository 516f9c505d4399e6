use thiserror::Error;

/// Errors raised by Team Store implementations
///
/// The membership service treats these as opaque storage failures, except
/// where a specific variant carries domain meaning (a uniqueness conflict on
/// personal teams, a row that vanished between read and write).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("operation not supported by this store: {0}")]
    Unsupported(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;
