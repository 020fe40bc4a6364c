use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("box {0} is outside the valid range 1..=5")]
    BoxOutOfRange(i64),

    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("no card with id {0} for this owner")]
    CardNotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
