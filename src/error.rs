use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("invalid local time (expected HH:MM): {0}")]
    InvalidLocalTime(String),
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("unknown rotation: {0}")]
    UnknownRotation(String),
    #[error("unknown shift: {0}")]
    UnknownShift(String),
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShiftError>;
