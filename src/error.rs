use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// An authentication error reported by the auth issuer.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record store error.
    #[error("Record store error: {0}")]
    Store(String),

    /// An auth issuer error outside the sign-in path.
    #[error("Auth issuer error: {0}")]
    Issuer(String),

    /// A row was missing an expected field.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// The selected period is already authored by another faculty member.
    #[error("Period {period} is already taken by {taken_by}")]
    PeriodTaken {
        /// The contested period number.
        period: u8,
        /// The authoring faculty abbreviation holding the lock.
        taken_by: String,
    },

    /// An internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;
