//! Error types for the registration core.
//!
//! Three categories, mirrored by three enums: field validation failures
//! (always recoverable, never a fault), store faults (propagated with
//! diagnostic detail, never swallowed), and the top-level union used by
//! operations that can hit both. Business-rule aborts are not errors; they
//! are `Ok` values of the operation result types.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for registration operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A field failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The data store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Registration of an unregistered CPF was requested without person data.
    #[error("person fields are required when the CPF is not yet registered")]
    MissingPersonFields,
}

/// Errors produced by the field validators.
///
/// Malformed input is a normal negative outcome: every variant is reachable
/// from caller-supplied text and none indicates a fault in the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CPF must match the pattern XXX.XXX.XXX-XX")]
    MalformedCpf,

    #[error("CPF check digits do not match")]
    CpfCheckDigits,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("unknown state code: {0}")]
    UnknownState(String),

    #[error("house number must be an integer between 0 and 99999")]
    HouseNumberOutOfRange,

    #[error("phone must match the pattern (XX)9XXXX-XXXX")]
    MalformedPhone,

    #[error("a second phone requires a first phone")]
    SecondPhoneWithoutFirst,

    #[error("biological sex must be M or F")]
    InvalidSex,

    #[error("unknown race/color: {0}")]
    UnknownRaceColor(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("birth date cannot be in the future")]
    BirthInFuture,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("death timestamp cannot be in the future")]
    DeathInFuture,

    #[error("death timestamp cannot precede the birth date")]
    DeathBeforeBirth,

    #[error("weight is not a number: {0}")]
    MalformedWeight(String),

    #[error("weight must be greater than 0 and less than 1000 kg")]
    WeightOutOfRange,

    #[error("person id must be 32 hexadecimal characters")]
    MalformedPersonId,
}

/// Errors originating from the SQLite store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connecting to the database failed.
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The connection pool could not hand out a connection.
    #[error("connection pool unavailable: {message}")]
    Pool { message: String },

    /// A statement failed to execute.
    #[error("query failed: {message}")]
    Query { message: String },

    /// A uniqueness or referential constraint rejected a write.
    #[error("constraint violated: {message}")]
    Constraint { message: String },

    /// A transaction failed to commit and was rolled back.
    #[error("transaction rolled back: {reason}")]
    RolledBack { reason: String },
}

/// Result type alias for operations that can fail validation or storage.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for store-only operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint {
                    message: err.to_string(),
                }
            }
            _ => StoreError::Query {
                message: err.to_string(),
            },
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Pool {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Store(err.into())
    }
}

impl From<r2d2::Error> for RegistryError {
    fn from(err: r2d2::Error) -> Self {
        RegistryError::Store(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::MalformedCpf.to_string(),
            "CPF must match the pattern XXX.XXX.XXX-XX"
        );
        assert_eq!(
            ValidationError::TooLong {
                field: "city",
                max: 50
            }
            .to_string(),
            "city must be at most 50 characters"
        );
        assert_eq!(
            ValidationError::UnknownState("XX".to_string()).to_string(),
            "unknown state code: XX"
        );
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::RolledBack {
            reason: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "transaction rolled back: disk full");
    }

    #[test]
    fn registry_error_wraps_categories() {
        let err: RegistryError = ValidationError::MalformedPhone.into();
        assert!(matches!(err, RegistryError::Validation(_)));

        let err: RegistryError = StoreError::Pool {
            message: "timed out".to_string(),
        }
        .into();
        assert!(matches!(err, RegistryError::Store(_)));
    }

    #[test]
    fn rusqlite_constraint_maps_to_constraint() {
        let ffi = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT);
        let err: StoreError = rusqlite::Error::SqliteFailure(ffi, Some("cpf".to_string())).into();
        assert!(matches!(err, StoreError::Constraint { .. }));
    }
}
