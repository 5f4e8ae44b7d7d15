//! Error types for pimbridge.

use serde::Serialize;
use thiserror::Error;

/// Broad category of a failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A supplied value could not be converted to its native representation.
    Validation,
    /// A field that the record kind requires is absent.
    MissingField,
    /// The record store rejected the read or write.
    Store,
    /// Configuration could not be loaded.
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
        }
    }
}

/// Errors that can occur while applying field mappings or touching the store.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid date for '{field}': {value}")]
    InvalidDate { field: String, value: String },

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Missing required field '{field}' for {record}")]
    MissingField { record: &'static str, field: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidValue { .. }
            | BridgeError::InvalidDate { .. }
            | BridgeError::InvalidRecurrence(_)
            | BridgeError::UnknownField(_) => ErrorKind::Validation,
            BridgeError::MissingField { .. } => ErrorKind::MissingField,
            BridgeError::NotFound(_)
            | BridgeError::Store(_)
            | BridgeError::Io(_)
            | BridgeError::Serialization(_) => ErrorKind::Store,
            BridgeError::Config(_) => ErrorKind::Config,
        }
    }

    /// Stable machine-readable code, one per variant.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidValue { .. } => "E_INVALID_VALUE",
            BridgeError::InvalidDate { .. } => "E_INVALID_DATE",
            BridgeError::InvalidRecurrence(_) => "E_INVALID_RECURRENCE",
            BridgeError::UnknownField(_) => "E_UNKNOWN_FIELD",
            BridgeError::MissingField { .. } => "E_MISSING_FIELD",
            BridgeError::NotFound(_) => "E_NOT_FOUND",
            BridgeError::Store(_) => "E_STORE",
            BridgeError::Io(_) => "E_IO",
            BridgeError::Serialization(_) => "E_SERIALIZATION",
            BridgeError::Config(_) => "E_CONFIG",
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Serialization(e.to_string())
    }
}

/// Result type alias for pimbridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(
            BridgeError::InvalidRecurrence("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BridgeError::MissingField {
                record: "reminder",
                field: "dueDate".into()
            }
            .kind(),
            ErrorKind::MissingField
        );
        assert_eq!(BridgeError::NotFound("abc".into()).kind(), ErrorKind::Store);
    }

    #[test]
    fn test_missing_field_message_names_record() {
        let err = BridgeError::MissingField {
            record: "event",
            field: "startDate".into(),
        };
        assert_eq!(err.to_string(), "Missing required field 'startDate' for event");
        assert_eq!(err.code(), "E_MISSING_FIELD");
    }
}
