// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use governance_schema::EntityKind;

/// Failure talking to the entity store. Fatal for the event being processed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt {kind} record {id}: {reason}")]
    Corrupt {
        kind: EntityKind,
        id: String,
        reason: String,
    },

    #[error("Unknown entity kind in snapshot: {0}")]
    UnknownKind(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Short label for metrics and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            StoreError::Io(_) => "io",
            StoreError::Serialization(_) => "serialization",
            StoreError::Corrupt { .. } => "corrupt",
            StoreError::UnknownKind(_) => "unknown_kind",
            StoreError::Unavailable(_) => "unavailable",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Corrupt {
            kind: EntityKind::Delegate,
            id: "0xabc".to_string(),
            reason: "missing field".to_string(),
        };
        assert_eq!(err.to_string(), "Corrupt Delegate record 0xabc: missing field");
        assert_eq!(err.error_type(), "corrupt");

        let err = StoreError::Unavailable("disk full".to_string());
        assert_eq!(err.to_string(), "Store unavailable: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StoreError = io.into();
        assert_eq!(err.error_type(), "io");
    }
}
