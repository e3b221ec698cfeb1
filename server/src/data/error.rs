//! Store error type

use thiserror::Error;

/// Errors reported by an [`AuditStore`](super::AuditStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Table or index does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Store error ({operation}): {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn backend(operation: &'static str, msg: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: msg.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            StoreError::NotFound("audit".to_string()).to_string(),
            "Resource not found: audit"
        );
        assert_eq!(
            StoreError::backend("scan", "throttled").to_string(),
            "Store error (scan): throttled"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(StoreError::NotFound("x".to_string()).is_not_found());
        assert!(!StoreError::backend("query", "boom").is_not_found());
    }
}
