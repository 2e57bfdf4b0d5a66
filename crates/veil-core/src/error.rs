//! Error types for Veil views

use derive_more::Display;
use thiserror::Error;

/// The attribute operation a view was asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Operation {
    #[display("read")]
    Read,
    #[display("write")]
    Write,
    #[display("delete")]
    Delete,
    #[display("call")]
    Call,
}

/// Top-level error type for Veil
///
/// Reading or writing a non-visible attribute without strict options is not
/// an error: those yield [`Value::Undefined`](crate::Value::Undefined) or a
/// dropped write instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VeilError {
    #[error("Access denied: cannot {operation} attribute '{name}'")]
    AccessDenied { name: String, operation: Operation },
}

impl VeilError {
    pub(crate) fn denied(name: &str, operation: Operation) -> Self {
        Self::AccessDenied {
            name: name.to_string(),
            operation,
        }
    }

    /// Name of the attribute the failed operation targeted
    pub fn name(&self) -> &str {
        match self {
            Self::AccessDenied { name, .. } => name,
        }
    }

    /// The operation that was denied
    pub fn operation(&self) -> Operation {
        match self {
            Self::AccessDenied { operation, .. } => *operation,
        }
    }
}

/// Result type alias for Veil operations
pub type VeilResult<T> = Result<T, VeilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Read.to_string(), "read");
        assert_eq!(Operation::Write.to_string(), "write");
        assert_eq!(Operation::Delete.to_string(), "delete");
        assert_eq!(Operation::Call.to_string(), "call");
    }

    #[test]
    fn test_access_denied_display() {
        let err = VeilError::denied("_secret", Operation::Write);
        let msg = format!("{}", err);
        assert!(msg.contains("Access denied"));
        assert!(msg.contains("write"));
        assert!(msg.contains("_secret"));
    }

    #[test]
    fn test_accessors() {
        let err = VeilError::denied("name", Operation::Delete);
        assert_eq!(err.name(), "name");
        assert_eq!(err.operation(), Operation::Delete);
    }
}
