// ABOUTME: Error taxonomy shared by the schema model, inspector, and comparator
// ABOUTME: Connection, inspection, lookup, and configuration failures as typed variants

use thiserror::Error;

/// The main error type for drift detection
#[derive(Debug, Error)]
pub enum DriftError {
    /// The DSN is malformed, unreachable, or the credentials were rejected
    #[error("connection error: {message}")]
    Connection { message: String },

    /// The introspection tool is missing, crashed, timed out, or produced
    /// output that could not be parsed
    #[error("inspection failed: {message}{}", diagnostic_suffix(.diagnostic))]
    InspectionFailed {
        message: String,
        /// Raw diagnostic text emitted by the tool (usually stderr)
        diagnostic: Option<String>,
    },

    /// Lookup of a name that is absent from a schema
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A schema violated a structural invariant while being built
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error reading a schema document from disk
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(text) if !text.trim().is_empty() => format!("\n{}", text.trim_end()),
        _ => String::new(),
    }
}

impl DriftError {
    pub fn connection(message: impl Into<String>) -> Self {
        DriftError::Connection {
            message: message.into(),
        }
    }

    pub fn inspection(message: impl Into<String>) -> Self {
        DriftError::InspectionFailed {
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn inspection_with_diagnostic(
        message: impl Into<String>,
        diagnostic: impl Into<String>,
    ) -> Self {
        DriftError::InspectionFailed {
            message: message.into(),
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        DriftError::NotFound {
            kind: "table",
            name: name.into(),
        }
    }

    /// check if this error came from reaching the database
    pub fn is_connection(&self) -> bool {
        matches!(self, DriftError::Connection { .. })
    }

    /// check if this error came from the introspection step
    pub fn is_inspection(&self) -> bool {
        matches!(self, DriftError::InspectionFailed { .. })
    }

    /// check if this error indicates a name doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriftError::NotFound { .. })
    }
}

/// Result type alias for drift operations
pub type DriftResult<T> = Result<T, DriftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = DriftError::table_not_found("users");
        assert!(not_found.is_not_found());
        assert!(!not_found.is_connection());
        assert_eq!(not_found.to_string(), "table not found: users");

        let conn = DriftError::connection("Connection refused");
        assert!(conn.is_connection());
        assert!(!conn.is_inspection());
    }

    #[test]
    fn test_inspection_error_attaches_diagnostic() {
        let err = DriftError::inspection_with_diagnostic(
            "tbls exited with status 1",
            "dial tcp: refused\n",
        );
        assert!(err.is_inspection());
        assert_eq!(
            err.to_string(),
            "inspection failed: tbls exited with status 1\ndial tcp: refused"
        );

        let bare = DriftError::inspection("malformed output");
        assert_eq!(bare.to_string(), "inspection failed: malformed output");
    }
}
