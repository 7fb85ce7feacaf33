//! Error types and exit codes for gridtrace
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args, traversal misuse)
//! - 3: Data error (unknown entity, broken references in the network)

mod macros;

use thiserror::Error;

/// Exit codes for the gridtrace CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args or traversal misuse (2)
    Usage = 2,
    /// Data error - missing entities or broken references (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during tracing operations
#[derive(Error, Debug)]
pub enum TraceError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("traversal has already been run; call reset() before running it again")]
    TraversalAlreadyRun,

    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data errors (exit code 3)
    #[error("terminal {terminal} has no owning equipment")]
    MissingEquipment { terminal: String },

    #[error("{context} not found: {value}")]
    NotFound { context: String, value: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl TraceError {
    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        TraceError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an entity that was not found
    pub fn not_found(context: &str, value: impl std::fmt::Display) -> Self {
        TraceError::NotFound {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for a terminal without owning equipment
    pub fn missing_equipment(terminal: impl std::fmt::Display) -> Self {
        TraceError::MissingEquipment {
            terminal: terminal.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            TraceError::UnknownFormat(_)
            | TraceError::TraversalAlreadyRun
            | TraceError::UsageError(_)
            | TraceError::InvalidValue { .. } => ExitCode::Usage,

            TraceError::MissingEquipment { .. } | TraceError::NotFound { .. } => ExitCode::Data,

            TraceError::Io(_)
            | TraceError::Json(_)
            | TraceError::Toml(_)
            | TraceError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            TraceError::UnknownFormat(_) => "unknown_format",
            TraceError::TraversalAlreadyRun => "traversal_already_run",
            TraceError::UsageError(_) => "usage_error",
            TraceError::InvalidValue { .. } => "invalid_value",
            TraceError::MissingEquipment { .. } => "missing_equipment",
            TraceError::NotFound { .. } => "not_found",
            TraceError::Io(_) => "io_error",
            TraceError::Json(_) => "json_error",
            TraceError::Toml(_) => "toml_error",
            TraceError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for gridtrace operations
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(TraceError::TraversalAlreadyRun.exit_code(), ExitCode::Usage);
        assert_eq!(
            TraceError::missing_equipment("t1").exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            TraceError::not_found("equipment", "b0").exit_code(),
            ExitCode::Data
        );
        assert_eq!(
            TraceError::Other("boom".to_string()).exit_code(),
            ExitCode::Failure
        );
    }

    #[test]
    fn test_to_json_envelope() {
        let json = TraceError::not_found("terminal", "t9").to_json();
        assert_eq!(json["error"]["code"], 3);
        assert_eq!(json["error"]["type"], "not_found");
        assert_eq!(json["error"]["message"], "terminal not found: t9");
    }

    #[test]
    fn test_missing_equipment_message() {
        let err = TraceError::missing_equipment("fdr-head");
        assert_eq!(err.to_string(), "terminal fdr-head has no owning equipment");
    }
}
