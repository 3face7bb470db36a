//! # Error Types
//!
//! Structured error types for spring_core. Every failure carries enough
//! context (parameter name, offending value, elapsed time vs deadline) to be
//! rendered directly by a presentation layer without reinterpretation.
//!
//! Insufficient constraints after a solve is *not* an error: it is reported
//! as [`crate::spring::SolveStatus::Insufficient`].
//!
//! ## Example
//!
//! ```rust
//! use spring_core::errors::{SpringError, SpringResult};
//!
//! fn validate_wire(d_mm: f64) -> SpringResult<()> {
//!     if d_mm <= 0.0 {
//!         return Err(SpringError::invalid_value("d", d_mm.to_string(), "must be positive"));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for spring_core operations
pub type SpringResult<T> = Result<T, SpringError>;

/// Structured error type for spring operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum SpringError {
    /// A configuration option is outside its closed enumeration
    #[error("Invalid option for '{field}': '{value}' (accepted: {accepted})")]
    InvalidOption {
        field: String,
        value: String,
        accepted: String,
    },

    /// A user-supplied value is not numeric or outside its domain
    #[error("Invalid value for '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The solve exceeded its deadline; the worker was abandoned
    #[error("Timeout: solve exceeded {deadline_secs:.3} s (waited {elapsed_secs:.3} s)")]
    Timeout { elapsed_secs: f64, deadline_secs: f64 },

    /// The solve produced a non-physical value
    #[error("Domain violation: {parameter} = {value} - {reason}")]
    DomainViolation {
        parameter: String,
        value: f64,
        reason: String,
    },

    /// Known values contradict one of the governing equations
    #[error("Inconsistent constraints: '{equation}' is violated (residual {residual:.3e})")]
    InconsistentConstraints { equation: String, residual: f64 },

    /// The operation requires a fully solved spring
    #[error("Spring is not solved: {operation} requires all parameters to be resolved")]
    NotSolved { operation: String },

    /// A required parameter has not been resolved
    #[error("Missing parameter: '{parameter}' is required by {operation}")]
    MissingParameter { parameter: String, operation: String },

    /// The operation does not apply to this spring variant
    #[error("Unsupported operation: {operation} is not available for {variant} springs")]
    UnsupportedOperation { operation: String, variant: String },

    /// Material not found in the property store
    #[error("Material not found: {material}")]
    MaterialNotFound { material: String },

    /// Wire gauge outside every tabulated validity range
    #[error("Out of range: wire gauge {gauge_mm} mm has no strength data for {material}")]
    OutOfRange { material: String, gauge_mm: f64 },

    /// TOML/JSON deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SpringError {
    /// Create an InvalidOption error
    pub fn invalid_option(
        field: impl Into<String>,
        value: impl Into<String>,
        accepted: &[&str],
    ) -> Self {
        SpringError::InvalidOption {
            field: field.into(),
            value: value.into(),
            accepted: accepted.join(", "),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SpringError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a DomainViolation error
    pub fn domain_violation(
        parameter: impl Into<String>,
        value: f64,
        reason: impl Into<String>,
    ) -> Self {
        SpringError::DomainViolation {
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Create a NotSolved error
    pub fn not_solved(operation: impl Into<String>) -> Self {
        SpringError::NotSolved {
            operation: operation.into(),
        }
    }

    /// Create a MissingParameter error
    pub fn missing_parameter(parameter: impl Into<String>, operation: impl Into<String>) -> Self {
        SpringError::MissingParameter {
            parameter: parameter.into(),
            operation: operation.into(),
        }
    }

    /// Create an UnsupportedOperation error
    pub fn unsupported(operation: impl Into<String>, variant: impl Into<String>) -> Self {
        SpringError::UnsupportedOperation {
            operation: operation.into(),
            variant: variant.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material: impl Into<String>) -> Self {
        SpringError::MaterialNotFound {
            material: material.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SpringError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        SpringError::Internal {
            message: message.into(),
        }
    }

    /// Timeouts can be retried with a longer deadline
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SpringError::Timeout { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SpringError::InvalidOption { .. } => "INVALID_OPTION",
            SpringError::InvalidValue { .. } => "INVALID_VALUE",
            SpringError::Timeout { .. } => "TIMEOUT",
            SpringError::DomainViolation { .. } => "DOMAIN_VIOLATION",
            SpringError::InconsistentConstraints { .. } => "INCONSISTENT_CONSTRAINTS",
            SpringError::NotSolved { .. } => "NOT_SOLVED",
            SpringError::MissingParameter { .. } => "MISSING_PARAMETER",
            SpringError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            SpringError::MaterialNotFound { .. } => "NOT_FOUND",
            SpringError::OutOfRange { .. } => "OUT_OF_RANGE",
            SpringError::SerializationError { .. } => "SERIALIZATION_ERROR",
            SpringError::FileError { .. } => "FILE_ERROR",
            SpringError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
