//! Error types for ndproxyd
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Rejected tokens are reported with their position
//! - SI-11: Error Handling - Structured error types with contextual information

use crate::types::ListKind;
use ndproxy_types::ParseError;
use thiserror::Error;

/// Errors that can occur in ndproxyd
///
/// A failed write never changes stored configuration, whatever the variant.
#[derive(Debug, Error)]
pub enum NdproxyError {
    /// A list token failed to decode
    /// NIST: SI-10 - Offending token and zero-based position are reported
    #[error("Invalid {kind} entry {token:?} at position {position}: {source}")]
    Validation {
        kind: ListKind,
        token: String,
        position: usize,
        #[source]
        source: ParseError,
    },

    /// The write carried more entries than the list can hold
    #[error("{kind} accepts at most {capacity} entries")]
    CapacityExceeded { kind: ListKind, capacity: usize },

    /// The packet filter refused the interception hook
    /// Proxying does not happen, but the module stays loaded and queryable.
    #[error("Hook registration failed: {0}")]
    HookRegistrationFailed(String),

    /// packet_count was written with something other than an unsigned integer
    #[error("Invalid packet count {0:?}")]
    InvalidCount(String),

    /// No administrative node with this name
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Host delivered a lifecycle event other than load/unload
    #[error("Unsupported module event: {0}")]
    UnsupportedEvent(String),

    /// Configuration file error
    /// NIST: CM-6 (Configuration Settings) - Configuration validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NdproxyError {
    /// Short machine-readable reason, used as a metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            NdproxyError::Validation { .. } => "validation",
            NdproxyError::CapacityExceeded { .. } => "capacity",
            NdproxyError::HookRegistrationFailed(_) => "hook_registration",
            NdproxyError::InvalidCount(_) => "invalid_count",
            NdproxyError::UnknownNode(_) => "unknown_node",
            NdproxyError::UnsupportedEvent(_) => "unsupported_event",
            NdproxyError::Config(_) => "config",
            NdproxyError::Metrics(_) => "metrics",
            NdproxyError::Io(_) => "io",
        }
    }
}

/// Result type alias for ndproxyd operations
pub type Result<T> = std::result::Result<T, NdproxyError>;
