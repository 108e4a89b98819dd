//! Error types for the printer library

use thiserror::Error;

use crate::dialect::{DirectiveKind, PrinterFamily};

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// The printer family has no byte sequence for this directive
    #[error("Unsupported directive {directive} for printer family {family}")]
    UnsupportedDirective {
        family: PrinterFamily,
        directive: DirectiveKind,
    },
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

/// Why a delivery attempt did not reach the printer
///
/// Transport failures are environmental: the caller decides whether to try
/// again, this crate never does.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    /// The attempt did not finish within its timeout
    #[error("timeout after {0} ms")]
    Timeout(u64),

    /// The device actively refused the connection
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// The device answered with a status we do not treat as accepted
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The connection string could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Any other network error (reset, DNS, write failure)
    #[error("network error: {0}")]
    Network(String),
}
