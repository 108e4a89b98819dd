//! Printing pipeline errors
//!
//! Configuration, routing and encoding errors are bugs in the setup and halt
//! the print attempt. Transport problems are not errors here: they come back
//! as `DeliveryOutcome::Failed` in the per-section report.

use kasse_printer::PrintError;
use thiserror::Error;

use super::attempt::AttemptState;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing default rule, malformed profile, section without printer
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No route for item {item_id} ({name})")]
    NoRouteForItem { item_id: String, name: String },

    #[error("Encoding for printer {printer_id} failed: {source}")]
    Encode {
        printer_id: String,
        #[source]
        source: PrintError,
    },

    #[error("Invalid attempt transition {from:?} -> {to:?}")]
    InvalidTransition { from: AttemptState, to: AttemptState },

    #[error("Unknown printer: {0}")]
    UnknownPrinter(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Store(format!("Invalid JSON: {}", err))
    }
}
