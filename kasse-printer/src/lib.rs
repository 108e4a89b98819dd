//! # kasse-printer
//!
//! Thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Abstract print directives and a fluent ticket builder
//! - Data-driven dialect tables per printer family (ESC/POS, Star line mode, plain text)
//! - Code page encoding (Windows-1252, GBK)
//! - Delivery over HTTP or raw TCP with a tri-state outcome
//!
//! Business logic (WHAT to print) stays in application code:
//! - Routing items to stations, kitchen tickets and receipts → kasse-edge
//!
//! ## Example
//!
//! ```ignore
//! use kasse_printer::{
//!     Capabilities, Charset, DEFAULT_TIMEOUT, PrinterFamily, TicketBuilder, deliver, encode,
//! };
//!
//! let mut builder = TicketBuilder::new(48, Charset::Windows1252, Capabilities::default());
//! builder.center();
//! builder.double_size();
//! builder.line("KØKKEN");
//! builder.reset_size();
//! builder.sep_double();
//! builder.left();
//! builder.line("Bord 12");
//! builder.cut();
//!
//! let bytes = encode(&builder.build(), PrinterFamily::EscPos)?;
//! let outcome = deliver(&bytes, "192.168.1.100:9100", DEFAULT_TIMEOUT).await;
//! ```

mod dialect;
mod encoder;
mod encoding;
mod error;
mod ticket;
mod transport;

// Re-exports
pub use dialect::{Command, Dialect, DirectiveKind, PrinterFamily};
pub use encoder::{Alignment, CutMode, Directive, TextSize, encode};
pub use encoding::Charset;
pub use error::{PrintError, PrintResult, TransportFailure};
pub use ticket::{Capabilities, TicketBuilder};
pub use transport::{
    DEFAULT_RAW_PORT, DEFAULT_TIMEOUT, DeliveryOutcome, Endpoint, HttpPrinter, NetworkPrinter,
    Printer, deliver, probe,
};
