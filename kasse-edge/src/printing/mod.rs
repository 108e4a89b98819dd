//! Printer output pipeline
//!
//! - Routing: order items are partitioned into sections by sort rules
//! - Rendering: each section becomes a kitchen ticket or customer receipt
//! - Delivery: sections are sent to their printers in parallel

pub mod attempt;
pub mod error;
pub mod events;
pub mod executor;
pub mod renderer;
pub mod routing;
pub mod service;
pub mod setup;
pub mod store;
pub mod types;

pub use attempt::{AttemptState, PrintAttempt};
pub use error::{PipelineError, PipelineResult};
pub use events::{DEFAULT_EVENT_CAPACITY, NoticeLevel, PrintEvents, PrintNotice};
pub use executor::{PlannedJob, PrintExecutor, PrintReport, SectionReport, attempt_delivery};
pub use renderer::ReceiptRenderer;
pub use routing::{Router, route_items};
pub use service::PrintService;
pub use setup::PrintSetup;
pub use store::{JsonFileStore, MemoryStore, PrintJobRecord, PrintStore};
pub use types::*;
