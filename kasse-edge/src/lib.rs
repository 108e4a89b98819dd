//! Kasse Edge - restaurant printer output pipeline
//!
//! # Overview
//!
//! When an order is placed or paid, its items are routed into print
//! sections (kitchen, bar, ...), each section is rendered into a kitchen
//! ticket or customer receipt for the printer serving it, and the encoded
//! bytes are sent to all printers in parallel.
//!
//! - **Routing** (`printing::routing`): sort rules, item override >
//!   product type > room > default
//! - **Rendering** (`printing::renderer`): directive lists per printer
//!   profile, encoded by `kasse-printer`
//! - **Execution** (`printing::executor`): configuration snapshots,
//!   concurrent delivery, per-section reports and notifications
//! - **Money** (`order_money`): integer minor units
//!
//! # Module layout
//!
//! ```text
//! kasse-edge/src/
//! ├── core/          # configuration
//! ├── order_money/   # amounts and totals
//! ├── printing/      # routing, rendering, delivery, store
//! └── utils/         # logging
//! ```

pub mod core;
pub mod order_money;
pub mod printing;
pub mod utils;

pub use core::Config;
pub use order_money::{Money, MoneyFormat, OrderTotals};
pub use printing::{
    PipelineError, PipelineResult, PrintEvents, PrintExecutor, PrintReport, PrintService,
    PrintSetup, PrintStore, ReceiptRenderer, attempt_delivery, route_items,
};
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
pub fn setup_environment() -> Config {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    config
}
