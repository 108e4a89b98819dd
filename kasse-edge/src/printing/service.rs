//! Print service - loads orders from the store and hands them to the executor

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::error::PipelineResult;
use super::executor::{PrintExecutor, PrintReport};
use super::setup::PrintSetup;
use super::store::{PrintJobRecord, PrintStore};
use super::types::{ContentType, PrintTrigger};

/// Order print service
///
/// Responsibilities:
/// - Load the order when it reaches a print trigger
/// - Run the print job through the executor
/// - Keep a job record per section (best effort)
#[derive(Clone)]
pub struct PrintService {
    store: Arc<dyn PrintStore>,
    executor: Arc<PrintExecutor>,
}

impl PrintService {
    pub fn new(store: Arc<dyn PrintStore>, executor: Arc<PrintExecutor>) -> Self {
        Self { store, executor }
    }

    /// Build the executor from the store's current setup
    pub async fn from_store(
        store: Arc<dyn PrintStore>,
        build: impl FnOnce(PrintSetup) -> PipelineResult<PrintExecutor>,
    ) -> PipelineResult<Self> {
        let setup = store.load_setup().await?;
        let executor = build(setup)?;
        Ok(Self::new(store, Arc::new(executor)))
    }

    pub fn executor(&self) -> &PrintExecutor {
        &self.executor
    }

    /// An order reached `trigger`
    #[instrument(skip(self, trigger), fields(trigger = trigger.as_str()))]
    pub async fn handle(
        &self,
        order_id: &str,
        trigger: PrintTrigger,
    ) -> PipelineResult<PrintReport> {
        let order = self.store.load_order(order_id).await?;
        let report = self.executor.print_order(&order, trigger).await?;
        self.record(&report).await;
        Ok(report)
    }

    /// Operator-requested reprint
    #[instrument(skip(self, content_type), fields(content_type = content_type.as_str()))]
    pub async fn reprint(
        &self,
        order_id: &str,
        content_type: ContentType,
    ) -> PipelineResult<PrintReport> {
        let order = self.store.load_order(order_id).await?;
        let report = self.executor.reprint(&order, content_type).await?;
        self.record(&report).await;
        Ok(report)
    }

    /// Reload rules and printers; the old setup stays if the new one is invalid
    pub async fn reload_setup(&self) -> PipelineResult<()> {
        let setup = self.store.load_setup().await?;
        self.executor.replace_setup(setup)
    }

    async fn record(&self, report: &PrintReport) {
        let now = Utc::now();
        for section in &report.sections {
            let record = PrintJobRecord::from_report(&report.order_id, section, now);
            if let Err(e) = self.store.record_job(record).await {
                warn!(section = %section.section, error = %e, "Failed to record print job");
            }
        }
        info!(
            order_id = %report.order_id,
            sections = report.sections.len(),
            "Print job finished"
        );
    }
}
