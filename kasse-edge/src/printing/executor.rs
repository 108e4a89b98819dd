//! Print job executor
//!
//! Plans an order's print jobs against a configuration snapshot, then sends
//! every section in parallel. Building and encoding happen before anything
//! is sent: a routing or encoding error halts the whole job. Transport
//! failures only show up in the per-section report.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use kasse_printer::{DEFAULT_TIMEOUT, DeliveryOutcome, deliver};
use parking_lot::RwLock;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::attempt::{AttemptState, PrintAttempt};
use super::error::{PipelineError, PipelineResult};
use super::events::{PrintEvents, PrintNotice};
use super::renderer::ReceiptRenderer;
use super::setup::PrintSetup;
use super::types::{
    ContentType, PrintTrigger, PrintableOrder, PrinterProfile, ReceiptContent, SectionId,
    SortedPrintSection,
};

/// Result of one section's attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub attempt_id: Uuid,
    pub section: SectionId,
    pub printer_id: String,
    pub content_type: ContentType,
    pub state: AttemptState,
    pub outcome: DeliveryOutcome,
    pub bytes: usize,
}

/// Result of printing one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintReport {
    pub order_id: String,
    pub sections: Vec<SectionReport>,
}

impl PrintReport {
    pub fn section(&self, section: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section == section)
    }

    pub fn failures(&self) -> impl Iterator<Item = &SectionReport> {
        self.sections.iter().filter(|s| s.outcome.is_failed())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Encoded content waiting to be sent
#[derive(Debug)]
pub struct PlannedJob {
    pub attempt: PrintAttempt,
    pub connection: String,
    pub content: ReceiptContent,
}

/// Send one encoded section to a printer
///
/// A single attempt bounded by `timeout`; never retries.
#[instrument(skip(content), fields(
    printer_id = %content.printer_id,
    section = %content.section,
    bytes = content.bytes.len(),
))]
pub async fn attempt_delivery(
    content: &ReceiptContent,
    connection: &str,
    timeout: Duration,
) -> DeliveryOutcome {
    let outcome = deliver(&content.bytes, connection, timeout).await;
    match &outcome {
        DeliveryOutcome::Delivered => info!("Print job delivered"),
        DeliveryOutcome::Unconfirmed => info!("Print job sent, not confirmed"),
        DeliveryOutcome::Failed(reason) => error!(error = %reason, "Print job failed"),
    }
    outcome
}

/// Print job executor
pub struct PrintExecutor {
    setup: RwLock<Arc<PrintSetup>>,
    renderer: ReceiptRenderer,
    events: PrintEvents,
    timeout: Duration,
}

impl PrintExecutor {
    /// Create an executor; the setup is validated first
    pub fn new(
        setup: PrintSetup,
        renderer: ReceiptRenderer,
        events: PrintEvents,
    ) -> PipelineResult<Self> {
        setup.validate()?;
        Ok(Self {
            setup: RwLock::new(Arc::new(setup)),
            renderer,
            events,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Per-attempt delivery timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn events(&self) -> &PrintEvents {
        &self.events
    }

    /// Current configuration snapshot
    ///
    /// Jobs hold on to the snapshot they started with; a later
    /// `replace_setup` does not affect them.
    pub fn snapshot(&self) -> Arc<PrintSetup> {
        self.setup.read().clone()
    }

    /// Swap in a new configuration after validating it
    pub fn replace_setup(&self, setup: PrintSetup) -> PipelineResult<()> {
        setup.validate()?;
        *self.setup.write() = Arc::new(setup);
        info!("Print setup replaced");
        Ok(())
    }

    /// Dry run of the routing for an order
    pub fn route(&self, order: &PrintableOrder) -> PipelineResult<Vec<SortedPrintSection>> {
        self.snapshot().router()?.route(&order.items)
    }

    /// Print what `trigger` prints automatically
    #[instrument(skip(self, order, trigger), fields(
        order_id = %order.meta.order_id,
        trigger = trigger.as_str(),
    ))]
    pub async fn print_order(
        &self,
        order: &PrintableOrder,
        trigger: PrintTrigger,
    ) -> PipelineResult<PrintReport> {
        let setup = self.snapshot();
        let jobs = self.plan(&setup, order, trigger.content_type(), Some(trigger))?;
        Ok(self.run(&order.meta.order_id, jobs).await)
    }

    /// Operator-requested print, ignoring auto-print triggers
    #[instrument(skip(self, order, content_type), fields(
        order_id = %order.meta.order_id,
        content_type = content_type.as_str(),
    ))]
    pub async fn reprint(
        &self,
        order: &PrintableOrder,
        content_type: ContentType,
    ) -> PipelineResult<PrintReport> {
        let setup = self.snapshot();
        let jobs = self.plan(&setup, order, content_type, None)?;
        Ok(self.run(&order.meta.order_id, jobs).await)
    }

    /// Print a self-check page on one printer
    #[instrument(skip(self))]
    pub async fn print_test_page(&self, printer_id: &str) -> PipelineResult<SectionReport> {
        let setup = self.snapshot();
        let profile = setup
            .printer(printer_id)
            .ok_or_else(|| PipelineError::UnknownPrinter(printer_id.to_string()))?;

        let mut attempt = PrintAttempt::new(
            "",
            profile.section.clone(),
            profile.id.clone(),
            ContentType::TestPage,
        );
        attempt.advance(AttemptState::Encoding)?;
        let content = match self.renderer.test_page(profile, Utc::now()) {
            Ok(content) => content,
            Err(e) => {
                attempt.advance(AttemptState::Failed)?;
                return Err(e);
            }
        };
        attempt.advance(AttemptState::Sending)?;

        let job = PlannedJob {
            attempt,
            connection: profile.connection.clone(),
            content,
        };
        Ok(self.send(job).await)
    }

    /// Build and encode every section the order prints
    ///
    /// `trigger` gates on the profiles' auto-print settings; `None` prints
    /// to every profile enabled for `content_type`.
    pub fn plan(
        &self,
        setup: &PrintSetup,
        order: &PrintableOrder,
        content_type: ContentType,
        trigger: Option<PrintTrigger>,
    ) -> PipelineResult<Vec<PlannedJob>> {
        let targets: Vec<(SortedPrintSection, &PrinterProfile)> = match content_type {
            ContentType::KitchenTicket => {
                let mut targets = Vec::new();
                for section in setup.router()?.route(&order.items)? {
                    let profile = setup.printer_for_section(&section.section).ok_or_else(|| {
                        PipelineError::Configuration(format!(
                            "section '{}' has no active kitchen printer",
                            section.section
                        ))
                    })?;
                    targets.push((section, profile));
                }
                targets
            }
            ContentType::CustomerReceipt => setup
                .active_printers()
                .map(|profile| {
                    let section = SortedPrintSection {
                        section: profile.section.clone(),
                        items: order.items.clone(),
                    };
                    (section, profile)
                })
                .collect(),
            ContentType::TestPage => {
                return Err(PipelineError::Configuration(
                    "test pages are not printed for orders".to_string(),
                ));
            }
        };

        let mut jobs = Vec::new();
        for (section, profile) in targets {
            if !profile.prints(content_type) {
                if content_type == ContentType::KitchenTicket {
                    return Err(PipelineError::Configuration(format!(
                        "printer '{}' for section '{}' does not print kitchen tickets",
                        profile.id, section.section
                    )));
                }
                debug!(printer_id = %profile.id, "Printer does not print this content");
                continue;
            }
            if let Some(trigger) = trigger
                && !profile.auto_prints_on(trigger)
            {
                debug!(printer_id = %profile.id, "Auto print not enabled for trigger");
                continue;
            }

            let mut attempt = PrintAttempt::new(
                order.meta.order_id.clone(),
                section.section.clone(),
                profile.id.clone(),
                content_type,
            );
            attempt.advance(AttemptState::Encoding)?;
            let content = match self
                .renderer
                .build_receipt(&section, &order.meta, profile, content_type)
            {
                Ok(content) => content,
                Err(e) => {
                    attempt.advance(AttemptState::Failed)?;
                    error!(section = %section.section, error = %e, "Print job halted");
                    return Err(e);
                }
            };
            attempt.advance(AttemptState::Sending)?;

            jobs.push(PlannedJob {
                attempt,
                connection: profile.connection.clone(),
                content,
            });
        }

        Ok(jobs)
    }

    /// Send all jobs concurrently, each with its own timeout
    async fn run(&self, order_id: &str, jobs: Vec<PlannedJob>) -> PrintReport {
        if jobs.is_empty() {
            info!("Nothing to print");
        }

        let sections = join_all(jobs.into_iter().map(|job| self.send(job))).await;

        let failed = sections.iter().filter(|s| s.outcome.is_failed()).count();
        if failed > 0 {
            warn!(failed, total = sections.len(), "Some sections failed to print");
        }

        PrintReport {
            order_id: order_id.to_string(),
            sections,
        }
    }

    async fn send(&self, job: PlannedJob) -> SectionReport {
        let PlannedJob {
            mut attempt,
            connection,
            content,
        } = job;

        let outcome = attempt_delivery(&content, &connection, self.timeout).await;
        if let Err(e) = attempt.finish(&outcome) {
            warn!(attempt_id = %attempt.id, error = %e, "Attempt was not ready to finish");
        }

        self.events.publish(PrintNotice::from_outcome(
            &attempt.order_id,
            &attempt.section,
            &attempt.printer_id,
            attempt.content_type,
            &outcome,
        ));

        SectionReport {
            attempt_id: attempt.id,
            section: attempt.section.clone(),
            printer_id: attempt.printer_id.clone(),
            content_type: attempt.content_type,
            state: attempt.state(),
            outcome,
            bytes: content.bytes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::Money;
    use crate::printing::types::{OrderMeta, PrintableItem, RuleSelector, SortRule};
    use kasse_printer::{Capabilities, Charset, PrinterFamily};

    fn item(id: &str, product_type: Option<&str>) -> PrintableItem {
        PrintableItem {
            id: id.to_string(),
            name: id.to_string(),
            quantity: 1,
            unit_price: Money::from_minor(1000),
            modifiers: vec![],
            room_id: None,
            product_type_id: product_type.map(str::to_string),
            course: None,
            note: None,
        }
    }

    fn order() -> PrintableOrder {
        PrintableOrder {
            meta: OrderMeta {
                order_id: "o1".to_string(),
                order_number: None,
                company_name: None,
                company_address: None,
                company_vat: None,
                table_name: None,
                room_name: None,
                guest_count: None,
                staff_name: None,
                printed_at: Utc::now(),
                totals: Default::default(),
                payments: vec![],
                footer: None,
                print_count: 0,
            },
            items: vec![item("beer", Some("drinks")), item("steak", None)],
        }
    }

    fn profile(id: &str, section: &str) -> PrinterProfile {
        PrinterProfile {
            id: id.to_string(),
            name: id.to_string(),
            section: section.to_string(),
            connection: "127.0.0.1:9".to_string(),
            family: PrinterFamily::EscPos,
            width: 48,
            charset: Charset::Windows1252,
            capabilities: Capabilities::default(),
            kitchen_tickets: true,
            customer_receipts: false,
            auto_print: vec![PrintTrigger::Placed],
            is_active: true,
        }
    }

    fn setup() -> PrintSetup {
        let mut receipt = profile("r1", "bar");
        receipt.kitchen_tickets = false;
        receipt.customer_receipts = true;
        receipt.auto_print = vec![PrintTrigger::Paid];
        PrintSetup::new(
            vec![
                SortRule {
                    id: "drinks".to_string(),
                    selector: RuleSelector::ProductType("drinks".to_string()),
                    section: "bar".to_string(),
                    order: 0,
                },
                SortRule {
                    id: "default".to_string(),
                    selector: RuleSelector::Default,
                    section: "kitchen".to_string(),
                    order: 1,
                },
            ],
            vec![profile("b1", "bar"), profile("k1", "kitchen"), receipt],
        )
    }

    fn executor() -> PrintExecutor {
        PrintExecutor::new(setup(), ReceiptRenderer::default(), PrintEvents::default()).unwrap()
    }

    #[test]
    fn test_new_validates() {
        let mut s = setup();
        s.rules.pop();
        let result = PrintExecutor::new(s, ReceiptRenderer::default(), PrintEvents::default());
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_plan_kitchen_sections() {
        let exec = executor();
        let setup = exec.snapshot();
        let jobs = exec
            .plan(&setup, &order(), ContentType::KitchenTicket, Some(PrintTrigger::Placed))
            .unwrap();
        let targets: Vec<(&str, &str)> = jobs
            .iter()
            .map(|j| (j.attempt.section.as_str(), j.attempt.printer_id.as_str()))
            .collect();
        assert_eq!(targets, vec![("bar", "b1"), ("kitchen", "k1")]);
        assert!(jobs.iter().all(|j| j.attempt.state() == AttemptState::Sending));
        assert!(jobs.iter().all(|j| !j.content.bytes.is_empty()));
    }

    #[test]
    fn test_plan_receipts_on_paid() {
        let exec = executor();
        let setup = exec.snapshot();
        let jobs = exec
            .plan(&setup, &order(), ContentType::CustomerReceipt, Some(PrintTrigger::Paid))
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].attempt.printer_id, "r1");
        assert_eq!(jobs[0].content.content_type, ContentType::CustomerReceipt);
    }

    #[test]
    fn test_plan_respects_auto_print() {
        let mut s = setup();
        s.printers[1].auto_print.clear();
        let exec =
            PrintExecutor::new(s, ReceiptRenderer::default(), PrintEvents::default()).unwrap();
        let setup = exec.snapshot();

        let auto = exec
            .plan(&setup, &order(), ContentType::KitchenTicket, Some(PrintTrigger::Placed))
            .unwrap();
        assert_eq!(auto.len(), 1);

        let manual = exec
            .plan(&setup, &order(), ContentType::KitchenTicket, None)
            .unwrap();
        assert_eq!(manual.len(), 2);
    }

    #[test]
    fn test_plan_skips_receipt_printer_listed_first() {
        let mut s = setup();
        s.printers.rotate_right(1);
        assert_eq!(s.printers[0].id, "r1");
        let exec =
            PrintExecutor::new(s, ReceiptRenderer::default(), PrintEvents::default()).unwrap();
        let setup = exec.snapshot();

        let jobs = exec
            .plan(&setup, &order(), ContentType::KitchenTicket, Some(PrintTrigger::Placed))
            .unwrap();
        let targets: Vec<(&str, &str)> = jobs
            .iter()
            .map(|j| (j.attempt.section.as_str(), j.attempt.printer_id.as_str()))
            .collect();
        assert_eq!(targets, vec![("bar", "b1"), ("kitchen", "k1")]);
    }

    #[test]
    fn test_plan_section_without_kitchen_printer_fails() {
        let exec = executor();
        let mut broken = (*exec.snapshot()).clone();
        broken.printers.retain(|p| p.id != "b1");
        let err = exec
            .plan(&broken, &order(), ContentType::KitchenTicket, Some(PrintTrigger::Placed))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(ref msg) if msg.contains("bar")));
    }

    #[test]
    fn test_plan_encoding_error_halts() {
        let mut s = setup();
        s.printers[0].family = PrinterFamily::PlainText;
        s.printers[0].capabilities = Capabilities::plain();
        let exec =
            PrintExecutor::new(s, ReceiptRenderer::default(), PrintEvents::default()).unwrap();

        // plan() trusts its snapshot, so skip validation to reach the encoder
        let mut broken = (*exec.snapshot()).clone();
        broken.printers[0].capabilities = Capabilities::default();
        let err = exec
            .plan(&broken, &order(), ContentType::KitchenTicket, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { ref printer_id, .. } if printer_id == "b1"));
    }

    #[test]
    fn test_replace_setup_keeps_old_snapshot() {
        let exec = executor();
        let before = exec.snapshot();

        let mut next = setup();
        next.printers[1].connection = "10.0.0.9:9100".to_string();
        exec.replace_setup(next).unwrap();

        assert_eq!(before.printers[1].connection, "127.0.0.1:9");
        assert_eq!(exec.snapshot().printers[1].connection, "10.0.0.9:9100");

        let mut invalid = setup();
        invalid.rules.clear();
        assert!(exec.replace_setup(invalid).is_err());
        assert_eq!(exec.snapshot().printers[1].connection, "10.0.0.9:9100");
    }

    #[tokio::test]
    async fn test_unknown_printer_test_page() {
        let err = executor().print_test_page("nope").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownPrinter(_)));
    }
}
