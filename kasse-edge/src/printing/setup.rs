//! Printer setup snapshot
//!
//! Sort rules and printer profiles, loaded together and validated as a unit.
//! Once built a `PrintSetup` is never mutated; swapping configuration means
//! replacing the whole snapshot.

use serde::{Deserialize, Serialize};

use kasse_printer::{Dialect, DirectiveKind, Endpoint};

use super::error::{PipelineError, PipelineResult};
use super::routing::Router;
use super::types::{ContentType, PrinterProfile, SortRule};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSetup {
    #[serde(default)]
    pub rules: Vec<SortRule>,
    #[serde(default)]
    pub printers: Vec<PrinterProfile>,
}

impl PrintSetup {
    pub fn new(rules: Vec<SortRule>, printers: Vec<PrinterProfile>) -> Self {
        Self { rules, printers }
    }

    /// Reject setups that cannot print every routed item
    pub fn validate(&self) -> PipelineResult<()> {
        Router::new(&self.rules)?;

        for profile in self.printers.iter().filter(|p| p.is_active) {
            validate_profile(profile)?;
        }

        for rule in &self.rules {
            if self.printer_for_section(&rule.section).is_none() {
                return Err(PipelineError::Configuration(format!(
                    "rule '{}' targets section '{}' which has no active kitchen printer",
                    rule.id, rule.section
                )));
            }
        }

        Ok(())
    }

    pub fn router(&self) -> PipelineResult<Router> {
        Router::new(&self.rules)
    }

    /// First active printer printing kitchen tickets for `section`
    pub fn printer_for_section(&self, section: &str) -> Option<&PrinterProfile> {
        self.printer_for(section, ContentType::KitchenTicket)
    }

    /// First active printer in `section` enabled for `content_type`
    pub fn printer_for(
        &self,
        section: &str,
        content_type: ContentType,
    ) -> Option<&PrinterProfile> {
        self.printers
            .iter()
            .find(|p| p.is_active && p.section == section && p.prints(content_type))
    }

    pub fn printer(&self, id: &str) -> Option<&PrinterProfile> {
        self.printers.iter().find(|p| p.id == id)
    }

    pub fn active_printers(&self) -> impl Iterator<Item = &PrinterProfile> {
        self.printers.iter().filter(|p| p.is_active)
    }
}

fn validate_profile(profile: &PrinterProfile) -> PipelineResult<()> {
    let bad = |reason: String| {
        PipelineError::Configuration(format!("printer '{}': {}", profile.id, reason))
    };

    if profile.connection.trim().is_empty() {
        return Err(bad("empty connection address".to_string()));
    }
    if let Err(reason) = Endpoint::parse(&profile.connection) {
        return Err(bad(reason.to_string()));
    }
    if profile.width == 0 {
        return Err(bad("paper width must be positive".to_string()));
    }

    let missing = profile.capabilities.missing_in(profile.family);
    if let Some(kind) = missing.first() {
        return Err(bad(format!(
            "capability '{}' is not available for family {}",
            kind, profile.family
        )));
    }

    let charset_kind = DirectiveKind::for_charset(profile.charset);
    if !Dialect::for_family(profile.family).supports(charset_kind) {
        return Err(bad(format!(
            "charset {:?} is not available for family {}",
            profile.charset, profile.family
        )));
    }

    Ok(())
}
