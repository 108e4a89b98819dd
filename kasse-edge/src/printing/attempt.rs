//! Per-section print attempt lifecycle
//!
//! `Building → Encoding → Sending → {Delivered | Unconfirmed | Failed}`.
//! Building or encoding may also end in `Failed`. Terminal states are final;
//! printing again means a new attempt.

use kasse_printer::DeliveryOutcome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{PipelineError, PipelineResult};
use super::types::{ContentType, SectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Building,
    Encoding,
    Sending,
    Delivered,
    Unconfirmed,
    Failed,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Delivered | AttemptState::Unconfirmed | AttemptState::Failed
        )
    }

    fn can_advance_to(&self, next: AttemptState) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Building, Encoding)
                | (Building, Failed)
                | (Encoding, Sending)
                | (Encoding, Failed)
                | (Sending, Delivered)
                | (Sending, Unconfirmed)
                | (Sending, Failed)
        )
    }
}

impl From<&DeliveryOutcome> for AttemptState {
    fn from(outcome: &DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Delivered => AttemptState::Delivered,
            DeliveryOutcome::Unconfirmed => AttemptState::Unconfirmed,
            DeliveryOutcome::Failed(_) => AttemptState::Failed,
        }
    }
}

/// One print of one section to one printer
#[derive(Debug, Clone)]
pub struct PrintAttempt {
    pub id: Uuid,
    pub order_id: String,
    pub section: SectionId,
    pub printer_id: String,
    pub content_type: ContentType,
    state: AttemptState,
}

impl PrintAttempt {
    pub fn new(
        order_id: impl Into<String>,
        section: impl Into<SectionId>,
        printer_id: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order_id.into(),
            section: section.into(),
            printer_id: printer_id.into(),
            content_type,
            state: AttemptState::Building,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn advance(&mut self, next: AttemptState) -> PipelineResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(
            attempt_id = %self.id,
            from = ?self.state,
            to = ?next,
            "Attempt state change"
        );
        self.state = next;
        Ok(())
    }

    /// Move from `Sending` to the state matching the delivery outcome
    pub fn finish(&mut self, outcome: &DeliveryOutcome) -> PipelineResult<()> {
        self.advance(AttemptState::from(outcome))
    }
}
