//! Store collaborator
//!
//! Read-only access to orders and printer setup, plus an optional job log.
//! The pipeline never writes orders or setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::attempt::AttemptState;
use super::error::{PipelineError, PipelineResult};
use super::executor::SectionReport;
use super::setup::PrintSetup;
use super::types::{ContentType, PrintableOrder, SectionId};

/// One finished print attempt as kept by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJobRecord {
    pub id: Uuid,
    pub order_id: String,
    pub section: SectionId,
    pub printer_id: String,
    pub content_type: ContentType,
    pub state: AttemptState,
    /// Operator-facing outcome text
    pub outcome: String,
    pub bytes: usize,
    pub created_at: DateTime<Utc>,
}

impl PrintJobRecord {
    pub fn from_report(order_id: &str, report: &SectionReport, created_at: DateTime<Utc>) -> Self {
        Self {
            id: report.attempt_id,
            order_id: order_id.to_string(),
            section: report.section.clone(),
            printer_id: report.printer_id.clone(),
            content_type: report.content_type,
            state: report.state,
            outcome: report.outcome.describe(),
            bytes: report.bytes,
            created_at,
        }
    }
}

#[async_trait]
pub trait PrintStore: Send + Sync {
    async fn load_order(&self, order_id: &str) -> PipelineResult<PrintableOrder>;

    async fn load_setup(&self) -> PipelineResult<PrintSetup>;

    async fn record_job(&self, record: PrintJobRecord) -> PipelineResult<()>;
}

// ============================================================================
// In-memory
// ============================================================================

/// In-memory store for tests and demos
#[derive(Debug, Default)]
pub struct MemoryStore {
    setup: RwLock<PrintSetup>,
    orders: RwLock<HashMap<String, PrintableOrder>>,
    jobs: RwLock<Vec<PrintJobRecord>>,
}

impl MemoryStore {
    pub fn new(setup: PrintSetup) -> Self {
        Self {
            setup: RwLock::new(setup),
            ..Default::default()
        }
    }

    pub fn insert_order(&self, order: PrintableOrder) {
        self.orders
            .write()
            .insert(order.meta.order_id.clone(), order);
    }

    pub fn set_setup(&self, setup: PrintSetup) {
        *self.setup.write() = setup;
    }

    pub fn jobs(&self) -> Vec<PrintJobRecord> {
        self.jobs.read().clone()
    }
}

#[async_trait]
impl PrintStore for MemoryStore {
    async fn load_order(&self, order_id: &str) -> PipelineResult<PrintableOrder> {
        self.orders
            .read()
            .get(order_id)
            .cloned()
            .ok_or_else(|| PipelineError::OrderNotFound(order_id.to_string()))
    }

    async fn load_setup(&self) -> PipelineResult<PrintSetup> {
        Ok(self.setup.read().clone())
    }

    async fn record_job(&self, record: PrintJobRecord) -> PipelineResult<()> {
        self.jobs.write().push(record);
        Ok(())
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// File-backed store
///
/// Layout:
/// - `setup.json`: rules and printers
/// - `orders/<order_id>.json`: one order per file
/// - `print_jobs.jsonl`: appended job records, one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    setup_path: PathBuf,
    orders_dir: PathBuf,
    jobs_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(
        setup_path: impl Into<PathBuf>,
        orders_dir: impl Into<PathBuf>,
        jobs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            setup_path: setup_path.into(),
            orders_dir: orders_dir.into(),
            jobs_path: jobs_path.into(),
        }
    }

    /// Conventional layout under one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("setup.json"),
            dir.join("orders"),
            dir.join("print_jobs.jsonl"),
        )
    }

    pub fn setup_path(&self) -> &Path {
        &self.setup_path
    }

    fn order_path(&self, order_id: &str) -> PipelineResult<PathBuf> {
        let valid = !order_id.is_empty()
            && order_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PipelineError::OrderNotFound(order_id.to_string()));
        }
        Ok(self.orders_dir.join(format!("{}.json", order_id)))
    }

    /// Recorded jobs, oldest first
    pub async fn jobs(&self) -> PipelineResult<Vec<PrintJobRecord>> {
        let data = match tokio::fs::read_to_string(&self.jobs_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(PipelineError::from))
            .collect()
    }
}

#[async_trait]
impl PrintStore for JsonFileStore {
    async fn load_order(&self, order_id: &str) -> PipelineResult<PrintableOrder> {
        let path = self.order_path(order_id)?;
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::OrderNotFound(order_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    async fn load_setup(&self) -> PipelineResult<PrintSetup> {
        let data = tokio::fs::read(&self.setup_path).await.map_err(|e| {
            PipelineError::Configuration(format!(
                "cannot read setup file {}: {}",
                self.setup_path.display(),
                e
            ))
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            PipelineError::Configuration(format!(
                "invalid setup file {}: {}",
                self.setup_path.display(),
                e
            ))
        })
    }

    async fn record_job(&self, record: PrintJobRecord) -> PipelineResult<()> {
        if let Some(parent) = self.jobs_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.jobs_path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
