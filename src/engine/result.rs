//! Reconciliation result types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::StatusUpdate;

/// Stage of a reconciliation run, used to label reported failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StatusCatalog,
    Folder,
    ResolveCase,
    CaseStatuses,
    ScriptResults,
    StepStatuses,
}

/// A non-fatal failure that was reported and skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    /// Key, run item or folder the failure applies to
    pub subject: String,
    pub message: String,
}

/// Outcome count and parameter-set count disagreed for one run item; the
/// shorter of the two was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationMismatch {
    pub key: String,
    pub item_id: u64,
    pub outcomes: usize,
    pub parameter_sets: usize,
}

/// Step writes computed for one run item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStepUpdates {
    pub item_id: u64,
    pub key: String,
    pub updates: Vec<StatusUpdate>,
}

/// Result of a reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub cycle_id: u64,
    pub folder_id: Option<u64>,
    pub attached_case_ids: Vec<u64>,
    pub case_updates: Vec<StatusUpdate>,
    pub step_updates: Vec<ItemStepUpdates>,
    pub mismatches: Vec<CorrelationMismatch>,
    pub failures: Vec<StageFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub(crate) fn new(cycle_id: u64, folder_id: Option<u64>, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle_id,
            folder_id,
            attached_case_ids: Vec::new(),
            case_updates: Vec::new(),
            step_updates: Vec::new(),
            mismatches: Vec::new(),
            failures: Vec::new(),
            started_at,
            finished_at: started_at,
        }
    }

    /// True when nothing was skipped or truncated
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.mismatches.is_empty()
    }

    pub fn step_write_count(&self) -> usize {
        self.step_updates.iter().map(|i| i.updates.len()).sum()
    }

    pub fn steps_for(&self, item_id: u64) -> Option<&[StatusUpdate]> {
        self.step_updates
            .iter()
            .find(|i| i.item_id == item_id)
            .map(|i| i.updates.as_slice())
    }

    pub fn failures_at(&self, stage: Stage) -> Vec<&StageFailure> {
        self.failures.iter().filter(|f| f.stage == stage).collect()
    }
}
