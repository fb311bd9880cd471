//! Reconciliation engine
//!
//! Runs once at session end against a `TestManagement` remote:
//! 1. build the status catalog
//! 2. resolve or create the destination folder (when one is configured)
//! 3. create the cycle and attach every seen key's case, in first-seen order;
//!    with nothing attached the run stops here
//! 4. stage one case-level write per run item whose key was executed
//! 5. flush case-level writes in one bulk call
//! 6. pair each run item's parameter sets (ascending id) with the key's
//!    per-variant outcomes (execution order)
//! 7. flush step-level writes in one bulk call per run item
//!
//! Nothing is rolled back: a fatal error leaves earlier writes in place.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::collector::{Outcome, OutcomeCollector};
use super::error::{Result, SyncError};
use super::folder;
use super::result::{CorrelationMismatch, ItemStepUpdates, ReconcileReport, Stage, StageFailure};
use super::status::StatusCatalog;
use crate::client::{RunItem, ScriptStep, StatusUpdate, TestManagement};
use crate::config::StatusIds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub cycle_name: String,
    pub folder_name: Option<String>,
}

/// Logical key of a remote case key: its last hyphen-separated segment
/// (`PROJ-T123` -> `T123`)
pub fn case_key_suffix(case_key: &str) -> &str {
    case_key.rsplit('-').next().unwrap_or(case_key)
}

/// One status write per distinct last-result id, for every run item whose key
/// has a folded status
pub fn plan_case_updates(
    items: &[RunItem],
    collector: &OutcomeCollector,
    catalog: &StatusCatalog,
) -> Result<Vec<StatusUpdate>> {
    let mut staged = HashSet::new();
    let mut updates = Vec::new();

    for item in items {
        let Some(key) = item.case_key().map(case_key_suffix) else {
            continue;
        };
        let Some(outcome) = collector.folded_status(key) else {
            continue;
        };
        let result_id = item.last_test_result.id;
        if staged.insert(result_id) {
            updates.push(StatusUpdate::new(result_id, catalog.id_for(outcome)?));
        }
    }

    Ok(updates)
}

/// Step ids grouped by parameter-set id, ascending by set id, keeping step
/// order within a group. Steps without a parameter set are left out.
pub fn group_parameter_sets(steps: &[ScriptStep]) -> BTreeMap<u64, Vec<u64>> {
    let mut groups: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for step in steps {
        if let Some(set_id) = step.parameter_set_id {
            groups.entry(set_id).or_default().push(step.id);
        }
    }
    groups
}

/// Step writes for one run item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPlan {
    pub updates: Vec<StatusUpdate>,
    pub outcomes: usize,
    pub parameter_sets: usize,
}

impl StepPlan {
    pub fn is_mismatched(&self) -> bool {
        self.parameter_sets > 0 && self.outcomes != self.parameter_sets
    }
}

/// Pair parameter set *i* (ascending id) with outcome *i* and give every step
/// of the set that outcome's status. Extra sets stay unwritten; extra
/// outcomes are dropped.
pub fn plan_step_updates(
    steps: &[ScriptStep],
    outcomes: &[Outcome],
    catalog: &StatusCatalog,
) -> Result<StepPlan> {
    let groups = group_parameter_sets(steps);
    let mut updates = Vec::new();

    for (step_ids, outcome) in groups.values().zip(outcomes) {
        let status_id = catalog.id_for(*outcome)?;
        updates.extend(step_ids.iter().map(|&id| StatusUpdate::new(id, status_id)));
    }

    Ok(StepPlan {
        updates,
        outcomes: outcomes.len(),
        parameter_sets: groups.len(),
    })
}

pub struct Reconciler<'a> {
    remote: &'a dyn TestManagement,
    options: ReconcileOptions,
    statuses: StatusIds,
}

impl<'a> Reconciler<'a> {
    /// `statuses` fill in any name the remote catalog lacks
    pub fn new(remote: &'a dyn TestManagement, options: ReconcileOptions, statuses: StatusIds) -> Self {
        Self {
            remote,
            options,
            statuses,
        }
    }

    pub async fn run(&self, collector: &OutcomeCollector) -> Result<ReconcileReport> {
        let started_at = Utc::now();
        let mut failures = Vec::new();

        let catalog = self.build_catalog(&mut failures).await;

        let folder_id = match self.options.folder_name.as_deref() {
            Some(name) => match self.resolve_folder(name).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!("Folder '{}' could not be resolved, cycle goes to the root: {}", name, err);
                    failures.push(failure(Stage::Folder, name, &err));
                    None
                }
            },
            None => None,
        };

        let cycle_id = self
            .remote
            .create_cycle(&self.options.cycle_name, folder_id)
            .await
            .map_err(|err| SyncError::CycleCreation(Box::new(err)))?;
        info!("Test cycle '{}' created: {}", self.options.cycle_name, cycle_id);

        let mut report = ReconcileReport::new(cycle_id, folder_id, started_at);
        report.failures = failures;

        let mut case_ids = Vec::new();
        for key in collector.seen_keys() {
            match self.remote.resolve_case_id(key).await {
                Ok(id) => case_ids.push(id),
                Err(err) => {
                    warn!("Test case {} could not be resolved, skipping: {}", key, err);
                    report.failures.push(failure(Stage::ResolveCase, key, &err));
                }
            }
        }
        if !case_ids.is_empty() {
            self.remote.attach_cases(cycle_id, &case_ids).await?;
        }
        info!("Attached {} test cases to cycle {}", case_ids.len(), cycle_id);
        if case_ids.is_empty() {
            report.finished_at = Utc::now();
            return Ok(report);
        }
        report.attached_case_ids = case_ids;

        let items = self.remote.run_items(cycle_id).await?;
        debug!("Cycle {} has {} run items", cycle_id, items.len());

        let case_updates = plan_case_updates(&items, collector, &catalog)?;
        debug!("Case status payload: {}", payload(&case_updates));
        if !case_updates.is_empty() {
            if let Err(err) = self.remote.update_case_statuses(&case_updates).await {
                warn!("Case status update failed: {}", err);
                report
                    .failures
                    .push(failure(Stage::CaseStatuses, &format!("cycle {cycle_id}"), &err));
            }
        }
        report.case_updates = case_updates;

        for key in collector.seen_keys() {
            let outcomes = collector.outcomes_for(key);
            let matching = items
                .iter()
                .filter(|item| item.case_key().map(case_key_suffix) == Some(key.as_str()));
            for item in matching {
                self.reconcile_steps(cycle_id, key, item, &outcomes, &catalog, &mut report)
                    .await?;
            }
        }

        report.finished_at = Utc::now();
        info!(
            "Reconciled cycle {}: {} case writes, {} step writes, {} failures",
            cycle_id,
            report.case_updates.len(),
            report.step_write_count(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn build_catalog(&self, failures: &mut Vec<StageFailure>) -> StatusCatalog {
        match self.remote.status_catalog().await {
            Ok(items) => StatusCatalog::from_items(&items).with_fallback(&self.statuses),
            Err(err) => {
                warn!("Status catalog unavailable, using configured ids: {}", err);
                failures.push(failure(Stage::StatusCatalog, "catalog", &err));
                StatusCatalog::from_configured(&self.statuses)
            }
        }
    }

    async fn resolve_folder(&self, name: &str) -> Result<u64> {
        let root = self.remote.folder_tree().await?;
        folder::resolve_or_create(self.remote, &root, name).await
    }

    /// Failures to fetch or write are recorded and confined to this item
    async fn reconcile_steps(
        &self,
        cycle_id: u64,
        key: &str,
        item: &RunItem,
        outcomes: &[Outcome],
        catalog: &StatusCatalog,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let subject = format!("run item {}", item.id);
        let steps = match self.remote.script_results(cycle_id, item.id).await {
            Ok(steps) => steps,
            Err(err) => {
                warn!("Script results for {} ({}) unavailable: {}", subject, key, err);
                report
                    .failures
                    .push(failure(Stage::ScriptResults, &subject, &err));
                return Ok(());
            }
        };

        let plan = plan_step_updates(&steps, outcomes, catalog)?;
        if plan.is_mismatched() {
            warn!(
                "{} has {} variant outcomes but {} parameter sets for {}; pairing the first {}",
                key,
                plan.outcomes,
                plan.parameter_sets,
                subject,
                plan.outcomes.min(plan.parameter_sets)
            );
            report.mismatches.push(CorrelationMismatch {
                key: key.to_string(),
                item_id: item.id,
                outcomes: plan.outcomes,
                parameter_sets: plan.parameter_sets,
            });
        }
        if plan.updates.is_empty() {
            return Ok(());
        }

        debug!("Step status payload for {}: {}", subject, payload(&plan.updates));
        match self.remote.update_step_statuses(&plan.updates).await {
            Ok(()) => report.step_updates.push(ItemStepUpdates {
                item_id: item.id,
                key: key.to_string(),
                updates: plan.updates,
            }),
            Err(err) => {
                warn!("Step status update for {} failed: {}", subject, err);
                report
                    .failures
                    .push(failure(Stage::StepStatuses, &subject, &err));
            }
        }
        Ok(())
    }
}

fn failure(stage: Stage, subject: &str, err: &SyncError) -> StageFailure {
    StageFailure {
        stage,
        subject: subject.to_string(),
        message: err.to_string(),
    }
}

fn payload<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
