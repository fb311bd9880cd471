#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use test_cycle_sync::client::{FolderNode, RunItem, ScriptStep, StatusItem, StatusUpdate};
use test_cycle_sync::engine::error::Result;
use test_cycle_sync::{StatusIds, SyncError, TestManagement};

pub const PASS_ID: u64 = 3238;
pub const FAIL_ID: u64 = 3239;
pub const CYCLE_ID: u64 = 7001;
pub const CREATED_FOLDER_ID: u64 = 4242;

/// Run item ids are `ITEM_BASE + attach index`
pub const ITEM_BASE: u64 = 100;
/// Last-result ids are `RESULT_BASE + attach index`
pub const RESULT_BASE: u64 = 500;

pub fn status_ids() -> StatusIds {
    StatusIds::new(PASS_ID, FAIL_ID)
}

pub fn rejected(path: &str, status: u16) -> SyncError {
    SyncError::RemoteRejected {
        method: "GET".to_string(),
        url: format!("http://fake{}", path),
        status,
        body: "rejected".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StatusCatalog,
    FolderTree,
    CreateFolder(String),
    CreateCycle { name: String, folder_id: Option<u64> },
    ResolveCase(String),
    Attach { cycle_id: u64, case_ids: Vec<u64> },
    RunItems(u64),
    ScriptResults { cycle_id: u64, item_id: u64 },
    CaseStatuses(Vec<StatusUpdate>),
    StepStatuses(Vec<StatusUpdate>),
}

/// In-memory remote that records every call. Attached cases become run items
/// in attach order; each case key has its own script steps.
#[derive(Default)]
pub struct FakeRemote {
    pub project_key: String,
    pub statuses: Vec<StatusItem>,
    pub tree: FolderNode,
    /// Logical key -> case id; unknown keys are rejected with 404
    pub cases: HashMap<String, u64>,
    /// Logical key -> script steps of its run item
    pub scripts: HashMap<String, Vec<ScriptStep>>,
    /// Extra run items per logical key, on top of the attached one
    pub duplicate_items: HashMap<String, usize>,
    pub fail_catalog: bool,
    pub fail_folder_tree: bool,
    pub fail_cycle: bool,
    pub fail_case_flush: bool,
    pub fail_scripts_for: HashSet<u64>,
    /// Step writes containing any of these step ids are rejected
    pub fail_step_writes_for: HashSet<u64>,
    calls: Mutex<Vec<Call>>,
    attached: Mutex<Vec<u64>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            project_key: "PROJ".to_string(),
            statuses: vec![
                StatusItem {
                    id: PASS_ID,
                    name: "Pass".to_string(),
                },
                StatusItem {
                    id: FAIL_ID,
                    name: "Fail".to_string(),
                },
            ],
            ..Self::default()
        }
    }

    pub fn with_case(mut self, key: &str, id: u64) -> Self {
        self.cases.insert(key.to_string(), id);
        self
    }

    pub fn with_steps(mut self, key: &str, steps: Vec<ScriptStep>) -> Self {
        self.scripts.insert(key.to_string(), steps);
        self
    }

    pub fn with_tree(mut self, tree: FolderNode) -> Self {
        self.tree = tree;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn step_writes(&self) -> Vec<Vec<StatusUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::StepStatuses(updates) => Some(updates),
                _ => None,
            })
            .collect()
    }

    pub fn case_writes(&self) -> Vec<Vec<StatusUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CaseStatuses(updates) => Some(updates),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn key_of(&self, case_id: u64) -> Option<&str> {
        self.cases
            .iter()
            .find(|(_, &id)| id == case_id)
            .map(|(key, _)| key.as_str())
    }

    fn items(&self) -> Vec<RunItem> {
        let attached = self.attached.lock().unwrap().clone();
        let mut items = Vec::new();
        for (index, case_id) in attached.iter().enumerate() {
            let Some(key) = self.key_of(*case_id) else {
                continue;
            };
            let remote_key = format!("{}-{}", self.project_key, key);
            let index = index as u64;
            items.push(RunItem::new(ITEM_BASE + index, RESULT_BASE + index, remote_key.clone()));
            for extra in 0..self.duplicate_items.get(key).copied().unwrap_or(0) {
                let extra = extra as u64 + 1;
                items.push(RunItem::new(
                    ITEM_BASE * 10 + index * 10 + extra,
                    RESULT_BASE * 10 + index * 10 + extra,
                    remote_key.clone(),
                ));
            }
        }
        items
    }
}

#[async_trait]
impl TestManagement for FakeRemote {
    async fn status_catalog(&self) -> Result<Vec<StatusItem>> {
        self.record(Call::StatusCatalog);
        if self.fail_catalog {
            return Err(rejected("/testresultstatus", 503));
        }
        Ok(self.statuses.clone())
    }

    async fn folder_tree(&self) -> Result<FolderNode> {
        self.record(Call::FolderTree);
        if self.fail_folder_tree {
            return Err(rejected("/foldertree/testrun", 500));
        }
        Ok(self.tree.clone())
    }

    async fn create_folder(&self, name: &str) -> Result<u64> {
        self.record(Call::CreateFolder(name.to_string()));
        Ok(CREATED_FOLDER_ID)
    }

    async fn create_cycle(&self, name: &str, folder_id: Option<u64>) -> Result<u64> {
        self.record(Call::CreateCycle {
            name: name.to_string(),
            folder_id,
        });
        if self.fail_cycle {
            return Err(rejected("/testrun", 400));
        }
        Ok(CYCLE_ID)
    }

    async fn resolve_case_id(&self, key: &str) -> Result<u64> {
        self.record(Call::ResolveCase(key.to_string()));
        self.cases
            .get(key)
            .copied()
            .ok_or_else(|| rejected(&format!("/testcase/PROJ-{}", key), 404))
    }

    async fn attach_cases(&self, cycle_id: u64, case_ids: &[u64]) -> Result<()> {
        self.record(Call::Attach {
            cycle_id,
            case_ids: case_ids.to_vec(),
        });
        self.attached.lock().unwrap().extend_from_slice(case_ids);
        Ok(())
    }

    async fn run_items(&self, cycle_id: u64) -> Result<Vec<RunItem>> {
        self.record(Call::RunItems(cycle_id));
        Ok(self.items())
    }

    async fn script_results(&self, cycle_id: u64, item_id: u64) -> Result<Vec<ScriptStep>> {
        self.record(Call::ScriptResults { cycle_id, item_id });
        if self.fail_scripts_for.contains(&item_id) {
            return Err(rejected("/testresults", 500));
        }
        let key = self
            .items()
            .into_iter()
            .find(|item| item.id == item_id)
            .and_then(|item| item.case_key().map(|k| k.rsplit('-').next().unwrap_or(k).to_string()));
        Ok(key
            .and_then(|k| self.scripts.get(&k).cloned())
            .unwrap_or_default())
    }

    async fn update_case_statuses(&self, updates: &[StatusUpdate]) -> Result<()> {
        self.record(Call::CaseStatuses(updates.to_vec()));
        if self.fail_case_flush {
            return Err(rejected("/testresult", 500));
        }
        Ok(())
    }

    async fn update_step_statuses(&self, updates: &[StatusUpdate]) -> Result<()> {
        self.record(Call::StepStatuses(updates.to_vec()));
        if updates.iter().any(|u| self.fail_step_writes_for.contains(&u.id)) {
            return Err(rejected("/testscriptresult", 500));
        }
        Ok(())
    }
}
