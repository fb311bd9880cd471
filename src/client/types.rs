use serde::{Deserialize, Serialize};

/// Entry of the project's test-result status catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    pub id: u64,
    pub name: String,
}

/// Node of the test-run folder tree. The tree root is a synthetic container
/// whose `id` and `name` may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn root(children: Vec<FolderNode>) -> Self {
        Self {
            id: 0,
            name: String::new(),
            children,
        }
    }

    pub fn with_children(mut self, children: Vec<FolderNode>) -> Self {
        self.children = children;
        self
    }
}

/// Response body carrying only a created or looked-up entity id
#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    pub id: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub project_id: u64,
    pub index: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCycleRequest<'a> {
    pub name: &'a str,
    pub project_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachCasesRequest {
    pub test_run_id: u64,
    pub added_test_run_items: Vec<AddedRunItem>,
}

impl AttachCasesRequest {
    /// Each case's `index` is its position in `case_ids`
    pub fn new(cycle_id: u64, case_ids: &[u64]) -> Self {
        Self {
            test_run_id: cycle_id,
            added_test_run_items: case_ids
                .iter()
                .enumerate()
                .map(|(index, &test_case_id)| AddedRunItem {
                    index,
                    last_test_result: NewTestResult { test_case_id },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedRunItem {
    pub index: usize,
    pub last_test_result: NewTestResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestResult {
    pub test_case_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunItemsResponse {
    #[serde(default)]
    pub test_run_items: Vec<RunItem>,
}

/// A test case's placement inside a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunItem {
    pub id: u64,
    #[serde(rename = "$lastTestResult")]
    pub last_test_result: LastTestResult,
}

impl RunItem {
    pub fn new(id: u64, last_result_id: u64, case_key: impl Into<String>) -> Self {
        Self {
            id,
            last_test_result: LastTestResult {
                id: last_result_id,
                test_case: Some(TestCaseRef {
                    key: case_key.into(),
                }),
            },
        }
    }

    /// Full remote case key, e.g. `PROJ-T123`
    pub fn case_key(&self) -> Option<&str> {
        self.last_test_result
            .test_case
            .as_ref()
            .map(|case| case.key.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTestResult {
    pub id: u64,
    #[serde(default)]
    pub test_case: Option<TestCaseRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseRef {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultScripts {
    #[serde(default)]
    pub test_script_results: Vec<ScriptStep>,
}

/// One step result of a run item's script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    pub id: u64,
    #[serde(default)]
    pub parameter_set_id: Option<u64>,
}

impl ScriptStep {
    pub fn new(id: u64, parameter_set_id: Option<u64>) -> Self {
        Self {
            id,
            parameter_set_id,
        }
    }
}

/// Full-replacement status write for a test result or a script step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: u64,
    pub test_result_status_id: u64,
}

impl StatusUpdate {
    pub fn new(id: u64, test_result_status_id: u64) -> Self {
        Self {
            id,
            test_result_status_id,
        }
    }
}
