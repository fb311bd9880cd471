//! REST gateway for the test-management service (`/rest/tests/1.0`)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::http::{RateLimitedClient, RetryPolicy};
use super::types::*;
use super::TestManagement;
use crate::config::Settings;
use crate::engine::error::Result;
use crate::engine::mock_clock::Clock;

const API_PREFIX: &str = "/rest/tests/1.0";

#[derive(Debug, Clone)]
pub struct ScaleGateway {
    client: RateLimitedClient,
    project_id: u64,
    project_key: String,
}

impl ScaleGateway {
    pub fn new(client: RateLimitedClient, project_id: u64, project_key: impl Into<String>) -> Self {
        Self {
            client,
            project_id,
            project_key: project_key.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = RateLimitedClient::new(&settings.base_url, &settings.token)?;
        Ok(Self::new(
            client,
            settings.project_id,
            settings.project_key.clone(),
        ))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.client = self.client.with_retry_policy(policy);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.client = self.client.with_clock(clock);
        self
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Remote key of a logical case key, e.g. `T12` -> `PROJ-T12`
    pub fn remote_case_key(&self, key: &str) -> String {
        format!("{}-{}", self.project_key, key)
    }
}

#[async_trait]
impl TestManagement for ScaleGateway {
    async fn status_catalog(&self) -> Result<Vec<StatusItem>> {
        let path = format!("{API_PREFIX}/project/{}/testresultstatus", self.project_id);
        let statuses: Vec<StatusItem> = self.client.get(&path).await?.json("status catalog")?;
        debug!("Status catalog: {:?}", statuses);
        Ok(statuses)
    }

    async fn folder_tree(&self) -> Result<FolderNode> {
        let path = format!("{API_PREFIX}/project/{}/foldertree/testrun", self.project_id);
        self.client.get(&path).await?.json("test-run folder tree")
    }

    async fn create_folder(&self, name: &str) -> Result<u64> {
        let request = CreateFolderRequest {
            name,
            project_id: self.project_id,
            index: 0,
        };
        let created: IdResponse = self
            .client
            .post_json(&format!("{API_PREFIX}/folder/testrun"), &request)
            .await?
            .json("create folder")?;
        info!("Created test-run folder '{}' with id {}", name, created.id);
        Ok(created.id)
    }

    async fn create_cycle(&self, name: &str, folder_id: Option<u64>) -> Result<u64> {
        let request = CreateCycleRequest {
            name,
            project_id: self.project_id,
            folder_id,
        };
        let created: IdResponse = self
            .client
            .post_json(&format!("{API_PREFIX}/testrun"), &request)
            .await?
            .json("create test cycle")?;
        Ok(created.id)
    }

    async fn resolve_case_id(&self, key: &str) -> Result<u64> {
        let path = format!(
            "{API_PREFIX}/testcase/{}?fields=id",
            self.remote_case_key(key)
        );
        let case: IdResponse = self.client.get(&path).await?.json("test case id")?;
        debug!("Resolved {} to case id {}", self.remote_case_key(key), case.id);
        Ok(case.id)
    }

    async fn attach_cases(&self, cycle_id: u64, case_ids: &[u64]) -> Result<()> {
        let request = AttachCasesRequest::new(cycle_id, case_ids);
        self.client
            .put_json(&format!("{API_PREFIX}/testrunitem/bulk/save"), &request)
            .await?;
        Ok(())
    }

    async fn run_items(&self, cycle_id: u64) -> Result<Vec<RunItem>> {
        let path = format!(
            "{API_PREFIX}/testrun/{cycle_id}/testrunitems?fields=testCaseId,testScriptResults(id),testRunId"
        );
        let response: RunItemsResponse = self.client.get(&path).await?.json("run items")?;
        Ok(response.test_run_items)
    }

    async fn script_results(&self, cycle_id: u64, item_id: u64) -> Result<Vec<ScriptStep>> {
        let path = format!(
            "{API_PREFIX}/testrun/{cycle_id}/testresults?fields=testScriptResults(id,parameterSetId)&itemId={item_id}"
        );
        let results: Vec<TestResultScripts> =
            self.client.get(&path).await?.json("script results")?;
        Ok(results
            .into_iter()
            .next()
            .map(|r| r.test_script_results)
            .unwrap_or_default())
    }

    async fn update_case_statuses(&self, updates: &[StatusUpdate]) -> Result<()> {
        self.client
            .put_json(&format!("{API_PREFIX}/testresult"), updates)
            .await?;
        Ok(())
    }

    async fn update_step_statuses(&self, updates: &[StatusUpdate]) -> Result<()> {
        self.client
            .put_json(&format!("{API_PREFIX}/testscriptresult"), updates)
            .await?;
        Ok(())
    }
}
