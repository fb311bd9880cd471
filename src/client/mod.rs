//! Test-management service client
//!
//! - `http` - rate-limited request client with 429 backoff
//! - `gateway` - typed operations over the service's REST API
//! - `types` - request and response bodies

use async_trait::async_trait;

use crate::engine::error::Result;

pub mod gateway;
pub mod http;
pub mod types;

pub use gateway::ScaleGateway;
pub use http::{HttpResponse, RateLimitedClient, RetryPolicy};
pub use types::{FolderNode, RunItem, ScriptStep, StatusItem, StatusUpdate};

/// Operations the reconciliation engine needs from the remote service.
///
/// Writes replace the whole targeted payload, so retrying any of them is safe.
#[async_trait]
pub trait TestManagement: Send + Sync {
    /// Test-result statuses known to the project
    async fn status_catalog(&self) -> Result<Vec<StatusItem>>;

    /// Root of the project's test-run folder tree
    async fn folder_tree(&self) -> Result<FolderNode>;

    /// Create a root-level test-run folder, returning its id
    async fn create_folder(&self, name: &str) -> Result<u64>;

    /// Create a test cycle, returning its id
    async fn create_cycle(&self, name: &str, folder_id: Option<u64>) -> Result<u64>;

    /// Numeric id of the case identified by a logical key such as `T123`
    async fn resolve_case_id(&self, key: &str) -> Result<u64>;

    /// Attach cases to a cycle; list order becomes each item's index
    async fn attach_cases(&self, cycle_id: u64, case_ids: &[u64]) -> Result<()>;

    async fn run_items(&self, cycle_id: u64) -> Result<Vec<RunItem>>;

    /// Script step results of one run item, in remote order
    async fn script_results(&self, cycle_id: u64, item_id: u64) -> Result<Vec<ScriptStep>>;

    async fn update_case_statuses(&self, updates: &[StatusUpdate]) -> Result<()>;

    async fn update_step_statuses(&self, updates: &[StatusUpdate]) -> Result<()>;
}
