//! # Test Cycle Sync
//!
//! Pushes the outcomes of a test-runner session into a test-management
//! service: one test cycle per session, one status per executed test case, and
//! per-step statuses for parameterized tests.
//!
//! ## How it works
//!
//! - **Collect** - every finished test call is recorded. Its logical case key
//!   (`T<digits>` in the test name) groups parameterized variants; a key fails
//!   if any of its variants failed.
//! - **Reconcile** - at session end a cycle is created (optionally inside a
//!   folder), the executed cases are attached, and each run item gets its
//!   folded status. Parameter sets of a run item are matched, in ascending id
//!   order, with the key's variants in execution order.
//! - **Throttling** - HTTP 429 responses are retried with a deterministic
//!   exponential backoff (1s, 2s, 4s, 8s, 16s).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use test_cycle_sync::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = SyncSession::configure(SessionOptions::enabled("Nightly"))?;
//!
//!     session.handle(&RunnerEvent::call("tests/test_login.py::test_T101[admin]", RunnerOutcome::Passed));
//!     session.handle(&RunnerEvent::call("tests/test_login.py::test_T101[guest]", RunnerOutcome::Failed));
//!
//!     if let Some(report) = session.finish().await? {
//!         println!("cycle {} updated", report.cycle_id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;

// Re-export main types
pub use client::{
    FolderNode, RateLimitedClient, RetryPolicy, RunItem, ScaleGateway, ScriptStep, StatusItem,
    StatusUpdate, TestManagement,
};
pub use config::{ConfigError, SessionOptions, Settings, StatusIds, DEFAULT_CYCLE_NAME};
pub use engine::{
    Outcome, OutcomeCollector, ReconcileReport, Reconciler, RunnerEvent, RunnerOutcome,
    StatusCatalog, SyncError, SyncSession,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{ScaleGateway, TestManagement};
    pub use crate::config::{SessionOptions, Settings, StatusIds};
    pub use crate::engine::{
        Outcome, OutcomeCollector, Phase, ReconcileOptions, ReconcileReport, Reconciler,
        RunnerEvent, RunnerOutcome, SyncError, SyncSession,
    };
}
