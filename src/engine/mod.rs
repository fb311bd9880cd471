//! Result aggregation and reconciliation
//!
//! This module contains:
//! - `collector` - per-variant records and fail-dominant folding per key
//! - `event` - runner events fed into a session
//! - `session` - session-scoped state and the session-end entry point
//! - `reconcile` - the reconciliation engine and its pure planning steps
//! - `folder` - destination folder lookup/creation
//! - `status` - outcome -> status id catalog
//! - `result` - reconciliation report types
//! - `error` - sync error types
//! - `mock_clock` - clocks for retry backoff

pub mod collector;
pub mod error;
pub mod event;
pub mod folder;
pub mod mock_clock;
pub mod reconcile;
pub mod result;
pub mod session;
pub mod status;

pub use collector::{extract_case_key, Outcome, OutcomeCollector, VariantRecord};
pub use error::SyncError;
pub use event::{Phase, RunnerEvent, RunnerOutcome};
pub use folder::{find_folder, resolve_or_create};
pub use mock_clock::{Clock, MockClock, TokioClock};
pub use reconcile::{
    case_key_suffix, group_parameter_sets, plan_case_updates, plan_step_updates,
    ReconcileOptions, Reconciler, StepPlan,
};
pub use result::{CorrelationMismatch, ItemStepUpdates, ReconcileReport, Stage, StageFailure};
pub use session::SyncSession;
pub use status::StatusCatalog;
