//! Sync session: the state shared between the runner's per-test callback and
//! its session-end callback

use std::sync::Arc;

use tracing::{debug, info};

use super::collector::{Outcome, OutcomeCollector};
use super::error::Result;
use super::event::{Phase, RunnerEvent};
use super::reconcile::{ReconcileOptions, Reconciler};
use super::result::ReconcileReport;
use crate::client::{ScaleGateway, TestManagement};
use crate::config::{SessionOptions, Settings, StatusIds};

struct Remote {
    api: Arc<dyn TestManagement>,
    statuses: StatusIds,
    folder_name: Option<String>,
}

pub struct SyncSession {
    options: SessionOptions,
    collector: OutcomeCollector,
    remote: Option<Remote>,
}

impl SyncSession {
    /// A session that only collects outcomes
    pub fn disabled() -> Self {
        Self {
            options: SessionOptions::default(),
            collector: OutcomeCollector::new(),
            remote: None,
        }
    }

    /// Build a session from CLI options, reading the environment only when
    /// the integration is enabled. Configuration errors surface here, before
    /// any test runs.
    pub fn configure(options: SessionOptions) -> Result<Self> {
        if !options.enabled {
            return Ok(Self {
                options,
                ..Self::disabled()
            });
        }
        let settings = Settings::from_env()?;
        Self::from_settings(options, &settings)
    }

    pub fn from_settings(options: SessionOptions, settings: &Settings) -> Result<Self> {
        let gateway = ScaleGateway::from_settings(settings)?;
        info!(
            "Results will be synced to project {} ({}) at {}",
            settings.project_key, settings.project_id, settings.base_url
        );
        Ok(Self::with_remote(
            options,
            Arc::new(gateway),
            settings.statuses,
            settings.folder_name.clone(),
        ))
    }

    pub fn with_remote(
        options: SessionOptions,
        api: Arc<dyn TestManagement>,
        statuses: StatusIds,
        folder_name: Option<String>,
    ) -> Self {
        Self {
            options,
            collector: OutcomeCollector::new(),
            remote: Some(Remote {
                api,
                statuses,
                folder_name,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled && self.remote.is_some()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn collector(&self) -> &OutcomeCollector {
        &self.collector
    }

    /// Feed one runner event. Returns `true` once the session has finished.
    pub fn handle(&mut self, event: &RunnerEvent) -> bool {
        match event {
            RunnerEvent::TestFinished {
                name,
                phase,
                outcome,
            } => {
                self.on_test_finished(name, *phase, (*outcome).into());
                false
            }
            RunnerEvent::SessionFinished => true,
        }
    }

    /// Only the call phase is recorded; setup and teardown reports are ignored
    pub fn on_test_finished(&mut self, name: &str, phase: Phase, outcome: Outcome) {
        if phase != Phase::Call {
            return;
        }
        match self.collector.record(name, outcome) {
            Some(key) => debug!("{} -> {} ({})", name, key, outcome),
            None => debug!("{} has no test-case key, ignored", name),
        }
    }

    /// Reconcile the collected outcomes. Consumes the session; returns `None`
    /// when the integration is disabled. An enabled session always gets its
    /// cycle, even when no keyed test ran.
    pub async fn finish(self) -> Result<Option<ReconcileReport>> {
        let Some(remote) = self.remote.filter(|_| self.options.enabled) else {
            return Ok(None);
        };
        if self.collector.is_empty() {
            info!("No tests with a test-case key were executed, the cycle stays empty");
        }

        let reconciler = Reconciler::new(
            remote.api.as_ref(),
            ReconcileOptions {
                cycle_name: self.options.cycle_name.clone(),
                folder_name: remote.folder_name.clone(),
            },
            remote.statuses,
        );
        reconciler.run(&self.collector).await.map(Some)
    }
}
