//! Events delivered by the host test runner

use serde::{Deserialize, Serialize};

use super::collector::Outcome;

/// Runner phase a report belongs to; only `Call` carries a test outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    #[default]
    Call,
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerOutcome {
    Passed,
    Failed,
    Skipped,
}

impl From<RunnerOutcome> for Outcome {
    /// Anything that did not pass counts as a failure
    fn from(outcome: RunnerOutcome) -> Self {
        match outcome {
            RunnerOutcome::Passed => Outcome::Pass,
            RunnerOutcome::Failed | RunnerOutcome::Skipped => Outcome::Fail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    TestFinished {
        name: String,
        #[serde(default)]
        phase: Phase,
        outcome: RunnerOutcome,
    },
    SessionFinished,
}

impl RunnerEvent {
    pub fn call(name: impl Into<String>, outcome: RunnerOutcome) -> Self {
        RunnerEvent::TestFinished {
            name: name.into(),
            phase: Phase::Call,
            outcome,
        }
    }

    /// Parse one JSON line; blank lines yield `None`
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }
}
