//! Outcome collector
//!
//! Builds two views of a session's executions:
//! - the ordered record of every executed variant
//! - the folded status per logical test-case key, where a single failing
//!   variant makes the whole key fail

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Logical test-case key embedded in a test's qualified name
static CASE_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"T\d+").unwrap());

/// Extract the first `T<digits>` key from a qualified test name
pub fn extract_case_key(test_name: &str) -> Option<&str> {
    CASE_KEY_REGEX.find(test_name).map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    /// Name of this outcome in the remote status catalog
    pub fn catalog_name(self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        }
    }

    /// Fail-dominant merge
    pub fn merge(self, other: Outcome) -> Outcome {
        if self == Outcome::Fail || other == Outcome::Fail {
            Outcome::Fail
        } else {
            Outcome::Pass
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_name())
    }
}

/// One concrete execution of a test (a parameterized test yields several)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantRecord {
    pub test_name: String,
    pub key: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeCollector {
    records: Vec<VariantRecord>,
    folded: HashMap<String, Outcome>,
    seen_keys: Vec<String>,
}

impl OutcomeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished test call. Returns the extracted key, or `None` when
    /// the test name carries no key and the event was ignored.
    pub fn record(&mut self, test_name: &str, outcome: Outcome) -> Option<&str> {
        let key = extract_case_key(test_name)?.to_string();

        self.records.push(VariantRecord {
            test_name: test_name.to_string(),
            key: key.clone(),
            outcome,
        });

        self.folded
            .entry(key.clone())
            .and_modify(|folded| *folded = folded.merge(outcome))
            .or_insert(outcome);

        if !self.seen_keys.contains(&key) {
            self.seen_keys.push(key);
        }

        self.records.last().map(|r| r.key.as_str())
    }

    /// Every keyed execution, in execution order
    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }

    pub fn folded(&self) -> &HashMap<String, Outcome> {
        &self.folded
    }

    pub fn folded_status(&self, key: &str) -> Option<Outcome> {
        self.folded.get(key).copied()
    }

    /// Keys in the order they were first seen
    pub fn seen_keys(&self) -> &[String] {
        &self.seen_keys
    }

    /// Per-variant outcomes of one key, in execution order
    pub fn outcomes_for(&self, key: &str) -> Vec<Outcome> {
        self.records
            .iter()
            .filter(|r| r.key == key)
            .map(|r| r.outcome)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
