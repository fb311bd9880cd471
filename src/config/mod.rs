//! Session configuration
//!
//! Two sources feed a sync session:
//! - `SessionOptions` come from the runner's command line (enable switch and
//!   cycle name)
//! - `Settings` come from the environment (optionally a `.env` file) and are
//!   validated eagerly, so every missing or malformed variable is reported at
//!   once before any request is made

use std::env;
use std::fmt;

/// Cycle name used when the runner does not supply one
pub const DEFAULT_CYCLE_NAME: &str = "Test Run Cycle";

pub const TOKEN_VAR: &str = "JIRA_TOKEN";
pub const BASE_URL_VAR: &str = "JIRA_URL";
pub const PROJECT_ID_VAR: &str = "JIRA_PROJECT_ID";
pub const PROJECT_KEY_VAR: &str = "JIRA_PROJECT_NAME";
pub const PASS_VAR: &str = "PASS";
pub const FAIL_VAR: &str = "FAIL";
pub const NOT_EXECUTED_VAR: &str = "NOT_EXECUTED";
pub const IN_PROGRESS_VAR: &str = "IN_PROGRESS";
pub const BLOCKED_VAR: &str = "BLOCKED";
pub const FOLDER_NAME_VAR: &str = "FOLDER_NAME";

/// Options supplied by the runner's CLI flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Whether results are pushed to the remote service at all
    pub enabled: bool,
    /// Display name of the cycle created at session end
    pub cycle_name: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            cycle_name: DEFAULT_CYCLE_NAME.to_string(),
        }
    }
}

impl SessionOptions {
    pub fn enabled(cycle_name: impl Into<String>) -> Self {
        Self {
            enabled: true,
            cycle_name: cycle_name.into(),
        }
    }
}

/// Numeric status ids configured for this project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIds {
    pub pass: u64,
    pub fail: u64,
    pub not_executed: Option<u64>,
    pub in_progress: Option<u64>,
    pub blocked: Option<u64>,
}

impl StatusIds {
    pub fn new(pass: u64, fail: u64) -> Self {
        Self {
            pass,
            fail,
            not_executed: None,
            in_progress: None,
            blocked: None,
        }
    }

    /// Configured ids as (catalog name, id) pairs
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        let mut entries = vec![("PASS", self.pass), ("FAIL", self.fail)];
        if let Some(id) = self.not_executed {
            entries.push(("NOT_EXECUTED", id));
        }
        if let Some(id) = self.in_progress {
            entries.push(("IN_PROGRESS", id));
        }
        if let Some(id) = self.blocked {
            entries.push(("BLOCKED", id));
        }
        entries
    }
}

/// Connection and project settings for the test-management service
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub token: String,
    pub base_url: String,
    pub project_id: u64,
    /// Short project name, used as the prefix of remote case keys
    pub project_key: String,
    pub statuses: StatusIds,
    /// Folder the cycle is filed under, created if it does not exist
    pub folder_name: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("project_key", &self.project_key)
            .field("statuses", &self.statuses)
            .field("folder_name", &self.folder_name)
            .finish()
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if
    /// one exists
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut report = ConfigError::default();
        let mut required = |name: &'static str| -> Option<String> {
            let value = lookup(name).map(|v| v.trim().to_string());
            match value {
                Some(v) if !v.is_empty() => Some(v),
                _ => {
                    report.missing.push(name.to_string());
                    None
                }
            }
        };

        let token = required(TOKEN_VAR);
        let base_url = required(BASE_URL_VAR);
        let project_id = required(PROJECT_ID_VAR);
        let project_key = required(PROJECT_KEY_VAR);
        let pass = required(PASS_VAR);
        let fail = required(FAIL_VAR);

        let project_id = project_id.and_then(|v| report.parse_id(PROJECT_ID_VAR, &v));
        let pass = pass.and_then(|v| report.parse_id(PASS_VAR, &v));
        let fail = fail.and_then(|v| report.parse_id(FAIL_VAR, &v));

        let mut optional_id = |name: &'static str| -> Option<u64> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .and_then(|v| report.parse_id(name, &v))
        };
        let not_executed = optional_id(NOT_EXECUTED_VAR);
        let in_progress = optional_id(IN_PROGRESS_VAR);
        let blocked = optional_id(BLOCKED_VAR);

        let folder_name = lookup(FOLDER_NAME_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        match (token, base_url, project_id, project_key, pass, fail) {
            (Some(token), Some(base_url), Some(project_id), Some(project_key), Some(pass), Some(fail))
                if report.is_empty() =>
            {
                Ok(Self {
                    token,
                    base_url: base_url.trim_end_matches('/').to_string(),
                    project_id,
                    project_key,
                    statuses: StatusIds {
                        pass,
                        fail,
                        not_executed,
                        in_progress,
                        blocked,
                    },
                    folder_name,
                })
            }
            _ => Err(report),
        }
    }
}

/// Every problem found while validating the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.summary())]
pub struct ConfigError {
    pub missing: Vec<String>,
    /// (variable, offending value)
    pub invalid: Vec<(String, String)>,
}

impl ConfigError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    /// One line naming every missing and malformed variable
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!(
                "missing required environment variables: {}",
                self.missing.join(", ")
            ));
        }
        if !self.invalid.is_empty() {
            let invalid: Vec<String> = self
                .invalid
                .iter()
                .map(|(name, value)| format!("{name}={value:?}"))
                .collect();
            parts.push(format!("expected numeric ids: {}", invalid.join(", ")));
        }
        parts.join("; ")
    }

    fn parse_id(&mut self, name: &str, value: &str) -> Option<u64> {
        match value.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                self.invalid.push((name.to_string(), value.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (TOKEN_VAR, "secret"),
            (BASE_URL_VAR, "https://jira.example.com/"),
            (PROJECT_ID_VAR, "10100"),
            (PROJECT_KEY_VAR, "PROJ"),
            (PASS_VAR, "3238"),
            (FAIL_VAR, "3239"),
        ]
    }

    #[test]
    fn test_default_session_options() {
        let options = SessionOptions::default();
        assert!(!options.enabled);
        assert_eq!(options.cycle_name, "Test Run Cycle");
    }

    #[test]
    fn test_load_complete_settings() {
        let settings = Settings::from_lookup(lookup_from(&complete_env())).unwrap();
        assert_eq!(settings.base_url, "https://jira.example.com");
        assert_eq!(settings.project_id, 10100);
        assert_eq!(settings.project_key, "PROJ");
        assert_eq!(settings.statuses, StatusIds::new(3238, 3239));
        assert!(settings.folder_name.is_none());
    }

    #[test]
    fn test_optional_values() {
        let mut env = complete_env();
        env.push((BLOCKED_VAR, "3240"));
        env.push((FOLDER_NAME_VAR, "Nightly"));
        let settings = Settings::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(settings.statuses.blocked, Some(3240));
        assert_eq!(settings.folder_name.as_deref(), Some("Nightly"));
        assert_eq!(settings.statuses.entries().len(), 3);
    }

    #[test]
    fn test_reports_every_missing_variable() {
        let err = Settings::from_lookup(lookup_from(&[(TOKEN_VAR, "secret"), (PASS_VAR, "")]))
            .unwrap_err();
        assert_eq!(
            err.missing,
            vec![BASE_URL_VAR, PROJECT_ID_VAR, PROJECT_KEY_VAR, PASS_VAR, FAIL_VAR]
        );
        let message = err.to_string();
        assert!(message.contains("JIRA_URL"));
        assert!(message.contains("FAIL"));
    }

    #[test]
    fn test_reports_non_numeric_ids() {
        let mut env = complete_env();
        env.retain(|(k, _)| *k != PASS_VAR);
        env.push((PASS_VAR, "passed"));
        env.push((BLOCKED_VAR, "x"));
        let err = Settings::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.missing.is_empty());
        assert_eq!(
            err.invalid,
            vec![
                (PASS_VAR.to_string(), "passed".to_string()),
                (BLOCKED_VAR.to_string(), "x".to_string())
            ]
        );
    }

    #[test]
    fn test_error_lists_missing_and_invalid_together() {
        let err = Settings::from_lookup(lookup_from(&[
            (TOKEN_VAR, "secret"),
            (PROJECT_ID_VAR, "ten"),
        ]))
        .unwrap_err();

        assert_eq!(err.to_string(), err.summary());
        assert_eq!(
            err.to_string(),
            "missing required environment variables: JIRA_URL, JIRA_PROJECT_NAME, PASS, FAIL; \
             expected numeric ids: JIRA_PROJECT_ID=\"ten\""
        );
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings::from_lookup(lookup_from(&complete_env())).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
