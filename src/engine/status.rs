//! Status catalog: immutable name -> id table for one session

use std::collections::HashMap;

use super::collector::Outcome;
use super::error::{Result, SyncError};
use crate::client::StatusItem;
use crate::config::StatusIds;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCatalog {
    ids: HashMap<String, u64>,
}

impl StatusCatalog {
    /// Build from the remote catalog. Names are upper-cased; the first entry
    /// for a name wins.
    pub fn from_items(items: &[StatusItem]) -> Self {
        let mut ids = HashMap::new();
        for item in items {
            ids.entry(item.name.trim().to_uppercase()).or_insert(item.id);
        }
        Self { ids }
    }

    pub fn from_configured(statuses: &StatusIds) -> Self {
        Self::default().with_fallback(statuses)
    }

    /// Fill names missing from the catalog with configured ids
    pub fn with_fallback(mut self, statuses: &StatusIds) -> Self {
        for (name, id) in statuses.entries() {
            self.ids.entry(name.to_string()).or_insert(id);
        }
        self
    }

    pub fn id(&self, name: &str) -> Option<u64> {
        self.ids.get(&name.to_uppercase()).copied()
    }

    pub fn id_for(&self, outcome: Outcome) -> Result<u64> {
        self.id(outcome.catalog_name())
            .ok_or_else(|| SyncError::UnknownStatus(outcome.catalog_name().to_string()))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, name: &str) -> StatusItem {
        StatusItem {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_catalog_from_remote_items() {
        let catalog = StatusCatalog::from_items(&[
            item(3237, "Not Executed"),
            item(3238, "Pass"),
            item(3239, "Fail"),
            item(9999, "pass"),
        ]);

        assert_eq!(catalog.id_for(Outcome::Pass).unwrap(), 3238);
        assert_eq!(catalog.id_for(Outcome::Fail).unwrap(), 3239);
        assert_eq!(catalog.id("not executed"), Some(3237));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_remote_ids_win_over_configured() {
        let catalog =
            StatusCatalog::from_items(&[item(1, "PASS")]).with_fallback(&StatusIds::new(10, 20));

        assert_eq!(catalog.id_for(Outcome::Pass).unwrap(), 1);
        assert_eq!(catalog.id_for(Outcome::Fail).unwrap(), 20);
    }

    #[test]
    fn test_unknown_outcome() {
        let catalog = StatusCatalog::from_items(&[item(1, "PASS")]);
        let err = catalog.id_for(Outcome::Fail).unwrap_err();
        assert!(matches!(err, SyncError::UnknownStatus(name) if name == "FAIL"));
    }
}
