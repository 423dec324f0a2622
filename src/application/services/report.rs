//! Read-only views over the rule store: trees, question sets and truth tables.

use std::sync::Arc;

use tracing::debug;

use crate::application::ApplicationResult;
use crate::domain::{DomainError, Location, RuleNode, RuleStore, TruthTable};
use crate::infrastructure::traits::RuleRepository;

/// Truth table for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTable {
    pub location: Location,
    pub table: TruthTable,
}

pub struct ReportService {
    repo: Arc<dyn RuleRepository>,
    max_table_questions: usize,
}

impl ReportService {
    pub fn new(repo: Arc<dyn RuleRepository>, max_table_questions: usize) -> Self {
        Self {
            repo,
            max_table_questions,
        }
    }

    pub fn store(&self) -> ApplicationResult<RuleStore> {
        Ok(self.repo.load()?.store)
    }

    pub fn locations(&self) -> ApplicationResult<Vec<Location>> {
        Ok(self.store()?.locations().cloned().collect())
    }

    /// Trees for one location, or every location when `raw_location` is `None`.
    pub fn trees(&self, raw_location: Option<&str>) -> ApplicationResult<Vec<(Location, RuleNode)>> {
        let store = self.store()?;
        match raw_location {
            Some(raw) => {
                let location = Location::parse(raw)?;
                let tree = store
                    .tree(&location)
                    .cloned()
                    .ok_or_else(|| DomainError::UnknownLocation(location.to_string()))?;
                Ok(vec![(location, tree)])
            }
            None => Ok(store
                .iter()
                .map(|(location, tree)| (location.clone(), tree.clone()))
                .collect()),
        }
    }

    pub fn questions(&self, raw_location: &str) -> ApplicationResult<Vec<String>> {
        let location = Location::parse(raw_location)?;
        Ok(self.store()?.questions(&location)?)
    }

    /// Truth tables for one location, or every location when `raw_location` is `None`.
    pub fn truth_tables(&self, raw_location: Option<&str>) -> ApplicationResult<Vec<LocationTable>> {
        let store = self.store()?;
        let locations: Vec<Location> = match raw_location {
            Some(raw) => vec![Location::parse(raw)?],
            None => store.locations().cloned().collect(),
        };

        let mut tables = Vec::with_capacity(locations.len());
        for location in locations {
            let table = store.truth_table(&location, self.max_table_questions)?;
            debug!(
                %location,
                questions = table.questions.len(),
                rows = table.len(),
                "derived truth table"
            );
            tables.push(LocationTable { location, table });
        }
        Ok(tables)
    }
}
