//! Rule store: every location's decision tree.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::extension::{self, ExtendReport};
use crate::domain::location::Location;
use crate::domain::node::{RuleNode, Step};
use crate::domain::traversal::{self, AnswerSource, Resolution};
use crate::domain::truth_table::TruthTable;

/// In-memory mapping from location to rule tree.
///
/// The store owns its trees; mutation goes through `&mut self` only, and
/// entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStore {
    rules: BTreeMap<Location, RuleNode>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.rules.contains_key(location)
    }

    pub fn tree(&self, location: &Location) -> Option<&RuleNode> {
        self.rules.get(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.rules.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Location, &RuleNode)> {
        self.rules.iter()
    }

    /// Put a tree under `location` as loaded from storage.
    ///
    /// Authoring goes through [`RuleStore::extend`]; this is for rebuilding a store.
    pub fn insert(&mut self, location: Location, root: RuleNode) {
        self.rules.insert(location, root);
    }

    /// Resolve `location` with answers from `answers`.
    ///
    /// An unregistered location resolves to `Unresolved` with an empty path.
    pub fn resolve(
        &self,
        location: &Location,
        answers: &mut dyn AnswerSource,
    ) -> DomainResult<Resolution> {
        match self.rules.get(location) {
            Some(root) => traversal::resolve(root, answers),
            None => Ok(Resolution::Unresolved {
                path: Vec::new(),
                frontier: RuleNode::Empty,
            }),
        }
    }

    /// Graft `question` (with `diagnosis` on its `yes` branch) at the end of `path`.
    ///
    /// Registers the location when it is new. On error neither the tree nor
    /// the set of locations changes.
    pub fn extend(
        &mut self,
        location: &Location,
        path: &[Step],
        question: &str,
        diagnosis: &str,
    ) -> DomainResult<ExtendReport> {
        debug!(%location, steps = path.len(), question, "extend");
        let mut root = self.rules.get(location).cloned().unwrap_or_default();
        let report = extension::extend(&mut root, location.as_str(), path, question, diagnosis)?;
        self.rules.insert(location.clone(), root);
        Ok(report)
    }

    pub fn questions(&self, location: &Location) -> DomainResult<Vec<String>> {
        self.rules
            .get(location)
            .map(|root| root.questions().into_iter().collect())
            .ok_or_else(|| DomainError::UnknownLocation(location.to_string()))
    }

    pub fn truth_table(&self, location: &Location, limit: usize) -> DomainResult<TruthTable> {
        let root = self
            .rules
            .get(location)
            .ok_or_else(|| DomainError::UnknownLocation(location.to_string()))?;
        TruthTable::derive(root, limit)
    }
}

impl FromIterator<(Location, RuleNode)> for RuleStore {
    fn from_iter<I: IntoIterator<Item = (Location, RuleNode)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
