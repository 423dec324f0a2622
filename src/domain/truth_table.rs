//! Truth-table derivation over a tree's distinct questions.
//!
//! Every boolean assignment over the sorted question list is evaluated
//! against the tree. The outcome only says whether *some* diagnosis is
//! reachable; which one is deliberately collapsed away. Rows whose extra
//! answers never influence the walk are kept, so the table has exactly
//! `2^k` rows for `k` questions.

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::RuleNode;
use crate::domain::traversal::Assignment;

/// One assignment and whether it reaches a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthRow {
    /// Answers in the same order as [`TruthTable::questions`].
    pub answers: Vec<bool>,
    pub outcome: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    /// Sorted, distinct question texts (the column order).
    pub questions: Vec<String>,
    pub rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Derive the table for `root`.
    ///
    /// Rows are ordered lexicographically over the sorted questions, the
    /// first question varying slowest and `yes` coming before `no`.
    /// Fails when more than `limit` distinct questions would be enumerated.
    pub fn derive(root: &RuleNode, limit: usize) -> DomainResult<Self> {
        let questions: Vec<String> = root.questions().into_iter().collect();
        if questions.len() > limit {
            return Err(DomainError::TooManyQuestions {
                count: questions.len(),
                limit,
            });
        }

        let combinations: Vec<Vec<bool>> = if questions.is_empty() {
            vec![Vec::new()]
        } else {
            std::iter::repeat([true, false])
                .take(questions.len())
                .multi_cartesian_product()
                .collect()
        };

        let rows = combinations
            .into_iter()
            .map(|answers| {
                let assignment: Assignment =
                    questions.iter().cloned().zip(answers.iter().copied()).collect();
                TruthRow {
                    outcome: evaluate(root, &assignment),
                    answers,
                }
            })
            .collect();

        Ok(Self { questions, rows })
    }

    /// Row as a question → answer map.
    pub fn assignment(&self, row: &TruthRow) -> Assignment {
        self.questions
            .iter()
            .cloned()
            .zip(row.answers.iter().copied())
            .collect()
    }

    pub fn reachable_count(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whether a diagnosis is reachable under `assignment`.
///
/// A question without an answer in the assignment makes the row unreachable.
pub fn evaluate(root: &RuleNode, assignment: &Assignment) -> bool {
    let mut current = root;
    loop {
        match current {
            RuleNode::Question { text, yes, no } => match assignment.get(text) {
                Some(true) => current = yes,
                Some(false) => current = no,
                None => return false,
            },
            RuleNode::Diagnosis(text) => return !text.is_empty(),
            RuleNode::Empty => return false,
        }
    }
}
