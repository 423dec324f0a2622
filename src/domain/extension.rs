//! Incremental extension: grafting a new question at the end of a recorded path.

use tracing::warn;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{RuleNode, Step};

/// What happened at the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// New question node attached at an empty branch.
    Attached,
    /// Existing node with the same question got its empty `yes` branch filled.
    Refined,
    /// The same question and diagnosis were already there.
    Unchanged,
}

/// Result of a successful extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendReport {
    pub attachment: Attachment,
    /// Path questions that were missing from the tree and had to be grafted.
    pub healed: Vec<String>,
}

impl ExtendReport {
    pub fn changed(&self) -> bool {
        self.attachment != Attachment::Unchanged || !self.healed.is_empty()
    }
}

/// Extend `root` so that replaying `path` reaches `question`, whose `yes`
/// branch is `diagnosis` and whose `no` branch is empty.
///
/// Works on a copy and only commits it when every step succeeded, so `root`
/// is untouched on error. Existing questions and diagnoses are never overwritten.
pub fn extend(
    root: &mut RuleNode,
    location: &str,
    path: &[Step],
    question: &str,
    diagnosis: &str,
) -> DomainResult<ExtendReport> {
    let question = question.trim();
    let diagnosis = diagnosis.trim();
    if question.is_empty() {
        return Err(DomainError::IncompleteAuthoring("question"));
    }
    if diagnosis.is_empty() {
        return Err(DomainError::IncompleteAuthoring("diagnosis"));
    }
    if path.iter().any(|step| step.question == question) {
        return Err(DomainError::QuestionOnPath(question.to_string()));
    }

    let mut draft = root.clone();
    let report = graft(&mut draft, location, path, question, diagnosis)?;
    if report.changed() {
        *root = draft;
    }
    Ok(report)
}

fn graft(
    root: &mut RuleNode,
    location: &str,
    path: &[Step],
    question: &str,
    diagnosis: &str,
) -> DomainResult<ExtendReport> {
    let stale = |depth: usize, reason: String| DomainError::StaleTreePath {
        location: location.to_string(),
        depth,
        reason,
    };

    let mut healed = Vec::new();
    let mut current = root;

    for (depth, step) in path.iter().enumerate() {
        if current.is_empty() {
            warn!(
                location,
                depth,
                question = %step.question,
                "recorded path question missing from tree, grafting it"
            );
            *current = RuleNode::question(step.question.clone());
            healed.push(step.question.clone());
        }
        match &*current {
            RuleNode::Diagnosis(existing) => {
                return Err(stale(
                    depth,
                    format!("found diagnosis '{}' where '{}' was asked", existing, step.question),
                ));
            }
            RuleNode::Question { text, .. } if *text != step.question => {
                return Err(stale(
                    depth,
                    format!("found question '{}' where '{}' was asked", text, step.question),
                ));
            }
            _ => {}
        }
        current = current
            .branch_mut(step.answer)
            .ok_or_else(|| stale(depth, "path ends on a leaf".to_string()))?;
    }

    let depth = path.len();
    let attachment = match &*current {
        RuleNode::Empty => Attachment::Attached,
        RuleNode::Question { text, yes, .. } if text == question => match yes.as_ref() {
            RuleNode::Empty => Attachment::Refined,
            RuleNode::Diagnosis(existing) if existing == diagnosis => Attachment::Unchanged,
            RuleNode::Diagnosis(existing) => {
                return Err(stale(
                    depth,
                    format!("'{}' already leads to diagnosis '{}'", question, existing),
                ));
            }
            RuleNode::Question { text: next, .. } => {
                return Err(stale(
                    depth,
                    format!("'{}' already continues with question '{}'", question, next),
                ));
            }
        },
        RuleNode::Question { text, .. } => {
            return Err(stale(depth, format!("frontier already holds question '{}'", text)));
        }
        RuleNode::Diagnosis(existing) => {
            return Err(stale(depth, format!("frontier already holds diagnosis '{}'", existing)));
        }
    };

    match attachment {
        Attachment::Attached => *current = RuleNode::question_with_diagnosis(question, diagnosis),
        Attachment::Refined => {
            if let Some(yes) = current.branch_mut(true) {
                *yes = RuleNode::diagnosis(diagnosis);
            }
        }
        Attachment::Unchanged => {}
    }

    Ok(ExtendReport { attachment, healed })
}
