//! Diagnosis resolution: walking a tree with answers supplied on demand.

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{RuleNode, Step};

/// Supplies one boolean answer per question.
///
/// Implementations decide how the answer is obtained: a terminal prompt, a
/// scripted list, a fixed assignment.
pub trait AnswerSource {
    /// Answer `question`; an error stops the traversal.
    fn ask(&mut self, question: &str) -> DomainResult<bool>;
}

impl<F> AnswerSource for F
where
    F: FnMut(&str) -> bool,
{
    fn ask(&mut self, question: &str) -> DomainResult<bool> {
        Ok(self(question))
    }
}

/// Fixed answers keyed by question text.
pub type Assignment = BTreeMap<String, bool>;

impl AnswerSource for Assignment {
    fn ask(&mut self, question: &str) -> DomainResult<bool> {
        self.get(question)
            .copied()
            .ok_or_else(|| DomainError::MissingAnswer(question.to_string()))
    }
}

/// Answers consumed in order, regardless of question.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    answers: VecDeque<bool>,
}

impl ScriptedAnswers {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl AnswerSource for ScriptedAnswers {
    fn ask(&mut self, question: &str) -> DomainResult<bool> {
        self.answers
            .pop_front()
            .ok_or_else(|| DomainError::MissingAnswer(question.to_string()))
    }
}

/// Outcome of walking a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A diagnosis leaf was reached.
    Diagnosis { text: String, path: Vec<Step> },
    /// An empty branch was reached; `frontier` is that branch.
    Unresolved { path: Vec<Step>, frontier: RuleNode },
}

impl Resolution {
    pub fn path(&self) -> &[Step] {
        match self {
            Self::Diagnosis { path, .. } | Self::Unresolved { path, .. } => path,
        }
    }

    pub fn diagnosis(&self) -> Option<&str> {
        match self {
            Self::Diagnosis { text, .. } => Some(text),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Diagnosis { .. })
    }
}

/// Walk `root`, asking each question on the active path exactly once.
///
/// Stops at the first diagnosis leaf on either branch, or at the first empty branch.
pub fn resolve(root: &RuleNode, answers: &mut dyn AnswerSource) -> DomainResult<Resolution> {
    let mut path = Vec::new();
    let mut current = root;

    loop {
        match current {
            RuleNode::Question { text, yes, no } => {
                let answer = answers.ask(text)?;
                trace!(question = %text, answer, "answered");
                path.push(Step::new(text.clone(), answer));
                current = if answer { yes } else { no };
            }
            RuleNode::Diagnosis(text) => {
                return Ok(Resolution::Diagnosis {
                    text: text.clone(),
                    path,
                });
            }
            RuleNode::Empty => {
                return Ok(Resolution::Unresolved {
                    path,
                    frontier: RuleNode::Empty,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fever_tree() -> RuleNode {
        RuleNode::question_with_diagnosis("fiebre?", "gripe")
    }

    #[test]
    fn given_yes_when_resolving_then_diagnosis() {
        let result = resolve(&fever_tree(), &mut |_: &str| true).unwrap();
        assert_eq!(result.diagnosis(), Some("gripe"));
        assert_eq!(result.path(), &[Step::new("fiebre?", true)]);
    }

    #[test]
    fn given_no_when_resolving_then_unresolved_with_path() {
        let result = resolve(&fever_tree(), &mut |_: &str| false).unwrap();
        assert_eq!(
            result,
            Resolution::Unresolved {
                path: vec![Step::new("fiebre?", false)],
                frontier: RuleNode::Empty,
            }
        );
    }

    #[test]
    fn given_empty_root_when_resolving_then_unresolved_without_asking() {
        let mut asked = 0;
        let result = resolve(&RuleNode::Empty, &mut |_: &str| {
            asked += 1;
            true
        })
        .unwrap();
        assert_eq!(asked, 0);
        assert!(result.path().is_empty());
        assert!(!result.is_resolved());
    }

    #[test]
    fn given_diagnosis_on_no_branch_when_resolving_then_terminal() {
        let tree = RuleNode::Question {
            text: "hinchado?".into(),
            yes: Box::new(RuleNode::Empty),
            no: Box::new(RuleNode::diagnosis("contractura")),
        };
        let mut answers = ScriptedAnswers::new([false, true, true]);
        let result = resolve(&tree, &mut answers).unwrap();
        assert_eq!(result.diagnosis(), Some("contractura"));
        assert_eq!(answers.remaining(), 2);
    }

    #[test]
    fn given_exhausted_script_when_resolving_then_missing_answer() {
        let mut answers = ScriptedAnswers::new([]);
        let err = resolve(&fever_tree(), &mut answers).unwrap_err();
        assert_eq!(err, DomainError::MissingAnswer("fiebre?".into()));
    }
}
