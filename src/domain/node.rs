//! Rule tree nodes

use std::collections::BTreeSet;
use std::fmt;

/// One node of a location's decision tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleNode {
    /// Nothing defined yet; a place where new structure can be grafted.
    #[default]
    Empty,
    /// Terminal outcome. Never holds an empty string.
    Diagnosis(String),
    /// Yes/no question with both branches always present.
    Question {
        text: String,
        yes: Box<RuleNode>,
        no: Box<RuleNode>,
    },
}

impl RuleNode {
    /// Question node with both branches empty.
    pub fn question(text: impl Into<String>) -> Self {
        Self::Question {
            text: text.into(),
            yes: Box::new(Self::Empty),
            no: Box::new(Self::Empty),
        }
    }

    /// Question node whose `yes` branch holds a diagnosis and whose `no` branch is empty.
    pub fn question_with_diagnosis(text: impl Into<String>, diagnosis: impl Into<String>) -> Self {
        Self::Question {
            text: text.into(),
            yes: Box::new(Self::diagnosis(diagnosis)),
            no: Box::new(Self::Empty),
        }
    }

    /// Diagnosis leaf; a blank text collapses to `Empty`.
    pub fn diagnosis(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Diagnosis(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn question_text(&self) -> Option<&str> {
        match self {
            Self::Question { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Branch taken for `answer`, or `None` on leaves.
    pub fn branch(&self, answer: bool) -> Option<&RuleNode> {
        match self {
            Self::Question { yes, no, .. } => Some(if answer { yes } else { no }),
            _ => None,
        }
    }

    pub fn branch_mut(&mut self, answer: bool) -> Option<&mut RuleNode> {
        match self {
            Self::Question { yes, no, .. } => Some(if answer { yes } else { no }),
            _ => None,
        }
    }

    /// Distinct question texts anywhere in the tree.
    pub fn questions(&self) -> BTreeSet<String> {
        let mut questions = BTreeSet::new();
        self.collect_questions(&mut questions);
        questions
    }

    fn collect_questions(&self, acc: &mut BTreeSet<String>) {
        if let Self::Question { text, yes, no } = self {
            acc.insert(text.clone());
            yes.collect_questions(acc);
            no.collect_questions(acc);
        }
    }
}

/// One answered question on a traversal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub question: String,
    pub answer: bool,
}

impl Step {
    pub fn new(question: impl Into<String>, answer: bool) -> Self {
        Self {
            question: question.into(),
            answer,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.question, if self.answer { "yes" } else { "no" })
    }
}
