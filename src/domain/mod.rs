//! Domain layer: rule trees and the engine operating on them
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod extension;
pub mod location;
pub mod node;
pub mod store;
pub mod traversal;
pub mod truth_table;

pub use error::{DomainError, DomainResult};
pub use extension::{Attachment, ExtendReport};
pub use location::Location;
pub use node::{RuleNode, Step};
pub use store::RuleStore;
pub use traversal::{resolve, AnswerSource, Assignment, Resolution, ScriptedAnswers};
pub use truth_table::{evaluate, TruthRow, TruthTable};
