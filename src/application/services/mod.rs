//! Application services

pub mod diagnosis;
pub mod report;

pub use diagnosis::{DiagnosisService, PromptedAnswers, SessionOutcome};
pub use report::{LocationTable, ReportService};
