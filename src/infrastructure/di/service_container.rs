//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::services::{DiagnosisService, ReportService};
use crate::config::Settings;
use crate::infrastructure::repository::JsonRuleRepository;
use crate::infrastructure::traits::{
    FileSystem, Prompter, RealFileSystem, RuleRepository, TerminalPrompter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Operator prompts
    pub prompter: Arc<dyn Prompter>,

    /// Rule persistence
    pub repo: Arc<dyn RuleRepository>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(TerminalPrompter))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        let repo = JsonRuleRepository::new(
            settings.rules_file.clone(),
            settings.branch_labels(),
            Arc::clone(&fs),
        )
        .with_backup(settings.backup_malformed);
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            prompter,
            repo: Arc::new(repo),
        }
    }

    pub fn rules_file(&self) -> PathBuf {
        self.settings.rules_file.clone()
    }

    pub fn diagnosis_service(&self) -> DiagnosisService {
        self.diagnosis_service_with(self.settings.offer_extension)
    }

    pub fn diagnosis_service_with(&self, offer_extension: bool) -> DiagnosisService {
        DiagnosisService::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.prompter),
            offer_extension,
        )
    }

    pub fn report_service(&self) -> ReportService {
        ReportService::new(Arc::clone(&self.repo), self.settings.max_table_questions)
    }
}
