//! JSON file backed rule repository

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::RuleStore;
use crate::infrastructure::json::{self, BranchLabels};
use crate::infrastructure::traits::{FileSystem, LoadedStore, RuleRepository};

/// Keeps the rule store in a single JSON document.
pub struct JsonRuleRepository {
    path: PathBuf,
    labels: BranchLabels,
    backup_malformed: bool,
    fs: Arc<dyn FileSystem>,
}

impl JsonRuleRepository {
    pub fn new(path: impl Into<PathBuf>, labels: BranchLabels, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            labels,
            backup_malformed: true,
            fs,
        }
    }

    /// Whether an unparsable rule file is copied to `<file>.bak` before being replaced.
    pub fn with_backup(mut self, backup_malformed: bool) -> Self {
        self.backup_malformed = backup_malformed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    /// Strict load: a malformed file is an error.
    pub fn load_strict(&self) -> ApplicationResult<RuleStore> {
        if !self.fs.exists(&self.path) {
            debug!("rule file {} missing, starting empty", self.path.display());
            return Ok(RuleStore::new());
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .with_path_context("read rule file", &self.path)?;
        json::parse_store(&content, &self.labels).map_err(|e| ApplicationError::MalformedRuleFile {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl RuleRepository for JsonRuleRepository {
    fn load(&self) -> ApplicationResult<LoadedStore> {
        match self.load_strict() {
            Ok(store) => {
                debug!("loaded {} locations from {}", store.len(), self.path.display());
                Ok(LoadedStore {
                    store,
                    recovered: false,
                })
            }
            Err(ApplicationError::MalformedRuleFile { path, message }) => {
                warn!("malformed rule file {}: {}; continuing with no rules", path.display(), message);
                if self.backup_malformed {
                    let backup = self.backup_path();
                    self.fs
                        .copy(&self.path, &backup)
                        .with_path_context("back up malformed rule file", &backup)?;
                    warn!("kept unreadable rules in {}", backup.display());
                }
                Ok(LoadedStore {
                    store: RuleStore::new(),
                    recovered: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, store: &RuleStore) -> ApplicationResult<()> {
        let value = json::encode_store(store, &self.labels);
        let content = json::to_pretty_string(&value).map_err(|e| ApplicationError::OperationFailed {
            context: format!("serialize rules for {}", self.path.display()),
            source: Box::new(e),
        })?;
        self.fs
            .ensure_parent(&self.path)
            .with_path_context("create rule directory", &self.path)?;
        self.fs
            .write_atomic(&self.path, &content)
            .with_path_context("write rule file", &self.path)?;
        info!("saved {} locations to {}", store.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
