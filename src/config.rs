//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/symptree/symptree.toml`
//! 3. Local config: `<project_dir>/.symptree.toml`
//! 4. Environment variables: `SYMPTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::infrastructure::json::BranchLabels;

/// Default rule file name.
pub const DEFAULT_RULES_FILE: &str = "reglas_dolores.json";

/// Unified configuration for symptree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Rule file (default: <data_dir>/reglas_dolores.json)
    pub rules_file: PathBuf,
    /// Key of the `yes` branch in the rule file
    pub yes_label: String,
    /// Key of the `no` branch in the rule file
    pub no_label: String,
    /// Largest question count a truth table is derived for
    pub max_table_questions: usize,
    /// Offer to add a question after an unresolved diagnosis
    pub offer_extension: bool,
    /// Copy an unreadable rule file to `<file>.bak` before starting empty
    pub backup_malformed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            yes_label: "sí".into(),
            no_label: "no".into(),
            max_table_questions: 16,
            offer_extension: true,
            backup_malformed: true,
        }
    }
}

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub rules_file: Option<PathBuf>,
    pub yes_label: Option<String>,
    pub no_label: Option<String>,
    pub max_table_questions: Option<usize>,
    pub offer_extension: Option<bool>,
    pub backup_malformed: Option<bool>,
}

fn default_rules_file() -> PathBuf {
    ProjectDirs::from("", "", "symptree")
        .map(|dirs| dirs.data_dir().join(DEFAULT_RULES_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_FILE))
}

/// Get the XDG config directory for symptree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "symptree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("symptree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".symptree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    pub fn branch_labels(&self) -> BranchLabels {
        BranchLabels::new(self.yes_label.clone(), self.no_label.clone())
    }

    /// Overlay wins where it specifies a value.
    ///
    /// A relative `rules_file` in a local config is taken relative to `base`.
    fn merge_with(&self, overlay: &RawSettings, base: Option<&Path>) -> Self {
        let rules_file = overlay.rules_file.as_ref().map(|p| {
            let p = expand_path(p);
            match base {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p,
            }
        });
        Self {
            rules_file: rules_file.unwrap_or_else(|| self.rules_file.clone()),
            yes_label: overlay
                .yes_label
                .clone()
                .unwrap_or_else(|| self.yes_label.clone()),
            no_label: overlay
                .no_label
                .clone()
                .unwrap_or_else(|| self.no_label.clone()),
            max_table_questions: overlay
                .max_table_questions
                .unwrap_or(self.max_table_questions),
            offer_extension: overlay.offer_extension.unwrap_or(self.offer_extension),
            backup_malformed: overlay.backup_malformed.unwrap_or(self.backup_malformed),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.symptree.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw, None);
            }
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw, Some(dir));
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.validate()?;
        Ok(current)
    }

    /// Apply SYMPTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("SYMPTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("rules_file") {
            settings.rules_file = expand_path(Path::new(&val));
        }
        if let Ok(val) = config.get_string("yes_label") {
            settings.yes_label = val;
        }
        if let Ok(val) = config.get_string("no_label") {
            settings.no_label = val;
        }
        if let Ok(val) = config.get_string("max_table_questions") {
            settings.max_table_questions = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("SYMPTREE_MAX_TABLE_QUESTIONS: {e}"),
            })?;
        }
        if let Ok(val) = config.get_bool("offer_extension") {
            settings.offer_extension = val;
        }
        if let Ok(val) = config.get_bool("backup_malformed") {
            settings.backup_malformed = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.yes_label.trim().is_empty() || self.no_label.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "yes_label and no_label must not be blank".into(),
            });
        }
        if self.yes_label == self.no_label {
            return Err(ApplicationError::Config {
                message: format!("yes_label and no_label are both '{}'", self.yes_label),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# symptree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/symptree/symptree.toml
#   Local:  <project_dir>/.symptree.toml
#   Env:    SYMPTREE_* environment variables

# Rule file (relative paths in a local config resolve against its directory)
# rules_file = "reglas_dolores.json"

# Branch keys written to the rule file ("yes", "sí" and "si" are always read)
# yes_label = "sí"
# no_label = "no"

# Refuse truth tables over more distinct questions than this
# max_table_questions = 16

# Offer to add a question when no diagnosis is found
# offer_extension = true

# Copy an unreadable rule file to <rules_file>.bak before starting empty
# backup_malformed = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_spanish_labels_and_file_name() {
        let settings = Settings::default();
        assert_eq!(settings.yes_label, "sí");
        assert_eq!(settings.no_label, "no");
        assert!(settings.rules_file.ends_with(DEFAULT_RULES_FILE));
        assert!(settings.offer_extension);
    }

    #[test]
    fn given_overlay_when_merging_then_specified_fields_win() {
        let base = Settings::default();
        let overlay = RawSettings {
            rules_file: Some(PathBuf::from("rules.json")),
            yes_label: Some("yes".into()),
            max_table_questions: Some(4),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay, Some(Path::new("/srv/clinic")));

        assert_eq!(merged.rules_file, PathBuf::from("/srv/clinic/rules.json"));
        assert_eq!(merged.yes_label, "yes");
        assert_eq!(merged.no_label, "no");
        assert_eq!(merged.max_table_questions, 4);
        assert_eq!(merged.backup_malformed, base.backup_malformed);
    }

    #[test]
    fn given_absolute_rules_file_when_merging_then_kept() {
        let overlay = RawSettings {
            rules_file: Some(PathBuf::from("/data/reglas.json")),
            ..RawSettings::default()
        };
        let merged = Settings::default().merge_with(&overlay, Some(Path::new("/srv")));
        assert_eq!(merged.rules_file, PathBuf::from("/data/reglas.json"));
    }

    #[test]
    fn given_identical_labels_when_validating_then_config_error() {
        let settings = Settings {
            yes_label: "no".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_template_when_parsed_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.rules_file.is_none());
    }
}
