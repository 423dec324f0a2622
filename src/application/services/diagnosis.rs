//! Diagnosis session service
//!
//! Drives one operator session: look up the location, walk its tree with
//! prompted answers, and offer to author rules where none match. Every
//! successful mutation is saved before the session returns.

use std::io;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    AnswerSource, DomainError, DomainResult, ExtendReport, Location, Resolution, RuleNode,
    RuleStore, Step,
};
use crate::infrastructure::traits::{Prompter, RuleRepository};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A diagnosis leaf was reached.
    Diagnosed { diagnosis: String, path: Vec<Step> },
    /// A new location was registered with its first question.
    Registered { location: Location },
    /// A question was added at the end of the walked path.
    Extended { path: Vec<Step>, report: ExtendReport },
    /// No diagnosis and no extension offered.
    Unresolved { path: Vec<Step> },
    /// The operator declined to add rules.
    Declined,
    /// Authoring was started but a required input was left blank.
    Abandoned,
}

/// Adapts a [`Prompter`] into an [`AnswerSource`].
///
/// A prompter I/O failure stops the walk; the failure is kept for
/// [`PromptedAnswers::take_failure`].
pub struct PromptedAnswers<'a> {
    prompter: &'a dyn Prompter,
    failure: Option<(String, io::Error)>,
}

impl<'a> PromptedAnswers<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self {
            prompter,
            failure: None,
        }
    }

    /// The question whose prompt failed, with the I/O error.
    pub fn take_failure(&mut self) -> Option<(String, io::Error)> {
        self.failure.take()
    }
}

impl AnswerSource for PromptedAnswers<'_> {
    fn ask(&mut self, question: &str) -> DomainResult<bool> {
        match self.prompter.confirm(question) {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) => Err(DomainError::AnswerCancelled(question.to_string())),
            Err(e) => {
                warn!("reading answer for '{}' failed: {}", question, e);
                self.failure = Some((question.to_string(), e));
                Err(DomainError::AnswerCancelled(question.to_string()))
            }
        }
    }
}

/// Service running diagnosis sessions against a rule repository.
pub struct DiagnosisService {
    repo: Arc<dyn RuleRepository>,
    prompter: Arc<dyn Prompter>,
    offer_extension: bool,
}

impl DiagnosisService {
    pub fn new(
        repo: Arc<dyn RuleRepository>,
        prompter: Arc<dyn Prompter>,
        offer_extension: bool,
    ) -> Self {
        Self {
            repo,
            prompter,
            offer_extension,
        }
    }

    /// Load the rule store, telling the operator when the file had to be discarded.
    pub fn load(&self) -> ApplicationResult<RuleStore> {
        let loaded = self.repo.load()?;
        if loaded.recovered {
            self.prompter.notify(&format!(
                "Rule file {} could not be read; starting with no rules.",
                self.repo.location()
            ));
        }
        Ok(loaded.store)
    }

    /// Full interactive session for `raw_location`.
    ///
    /// With extension disabled nothing is offered: an unregistered location
    /// ends `Unresolved` with an empty path.
    #[instrument(skip(self))]
    pub fn diagnose(&self, raw_location: &str) -> ApplicationResult<SessionOutcome> {
        let location = Location::parse(raw_location)?;
        let mut store = self.load()?;

        if !store.contains(&location) {
            debug!(%location, "location not registered");
            if !self.offer_extension {
                return Ok(SessionOutcome::Unresolved { path: Vec::new() });
            }
            let offer = format!("Location '{}' is not registered. Add it?", location);
            if !self.confirm(&offer)? {
                return Ok(SessionOutcome::Declined);
            }
            return self.author(&mut store, &location, Vec::new(), true);
        }

        let mut answers = PromptedAnswers::new(self.prompter.as_ref());
        let resolution = match store.resolve(&location, &mut answers) {
            Ok(resolution) => resolution,
            Err(e) => {
                return Err(match answers.take_failure() {
                    Some((question, io_err)) => prompt_err(&question, io_err),
                    None => e.into(),
                })
            }
        };
        self.conclude(&mut store, &location, resolution)
    }

    /// Session with answers from `answers` instead of the prompter.
    ///
    /// An unresolved walk only offers extension when extension is enabled.
    #[instrument(skip(self, answers))]
    pub fn diagnose_with(
        &self,
        raw_location: &str,
        answers: &mut dyn AnswerSource,
    ) -> ApplicationResult<SessionOutcome> {
        let location = Location::parse(raw_location)?;
        let mut store = self.load()?;
        let resolution = store.resolve(&location, answers)?;
        self.conclude(&mut store, &location, resolution)
    }

    fn conclude(
        &self,
        store: &mut RuleStore,
        location: &Location,
        resolution: Resolution,
    ) -> ApplicationResult<SessionOutcome> {
        match resolution {
            Resolution::Diagnosis { text, path } => {
                info!(%location, diagnosis = %text, "diagnosed");
                Ok(SessionOutcome::Diagnosed {
                    diagnosis: text,
                    path,
                })
            }
            Resolution::Unresolved { path, .. } => {
                debug!(%location, steps = path.len(), "no diagnosis reached");
                if !self.offer_extension {
                    return Ok(SessionOutcome::Unresolved { path });
                }
                if !self.confirm("No matching diagnosis found. Add a new one?")? {
                    return Ok(SessionOutcome::Declined);
                }
                // A location without any question yet gets its first one
                let registering = store.tree(location).map_or(true, RuleNode::is_empty);
                self.author(store, location, path, registering)
            }
        }
    }

    /// Prompt for a question and its `yes` diagnosis, graft them, and save.
    fn author(
        &self,
        store: &mut RuleStore,
        location: &Location,
        path: Vec<Step>,
        registering: bool,
    ) -> ApplicationResult<SessionOutcome> {
        let question_prompt = if registering {
            format!("First question for '{}'", location)
        } else {
            "New question".to_string()
        };
        let Some(question) = self.input(&question_prompt)? else {
            return Ok(SessionOutcome::Abandoned);
        };
        let Some(diagnosis) = self.input("Diagnosis when the answer is 'yes'")? else {
            return Ok(SessionOutcome::Abandoned);
        };

        let report = match self.extend(store, location, &path, &question, &diagnosis) {
            Ok(report) => report,
            Err(ApplicationError::Domain(DomainError::IncompleteAuthoring(_))) => {
                return Ok(SessionOutcome::Abandoned)
            }
            Err(e) => return Err(e),
        };

        if registering {
            Ok(SessionOutcome::Registered {
                location: location.clone(),
            })
        } else {
            Ok(SessionOutcome::Extended { path, report })
        }
    }

    /// Graft `question`/`diagnosis` after `path` and persist the store.
    ///
    /// Nothing is saved when the extension fails or changes nothing.
    pub fn extend(
        &self,
        store: &mut RuleStore,
        location: &Location,
        path: &[Step],
        question: &str,
        diagnosis: &str,
    ) -> ApplicationResult<ExtendReport> {
        let report = store.extend(location, path, question, diagnosis)?;
        if !report.healed.is_empty() {
            warn!(
                %location,
                healed = ?report.healed,
                "rules for this location did not contain the whole recorded path"
            );
        }
        if report.changed() {
            self.repo.save(store)?;
        }
        Ok(report)
    }

    fn confirm(&self, message: &str) -> ApplicationResult<bool> {
        self.prompter
            .confirm(message)
            .map(|answer| answer.unwrap_or(false))
            .map_err(|e| prompt_err(message, e))
    }

    fn input(&self, message: &str) -> ApplicationResult<Option<String>> {
        self.prompter
            .input(message)
            .map(|text| text.filter(|t| !t.trim().is_empty()))
            .map_err(|e| prompt_err(message, e))
    }
}

fn prompt_err(message: &str, e: io::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: format!("prompt '{}'", message),
        source: Box::new(e),
    }
}
