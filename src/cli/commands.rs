//! Command dispatch

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::SessionOutcome;
use crate::application::{ApplicationError, ApplicationResult};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{expand_path, global_config_path, local_config_path, Settings};
use crate::domain::{Attachment, DomainError, ExtendReport, Location, ScriptedAnswers, Step};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => config_command(cli, command),
        Some(command) => {
            let container = build_container(cli)?;
            dispatch(&container, command)
        }
        None => Err(CliError::Usage(
            "no command given, try 'symptree diagnose'".to_string(),
        )),
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine working directory", e))),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = project_dir(cli)?;
    let mut settings = Settings::load(Some(dir.as_path()))?;
    if let Some(rules_file) = &cli.rules_file {
        settings.rules_file = expand_path(rules_file);
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli)?))
}

fn dispatch(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    match command {
        Commands::Diagnose {
            location,
            answers,
            no_extend,
        } => diagnose(container, location.as_deref(), answers.as_deref(), *no_extend),
        Commands::Add {
            location,
            question,
            diagnosis,
            steps,
        } => add(container, location, steps, question, diagnosis),
        Commands::Tree { location } => tree(container, location.as_deref()),
        Commands::Map => map(container),
        Commands::Table { location } => table(container, location.as_deref()),
        Commands::Questions { location } => questions(container, location),
        Commands::List => list(container),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn diagnose(
    container: &ServiceContainer,
    location: Option<&str>,
    answers: Option<&[bool]>,
    no_extend: bool,
) -> CliResult<()> {
    if let Some(outcome) = run_session(container, location, answers, no_extend)? {
        report_outcome(&outcome);
    }
    Ok(())
}

/// One diagnosis session; `None` when the operator closed input at the location prompt.
fn run_session(
    container: &ServiceContainer,
    location: Option<&str>,
    answers: Option<&[bool]>,
    no_extend: bool,
) -> CliResult<Option<SessionOutcome>> {
    let offer_extension = container.settings.offer_extension && !no_extend && answers.is_none();
    let service = container.diagnosis_service_with(offer_extension);
    let session = |raw: &str| match answers {
        Some(answers) => {
            let mut scripted = ScriptedAnswers::new(answers.iter().copied());
            service.diagnose_with(raw, &mut scripted)
        }
        None => service.diagnose(raw),
    };

    match location {
        Some(location) => Ok(Some(session(location)?)),
        None => prompt_for_location(container, session),
    }
}

/// Ask for a location until a non-blank one is given; `None` on EOF.
fn prompt_for_location(
    container: &ServiceContainer,
    session: impl Fn(&str) -> ApplicationResult<SessionOutcome>,
) -> CliResult<Option<SessionOutcome>> {
    loop {
        let input = container
            .prompter
            .input("Where do you feel the pain?")
            .map_err(|e| InfraError::Prompt {
                message: e.to_string(),
            })?;
        let Some(raw) = input else {
            return Ok(None);
        };
        match session(&raw) {
            Err(ApplicationError::Domain(DomainError::EmptyLocation)) => {
                output::warning("please name a location");
            }
            other => return Ok(Some(other?)),
        }
    }
}

fn report_outcome(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Diagnosed { diagnosis, path } => {
            output::action("Diagnosis", diagnosis);
            debug!("path: {:?}", path);
        }
        SessionOutcome::Registered { location } => {
            output::success(&format!("Registered '{}' with its first question", location));
        }
        SessionOutcome::Extended { path, report } => {
            report_extension(report);
            output::path(path);
        }
        SessionOutcome::Unresolved { path } => {
            output::warning("no diagnosis found for these answers");
            output::path(path);
        }
        SessionOutcome::Declined => output::info("Nothing changed."),
        SessionOutcome::Abandoned => {
            output::info("Nothing added: both a question and a diagnosis are required.")
        }
    }
}

fn report_extension(report: &ExtendReport) {
    match report.attachment {
        Attachment::Attached => output::success("Question and diagnosis added"),
        Attachment::Refined => output::success("Diagnosis added to existing question"),
        Attachment::Unchanged => output::info("Rule already present, nothing changed."),
    }
    for question in &report.healed {
        output::failure(&format!("question '{}' was missing and has been re-created", question));
    }
}

#[instrument(skip(container))]
fn add(
    container: &ServiceContainer,
    location: &str,
    steps: &[Step],
    question: &str,
    diagnosis: &str,
) -> CliResult<()> {
    let service = container.diagnosis_service();
    let location = Location::parse(location)?;
    let mut store = service.load()?;
    let report = service.extend(&mut store, &location, steps, question, diagnosis)?;
    report_extension(&report);
    Ok(())
}

fn no_rules(container: &ServiceContainer) -> CliError {
    CliError::NoRules(container.rules_file().display().to_string())
}

#[instrument(skip(container))]
fn tree(container: &ServiceContainer, location: Option<&str>) -> CliResult<()> {
    let trees = container.report_service().trees(location)?;
    if trees.is_empty() {
        return Err(no_rules(container));
    }
    for (location, root) in &trees {
        output::info(&output::rule_tree(location, root));
    }
    Ok(())
}

#[instrument(skip(container))]
fn map(container: &ServiceContainer) -> CliResult<()> {
    let store = container.report_service().store()?;
    if store.is_empty() {
        return Err(no_rules(container));
    }
    output::info(&output::rule_map(store.iter()));
    Ok(())
}

#[instrument(skip(container))]
fn table(container: &ServiceContainer, location: Option<&str>) -> CliResult<()> {
    let tables = container.report_service().truth_tables(location)?;
    if tables.is_empty() {
        return Err(no_rules(container));
    }
    for entry in &tables {
        output::header(&format!("Truth table: {}", entry.location));
        output::info(&output::truth_table(&entry.table));
        output::detail(&format!(
            "{} of {} combinations reach a diagnosis",
            entry.table.reachable_count(),
            entry.table.len()
        ));
    }
    Ok(())
}

fn questions(container: &ServiceContainer, location: &str) -> CliResult<()> {
    for question in container.report_service().questions(location)? {
        output::info(&question);
    }
    Ok(())
}

fn list(container: &ServiceContainer) -> CliResult<()> {
    let locations = container.report_service().locations()?;
    if locations.is_empty() {
        return Err(no_rules(container));
    }
    for location in locations {
        output::info(&location);
    }
    Ok(())
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(&project_dir(cli)?)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", "(unavailable)"),
            }
            output::action("local", &local_config_path(&project_dir(cli)?).display());
            output::action("rules", &load_settings(cli)?.rules_file.display());
        }
    }
    Ok(())
}
