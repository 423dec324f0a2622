//! Tests for DiagnosisService sessions
//!
//! Sessions run against a real rule file in a temp dir; the operator is
//! replaced by a ScriptedPrompter.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use symptree::application::services::SessionOutcome;
use symptree::application::ApplicationError;
use symptree::config::Settings;
use symptree::domain::{Attachment, DomainError, Location, ScriptedAnswers, Step};
use symptree::infrastructure::di::ServiceContainer;
use symptree::infrastructure::traits::{Prompter, RealFileSystem};
use symptree::util::testing::{init_test_setup, ScriptedPrompter};

const HEAD_RULES: &str = r#"{
    "cabeza": {
        "fiebre?": {
            "sí": "gripe",
            "no": {
                "tos?": {
                    "sí": "resfriado",
                    "no": {}
                }
            }
        }
    }
}
"#;

/// Helper to create test settings pointing at a rule file in `dir`
fn test_settings(dir: &TempDir) -> Settings {
    Settings {
        rules_file: dir.path().join("reglas_dolores.json"),
        ..Settings::default()
    }
}

fn setup(
    temp: &TempDir,
    rules: Option<&str>,
    prompter: ScriptedPrompter,
) -> (ServiceContainer, Arc<ScriptedPrompter>, PathBuf) {
    init_test_setup();
    let settings = test_settings(temp);
    let path = settings.rules_file.clone();
    if let Some(content) = rules {
        std::fs::write(&path, content).unwrap();
    }
    let prompter = Arc::new(prompter);
    let container =
        ServiceContainer::with_deps(settings, Arc::new(RealFileSystem), prompter.clone());
    (container, prompter, path)
}

fn loc(raw: &str) -> Location {
    Location::parse(raw).unwrap()
}

// ============================================================
// walking existing rules
// ============================================================

#[test]
fn given_fever_when_diagnosing_head_then_flu() {
    let temp = TempDir::new().unwrap();
    let (container, prompter, _) =
        setup(&temp, Some(HEAD_RULES), ScriptedPrompter::new().with_confirms([true]));

    let outcome = container.diagnosis_service().diagnose("  Cabeza ").unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Diagnosed {
            diagnosis: "gripe".into(),
            path: vec![Step::new("fiebre?", true)],
        }
    );
    assert_eq!(prompter.asked(), vec!["fiebre?"]);
}

#[test]
fn given_no_match_when_operator_adds_question_then_saved_and_reachable() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new()
        .with_confirms([false, false, true])
        .with_inputs(["náuseas?", "migraña"]);
    let (container, _, _) = setup(&temp, Some(HEAD_RULES), prompter);
    let service = container.diagnosis_service();

    let outcome = service.diagnose("cabeza").unwrap();

    match outcome {
        SessionOutcome::Extended { path, report } => {
            assert_eq!(path, vec![Step::new("fiebre?", false), Step::new("tos?", false)]);
            assert_eq!(report.attachment, Attachment::Attached);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    let store = service.load().unwrap();
    let result = store
        .resolve(&loc("cabeza"), &mut ScriptedAnswers::new([false, false, true]))
        .unwrap();
    assert_eq!(result.diagnosis(), Some("migraña"));
}

#[test]
fn given_no_match_when_operator_declines_then_file_untouched() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new().with_confirms([false, false, false]);
    let (container, _, path) = setup(&temp, Some(HEAD_RULES), prompter);

    let outcome = container.diagnosis_service().diagnose("cabeza").unwrap();

    assert_eq!(outcome, SessionOutcome::Declined);
    assert_eq!(std::fs::read_to_string(path).unwrap(), HEAD_RULES);
}

#[test]
fn given_extension_disabled_when_no_match_then_unresolved_without_offer() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new().with_confirms([false, false]);
    let (container, prompter, _) = setup(&temp, Some(HEAD_RULES), prompter);

    let outcome = container
        .diagnosis_service_with(false)
        .diagnose("cabeza")
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Unresolved { ref path } if path.len() == 2));
    assert_eq!(prompter.asked(), vec!["fiebre?", "tos?"]);
}

#[test]
fn given_input_closed_mid_walk_when_diagnosing_then_cancelled_and_nothing_saved() {
    let temp = TempDir::new().unwrap();
    let (container, _, path) = setup(&temp, Some(HEAD_RULES), ScriptedPrompter::new());

    let result = container.diagnosis_service().diagnose("cabeza");

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::AnswerCancelled(ref q))) if q == "fiebre?"
    ));
    assert_eq!(std::fs::read_to_string(path).unwrap(), HEAD_RULES);
}

#[test]
fn given_scripted_answers_when_diagnosing_then_no_prompts() {
    let temp = TempDir::new().unwrap();
    let (container, prompter, _) = setup(&temp, Some(HEAD_RULES), ScriptedPrompter::new());

    let outcome = container
        .diagnosis_service_with(false)
        .diagnose_with("cabeza", &mut ScriptedAnswers::new([false, true]))
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Diagnosed { ref diagnosis, .. } if diagnosis == "resfriado"));
    assert!(prompter.asked().is_empty());
}

// ============================================================
// registering locations
// ============================================================

#[test]
fn given_unknown_location_when_operator_registers_then_first_question_saved() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new()
        .with_confirms([true])
        .with_inputs(["golpe?", "contusión"]);
    let (container, _, path) = setup(&temp, None, prompter);

    let outcome = container.diagnosis_service().diagnose("Espalda").unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Registered {
            location: loc("espalda")
        }
    );
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["espalda"]["golpe?"]["sí"], "contusión");
}

#[test]
fn given_unknown_location_when_operator_declines_then_no_file_written() {
    let temp = TempDir::new().unwrap();
    let (container, _, path) = setup(&temp, None, ScriptedPrompter::new().with_confirms([false]));

    let outcome = container.diagnosis_service().diagnose("espalda").unwrap();

    assert_eq!(outcome, SessionOutcome::Declined);
    assert!(!path.exists());
}

#[test]
fn given_blank_diagnosis_when_registering_then_abandoned_and_not_registered() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new()
        .with_confirms([true])
        .with_inputs(["golpe?", "   "]);
    let (container, _, path) = setup(&temp, Some(HEAD_RULES), prompter);
    let service = container.diagnosis_service();

    let outcome = service.diagnose("espalda").unwrap();

    assert_eq!(outcome, SessionOutcome::Abandoned);
    assert!(!service.load().unwrap().contains(&loc("espalda")));
    assert_eq!(std::fs::read_to_string(path).unwrap(), HEAD_RULES);
}

#[test]
fn given_blank_location_when_diagnosing_then_empty_location() {
    let temp = TempDir::new().unwrap();
    let (container, _, _) = setup(&temp, None, ScriptedPrompter::new());

    let result = container.diagnosis_service().diagnose("   ");

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::EmptyLocation))
    ));
}

#[test]
fn given_extension_disabled_when_location_unknown_then_unresolved_without_offer() {
    let temp = TempDir::new().unwrap();
    let (container, prompter, path) =
        setup(&temp, None, ScriptedPrompter::new().with_confirms([true]));

    let outcome = container
        .diagnosis_service_with(false)
        .diagnose("espalda")
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Unresolved { path: vec![] });
    assert!(prompter.asked().is_empty());
    assert!(!path.exists());
}

// ============================================================
// location registered without rules
// ============================================================

#[test]
fn given_location_without_rules_when_extension_disabled_then_unresolved_with_empty_path() {
    let temp = TempDir::new().unwrap();
    let (container, prompter, _) =
        setup(&temp, Some(r#"{"rodilla": {}}"#), ScriptedPrompter::new());

    let outcome = container
        .diagnosis_service_with(false)
        .diagnose("rodilla")
        .unwrap();

    assert_eq!(outcome, SessionOutcome::Unresolved { path: vec![] });
    assert!(prompter.asked().is_empty());
}

#[test]
fn given_location_without_rules_when_operator_adds_rule_then_registered_with_first_question() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new()
        .with_confirms([true])
        .with_inputs(["hinchazón?", "esguince"]);
    let (container, prompter, _) = setup(&temp, Some(r#"{"rodilla": {}}"#), prompter);
    let service = container.diagnosis_service();

    let outcome = service.diagnose("rodilla").unwrap();

    assert_eq!(
        outcome,
        SessionOutcome::Registered {
            location: loc("rodilla")
        }
    );
    assert_eq!(prompter.asked()[1], "First question for 'rodilla'");
    let result = service
        .load()
        .unwrap()
        .resolve(&loc("rodilla"), &mut ScriptedAnswers::new([true]))
        .unwrap();
    assert_eq!(result.diagnosis(), Some("esguince"));
}

// ============================================================
// prompter failures
// ============================================================

/// Prompter whose terminal went away.
struct BrokenPrompter;

impl Prompter for BrokenPrompter {
    fn confirm(&self, _message: &str) -> io::Result<Option<bool>> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "tty gone"))
    }

    fn input(&self, _message: &str) -> io::Result<Option<String>> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "tty gone"))
    }

    fn notify(&self, _message: &str) {}
}

#[test]
fn given_prompter_io_error_when_answering_then_operation_failed_keeps_source() {
    let temp = TempDir::new().unwrap();
    let settings = test_settings(&temp);
    std::fs::write(&settings.rules_file, HEAD_RULES).unwrap();
    let container =
        ServiceContainer::with_deps(settings, Arc::new(RealFileSystem), Arc::new(BrokenPrompter));

    let err = container.diagnosis_service().diagnose("cabeza").unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, source } => {
            assert!(context.contains("fiebre?"), "{context}");
            assert_eq!(source.to_string(), "tty gone");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================
// malformed rule file
// ============================================================

#[test]
fn given_malformed_file_when_registering_then_operator_told_and_new_rules_saved() {
    let temp = TempDir::new().unwrap();
    let prompter = ScriptedPrompter::new()
        .with_confirms([true])
        .with_inputs(["fiebre?", "gripe"]);
    let (container, prompter, path) = setup(&temp, Some("{\"cabeza\": "), prompter);

    let outcome = container.diagnosis_service().diagnose("cabeza").unwrap();

    assert!(matches!(outcome, SessionOutcome::Registered { .. }));
    assert_eq!(prompter.notes().len(), 1);
    assert!(prompter.notes()[0].contains("could not be read"));
    assert!(temp.path().join("reglas_dolores.json.bak").exists());
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["cabeza"]["fiebre?"]["sí"], "gripe");
}

// ============================================================
// extend()
// ============================================================

#[test]
fn given_stale_path_when_extending_then_error_and_file_untouched() {
    let temp = TempDir::new().unwrap();
    let (container, _, path) = setup(&temp, Some(HEAD_RULES), ScriptedPrompter::new());
    let service = container.diagnosis_service();
    let mut store = service.load().unwrap();

    let result = service.extend(
        &mut store,
        &loc("cabeza"),
        &[Step::new("fiebre?", true)],
        "dolor?",
        "x",
    );

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::StaleTreePath { .. }))
    ));
    assert_eq!(std::fs::read_to_string(path).unwrap(), HEAD_RULES);
}

#[test]
fn given_same_rule_twice_when_extending_then_second_is_unchanged() {
    let temp = TempDir::new().unwrap();
    let (container, _, path) = setup(&temp, Some(HEAD_RULES), ScriptedPrompter::new());
    let service = container.diagnosis_service();
    let mut store = service.load().unwrap();
    let steps = [Step::new("fiebre?", false), Step::new("tos?", false)];

    let first = service
        .extend(&mut store, &loc("cabeza"), &steps, "náuseas?", "migraña")
        .unwrap();
    let saved = std::fs::read_to_string(&path).unwrap();
    let second = service
        .extend(&mut store, &loc("cabeza"), &steps, "náuseas?", "migraña")
        .unwrap();

    assert_eq!(first.attachment, Attachment::Attached);
    assert_eq!(second.attachment, Attachment::Unchanged);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
}
