//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Write};
use std::path::Path;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::application::ApplicationResult;
use crate::domain::RuleStore;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file content atomically (temp file in the same directory, then rename).
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Copy file from source to destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Interactive operator prompts.
///
/// `None` means the operator cancelled (EOF).
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> io::Result<Option<bool>>;

    /// Ask for a line of free text.
    fn input(&self, message: &str) -> io::Result<Option<String>>;

    /// Show a message without expecting input.
    fn notify(&self, message: &str);
}

/// A store read from persistent storage.
#[derive(Debug, Clone, Default)]
pub struct LoadedStore {
    pub store: RuleStore,
    /// The rule file could not be parsed and an empty store was substituted.
    pub recovered: bool,
}

/// Persistence collaborator for the rule store.
pub trait RuleRepository: Send + Sync {
    /// Load all rules; a missing file yields an empty store.
    fn load(&self) -> ApplicationResult<LoadedStore>;

    /// Persist all rules.
    fn save(&self, store: &RuleStore) -> ApplicationResult<()>;

    /// Where the rules live, for display.
    fn location(&self) -> String;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Prompts on the terminal through a line editor.
///
/// Ctrl-D and Ctrl-C both count as cancellation.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut editor = DefaultEditor::new().map_err(readline_err)?;
        match editor.readline(prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(readline_err(e)),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> io::Result<Option<bool>> {
        let mut prompt = format!("{message} [y/n] ");
        loop {
            let Some(line) = self.read_line(&prompt)? else {
                return Ok(None);
            };
            match parse_yes_no(&line) {
                Some(answer) => return Ok(Some(answer)),
                None => prompt = format!("{message} (answer yes or no) [y/n] "),
            }
        }
    }

    fn input(&self, message: &str) -> io::Result<Option<String>> {
        self.read_line(&format!("{message}: "))
    }

    fn notify(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn readline_err(e: ReadlineError) -> io::Error {
    match e {
        ReadlineError::Io(e) => e,
        other => io::Error::other(format!("line editor: {other}")),
    }
}

/// Parse a yes/no answer; accepts English and Spanish forms.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" | "s" | "si" | "sí" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn given_editor_io_error_when_converting_then_kept_as_io_error() {
        let err = readline_err(ReadlineError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "tty gone",
        )));
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[rstest]
    #[case("y", Some(true))]
    #[case(" Sí ", Some(true))]
    #[case("YES", Some(true))]
    #[case("n", Some(false))]
    #[case("No", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn given_input_when_parsing_yes_no_then_maps_answer(
        #[case] input: &str,
        #[case] expected: Option<bool>,
    ) {
        assert_eq!(parse_yes_no(input), expected);
    }

    #[test]
    fn given_existing_file_when_writing_atomically_then_content_replaced() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reglas.json");
        std::fs::write(&path, "{}").unwrap();

        RealFileSystem.write_atomic(&path, "{\"a\": {}}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\": {}}");
    }
}
