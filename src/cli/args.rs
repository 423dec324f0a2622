//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::Step;
use crate::infrastructure::traits::parse_yes_no;

/// Interactive pain-location diagnosis with extensible yes/no rule trees
#[derive(Parser, Debug)]
#[command(name = "symptree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding .symptree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Rule file (overrides config and SYMPTREE_RULES_FILE)
    #[arg(short = 'f', long, global = true, value_hint = ValueHint::FilePath)]
    pub rules_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk the questions for a pain location
    Diagnose {
        /// Where the pain is (prompted when omitted)
        location: Option<String>,
        /// Answers in order instead of prompting, e.g. "yes,no,yes"
        #[arg(short, long, value_delimiter = ',', value_parser = parse_answer)]
        answers: Option<Vec<bool>>,
        /// Do not offer to add rules (new locations or questions)
        #[arg(long)]
        no_extend: bool,
    },

    /// Add a question and its 'yes' diagnosis after a path of answers
    Add {
        /// Pain location (registered when new)
        location: String,
        /// New question
        #[arg(short, long)]
        question: String,
        /// Diagnosis for a 'yes' answer to the new question
        #[arg(short = 'D', long)]
        diagnosis: String,
        /// Answered question leading to the new one, in order: "question=yes|no"
        #[arg(short, long = "step", value_parser = parse_step)]
        steps: Vec<Step>,
    },

    /// Show decision trees
    Tree {
        /// Location (all when omitted)
        location: Option<String>,
    },

    /// Show every location with its tree as one map
    Map,

    /// Show truth tables of diagnosis reachability
    Table {
        /// Location (all when omitted)
        location: Option<String>,
    },

    /// List the distinct questions of a location
    Questions {
        /// Location
        location: String,
    },

    /// List registered locations
    List,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}

fn parse_answer(s: &str) -> Result<bool, String> {
    parse_yes_no(s).ok_or_else(|| format!("'{s}' is not yes or no"))
}

fn parse_step(s: &str) -> Result<Step, String> {
    let (question, answer) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("'{s}' is not question=yes|no"))?;
    let question = question.trim();
    if question.is_empty() {
        return Err(format!("'{s}' has no question"));
    }
    Ok(Step::new(question, parse_answer(answer)?))
}
