//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;
use termtree::Tree;

use crate::domain::{Location, RuleNode, Step, TruthTable};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print the answered questions of a walk, one per line.
pub fn path(steps: &[Step]) {
    for step in steps {
        let answer = if step.answer { "yes".green() } else { "no".red() };
        println!("  {} {}", step.question, answer);
    }
}

fn labelled(label: &str, body: impl std::fmt::Display) -> String {
    if label.is_empty() {
        body.to_string()
    } else {
        format!("{} {}", label, body)
    }
}

fn branch_tree(label: &str, node: &RuleNode) -> Tree<String> {
    match node {
        RuleNode::Empty => Tree::new(labelled(label, "(empty)".dimmed())),
        RuleNode::Diagnosis(text) => Tree::new(labelled(label, text.green().bold())),
        RuleNode::Question { text, yes, no } => Tree::new(labelled(label, text)).with_leaves([
            branch_tree(&"yes:".green().to_string(), yes),
            branch_tree(&"no:".red().to_string(), no),
        ]),
    }
}

/// Decision tree of one location as a `termtree`.
pub fn rule_tree(location: &Location, root: &RuleNode) -> Tree<String> {
    Tree::new(location.to_string().yellow().bold().to_string()).with_leaves([branch_tree("", root)])
}

/// All locations under a single root.
pub fn rule_map<'a>(trees: impl IntoIterator<Item = (&'a Location, &'a RuleNode)>) -> Tree<String> {
    Tree::new("rules".cyan().bold().to_string())
        .with_leaves(trees.into_iter().map(|(location, root)| rule_tree(location, root)))
}

/// Truth table with one column per question plus the outcome.
pub fn truth_table(table: &TruthTable) -> String {
    let mut builder = Builder::default();
    let mut header: Vec<String> = table.questions.clone();
    header.push("result".to_string());
    builder.push_record(header);

    for row in &table.rows {
        let mut record: Vec<String> = row
            .answers
            .iter()
            .map(|answer| if *answer { "yes" } else { "no" }.to_string())
            .collect();
        record.push(row.outcome.to_string());
        builder.push_record(record);
    }

    let mut rendered = builder.build();
    rendered.with(Style::rounded());
    rendered.to_string()
}
