//! symptree: interactive diagnosis from per-location yes/no rule trees.
//!
//! Layers:
//! - `domain`: rule trees, traversal, extension, truth tables (no I/O)
//! - `application`: diagnosis and reporting services
//! - `infrastructure`: JSON persistence, prompting, filesystem, wiring
//! - `cli`: argument parsing, dispatch, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
