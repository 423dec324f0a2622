use std::collections::VecDeque;
use std::env;
use std::io;
use std::sync::{Mutex, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::traits::Prompter;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "trace");
        }
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    let noisy_modules = ["config", "serde"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Prompter replaying canned replies; an exhausted queue behaves like EOF.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: Mutex<VecDeque<bool>>,
    inputs: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
    notes: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirms(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirms.lock().unwrap().extend(answers);
        self
    }

    pub fn with_inputs<S: Into<String>>(self, inputs: impl IntoIterator<Item = S>) -> Self {
        self.inputs
            .lock()
            .unwrap()
            .extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Every message shown through `confirm` or `input`, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Every message shown through `notify`.
    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> io::Result<Option<bool>> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.confirms.lock().unwrap().pop_front())
    }

    fn input(&self, message: &str) -> io::Result<Option<String>> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.inputs.lock().unwrap().pop_front())
    }

    fn notify(&self, message: &str) {
        self.notes.lock().unwrap().push(message.to_string());
    }
}
