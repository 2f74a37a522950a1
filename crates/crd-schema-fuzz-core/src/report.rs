//! Pass/fail reporting for fuzz sweeps.
//!
//! A [`Report`] plays the role of a test framework's reporting channel:
//! named sub-scopes, per-scope failures and a final verdict. Failures never
//! abort a sweep; they accumulate so one run surfaces every discrepancy.

use std::fmt;

use crate::diff::Diff;

#[derive(Debug, Clone)]
pub enum FailureKind {
    /// The scope could not start (unregistered kind, malformed schema, ...).
    Setup { message: String },
    /// An iteration could not be evaluated.
    Iteration { iteration: usize, message: String },
    /// Pruning changed a fuzzed value.
    Discrepancy { iteration: usize, diff: Diff },
}

#[derive(Debug, Clone)]
pub struct Failure {
    /// `/`-joined names of the enclosing scopes; empty at the top level.
    pub scope: String,
    pub kind: FailureKind,
}

impl Failure {
    pub fn diff(&self) -> Option<&Diff> {
        match &self.kind {
            FailureKind::Discrepancy { diff, .. } => Some(diff),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scope.is_empty() {
            write!(f, "{}: ", self.scope)?;
        }
        match &self.kind {
            FailureKind::Setup { message } => f.write_str(message),
            FailureKind::Iteration { iteration, message } => {
                write!(f, "iteration {iteration}: {message}")
            }
            FailureKind::Discrepancy { iteration, diff } => {
                write!(f, "iteration {iteration}: failed fuzz test, difference: {diff}")
            }
        }
    }
}

/// Counts for a finished sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub scopes: usize,
    pub passed: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scope(s), {} iteration(s) passed, {} failure(s)",
            self.scopes, self.passed, self.failed
        )
    }
}

#[derive(Debug, Default)]
pub struct Report {
    stack: Vec<String>,
    scopes: Vec<String>,
    failures: Vec<Failure>,
    passed: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` inside a named sub-scope. Scopes nest; names are joined with `/`.
    pub fn run<F: FnOnce(&mut Report)>(&mut self, name: impl Into<String>, f: F) {
        self.stack.push(name.into());
        let scope = self.scope();
        tracing::debug!(%scope, "entering scope");
        self.scopes.push(scope);
        f(self);
        self.stack.pop();
    }

    /// The current scope path.
    pub fn scope(&self) -> String {
        self.stack.join("/")
    }

    pub fn setup_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(scope = %self.scope(), %message, "scope setup failed");
        self.push(FailureKind::Setup { message });
    }

    pub fn iteration_failure(&mut self, iteration: usize, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(scope = %self.scope(), iteration, %message, "iteration failed");
        self.push(FailureKind::Iteration { iteration, message });
    }

    pub fn discrepancy(&mut self, iteration: usize, diff: Diff) {
        tracing::warn!(
            scope = %self.scope(),
            iteration,
            fields = diff.entries.len(),
            "pruning changed a fuzzed object"
        );
        self.push(FailureKind::Discrepancy { iteration, diff });
    }

    pub fn pass(&mut self) {
        self.passed += 1;
    }

    fn push(&mut self, kind: FailureKind) {
        self.failures.push(Failure {
            scope: self.scope(),
            kind,
        });
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Failures recorded in `scope` or any scope nested below it.
    pub fn failures_in<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Failure> + 'a {
        self.failures.iter().filter(move |f| {
            f.scope == scope
                || f.scope
                    .strip_prefix(scope)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &Diff> {
        self.failures.iter().filter_map(Failure::diff)
    }

    /// Every scope entered, in order.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            scopes: self.scopes.len(),
            passed: self.passed,
            failed: self.failures.len(),
        }
    }

    /// Panic with every recorded failure unless the sweep was clean.
    #[track_caller]
    pub fn assert_ok(&self) {
        if self.is_ok() {
            return;
        }
        let rendered: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        panic!(
            "{} fuzz failure(s):\n{}",
            self.failures.len(),
            rendered.join("\n\n")
        );
    }
}
