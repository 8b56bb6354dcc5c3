//! Reporting of checks and failures.
//!
//! The engine never formats a final report. It appends structured failure
//! records to a [`Reporter`] and relies on scoped [`Sentinel`] handles to
//! group failures under the operation that produced them.
//!
//! [`TestLogger`] is the in-process reporter. Besides counting checks and
//! failures it can export its failure log as newline-delimited JSON; each
//! line is a self-contained [`FailureRecord`].

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// The kind of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The supplied instances do not satisfy the preconditions of a check
    /// (e.g. they compare equal, or ordering operators disagree).
    Precondition,
    /// An equality, round-trip or mutation-effect assertion failed.
    Semantics,
    /// An observed acquisition delta differs from its prediction.
    Accounting,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition => write!(f, "precondition"),
            Self::Semantics => write!(f, "semantics"),
            Self::Accounting => write!(f, "accounting"),
        }
    }
}

/// A single failure, as written to the JSONL failure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// 1-based position of this failure in the log.
    pub seq: u64,
    /// What sort of contract was broken.
    pub kind: FailureKind,
    /// Enclosing scope messages, outermost first.
    pub scope: Vec<String>,
    /// The failure message itself.
    pub message: String,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in self.scope.iter().filter(|s| !s.is_empty()) {
            writeln!(f, "{s}")?;
        }
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Aggregate counts collected by a [`TestLogger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    /// Number of individual checks performed.
    pub checks: usize,
    /// Total number of failures, of any kind.
    pub failures: usize,
    /// Failures of kind [`FailureKind::Precondition`].
    pub precondition_failures: usize,
    /// Failures of kind [`FailureKind::Semantics`].
    pub semantic_failures: usize,
    /// Failures of kind [`FailureKind::Accounting`].
    pub accounting_failures: usize,
}

impl TestResults {
    /// True when no failure of any kind has been recorded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// The collaborator that receives check and failure events.
///
/// All methods take `&self`: reporters are shared by every scope that is
/// currently open, so implementations use interior mutability. The engine is
/// single-threaded and never calls a reporter re-entrantly.
pub trait Reporter {
    /// Record that a check was made.
    fn log_check(&self);

    /// Record a failure.
    fn log_failure(&self, kind: FailureKind, message: &str);

    /// Open a nested scope. Every call is paired with [`Reporter::exit_scope`].
    fn enter_scope(&self, message: &str);

    /// Close the innermost scope.
    fn exit_scope(&self);

    /// Number of failures recorded so far.
    fn failure_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Sentinel
// ---------------------------------------------------------------------------

/// Scoped handle pairing [`Reporter::enter_scope`] with
/// [`Reporter::exit_scope`].
///
/// The scope is closed on drop, so the bookkeeping also runs when a check
/// panics and the stack unwinds.
pub struct Sentinel<'a> {
    reporter: &'a dyn Reporter,
    prior_failures: usize,
}

impl<'a> Sentinel<'a> {
    /// Enter a scope labelled `message`.
    pub fn new(reporter: &'a dyn Reporter, message: &str) -> Self {
        reporter.enter_scope(message);
        Self {
            reporter,
            prior_failures: reporter.failure_count(),
        }
    }

    /// Whether any failure was recorded since this scope was entered.
    ///
    /// A reporter reset inside the scope lowers the count below the one
    /// recorded on entry, which is not a failure.
    #[must_use]
    pub fn failure_detected(&self) -> bool {
        self.reporter.failure_count() > self.prior_failures
    }

    /// Number of failures recorded since this scope was entered.
    #[must_use]
    pub fn failures_since_entry(&self) -> usize {
        self.reporter
            .failure_count()
            .saturating_sub(self.prior_failures)
    }

    /// The reporter this scope belongs to.
    #[must_use]
    pub const fn reporter(&self) -> &'a dyn Reporter {
        self.reporter
    }
}

impl Drop for Sentinel<'_> {
    fn drop(&mut self) {
        self.reporter.exit_scope();
    }
}

// ---------------------------------------------------------------------------
// TestLogger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LoggerState {
    results: TestResults,
    scopes: Vec<String>,
    records: Vec<FailureRecord>,
}

/// In-process [`Reporter`] that accumulates results and failure records.
///
/// Every failure is also emitted as a `tracing` warning carrying its kind
/// and enclosing scope.
#[derive(Debug, Default)]
pub struct TestLogger {
    state: RefCell<LoggerState>,
}

impl TestLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the aggregate counts.
    #[must_use]
    pub fn results(&self) -> TestResults {
        self.state.borrow().results.clone()
    }

    /// All failures recorded so far, in order.
    #[must_use]
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.state.borrow().records.clone()
    }

    /// Failure messages, each prefixed by its enclosing scopes.
    #[must_use]
    pub fn failure_messages(&self) -> Vec<String> {
        self.state
            .borrow()
            .records
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Depth of the currently open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.borrow().scopes.len()
    }

    /// Forget everything recorded so far. Open scopes are kept.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.results = TestResults::default();
        state.records.clear();
    }

    /// Write every failure record as one JSON object per line and flush.
    ///
    /// # Errors
    /// Returns an `io::Error` if serialization or writing fails.
    pub fn write_jsonl(&self, writer: impl Write) -> io::Result<()> {
        let mut writer = io::BufWriter::new(writer);
        for record in &self.state.borrow().records {
            let json = serde_json::to_string(record)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

impl Reporter for TestLogger {
    fn log_check(&self) {
        self.state.borrow_mut().results.checks += 1;
    }

    fn log_failure(&self, kind: FailureKind, message: &str) {
        let mut state = self.state.borrow_mut();
        let LoggerState {
            results,
            scopes,
            records,
        } = &mut *state;

        results.failures += 1;
        match kind {
            FailureKind::Precondition => results.precondition_failures += 1,
            FailureKind::Semantics => results.semantic_failures += 1,
            FailureKind::Accounting => results.accounting_failures += 1,
        }

        let record = FailureRecord {
            seq: records.len() as u64 + 1,
            kind,
            scope: scopes.clone(),
            message: message.to_owned(),
        };
        tracing::warn!(
            kind = %kind,
            scope = %scopes.last().map_or("", String::as_str),
            "{message}"
        );
        records.push(record);
    }

    fn enter_scope(&self, message: &str) {
        self.state.borrow_mut().scopes.push(message.to_owned());
    }

    fn exit_scope(&self) {
        self.state.borrow_mut().scopes.pop();
    }

    fn failure_count(&self) -> usize {
        self.state.borrow().results.failures
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
