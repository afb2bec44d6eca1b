// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation of reconciled results into the result model a test host displays.
//!
//! Log entries are rendered in the style of Boost.Test's compiler log formatter, so that
//! messages look the same as they would in a console run.

use crate::{
    identity::{QualifiedName, QualifiedNameBuilder, SourceFileInfo},
    log_entry::{LogEntry, LogEntryKind, MemoryLeak, MessageCategory},
    results::{TestOutcome, TestResult, TestResultCollection},
    test_unit::TestUnit,
};
use serde::{Serialize, Serializer};
use std::time::Duration;
use swrite::{SWrite, swrite};

/// The text Boost.Test prints instead of a report when a `--run_test` filter matches nothing.
pub const TEST_NOT_FOUND: &str = "Test setup error: no test cases matching filter";

/// The error reported when a run failed and left no report behind.
pub const MISSING_REPORT: &str = "Boost Test result file was not found or is empty.";

const SPACES_HINT: &str = " (Test name contains spaces)";
const COMMAS_HINT: &str = " (Test name contains commas)";

/// The outcome of a test as shown to the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostOutcome {
    /// The test passed.
    Passed,

    /// The test failed or was aborted.
    Failed,

    /// The test was skipped.
    Skipped,

    /// The test did not run because no test matched its name.
    ///
    /// Displayed as skipped.
    NotFound,
}

impl HostOutcome {
    /// Returns true if this outcome fails the run.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl From<TestOutcome> for HostOutcome {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Passed => Self::Passed,
            TestOutcome::Skipped => Self::Skipped,
            TestOutcome::Failed | TestOutcome::Aborted => Self::Failed,
        }
    }
}

/// One rendered log entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostMessage {
    /// The stream the message belongs to.
    pub category: MessageCategory,

    /// The rendered text, ending in a newline.
    pub text: String,
}

/// The result of one requested test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostTestResult {
    /// The fully-qualified name the test was requested by.
    pub fully_qualified_name: String,

    /// The outcome.
    pub outcome: HostOutcome,

    /// The time taken, truncated to whole milliseconds. Serialized as `duration_ms`.
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Rendered log entries, in order.
    pub messages: Vec<HostMessage>,

    /// A summary of the errors which failed the test.
    pub error_message: Option<String>,

    /// The source location of the last error.
    pub error_stack_trace: Option<String>,
}

/// Translates the result stored for `name`.
pub fn to_host_result(name: &str, result: &TestResult) -> HostTestResult {
    let outcome = HostOutcome::from(result.outcome);
    let unit_name = match result.unit.as_deref() {
        Some(unit) => unit.name().to_owned(),
        None => name
            .parse::<QualifiedName>()
            .ok()
            .and_then(|name| name.local_name().map(str::to_owned))
            .unwrap_or_default(),
    };

    let messages = result
        .log_entries
        .iter()
        .map(|entry| HostMessage {
            category: entry.kind.category(),
            text: message_text(&unit_name, entry),
        })
        .collect();

    let (error_message, error_stack_trace) = if outcome.is_failure() {
        let errors = errors(result);
        match errors.last() {
            Some(last) => (
                Some(
                    errors
                        .iter()
                        .map(|entry| entry.detail.as_str())
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                last.source.as_ref().map(ToString::to_string),
            ),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    HostTestResult {
        fully_qualified_name: name.to_owned(),
        outcome,
        duration: truncate_to_millis(result.duration()),
        messages,
        error_message,
        error_stack_trace,
    }
}

/// Translates the results of the requested tests.
///
/// A name with no result in `results` gets a not-found result.
pub fn host_results<'a>(
    names: impl IntoIterator<Item = &'a str>,
    results: &TestResultCollection,
) -> Vec<HostTestResult> {
    names
        .into_iter()
        .map(|name| match results.get(name) {
            Some(result) => to_host_result(name, result),
            None => {
                tracing::debug!(%name, "no result found for requested test");
                not_found_result(name)
            }
        })
        .collect()
}

/// The result of a test which Boost.Test did not recognize.
///
/// The error message carries a hint when the name contains characters the `--run_test`
/// filter cannot express.
pub fn not_found_result(name: &str) -> HostTestResult {
    let mut message = TEST_NOT_FOUND.to_owned();
    if name.contains(' ') {
        message.push_str(SPACES_HINT);
    } else if name.contains(',') {
        message.push_str(COMMAS_HINT);
    }

    HostTestResult {
        fully_qualified_name: name.to_owned(),
        outcome: HostOutcome::NotFound,
        duration: Duration::ZERO,
        messages: Vec::new(),
        error_message: Some(message),
        error_stack_trace: None,
    }
}

/// Results for the requested tests when the artifacts of their run could not be parsed.
///
/// If Boost.Test reported that nothing matched the filter, every test is not found. Otherwise
/// every test fails with the raw report text as a fatal error. Test units for the requested
/// names are built under `master_test_suite_name`.
pub fn parse_failure_results<'a>(
    master_test_suite_name: &str,
    names: impl IntoIterator<Item = &'a str>,
    report_text: Option<&str>,
    elapsed: Duration,
) -> Vec<HostTestResult> {
    let text = report_text.unwrap_or_default();
    if text.trim().starts_with(TEST_NOT_FOUND) {
        return names.into_iter().map(not_found_result).collect();
    }

    let detail = if text.is_empty() { MISSING_REPORT } else { text };
    names
        .into_iter()
        .map(|name| {
            let builder = QualifiedNameBuilder::from_str_with_master(master_test_suite_name, name);
            // The root owns the chain and must outlive the translation.
            let (_root, unit) = TestUnit::case_from_qualified_name(
                master_test_suite_name,
                &builder.qualified_name(),
            )
            .ok()
            .unzip();
            let result = TestResult {
                outcome: TestOutcome::Failed,
                duration_micros: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
                log_entries: vec![LogEntry::new(LogEntryKind::FatalError, detail)],
                ..TestResult::new(unit)
            };
            to_host_result(name, &result)
        })
        .collect()
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// The entries which explain a failure. A single memory leak stands in when there are none.
fn errors(result: &TestResult) -> Vec<&LogEntry> {
    let errors: Vec<_> = result
        .log_entries
        .iter()
        .filter(|entry| entry.is_error())
        .collect();
    if !errors.is_empty() {
        return errors;
    }

    result
        .log_entries
        .iter()
        .filter(|entry| matches!(entry.kind, LogEntryKind::MemoryLeak(_)))
        .take(1)
        .collect()
}

/// Renders `entry` the way the compiler log formatter would.
pub(crate) fn message_text(unit_name: &str, entry: &LogEntry) -> String {
    if matches!(
        entry.kind,
        LogEntryKind::StandardOutput | LogEntryKind::StandardError
    ) {
        return format!("{}\n", entry.detail.trim_end());
    }

    let mut text = String::new();
    if let Some(source) = &entry.source {
        push_source(&mut text, source);
    }
    swrite!(
        text,
        "{} in \"{unit_name}\"",
        entry.kind.name().to_lowercase()
    );

    match &entry.kind {
        LogEntryKind::MemoryLeak(leak) => push_leak(&mut text, leak),
        LogEntryKind::Exception {
            last_checkpoint,
            checkpoint_detail,
        } => {
            swrite!(text, ": {}", entry.detail.trim_end());
            if let Some(checkpoint) = last_checkpoint {
                text.push('\n');
                push_source(&mut text, checkpoint);
                swrite!(
                    text,
                    "last checkpoint: {}",
                    checkpoint_detail.as_deref().unwrap_or_default()
                );
            }
        }
        _ => swrite!(text, ": {}", entry.detail.trim_end()),
    }

    text.push('\n');
    text
}

fn push_source(text: &mut String, source: &SourceFileInfo) {
    if source.file.is_empty() {
        text.push_str("unknown location");
    } else {
        text.push_str(&source.file);
    }
    if let Some(line) = source.line_number {
        swrite!(text, "({line})");
    }
    text.push_str(": ");
}

fn push_leak(text: &mut String, leak: &MemoryLeak) {
    if let (Some(path), Some(name)) = (&leak.source_file_path, &leak.source_file_name) {
        swrite!(text, "source file path leak detected at :{path}{name}");
    }
    if let Some(line) = leak.line_number {
        swrite!(text, ", Line number: {line}");
    }

    text.push_str(", Memory allocation number: ");
    if let Some(number) = leak.allocation_number {
        swrite!(text, "{number}");
    }

    text.push_str(", Leak size: ");
    if let Some(size) = leak.size_in_bytes {
        swrite!(text, "{size}");
    }
    text.push_str(" byte");
    if leak.size_in_bytes.is_some_and(|size| size > 0) {
        text.push('s');
    }

    text.push('\n');
    text.push_str(&leak.leaked_data);
}
