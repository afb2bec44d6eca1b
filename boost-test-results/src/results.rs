// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The result aggregation model.
//!
//! A [`TestResultCollection`] maps fully-qualified test unit names to mutable [`TestResult`]
//! records. Each parser adds to or updates the records in turn.

use crate::{
    log_entry::LogEntry,
    test_unit::{TestUnit, TestUnitKind},
};
use indexmap::IndexMap;
use serde::Serialize;
use std::{rc::Rc, time::Duration};

/// The outcome Boost.Test reported for a test unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum TestOutcome {
    /// The unit passed.
    #[default]
    Passed,

    /// The unit was skipped, or its outcome is unknown.
    Skipped,

    /// The unit was aborted.
    Aborted,

    /// The unit failed.
    Failed,
}

impl TestOutcome {
    /// Parses the `result` attribute of a report element.
    ///
    /// Matching is case-insensitive. Unrecognized values map to [`TestOutcome::Skipped`].
    pub fn from_report_value(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "PASSED" => Self::Passed,
            "FAILED" => Self::Failed,
            "ABORTED" => Self::Aborted,
            _ => Self::Skipped,
        }
    }

    /// Returns true if this outcome counts as a failure.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Aborted)
    }
}

/// Counts of test case outcomes below a test unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TestCaseCounts {
    /// The number of passed cases.
    pub passed: u32,

    /// The number of failed cases, including aborted ones.
    pub failed: u32,

    /// The number of skipped cases.
    pub skipped: u32,

    /// The number of aborted cases.
    pub aborted: u32,
}

impl TestCaseCounts {
    fn record(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Skipped => self.skipped += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Aborted => {
                self.failed += 1;
                self.aborted += 1;
            }
        }
    }

    /// Returns the total number of cases with a known result.
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }
}

/// The reconciled result of one test unit.
#[derive(Clone, Debug, Default)]
pub struct TestResult {
    /// The unit this result belongs to, if known.
    pub unit: Option<Rc<TestUnit>>,

    /// The reported outcome.
    pub outcome: TestOutcome,

    /// The number of passed assertions.
    pub assertions_passed: u32,

    /// The number of failed assertions.
    pub assertions_failed: u32,

    /// The number of failures that were expected.
    pub expected_failures: u32,

    /// The time taken, in microseconds.
    pub duration_micros: u64,

    /// Diagnostic events, in the order they were parsed.
    pub log_entries: Vec<LogEntry>,
}

impl TestResult {
    /// Creates an empty result for `unit`.
    pub fn new(unit: Option<Rc<TestUnit>>) -> Self {
        Self {
            unit,
            ..Default::default()
        }
    }

    /// Returns true if this result belongs to a test case.
    pub fn is_case(&self) -> bool {
        self.unit.as_deref().is_some_and(TestUnit::is_case)
    }

    /// Returns the time taken as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration_micros)
    }

    /// Counts the outcomes of the test cases at or below this result's unit.
    ///
    /// The counts are resolved against `collection` on every call. Without a collection, a case
    /// result counts only itself and a suite result counts nothing.
    pub fn case_counts(&self, collection: Option<&TestResultCollection>) -> TestCaseCounts {
        let mut counts = TestCaseCounts::default();
        match (collection, self.unit.as_deref()) {
            (Some(collection), Some(unit)) => count_cases(unit, collection, &mut counts),
            (None, Some(unit)) if unit.is_case() => counts.record(self.outcome),
            _ => {}
        }
        counts
    }
}

fn count_cases(unit: &TestUnit, collection: &TestResultCollection, counts: &mut TestCaseCounts) {
    match unit.kind() {
        TestUnitKind::Case => {
            if let Some(result) = collection.get_by_unit(unit) {
                counts.record(result.outcome);
            }
        }
        TestUnitKind::Suite { children } => {
            for child in children.borrow().iter() {
                count_cases(child, collection, counts);
            }
        }
    }
}

/// Results of one test run, keyed by fully-qualified test unit name.
///
/// The collection also keeps alive the test unit trees its results refer to.
#[derive(Debug, Default)]
pub struct TestResultCollection {
    results: IndexMap<String, TestResult>,
    trees: Vec<Rc<TestUnit>>,
}

impl TestResultCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the tree rooted at `root` alive for as long as this collection.
    pub fn adopt_tree(&mut self, root: Rc<TestUnit>) {
        self.trees.push(root);
    }

    /// Returns the result stored under `name`.
    pub fn get(&self, name: &str) -> Option<&TestResult> {
        self.results.get(name)
    }

    /// Returns the result stored under `name`, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TestResult> {
        self.results.get_mut(name)
    }

    /// Returns the result stored for `unit`.
    pub fn get_by_unit(&self, unit: &TestUnit) -> Option<&TestResult> {
        self.get(&unit.qualified_name().to_string())
    }

    /// Returns true if a result is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    /// Stores `result` under `name`, replacing and returning any previous result.
    pub fn insert(&mut self, name: impl Into<String>, result: TestResult) -> Option<TestResult> {
        self.results.insert(name.into(), result)
    }

    /// Returns the result stored under `name`, creating it with `f` if absent.
    pub fn get_or_insert_with(
        &mut self,
        name: impl Into<String>,
        f: impl FnOnce() -> TestResult,
    ) -> &mut TestResult {
        self.results.entry(name.into()).or_insert_with(f)
    }

    /// Counts the test case outcomes below the unit stored under `name`.
    pub fn case_counts(&self, name: &str) -> Option<TestCaseCounts> {
        self.get(name).map(|result| result.case_counts(Some(self)))
    }

    /// Iterates over test case results. Suite results are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestResult)> + '_ {
        self.results
            .iter()
            .filter(|(_, result)| result.is_case())
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Iterates mutably over test case results. Suite results are skipped.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut TestResult)> + '_ {
        self.results
            .iter_mut()
            .filter(|(_, result)| result.is_case())
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Iterates over every result, including suite results.
    pub fn iter_all(&self) -> impl Iterator<Item = (&str, &TestResult)> + '_ {
        self.results
            .iter()
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Returns the number of stored results, including suite results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no results are stored.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
