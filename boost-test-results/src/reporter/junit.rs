// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from reconciled results.

use super::host::{HostMessage, HostOutcome, to_host_result};
use crate::{
    identity::QualifiedName,
    log_entry::MessageCategory,
    results::{TestResult, TestResultCollection},
};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};

/// Builds a JUnit report with one test suite per top-level Boost.Test suite.
///
/// Test cases declared directly in the master test suite are grouped under its name, falling
/// back to `master_test_suite_name` for results with no test unit tree. Only test case results
/// are included.
pub fn to_junit_report(
    run_name: &str,
    master_test_suite_name: &str,
    results: &TestResultCollection,
) -> Report {
    let mut test_suites: IndexMap<String, TestSuite> = IndexMap::new();

    for (name, result) in results.iter() {
        let qualified = name.parse::<QualifiedName>().unwrap_or_default();
        let master = master_suite_of(result, master_test_suite_name);
        let (suite_name, classname) = match qualified.segments() {
            [suites @ .., _] if !suites.is_empty() => (suites[0].clone(), suites.join("/")),
            _ => (master.clone(), master),
        };

        let test_suite = test_suites
            .entry(suite_name.clone())
            .or_insert_with(|| TestSuite::new(suite_name));
        test_suite.add_test_case(to_junit_case(name, &classname, result));
    }

    let mut report = Report::new(run_name);
    report.add_test_suites(test_suites.into_values());
    report
}

fn to_junit_case(name: &str, classname: &str, result: &TestResult) -> TestCase {
    let host = to_host_result(name, result);

    let mut status = match host.outcome {
        HostOutcome::Passed => TestCaseStatus::success(),
        HostOutcome::Skipped | HostOutcome::NotFound => TestCaseStatus::skipped(),
        HostOutcome::Failed => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            status.set_type("test failure");
            status
        }
    };
    if let Some(message) = &host.error_message {
        status.set_message(message.as_str());
    }
    if let Some(stack_trace) = &host.error_stack_trace {
        status.set_description(stack_trace.as_str());
    }

    let local_name = name.rsplit('/').next().unwrap_or(name);
    let mut test_case = TestCase::new(local_name, status);
    test_case
        .set_classname(classname)
        .set_time(host.duration)
        .set_assertions(result.assertions_passed as usize + result.assertions_failed as usize);

    let (stdout, stderr): (Vec<_>, Vec<_>) = host
        .messages
        .iter()
        .partition(|message| message.category == MessageCategory::StandardOutput);
    if !stdout.is_empty() {
        test_case.set_system_out(concat(&stdout));
    }
    if !stderr.is_empty() {
        test_case.set_system_err(concat(&stderr));
    }

    test_case
}

fn concat(messages: &[&HostMessage]) -> String {
    messages.iter().map(|message| message.text.as_str()).collect()
}

fn master_suite_of(result: &TestResult, default: &str) -> String {
    let Some(mut unit) = result.unit.clone() else {
        return default.to_owned();
    };
    while let Some(parent) = unit.parent() {
        unit = parent;
    }
    // A detached case is its own root.
    if unit.is_suite() {
        unit.name().to_owned()
    } else {
        default.to_owned()
    }
}
