// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use boost_test_results::{
    config::AdapterConfig,
    errors::{ArtifactKind, ReportParseError, ResultParseError},
    log_entry::{LogEntryKind, MessageCategory},
    parse::{ArtifactSource, parse_artifacts, read_artifact},
    reporter::{HostOutcome, host_results, parse_failure_results, to_junit_report},
    results::{TestCaseCounts, TestOutcome},
};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use fixture_data::{
    boost_tests::{
        ARTIFACTS, DIVISION_ERROR, EXPECTED_CASES, EXPECTED_SUITE_COUNTS, LEAKY_MESSAGE,
        MASTER_TEST_SUITE, NOT_FOUND_REPORT,
    },
    models::ArtifactsFixture,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_reconcile_artifacts() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let results = parse_artifacts(&artifacts, &AdapterConfig::default_config())?;

    let names: Vec<_> = results.iter().map(|(name, _)| name).collect();
    let mut expected_names: Vec<_> = EXPECTED_CASES.keys().copied().collect();
    let mut sorted_names = names.clone();
    sorted_names.sort_unstable();
    expected_names.sort_unstable();
    assert_eq!(sorted_names, expected_names, "only test cases are iterated");

    for (name, fixture) in EXPECTED_CASES.iter() {
        let result = results
            .get(name)
            .ok_or_else(|| color_eyre::eyre::eyre!("no result for {name}"))?;
        assert_eq!(result.outcome, expected_outcome(fixture.status), "{name}");
        assert_eq!(result.assertions_passed, fixture.assertions_passed, "{name}");
        assert_eq!(result.assertions_failed, fixture.assertions_failed, "{name}");
        assert_eq!(result.duration_micros, fixture.duration_micros, "{name}");

        let kinds: Vec<_> = result.log_entries.iter().map(|e| e.kind.name()).collect();
        assert_eq!(kinds, fixture.log_entries, "{name}");
    }

    Ok(())
}

#[test]
fn test_suite_roll_up() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let results = parse_artifacts(&artifacts, &AdapterConfig::default_config())?;

    let master = results
        .get("")
        .and_then(|result| result.unit.as_deref())
        .map(|unit| unit.name());
    assert_eq!(master, Some(MASTER_TEST_SUITE));

    for (name, fixture) in EXPECTED_SUITE_COUNTS.iter() {
        let counts = results.case_counts(name);
        ensure!(counts.is_some(), "suite {name:?} has a result");
        assert_eq!(
            counts,
            Some(TestCaseCounts {
                passed: fixture.passed,
                failed: fixture.failed,
                skipped: fixture.skipped,
                aborted: fixture.aborted,
            }),
            "suite {name:?}"
        );
    }

    Ok(())
}

#[test]
fn test_repaired_content() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let results = parse_artifacts(&artifacts, &AdapterConfig::default_config())?;

    let division = results.get("arithmetic/division").expect("division result");
    assert_eq!(division.log_entries[0].detail, DIVISION_ERROR);
    assert_eq!(
        division.log_entries[0]
            .source
            .as_ref()
            .map(ToString::to_string)
            .as_deref(),
        Some("arithmetic.cpp(20)")
    );

    let leaky = results.get("leaky").expect("leaky result");
    assert_eq!(leaky.log_entries[0].detail, LEAKY_MESSAGE);

    let LogEntryKind::MemoryLeak(leak) = &leaky.log_entries[1].kind else {
        panic!("expected a memory leak, found {:?}", leaky.log_entries[1].kind);
    };
    assert!(leak.source_location_reported);
    assert_eq!(leak.source_file_name.as_deref(), Some("leaky.cpp"));
    assert_eq!(leak.line_number, Some(9));
    assert_eq!(leak.size_in_bytes, Some(16));

    Ok(())
}

#[test]
fn test_fail_on_memory_leak() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;

    fs_err::create_dir_all(dir.path().join(".config"))?;
    fs_err::write(
        dir.path().join(AdapterConfig::CONFIG_PATH),
        "fail-test-on-memory-leak = true\n",
    )?;
    let config = AdapterConfig::from_sources(dir.path(), None)?;

    let results = parse_artifacts(&artifacts, &config)?;
    for (name, result) in results.iter() {
        assert_eq!(result.outcome, TestOutcome::Failed, "{name}");
    }

    Ok(())
}

#[test]
fn test_redirection_disabled() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let config = AdapterConfig {
        enable_stdout_redirection: false,
        enable_stderr_redirection: false,
        ..AdapterConfig::default_config()
    };

    let results = parse_artifacts(&artifacts, &config)?;
    let addition = results.get("arithmetic/addition").expect("addition result");
    assert_eq!(addition.log_entries.len(), 1);
    assert_eq!(addition.log_entries[0].kind, LogEntryKind::Info);

    Ok(())
}

#[test]
fn test_host_results() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let results = parse_artifacts(&artifacts, &AdapterConfig::default_config())?;

    let hosts = host_results(
        ["arithmetic/division", "arithmetic/addition", "missing case"],
        &results,
    );

    let division = &hosts[0];
    assert_eq!(division.outcome, HostOutcome::Failed);
    assert_eq!(division.duration, Duration::from_millis(2));
    assert_eq!(division.error_message.as_deref(), Some(DIVISION_ERROR));
    assert_eq!(division.error_stack_trace.as_deref(), Some("arithmetic.cpp(20)"));
    assert_eq!(
        division.messages[0].text,
        format!("arithmetic.cpp(20): error in \"division\": {DIVISION_ERROR}\n")
    );
    assert_eq!(division.messages[0].category, MessageCategory::StandardError);
    assert_eq!(division.messages[2].text, "Running 5 test cases...\n");

    let addition = &hosts[1];
    assert_eq!(addition.outcome, HostOutcome::Passed);
    assert_eq!(addition.error_message, None);

    let missing = &hosts[2];
    assert_eq!(missing.outcome, HostOutcome::NotFound);
    assert_eq!(
        missing.error_message.as_deref(),
        Some("Test setup error: no test cases matching filter (Test name contains spaces)")
    );

    Ok(())
}

#[test]
fn test_not_found_report() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let fixture = ArtifactsFixture {
        report: NOT_FOUND_REPORT,
        log: "",
        stdout: "",
        stderr: "",
    };
    let artifacts = write_artifacts(dir.path(), &fixture)?;

    let err = parse_artifacts(&artifacts, &AdapterConfig::default_config())
        .expect_err("plain text report fails to parse");
    assert!(
        matches!(
            err,
            ResultParseError::Report(ReportParseError::MissingRoot { .. })
        ),
        "{err:?}"
    );

    let report_path = artifacts.report.clone().expect("report path");
    let report_text = read_artifact(ArtifactKind::Report, ArtifactSource::Path(report_path))?;
    let hosts = parse_failure_results(
        MASTER_TEST_SUITE,
        ["a/b", "c"],
        Some(report_text.as_str()),
        Duration::from_secs(1),
    );
    assert!(hosts.iter().all(|host| host.outcome == HostOutcome::NotFound));

    Ok(())
}

#[test]
fn test_junit_report() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let artifacts = write_artifacts(dir.path(), &ARTIFACTS)?;
    let results = parse_artifacts(&artifacts, &AdapterConfig::default_config())?;

    let config = AdapterConfig::default_config();
    let report = to_junit_report("unit-tests", &config.master_test_suite_name, &results);
    let suites: Vec<_> = report
        .test_suites
        .iter()
        .map(|suite| (suite.name.as_str(), suite.tests, suite.failures))
        .collect();
    assert_eq!(
        suites,
        vec![
            ("arithmetic", 3, 2),
            ("disabled_suite", 1, 0),
            (MASTER_TEST_SUITE, 1, 0),
        ]
    );

    let xml = report.to_string()?;
    ensure!(xml.contains("check 1 / 1 == 2 has failed"), "{xml}");

    Ok(())
}
