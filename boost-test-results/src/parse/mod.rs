// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsers for the artifacts of a Boost.Test run.
//!
//! A test run produces up to four artifacts: an XML report, an XML log, and captured standard
//! output and error. Each has a [`ResultParser`] which folds what it finds into a shared
//! [`TestResultCollection`]. [`parse_artifacts`] runs them in order.

pub mod console;
pub mod encoding;
mod xml;
pub mod xml_log;
pub mod xml_report;

pub use console::{StandardErrorParser, StandardOutputParser, extract_memory_leaks};
pub use encoding::{ArtifactSource, decode_latin1, read_artifact, repair_xml};
pub use xml_log::XmlLogParser;
pub use xml_report::XmlReportParser;

use crate::{
    config::AdapterConfig,
    errors::{ArtifactKind, ResultParseError},
    results::TestResultCollection,
};
use camino::Utf8PathBuf;

/// Folds the contents of one artifact into a result collection.
pub trait ResultParser {
    /// Parses `content`, adding to or updating `results`.
    fn parse(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ResultParseError>;
}

/// The artifact paths of a single test run. Any of them may be absent.
#[derive(Clone, Debug, Default)]
pub struct ResultArtifacts {
    /// The XML report.
    pub report: Option<Utf8PathBuf>,

    /// The XML log.
    pub log: Option<Utf8PathBuf>,

    /// Captured standard output.
    pub stdout: Option<Utf8PathBuf>,

    /// Captured standard error.
    pub stderr: Option<Utf8PathBuf>,
}

/// Reconciles the artifacts of one test run into a single collection.
///
/// The report is parsed first, then the log, standard output and standard error. Artifacts
/// which are unset or missing on disk are skipped: they carry no information.
pub fn parse_artifacts(
    artifacts: &ResultArtifacts,
    config: &AdapterConfig,
) -> Result<TestResultCollection, ResultParseError> {
    let mut results = TestResultCollection::new();

    run_stage(
        ArtifactKind::Report,
        artifacts.report.as_ref(),
        &XmlReportParser::new(),
        &mut results,
    )?;
    run_stage(
        ArtifactKind::Log,
        artifacts.log.as_ref(),
        &XmlLogParser::new(),
        &mut results,
    )?;

    if config.enable_stdout_redirection {
        run_stage(
            ArtifactKind::Stdout,
            artifacts.stdout.as_ref(),
            &StandardOutputParser::new(config.fail_test_on_memory_leak),
            &mut results,
        )?;
    } else {
        tracing::debug!("standard output redirection disabled, skipping");
    }

    if config.enable_stderr_redirection {
        run_stage(
            ArtifactKind::Stderr,
            artifacts.stderr.as_ref(),
            &StandardErrorParser::new(),
            &mut results,
        )?;
    } else {
        tracing::debug!("standard error redirection disabled, skipping");
    }

    Ok(results)
}

fn run_stage(
    kind: ArtifactKind,
    path: Option<&Utf8PathBuf>,
    parser: &dyn ResultParser,
    results: &mut TestResultCollection,
) -> Result<(), ResultParseError> {
    let Some(path) = path else {
        tracing::debug!(%kind, "no path specified, skipping");
        return Ok(());
    };
    if !path.exists() {
        tracing::debug!(%kind, %path, "artifact does not exist, skipping");
        return Ok(());
    }

    let content = read_artifact(kind, ArtifactSource::Path(path.clone()))?;
    let content = match kind {
        ArtifactKind::Report | ArtifactKind::Log => repair_xml(&content),
        ArtifactKind::Stdout | ArtifactKind::Stderr => content,
    };
    parser.parse(&content, results)?;

    tracing::debug!(%kind, %path, results = results.len(), "parsed artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log_entry::LogEntryKind, results::TestOutcome};
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static REPORT: &str = indoc! {r#"
        <TestResult>
          <TestSuite name="Master Test Suite" result="passed" assertions_passed="1" assertions_failed="0" expected_failures="0">
            <TestCase name="only" result="passed" assertions_passed="1" assertions_failed="0" expected_failures="0"/>
          </TestSuite>
        </TestResult>
    "#};

    static LOG: &str = indoc! {r#"
        <TestLog><TestSuite name="Master Test Suite"><TestCase name="only"><Message file="a.cpp" line="3">hello</Message><TestingTime>2500</TestingTime></TestCase></TestSuite></TestLog>
    "#};

    fn write_artifacts(dir: &Utf8TempDir) -> ResultArtifacts {
        let write = |name: &str, content: &str| {
            let path = dir.path().join(name);
            fs_err::write(&path, content).unwrap();
            Some(path)
        };
        ResultArtifacts {
            report: write("report.xml", REPORT),
            log: write("log.xml", LOG),
            stdout: write("stdout.txt", "out\n"),
            stderr: write("stderr.txt", "err\n"),
        }
    }

    #[test]
    fn stages_run_in_order() {
        let dir = Utf8TempDir::new().unwrap();
        let artifacts = write_artifacts(&dir);
        let results = parse_artifacts(&artifacts, &AdapterConfig::default_config()).unwrap();

        let only = results.get("only").unwrap();
        assert_eq!(only.outcome, TestOutcome::Passed);
        assert_eq!(only.duration_micros, 2500);
        let kinds: Vec<_> = only.log_entries.iter().map(|e| e.kind.name()).collect();
        assert_eq!(kinds, vec!["Message", "Standard Output", "Standard Error"]);
    }

    #[test]
    fn missing_artifacts_are_skipped() {
        let dir = Utf8TempDir::new().unwrap();
        let mut artifacts = write_artifacts(&dir);
        artifacts.log = Some(dir.path().join("does-not-exist.xml"));
        artifacts.stderr = None;

        let results = parse_artifacts(&artifacts, &AdapterConfig::default_config()).unwrap();
        let only = results.get("only").unwrap();
        assert_eq!(only.log_entries, vec![crate::log_entry::LogEntry::standard_output("out\n")]);
    }

    #[test]
    fn disabled_redirection_ignores_console_output() {
        let dir = Utf8TempDir::new().unwrap();
        let artifacts = write_artifacts(&dir);
        let config = AdapterConfig {
            enable_stdout_redirection: false,
            enable_stderr_redirection: false,
            ..AdapterConfig::default_config()
        };

        let results = parse_artifacts(&artifacts, &config).unwrap();
        let only = results.get("only").unwrap();
        assert!(
            only.log_entries
                .iter()
                .all(|entry| entry.kind == LogEntryKind::Message)
        );
    }

    #[test]
    fn malformed_report_is_an_error() {
        let dir = Utf8TempDir::new().unwrap();
        let mut artifacts = write_artifacts(&dir);
        let report = dir.path().join("broken.xml");
        fs_err::write(&report, "Test setup error: no test cases matching filter\n").unwrap();
        artifacts.report = Some(report);

        let err = parse_artifacts(&artifacts, &AdapterConfig::default_config()).unwrap_err();
        assert!(err.is_xml_structure_error(), "{err:?}");
    }
}
