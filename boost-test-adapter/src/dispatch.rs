// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use crate::{
    ExpectedError, Result,
    errors::AdapterExitCode,
    output::{OutputContext, OutputOpts, OutputWriter, StdoutStyles},
};
use boost_test_results::{
    config::AdapterConfig,
    errors::{ArtifactKind, DisplayErrorChain},
    parse::{ArtifactSource, ResultArtifacts, parse_artifacts, read_artifact},
    reporter::{
        HostOutcome, HostTestResult, host_results, parse_failure_results, to_host_result,
        to_junit_report,
    },
    results::TestResultCollection,
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::{io::Write, time::Duration};

/// Reconcile the artifacts of a Boost.Test run.
///
/// A Boost.Test executable run with `--report_format=xml --report_level=detailed` and
/// `--log_format=xml` leaves behind a report, a log and (if redirected) its console output.
/// This tool combines them into one result per test case.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct BoostTestAdapterApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl BoostTestAdapterApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Parse(opts) => opts.exec(output, output_writer),
            Command::Junit(opts) => opts.exec(output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile the artifacts of a test run and print the results
    Parse(ParseOpts),

    /// Reconcile the artifacts of a test run and write a JUnit XML report
    Junit(JunitOpts),
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Artifact options")]
struct ArtifactOpts {
    /// XML report (`--report_sink`)
    #[arg(long, value_name = "PATH")]
    report: Option<Utf8PathBuf>,

    /// XML log (`--log_sink`)
    #[arg(long, value_name = "PATH")]
    log: Option<Utf8PathBuf>,

    /// Captured standard output
    #[arg(long, value_name = "PATH")]
    stdout: Option<Utf8PathBuf>,

    /// Captured standard error
    #[arg(long, value_name = "PATH")]
    stderr: Option<Utf8PathBuf>,

    /// Config file [default: .config/boost-test-adapter.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ArtifactOpts {
    fn load_config(&self) -> Result<AdapterConfig> {
        let current_dir = std::env::current_dir()
            .map_err(|err| ExpectedError::CurrentDirFailed { err })?;
        let current_dir = Utf8PathBuf::try_from(current_dir).map_err(|err| {
            ExpectedError::CurrentDirFailed {
                err: err.into_io_error(),
            }
        })?;

        let config = AdapterConfig::from_sources(&current_dir, self.config_file.as_deref())?;
        tracing::debug!(?config, "loaded adapter config");
        Ok(config)
    }

    fn artifacts(&self) -> ResultArtifacts {
        ResultArtifacts {
            report: self.report.clone(),
            log: self.log.clone(),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// One line per test, with failure details
    #[default]
    Human,

    /// A JSON array of results
    Json,
}

#[derive(Debug, Args)]
struct ParseOpts {
    #[clap(flatten)]
    artifacts: ArtifactOpts,

    /// Report only this test, by fully-qualified name (e.g. `suite/case`). May be repeated
    ///
    /// Requested tests missing from the results are reported as not found.
    #[arg(long = "test", value_name = "NAME")]
    tests: Vec<String>,

    /// Duration of the test run, attributed to each requested test if the artifacts cannot be
    /// parsed
    #[arg(long, value_name = "MS", default_value_t = 0)]
    duration_ms: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: MessageFormat,
}

impl ParseOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.artifacts.load_config()?;
        let artifacts = self.artifacts.artifacts();
        let parsed = parse_artifacts(&artifacts, &config);

        let (hosts, results) = if self.tests.is_empty() {
            let results = parsed?;
            let hosts: Vec<_> = results
                .iter()
                .map(|(name, result)| to_host_result(name, result))
                .collect();
            (hosts, Some(results))
        } else {
            let names = self.tests.iter().map(String::as_str);
            match parsed {
                Ok(results) => (host_results(names, &results), Some(results)),
                Err(err) if err.is_xml_structure_error() => {
                    tracing::warn!("{}", DisplayErrorChain::new(&err));
                    let report_text = read_report_text(artifacts.report.as_deref())?;
                    let hosts = parse_failure_results(
                        &config.master_test_suite_name,
                        names,
                        report_text.as_deref(),
                        Duration::from_millis(self.duration_ms),
                    );
                    (hosts, None)
                }
                Err(err) => return Err(err.into()),
            }
        };

        let mut writer = output_writer.stdout_writer();
        match self.format {
            MessageFormat::Human => {
                let styles = output.stdout_styles();
                for host in &hosts {
                    write_human(&mut writer, host, &styles).map_err(ExpectedError::write_output)?;
                }
                if output.verbose {
                    if let Some(results) = &results {
                        write_suite_summaries(&mut writer, results, &styles, &config)
                            .map_err(ExpectedError::write_output)?;
                    }
                }
                write_summary(&mut writer, &hosts, &styles).map_err(ExpectedError::write_output)?;
            }
            MessageFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, &hosts)
                    .map_err(|err| ExpectedError::JsonSerializeError { err })?;
                writeln!(writer).map_err(ExpectedError::write_output)?;
            }
        }
        writer.flush().map_err(ExpectedError::write_output)?;

        Ok(exit_code(hosts.iter().any(|host| host.outcome.is_failure())))
    }
}

#[derive(Debug, Args)]
struct JunitOpts {
    #[clap(flatten)]
    artifacts: ArtifactOpts,

    /// Name of the report
    #[arg(long, default_value = "boost-test")]
    name: String,

    /// Write the report to this file instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<Utf8PathBuf>,
}

impl JunitOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.artifacts.load_config()?;
        let results = parse_artifacts(&self.artifacts.artifacts(), &config)?;
        let report = to_junit_report(&self.name, &config.master_test_suite_name, &results);

        match &self.output {
            Some(path) => {
                let file = std::fs::File::create(path).map_err(|err| {
                    ExpectedError::JunitFileCreateError {
                        path: path.clone(),
                        err,
                    }
                })?;
                report
                    .serialize(file)
                    .map_err(|err| ExpectedError::JunitWriteError {
                        path: Some(path.clone()),
                        err,
                    })?;
                tracing::info!("wrote JUnit report to {path}");
            }
            None => {
                let mut writer = output_writer.stdout_writer();
                report
                    .serialize(&mut writer)
                    .map_err(|err| ExpectedError::JunitWriteError { path: None, err })?;
                writeln!(writer).map_err(ExpectedError::write_output)?;
                writer.flush().map_err(ExpectedError::write_output)?;
            }
        }

        let failed = results.iter().any(|(_, result)| result.outcome.is_failure());
        Ok(exit_code(failed))
    }
}

fn exit_code(failed: bool) -> i32 {
    if failed {
        AdapterExitCode::TEST_RUN_FAILED
    } else {
        AdapterExitCode::OK
    }
}

fn read_report_text(path: Option<&Utf8Path>) -> Result<Option<String>> {
    match path {
        Some(path) if path.exists() => Ok(Some(read_artifact(
            ArtifactKind::Report,
            ArtifactSource::Path(path.to_owned()),
        )?)),
        _ => Ok(None),
    }
}

fn write_human(
    writer: &mut dyn Write,
    host: &HostTestResult,
    styles: &StdoutStyles,
) -> std::io::Result<()> {
    let (status, style) = match host.outcome {
        HostOutcome::Passed => ("PASS", styles.pass),
        HostOutcome::Failed => ("FAIL", styles.fail),
        HostOutcome::Skipped => ("SKIP", styles.skip),
        HostOutcome::NotFound => ("NOT FOUND", styles.skip),
    };
    writeln!(
        writer,
        "{:>9} [{:>8.3}s] {}",
        status.style(style),
        host.duration.as_secs_f64(),
        host.fully_qualified_name.style(styles.test_name),
    )?;

    if let Some(error_message) = &host.error_message {
        for line in error_message.lines() {
            writeln!(writer, "          {line}")?;
        }
    }
    if host.outcome.is_failure() {
        for message in &host.messages {
            for line in message.text.lines() {
                writeln!(writer, "    {line}")?;
            }
        }
    }
    Ok(())
}

fn write_suite_summaries(
    writer: &mut dyn Write,
    results: &TestResultCollection,
    styles: &StdoutStyles,
    config: &AdapterConfig,
) -> std::io::Result<()> {
    for (name, result) in results.iter_all().filter(|(_, result)| !result.is_case()) {
        let counts = result.case_counts(Some(results));
        let display_name = match result.unit.as_deref() {
            Some(unit) if name.is_empty() => unit.name(),
            None if name.is_empty() => config.master_test_suite_name.as_str(),
            _ => name,
        };
        writeln!(
            writer,
            "{:>9} {}: {} passed, {} failed ({} aborted), {} skipped",
            "SUITE".style(styles.count),
            display_name.style(styles.test_name),
            counts.passed.style(styles.count),
            counts.failed.style(styles.count),
            counts.aborted,
            counts.skipped.style(styles.count),
        )?;
    }
    Ok(())
}

fn write_summary(
    writer: &mut dyn Write,
    hosts: &[HostTestResult],
    styles: &StdoutStyles,
) -> std::io::Result<()> {
    let count = |outcome: HostOutcome| hosts.iter().filter(|host| host.outcome == outcome).count();
    writeln!(
        writer,
        "{:>9} {} tests: {} passed, {} failed, {} skipped, {} not found",
        "Summary".style(styles.count),
        hosts.len().style(styles.count),
        count(HostOutcome::Passed).style(styles.pass),
        count(HostOutcome::Failed).style(styles.fail),
        count(HostOutcome::Skipped).style(styles.skip),
        count(HostOutcome::NotFound),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use clap::Parser;
    use fixture_data::{
        boost_tests::{ARTIFACTS, NOT_FOUND_REPORT},
        models::encode_latin1,
    };
    use pretty_assertions::assert_eq;

    fn output(verbose: bool) -> OutputContext {
        OutputContext {
            verbose,
            color: Color::Never,
        }
    }

    /// Writes the fixture artifacts plus an empty config file, and returns the common args.
    fn write_fixture(dir: &Utf8TempDir, report: &str) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, name, content) in [
            ("--report", "test.report.xml", report),
            ("--log", "test.log.xml", ARTIFACTS.log),
            ("--stdout", "test.stdout.log", ARTIFACTS.stdout),
            ("--stderr", "test.stderr.log", ARTIFACTS.stderr),
            ("--config-file", "config.toml", ""),
        ] {
            let path = dir.path().join(name);
            fs_err::write(&path, encode_latin1(content)).unwrap();
            args.push(flag.to_owned());
            args.push(path.into_string());
        }
        args
    }

    fn run(args: &[&str], common: &[String]) -> (Result<i32>, String) {
        run_with(output(false), args, common)
    }

    fn run_with(output: OutputContext, args: &[&str], common: &[String]) -> (Result<i32>, String) {
        let argv = std::iter::once("boost-test-adapter")
            .chain(args.iter().copied())
            .chain(common.iter().map(String::as_str));
        let app = BoostTestAdapterApp::try_parse_from(argv).unwrap();
        let mut writer = OutputWriter::Test { stdout: Vec::new() };
        let res = app.exec(output, &mut writer);
        let OutputWriter::Test { stdout } = writer else {
            unreachable!("test writer was created above")
        };
        (res, String::from_utf8(stdout).unwrap())
    }

    #[test]
    fn parse_human() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, ARTIFACTS.report);
        let (res, stdout) = run(&["parse"], &common);

        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        let status_lines: Vec<_> = stdout
            .lines()
            .filter(|line| line.contains("s] "))
            .map(|line| {
                let mut parts = line.split_whitespace();
                let status = parts.next().unwrap_or_default();
                let name = parts.last().unwrap_or_default();
                (status.to_owned(), name.to_owned())
            })
            .collect();
        assert_eq!(
            status_lines,
            vec![
                ("PASS".to_owned(), "arithmetic/addition".to_owned()),
                ("FAIL".to_owned(), "arithmetic/division".to_owned()),
                ("FAIL".to_owned(), "arithmetic/throws".to_owned()),
                ("SKIP".to_owned(), "disabled_suite/not_run".to_owned()),
                ("PASS".to_owned(), "leaky".to_owned()),
            ]
        );
        assert!(
            stdout.contains("    arithmetic.cpp(20): error in \"division\""),
            "{stdout}"
        );
        assert!(
            stdout.contains("5 tests: 2 passed, 2 failed, 1 skipped, 0 not found"),
            "{stdout}"
        );
    }

    #[test]
    fn parse_verbose_suite_summaries() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, ARTIFACTS.report);
        let (res, stdout) = run_with(output(true), &["parse"], &common);

        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        let suites: Vec<_> = stdout
            .lines()
            .map(str::trim_start)
            .filter(|line| line.starts_with("SUITE "))
            .collect();
        assert_eq!(
            suites,
            vec![
                "SUITE BoostUnitTest: 2 passed, 2 failed (0 aborted), 1 skipped",
                "SUITE arithmetic: 1 passed, 2 failed (0 aborted), 0 skipped",
                "SUITE disabled_suite: 0 passed, 0 failed (0 aborted), 1 skipped",
            ]
        );
    }

    #[test]
    fn parse_failure_uses_configured_master_suite() {
        let dir = Utf8TempDir::new().unwrap();
        let mut common = write_fixture(&dir, "<TestResult><TestSuite");
        let config_path = dir.path().join("custom.toml");
        fs_err::write(&config_path, "master-test-suite-name = \"Custom\"\n").unwrap();
        let config_arg = common
            .iter()
            .position(|arg| arg == "--config-file")
            .unwrap();
        common[config_arg + 1] = config_path.into_string();

        let (res, stdout) = run(&["parse", "--test", ""], &common);
        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        assert!(stdout.contains("fatal error in \"Custom\""), "{stdout}");
    }

    #[test]
    fn parse_requested_tests_json() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, ARTIFACTS.report);
        let (res, stdout) = run(
            &[
                "parse",
                "--format",
                "json",
                "--test",
                "arithmetic/addition",
                "--test",
                "no such test",
            ],
            &common,
        );

        assert_eq!(res.unwrap(), AdapterExitCode::OK);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        let outcomes: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|result| result["outcome"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(outcomes, vec!["passed", "not-found"]);
        assert_eq!(json[0]["duration_ms"], serde_json::json!(1));
    }

    #[test]
    fn parse_failure_with_requested_tests() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, NOT_FOUND_REPORT);
        let (res, stdout) = run(&["parse", "--test", "suite/case"], &common);

        assert_eq!(res.unwrap(), AdapterExitCode::OK);
        assert!(stdout.contains("NOT FOUND"), "{stdout}");
        assert!(
            stdout.contains("Test setup error: no test cases matching filter"),
            "{stdout}"
        );

        let common = write_fixture(&dir, "<TestResult><TestSuite");
        let (res, stdout) = run(
            &["parse", "--test", "suite/case", "--duration-ms", "1500"],
            &common,
        );
        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        assert!(stdout.contains("FAIL [   1.500s] suite/case"), "{stdout}");
    }

    #[test]
    fn parse_failure_without_requested_tests() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, NOT_FOUND_REPORT);
        let (res, _) = run(&["parse"], &common);
        let err = res.unwrap_err();
        assert!(
            matches!(err, ExpectedError::ResultParseError { .. }),
            "{err:?}"
        );
        assert_eq!(err.process_exit_code(), AdapterExitCode::SETUP_ERROR);
    }

    #[test]
    fn junit_to_stdout_and_file() {
        let dir = Utf8TempDir::new().unwrap();
        let common = write_fixture(&dir, ARTIFACTS.report);

        let (res, stdout) = run(&["junit", "--name", "unit-tests"], &common);
        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        assert!(stdout.contains(r#"<testsuites name="unit-tests""#), "{stdout}");
        assert!(stdout.contains(r#"<testsuite name="arithmetic""#), "{stdout}");

        let junit_path = dir.path().join("junit.xml");
        let (res, stdout) = run(&["junit", "--output", junit_path.as_str()], &common);
        assert_eq!(res.unwrap(), AdapterExitCode::TEST_RUN_FAILED);
        assert_eq!(stdout, "");
        let written = fs_err::read_to_string(&junit_path).unwrap();
        assert!(written.contains(r#"<testcase name="division""#), "{written}");
    }
}
