// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use boost_test_results::errors::{ArtifactReadError, ConfigParseError, ResultParseError};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for `boost-test-adapter`.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum AdapterExitCode {}

impl AdapterExitCode {
    /// All reported tests passed or were skipped.
    pub const OK: i32 = 0;

    /// One or more reported tests failed.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Writing results out produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// An error occurred while setting up or reconciling the results.
    pub const SETUP_ERROR: i32 = 96;
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error the adapter expects and reports without a backtrace.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("result parse error")]
    ResultParseError {
        #[from]
        err: ResultParseError,
    },
    #[error("failed to read report after a parse failure")]
    ReportReadError {
        #[from]
        err: ArtifactReadError,
    },
    #[error("failed to write results to stdout")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("failed to serialize results as JSON")]
    JsonSerializeError {
        #[source]
        err: serde_json::Error,
    },
    #[error("failed to create JUnit report file")]
    JunitFileCreateError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to write JUnit report")]
    JunitWriteError {
        path: Option<Utf8PathBuf>,
        #[source]
        err: quick_junit::SerializeError,
    },
}

impl ExpectedError {
    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::ConfigParseError { .. }
            | Self::ResultParseError { .. }
            | Self::ReportReadError { .. } => AdapterExitCode::SETUP_ERROR,
            Self::WriteOutputError { .. }
            | Self::JsonSerializeError { .. }
            | Self::JunitFileCreateError { .. }
            | Self::JunitWriteError { .. } => AdapterExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::ResultParseError { err } => {
                tracing::error!("failed to reconcile test results");
                Some(err as &dyn Error)
            }
            Self::ReportReadError { err } => {
                tracing::error!("failed to read report after a parse failure");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write results to stdout");
                Some(err as &dyn Error)
            }
            Self::JsonSerializeError { err } => {
                tracing::error!("failed to serialize results as JSON");
                Some(err as &dyn Error)
            }
            Self::JunitFileCreateError { path, err } => {
                tracing::error!(
                    "failed to create JUnit report file `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::JunitWriteError { path, err } => {
                match path {
                    Some(path) => tracing::error!(
                        "failed to write JUnit report to `{}`",
                        path.style(styles.bold)
                    ),
                    None => tracing::error!("failed to write JUnit report to stdout"),
                }
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
