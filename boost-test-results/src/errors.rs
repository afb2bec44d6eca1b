// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while reading and reconciling Boost.Test output.

use camino::Utf8PathBuf;
use std::{error::Error, fmt, io};
use thiserror::Error;

/// An error that occurred while building a [`TestUnit`](crate::test_unit::TestUnit) tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestUnitError {
    /// A child was attached to a test case. Test cases are always leaves.
    #[error("cannot attach `{child}` to `{parent}`: test cases cannot have children")]
    ParentIsTestCase {
        /// The name of the test case which was used as a parent.
        parent: String,

        /// The name of the unit which was being attached.
        child: String,
    },
}

/// An error that occurred while parsing a
/// [`SourceFileInfo`](crate::identity::SourceFileInfo) from a `file(line)` string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid source location `{input}`: {reason}")]
pub struct SourceFileInfoParseError {
    input: String,
    reason: &'static str,
}

impl SourceFileInfoParseError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// The kind of artifact produced by a Boost.Test executable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The XML report (`--report_format=xml`).
    Report,

    /// The XML log (`--log_format=xml`).
    Log,

    /// Captured standard output.
    Stdout,

    /// Captured standard error.
    Stderr,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report => write!(f, "report"),
            Self::Log => write!(f, "log"),
            Self::Stdout => write!(f, "standard output"),
            Self::Stderr => write!(f, "standard error"),
        }
    }
}

/// An error that occurred while reading an artifact into memory.
#[derive(Debug, Error)]
#[error(
    "failed to read {kind} artifact{}",
    .path.as_ref().map(|path| format!(" at `{path}`")).unwrap_or_default()
)]
pub struct ArtifactReadError {
    kind: ArtifactKind,
    path: Option<Utf8PathBuf>,
    #[source]
    err: io::Error,
}

impl ArtifactReadError {
    pub(crate) fn new(kind: ArtifactKind, path: Option<Utf8PathBuf>, err: io::Error) -> Self {
        Self { kind, path, err }
    }

    /// Returns the kind of artifact that could not be read.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Returns the path of the artifact, if it was read from a file.
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        self.path.as_ref()
    }
}

/// An error that occurred while parsing a Boost.Test XML report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportParseError {
    /// The document is not well-formed XML.
    #[error("report is not well-formed XML")]
    Xml(#[from] quick_xml::Error),

    /// The document does not contain any element.
    ///
    /// Boost.Test writes plain-text errors to the report file in some situations, for example
    /// when a filter does not match any test case.
    #[error("report does not contain a `{expected}` root element")]
    MissingRoot {
        /// The expected root element name.
        expected: &'static str,
    },

    /// The document's root element is not the report root.
    #[error("unexpected report root element `{found}` (expected `{expected}`)")]
    UnexpectedRoot {
        /// The expected root element name.
        expected: &'static str,

        /// The root element that was found.
        found: String,
    },

    /// A required attribute is absent.
    #[error("`{element}` element is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element name.
        element: String,

        /// The missing attribute.
        attribute: &'static str,
    },

    /// A count attribute is not an unsigned integer.
    #[error("attribute `{attribute}` has invalid count `{value}`")]
    InvalidCount {
        /// The attribute name.
        attribute: &'static str,

        /// The raw attribute value.
        value: String,

        /// The underlying error.
        #[source]
        err: std::num::ParseIntError,
    },

    /// The reported test units do not form a valid tree.
    #[error("invalid test unit hierarchy in report")]
    TestUnit(#[from] TestUnitError),
}

/// An error that occurred while parsing a Boost.Test XML log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LogParseError {
    /// The document is not well-formed XML.
    #[error("log is not well-formed XML")]
    Xml(#[from] quick_xml::Error),

    /// A required attribute is absent.
    #[error("`{element}` element is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element name.
        element: String,

        /// The missing attribute.
        attribute: &'static str,
    },

    /// A numeric value (a line number or testing time) could not be parsed.
    #[error("`{element}` has invalid numeric value `{value}`")]
    InvalidNumber {
        /// The element (or `element@attribute`) which carried the value.
        element: String,

        /// The raw value.
        value: String,

        /// The underlying error.
        #[source]
        err: std::num::ParseIntError,
    },

    /// The logged test units do not form a valid tree.
    #[error("invalid test unit hierarchy in log")]
    TestUnit(#[from] TestUnitError),
}

/// An error that occurred while reconciling the artifacts of a test run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResultParseError {
    /// An artifact could not be read.
    #[error(transparent)]
    Read(#[from] ArtifactReadError),

    /// The XML report could not be parsed.
    #[error("error parsing Boost.Test report")]
    Report(#[from] ReportParseError),

    /// The XML log could not be parsed.
    #[error("error parsing Boost.Test log")]
    Log(#[from] LogParseError),
}

impl ResultParseError {
    /// Returns true if this error was caused by malformed XML or an unexpected document
    /// structure, as opposed to an I/O failure.
    pub fn is_xml_structure_error(&self) -> bool {
        matches!(self, Self::Report(_) | Self::Log(_))
    }
}

/// An error that occurred while reading adapter configuration.
#[derive(Debug, Error)]
#[error("failed to parse adapter config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: config::ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: config::ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// Displays an error along with its chain of causes, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut next = self.error.source();
        while let Some(err) = next {
            write!(f, "\n  caused by: {err}")?;
            next = err.source();
        }

        Ok(())
    }
}
