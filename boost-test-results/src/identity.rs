// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity primitives: source locations and qualified test names.

use crate::{errors::SourceFileInfoParseError, test_unit::TestUnit};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// The name Boost.Test gives the root test suite unless a test module name is defined.
pub const DEFAULT_MASTER_TEST_SUITE_NAME: &str = "Master Test Suite";

const SEPARATOR: char = '/';

/// A source file and an optional line of interest within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SourceFileInfo {
    /// The source file path, exactly as reported.
    pub file: String,

    /// The line number, if one was reported.
    pub line_number: Option<u32>,
}

impl SourceFileInfo {
    /// Creates a new `SourceFileInfo`.
    pub fn new(file: impl Into<String>, line_number: Option<u32>) -> Self {
        Self {
            file: file.into(),
            line_number,
        }
    }

    /// Returns the last path component of the file, accepting both `/` and `\` separators.
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

impl fmt::Display for SourceFileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_name = self.file_name();
        match self.line_number {
            Some(line) if file_name.is_empty() => write!(f, "unknown location({line})"),
            Some(line) => write!(f, "{file_name}({line})"),
            None => f.write_str(file_name),
        }
    }
}

impl FromStr for SourceFileInfo {
    type Err = SourceFileInfoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SourceFileInfoParseError::new(s, "source location is empty"));
        }

        // A leading bracket is part of the file name, not a line number.
        match s.find('(') {
            Some(idx) if idx > 0 => {
                let line = s[idx + 1..].strip_suffix(')').ok_or_else(|| {
                    SourceFileInfoParseError::new(s, "line number is missing a closing `)`")
                })?;
                let line_number = if line.is_empty() {
                    None
                } else {
                    Some(line.parse().map_err(|_| {
                        SourceFileInfoParseError::new(s, "line number is not an unsigned integer")
                    })?)
                };
                Ok(Self::new(&s[..idx], line_number))
            }
            _ => Ok(Self::new(s, None)),
        }
    }
}

/// The fully-qualified name of a test unit, excluding the master test suite.
///
/// The empty name denotes the master test suite itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    segments: Vec<String>,
}

impl QualifiedName {
    /// Creates a qualified name from its segments, outermost suite first.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the segments of this name, outermost suite first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the name of the master test suite.
    pub fn is_master_test_suite(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the local (innermost) name, or `None` for the master test suite.
    pub fn local_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for QualifiedName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split(SEPARATOR).filter(|part| !part.is_empty())))
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Builds qualified names incrementally while walking a test tree.
///
/// The first element pushed is the master test suite, which is never part of the resulting
/// [`QualifiedName`].
#[derive(Clone, Debug, Default)]
pub struct QualifiedNameBuilder {
    path: Vec<String>,
}

impl QualifiedNameBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder positioned at `unit`, by walking its parent links.
    pub fn from_unit(unit: &TestUnit) -> Self {
        let mut path = Vec::new();
        path.push(unit.name().to_owned());
        let mut next = unit.parent();
        while let Some(parent) = next {
            path.push(parent.name().to_owned());
            next = parent.parent();
        }
        path.reverse();
        Self { path }
    }

    /// Creates a builder from a qualified name string, assuming the given master test suite.
    pub fn from_str_with_master(master_test_suite: &str, name: &str) -> Self {
        let mut builder = Self::new();
        builder.push(master_test_suite);
        for part in name.split(SEPARATOR).filter(|part| !part.is_empty()) {
            builder.push(part);
        }
        builder
    }

    /// Pushes the local name of a test unit.
    pub fn push(&mut self, name: impl Into<String>) -> &mut Self {
        self.path.push(name.into());
        self
    }

    /// Pops the innermost name. Popping an empty builder is a no-op.
    pub fn pop(&mut self) -> &mut Self {
        self.path.pop();
        self
    }

    /// Returns the innermost name pushed so far.
    pub fn peek(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Returns the depth of this builder. A depth of 0 means nothing was pushed.
    pub fn level(&self) -> usize {
        self.path.len()
    }

    /// Returns the local name of the master test suite.
    pub fn master_test_suite(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    /// Returns the qualified name built so far.
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.path.iter().skip(1).cloned())
    }
}

impl fmt::Display for QualifiedNameBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}
