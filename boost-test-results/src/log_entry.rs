// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic events recorded against a test result.

use crate::identity::SourceFileInfo;
use serde::Serialize;
use std::fmt;

/// The detail attached to every memory leak entry. The leak specifics live in [`MemoryLeak`].
pub const MEMORY_LEAK_NOTIFICATION: &str =
    "Memory leaks have been been detected. Please refer to the output tab for more details.";

/// One diagnostic event, parsed from a log or from console output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// What kind of event this is.
    pub kind: LogEntryKind,

    /// Free-text detail. May be empty.
    pub detail: String,

    /// Where the event was raised, if known.
    pub source: Option<SourceFileInfo>,

    /// Context frames active when the event was raised, outermost first.
    pub context_frames: Vec<String>,
}

impl LogEntry {
    /// Creates a new entry with no source location and no context.
    pub fn new(kind: LogEntryKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            source: None,
            context_frames: Vec::new(),
        }
    }

    /// Sets the source location of this entry.
    pub fn with_source(mut self, source: Option<SourceFileInfo>) -> Self {
        self.source = source;
        self
    }

    /// Creates a memory leak entry.
    ///
    /// The source of the entry is the leak location if one was reported.
    pub fn memory_leak(leak: MemoryLeak) -> Self {
        let source = leak.location();
        Self {
            kind: LogEntryKind::MemoryLeak(leak),
            detail: MEMORY_LEAK_NOTIFICATION.to_owned(),
            source,
            context_frames: Vec::new(),
        }
    }

    /// Creates an entry holding captured standard output.
    pub fn standard_output(detail: impl Into<String>) -> Self {
        Self::new(LogEntryKind::StandardOutput, detail)
    }

    /// Creates an entry holding captured standard error.
    pub fn standard_error(detail: impl Into<String>) -> Self {
        Self::new(LogEntryKind::StandardError, detail)
    }

    /// Returns true if this entry flags a problem with the test.
    ///
    /// Memory leaks are not included: they are only reported as errors when nothing else is.
    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            LogEntryKind::Warning
                | LogEntryKind::Error
                | LogEntryKind::FatalError
                | LogEntryKind::Exception { .. }
        )
    }
}

/// The kind of a [`LogEntry`], along with any kind-specific data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LogEntryKind {
    /// An informational message, e.g. a passed assertion.
    Info,

    /// A user-issued message (`BOOST_TEST_MESSAGE`).
    Message,

    /// A warning-level assertion failure.
    Warning,

    /// An error-level assertion failure.
    Error,

    /// A fatal assertion failure or a system error.
    FatalError,

    /// An uncaught exception.
    Exception {
        /// The last checkpoint passed before the exception was thrown.
        last_checkpoint: Option<SourceFileInfo>,

        /// The text attached to the last checkpoint.
        checkpoint_detail: Option<String>,
    },

    /// A memory leak reported by the debug CRT.
    MemoryLeak(MemoryLeak),

    /// Captured standard output.
    StandardOutput,

    /// Captured standard error.
    StandardError,
}

impl LogEntryKind {
    /// Returns the human-readable name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Message => "Message",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::FatalError => "Fatal Error",
            Self::Exception { .. } => "Exception",
            Self::MemoryLeak(_) => "Memory leak",
            Self::StandardOutput => "Standard Output",
            Self::StandardError => "Standard Error",
        }
    }

    /// Returns the output stream this kind of entry is rendered to.
    pub fn category(&self) -> MessageCategory {
        match self {
            Self::Info | Self::Message | Self::StandardOutput => MessageCategory::StandardOutput,
            Self::Warning
            | Self::Error
            | Self::FatalError
            | Self::Exception { .. }
            | Self::MemoryLeak(_)
            | Self::StandardError => MessageCategory::StandardError,
        }
    }
}

impl fmt::Display for LogEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The output stream a log entry is rendered to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageCategory {
    /// Standard output.
    StandardOutput,

    /// Standard error.
    StandardError,
}

/// A memory leak record extracted from a debug CRT object dump.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryLeak {
    /// The directory part of the allocating source file, including the trailing separator.
    pub source_file_path: Option<String>,

    /// The file name of the allocating source file.
    pub source_file_name: Option<String>,

    /// The line of the allocation.
    pub line_number: Option<u32>,

    /// The CRT allocation request number.
    pub allocation_number: Option<u32>,

    /// The size of the leaked block.
    pub size_in_bytes: Option<u32>,

    /// The dumped block contents, as printed by the CRT.
    pub leaked_data: String,

    /// Whether the CRT reported a source location for this particular leak.
    ///
    /// Only allocations made through the debug `new` carry a location, so leaks in the same
    /// dump may differ.
    pub source_location_reported: bool,
}

impl MemoryLeak {
    /// Returns the leak location, if it was reported.
    pub fn location(&self) -> Option<SourceFileInfo> {
        if !self.source_location_reported {
            return None;
        }
        let mut file = self.source_file_path.clone().unwrap_or_default();
        file.push_str(self.source_file_name.as_deref().unwrap_or_default());
        Some(SourceFileInfo::new(file, self.line_number))
    }
}
