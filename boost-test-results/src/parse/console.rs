// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsers for captured console output.
//!
//! Console output cannot be attributed to a single test case, so whatever is found is attached
//! to every test case result in the collection.

use super::ResultParser;
use crate::{
    errors::ResultParseError,
    log_entry::{LogEntry, MemoryLeak},
    results::{TestOutcome, TestResultCollection},
};
use regex::Regex;
use std::sync::LazyLock;

/// Matches the object dump the MSVC debug CRT prints on exit. The block body is captured.
static LEAK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)Detected\smemory\sleaks!\r?\nDumping objects\s->\r?\n(.*)Object dump complete\.",
    )
    .expect("memory leak block regex is valid")
});

/// Matches the header line of one leaked block, for example
/// `d:\src\leaky.cpp(58) : {869} normal block at 0x00A88A58, 4 bytes long.`
///
/// Groups: directory, file name, line, allocation number, size. The location prefix is only
/// present for allocations made through the debug `new`.
static LEAK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:([\\:\w\rA-z.]*?)([\w.]*)\((\d+)\)\s:\s)?\{(\d+)\}[\w\s]*,\s(\d+)[\s\w.]*\n",
    )
    .expect("memory leak header regex is valid")
});

/// Parses captured standard output, extracting memory leak reports.
#[derive(Clone, Debug, Default)]
pub struct StandardOutputParser {
    fail_test_on_memory_leak: bool,
}

impl StandardOutputParser {
    /// Creates a new parser. If `fail_test_on_memory_leak` is set, a leak dump marks every
    /// test case as failed.
    pub fn new(fail_test_on_memory_leak: bool) -> Self {
        Self {
            fail_test_on_memory_leak,
        }
    }
}

impl ResultParser for StandardOutputParser {
    fn parse(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ResultParseError> {
        let mut output = content;

        if let Some(captures) = LEAK_BLOCK.captures(content) {
            let (block_start, block) = match (captures.get(0), captures.get(1)) {
                (Some(whole), Some(block)) => (whole.start(), block.as_str()),
                _ => (content.len(), ""),
            };
            output = &content[..block_start];

            let leaks = extract_memory_leaks(block);
            tracing::debug!(
                leaks = leaks.len(),
                fail_test_on_memory_leak = self.fail_test_on_memory_leak,
                "memory leak dump found in standard output"
            );

            for (_, result) in results.iter_mut() {
                if self.fail_test_on_memory_leak {
                    result.outcome = TestOutcome::Failed;
                }
                result
                    .log_entries
                    .extend(leaks.iter().cloned().map(LogEntry::memory_leak));
            }
        }

        if !output.is_empty() {
            for (_, result) in results.iter_mut() {
                result.log_entries.push(LogEntry::standard_output(output));
            }
        }

        Ok(())
    }
}

/// Parses captured standard error. The whole stream becomes a single entry.
#[derive(Clone, Debug, Default)]
pub struct StandardErrorParser;

impl StandardErrorParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl ResultParser for StandardErrorParser {
    fn parse(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ResultParseError> {
        if !content.is_empty() {
            for (_, result) in results.iter_mut() {
                result.log_entries.push(LogEntry::standard_error(content));
            }
        }
        Ok(())
    }
}

/// Extracts the leaked blocks listed in the body of a CRT object dump.
///
/// A record's leaked data runs from the end of its header line to the start of the next
/// header. The final record's data excludes the trailing line break.
pub fn extract_memory_leaks(block: &str) -> Vec<MemoryLeak> {
    let headers: Vec<_> = LEAK_HEADER.captures_iter(block).collect();

    headers
        .iter()
        .enumerate()
        .map(|(idx, captures)| {
            let header_end = captures.get(0).map_or(block.len(), |m| m.end());
            let data = match headers.get(idx + 1).and_then(|next| next.get(0)) {
                Some(next) => &block[header_end..next.start()],
                None => {
                    let rest = &block[header_end..];
                    let rest = rest.strip_suffix('\n').unwrap_or(rest);
                    rest.strip_suffix('\r').unwrap_or(rest)
                }
            };

            let directory = captures.get(1);
            let file_name = captures.get(2);
            let line = captures.get(3);
            let source_location_reported =
                directory.is_some() && file_name.is_some() && line.is_some();

            MemoryLeak {
                source_file_path: directory
                    .filter(|_| source_location_reported)
                    .map(|m| m.as_str().to_owned()),
                source_file_name: file_name
                    .filter(|_| source_location_reported)
                    .map(|m| m.as_str().to_owned()),
                line_number: line
                    .filter(|_| source_location_reported)
                    .and_then(|m| m.as_str().parse().ok()),
                allocation_number: captures.get(4).and_then(|m| m.as_str().parse().ok()),
                size_in_bytes: captures.get(5).and_then(|m| m.as_str().parse().ok()),
                leaked_data: data.to_owned(),
                source_location_reported,
            }
        })
        .collect()
}
