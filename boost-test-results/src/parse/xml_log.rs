// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The XML log parser.

use super::{
    ResultParser,
    xml::{Element, Node, read_document},
};
use crate::{
    errors::{LogParseError, ResultParseError},
    identity::{QualifiedNameBuilder, SourceFileInfo},
    log_entry::{LogEntry, LogEntryKind},
    results::{TestResult, TestResultCollection},
    test_unit::TestUnit,
};
use std::rc::Rc;

const TEST_LOG: &str = "TestLog";
const TEST_SUITE: &str = "TestSuite";
const TEST_CASE: &str = "TestCase";
const NAME: &str = "name";
const TESTING_TIME: &str = "TestingTime";
const INFO: &str = "Info";
const MESSAGE: &str = "Message";
const WARNING: &str = "Warning";
const ERROR: &str = "Error";
const FATAL_ERROR: &str = "FatalError";
const EXCEPTION: &str = "Exception";
const LAST_CHECKPOINT: &str = "LastCheckpoint";
const CONTEXT: &str = "Context";
const FRAME: &str = "Frame";
const FILE: &str = "file";
const LINE: &str = "line";

/// Parses the XML log written by `--log_format=xml --log_level=test_suite` (or more verbose).
///
/// Log entries are appended to existing results, so counts set by the report survive. Results
/// missing from the collection are created on demand.
#[derive(Clone, Debug, Default)]
pub struct XmlLogParser;

impl XmlLogParser {
    /// Creates a new log parser.
    pub fn new() -> Self {
        Self
    }

    fn parse_log(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), LogParseError> {
        let nodes = read_document(content)?;

        // Dependent test cases make Boost.Test write extra elements around the log.
        let Some(log) = nodes.iter().find_map(|node| match node {
            Node::Element(element) => element.find_descendant(TEST_LOG),
            Node::Text(_) | Node::CData(_) => None,
        }) else {
            tracing::debug!("no `{TEST_LOG}` element found in log");
            return Ok(());
        };

        let mut cx = LogContext {
            path: QualifiedNameBuilder::new(),
            results,
        };
        for child in log.child_elements() {
            if let Some(root) = cx.parse_unit(child, None)? {
                cx.results.adopt_tree(root);
            }
        }
        Ok(())
    }
}

impl ResultParser for XmlLogParser {
    fn parse(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ResultParseError> {
        Ok(self.parse_log(content, results)?)
    }
}

struct LogContext<'a> {
    path: QualifiedNameBuilder,
    results: &'a mut TestResultCollection,
}

impl LogContext<'_> {
    /// Parses a suite or case element. Returns the unit created, or `None` for other elements.
    fn parse_unit(
        &mut self,
        element: &Element,
        parent: Option<&Rc<TestUnit>>,
    ) -> Result<Option<Rc<TestUnit>>, LogParseError> {
        match element.name.as_str() {
            TEST_SUITE => {
                let name = required(element, NAME)?;
                let suite = TestUnit::new_suite(name, parent)?;
                self.path.push(name);
                for child in element.child_elements() {
                    self.parse_unit(child, Some(&suite))?;
                }
                self.path.pop();
                Ok(Some(suite))
            }
            TEST_CASE => {
                let name = required(element, NAME)?;
                let case = TestUnit::new_case(name, parent)?;
                self.path.push(name);
                let key = self.path.to_string();
                self.path.pop();

                let result = self
                    .results
                    .get_or_insert_with(key, || TestResult::new(Some(Rc::clone(&case))));
                parse_case_children(element, result)?;
                Ok(Some(case))
            }
            _ => Ok(None),
        }
    }
}

fn parse_case_children(element: &Element, result: &mut TestResult) -> Result<(), LogParseError> {
    for child in element.child_elements() {
        let kind = match child.name.as_str() {
            TESTING_TIME => {
                let text = child.inner_text();
                // Boost.Test reports testing time in microseconds.
                result.duration_micros =
                    text.trim()
                        .parse()
                        .map_err(|err| LogParseError::InvalidNumber {
                            element: TESTING_TIME.to_owned(),
                            value: text.clone(),
                            err,
                        })?;
                continue;
            }
            INFO => LogEntryKind::Info,
            MESSAGE => LogEntryKind::Message,
            WARNING => LogEntryKind::Warning,
            ERROR => LogEntryKind::Error,
            FATAL_ERROR => LogEntryKind::FatalError,
            EXCEPTION => {
                let checkpoint = child.children_named(LAST_CHECKPOINT).last();
                LogEntryKind::Exception {
                    last_checkpoint: checkpoint.map(parse_source).transpose()?.flatten(),
                    checkpoint_detail: checkpoint.map(Element::inner_text),
                }
            }
            other => {
                tracing::debug!(element = other, "skipping unrecognized log element");
                continue;
            }
        };
        result.log_entries.push(parse_entry(child, kind)?);
    }
    Ok(())
}

fn parse_entry(element: &Element, kind: LogEntryKind) -> Result<LogEntry, LogParseError> {
    let mut cdata = None;
    let mut text = String::new();
    let mut context_frames = Vec::new();

    for node in &element.children {
        match node {
            Node::CData(data) => cdata = Some(data.as_str()),
            Node::Text(data) => text.push_str(data),
            Node::Element(child) if child.name == CONTEXT => {
                context_frames = child
                    .children_named(FRAME)
                    .map(|frame| frame.inner_text().trim().to_owned())
                    .collect();
            }
            Node::Element(_) => {}
        }
    }

    Ok(LogEntry {
        kind,
        detail: cdata.map_or(text, str::to_owned),
        source: parse_source(element)?,
        context_frames,
    })
}

fn parse_source(element: &Element) -> Result<Option<SourceFileInfo>, LogParseError> {
    let Some(file) = element.attribute(FILE) else {
        return Ok(None);
    };
    let line_number = element
        .attribute(LINE)
        .map(|line| {
            line.trim()
                .parse()
                .map_err(|err| LogParseError::InvalidNumber {
                    element: format!("{}@{LINE}", element.name),
                    value: line.to_owned(),
                    err,
                })
        })
        .transpose()?;
    Ok(Some(SourceFileInfo::new(file, line_number)))
}

fn required<'a>(element: &'a Element, attribute: &'static str) -> Result<&'a str, LogParseError> {
    element
        .attribute(attribute)
        .ok_or_else(|| LogParseError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })
}
