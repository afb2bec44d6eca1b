// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The XML report parser.

use super::{
    ResultParser,
    xml::{Element, first_element, read_document},
};
use crate::{
    errors::{ReportParseError, ResultParseError},
    results::{TestOutcome, TestResult, TestResultCollection},
    test_unit::TestUnit,
};
use std::rc::Rc;

const TEST_RESULT: &str = "TestResult";
const TEST_SUITE: &str = "TestSuite";
const TEST_CASE: &str = "TestCase";
const NAME: &str = "name";
const RESULT: &str = "result";
const ASSERTIONS_PASSED: &str = "assertions_passed";
const ASSERTIONS_FAILED: &str = "assertions_failed";
const EXPECTED_FAILURES: &str = "expected_failures";

/// Parses the XML report written by `--report_format=xml --report_level=detailed`.
///
/// Every suite and case in the report produces one result, replacing any result previously
/// stored under the same name.
#[derive(Clone, Debug, Default)]
pub struct XmlReportParser;

impl XmlReportParser {
    /// Creates a new report parser.
    pub fn new() -> Self {
        Self
    }

    fn parse_report(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ReportParseError> {
        let nodes = read_document(content)?;
        let root = first_element(&nodes).ok_or(ReportParseError::MissingRoot {
            expected: TEST_RESULT,
        })?;
        if root.name != TEST_RESULT {
            return Err(ReportParseError::UnexpectedRoot {
                expected: TEST_RESULT,
                found: root.name.clone(),
            });
        }

        let mut roots = Vec::new();
        parse_units(root, None, results, &mut roots)?;
        for root in roots {
            results.adopt_tree(root);
        }
        Ok(())
    }
}

impl ResultParser for XmlReportParser {
    fn parse(
        &self,
        content: &str,
        results: &mut TestResultCollection,
    ) -> Result<(), ResultParseError> {
        Ok(self.parse_report(content, results)?)
    }
}

// Suites are visited before cases at every level.
fn parse_units(
    element: &Element,
    parent: Option<&Rc<TestUnit>>,
    results: &mut TestResultCollection,
    roots: &mut Vec<Rc<TestUnit>>,
) -> Result<(), ReportParseError> {
    for suite in element.children_named(TEST_SUITE) {
        let unit = TestUnit::new_suite(required(suite, NAME)?, parent)?;
        store_result(suite, &unit, results)?;
        parse_units(suite, Some(&unit), results, roots)?;
        if parent.is_none() {
            roots.push(unit);
        }
    }

    for case in element.children_named(TEST_CASE) {
        let unit = TestUnit::new_case(required(case, NAME)?, parent)?;
        store_result(case, &unit, results)?;
        if parent.is_none() {
            roots.push(unit);
        }
    }

    Ok(())
}

fn store_result(
    element: &Element,
    unit: &Rc<TestUnit>,
    results: &mut TestResultCollection,
) -> Result<(), ReportParseError> {
    let result = TestResult {
        outcome: TestOutcome::from_report_value(element.attribute(RESULT).unwrap_or_default()),
        assertions_passed: count(element, ASSERTIONS_PASSED)?,
        assertions_failed: count(element, ASSERTIONS_FAILED)?,
        expected_failures: count(element, EXPECTED_FAILURES)?,
        ..TestResult::new(Some(Rc::clone(unit)))
    };
    let name = unit.qualified_name().to_string();
    if results.insert(name.as_str(), result).is_some() {
        tracing::debug!(%name, "report entry replaced an existing result");
    }
    Ok(())
}

fn required<'a>(element: &'a Element, attribute: &'static str) -> Result<&'a str, ReportParseError> {
    element
        .attribute(attribute)
        .ok_or_else(|| ReportParseError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })
}

fn count(element: &Element, attribute: &'static str) -> Result<u32, ReportParseError> {
    let value = required(element, attribute)?;
    value
        .trim()
        .parse()
        .map_err(|err| ReportParseError::InvalidCount {
            attribute,
            value: value.to_owned(),
            err,
        })
}
