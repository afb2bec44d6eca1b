// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Reconciliation of the artifacts a [Boost.Test](https://www.boost.org/libs/test) run
//! leaves behind.
//!
//! A test executable run with `--report_format=xml --log_format=xml` writes an XML report and
//! an XML log, and its console output may be captured as well. Each of these tells part of the
//! story. The parsers in [`parse`] fold them, in order, into a single
//! [`TestResultCollection`](results::TestResultCollection) keyed by fully-qualified test name.
//! The [`reporter`] module translates the collection for display.

pub mod config;
pub mod errors;
pub mod identity;
pub mod log_entry;
pub mod parse;
pub mod reporter;
pub mod results;
pub mod test_unit;
