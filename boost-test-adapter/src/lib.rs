// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconcile the report, log and console output of a Boost.Test run, and print the results or
//! write them out as JUnit XML.
//!
//! ```text
//! boost-test-adapter parse --report test.report.xml --log test.log.xml --stdout test.stdout.log
//! ```

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
