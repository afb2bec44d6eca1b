// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report reconciled results in the shapes consumers expect.
//!
//! [`to_host_result`] renders a result the way a test explorer displays it, and
//! [`to_junit_report`] produces a JUnit XML report for CI systems.

mod host;
mod junit;

pub use host::*;
pub use junit::to_junit_report;
