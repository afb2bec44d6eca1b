// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data models for fixture information.

/// The artifacts a single Boost.Test run leaves behind.
#[derive(Copy, Clone, Debug)]
pub struct ArtifactsFixture {
    pub report: &'static str,
    pub log: &'static str,
    pub stdout: &'static str,
    pub stderr: &'static str,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CaseFixtureStatus {
    Pass,
    Fail,
    Skip,
    Abort,
}

#[derive(Clone, Debug)]
pub struct CaseFixture {
    pub name: &'static str,
    pub status: CaseFixtureStatus,
    pub assertions_passed: u32,
    pub assertions_failed: u32,
    pub duration_micros: u64,
    pub log_entries: &'static [&'static str],
}

impl CaseFixture {
    pub fn new(name: &'static str, status: CaseFixtureStatus) -> Self {
        Self {
            name,
            status,
            assertions_passed: 0,
            assertions_failed: 0,
            duration_micros: 0,
            log_entries: &[],
        }
    }

    pub fn with_assertions(mut self, passed: u32, failed: u32) -> Self {
        self.assertions_passed = passed;
        self.assertions_failed = failed;
        self
    }

    pub fn with_duration(mut self, duration_micros: u64) -> Self {
        self.duration_micros = duration_micros;
        self
    }

    /// Sets the expected log entry kinds, by display name, in order.
    pub fn with_log_entries(mut self, log_entries: &'static [&'static str]) -> Self {
        self.log_entries = log_entries;
        self
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CaseCountsFixture {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub aborted: u32,
}

/// Encodes `text` as ISO-8859-1, the way Boost.Test writes it on Windows.
///
/// Panics if `text` contains a character outside Latin-1.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(c).expect("fixture text is Latin-1"))
        .collect()
}
