// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use boost_test_results::{parse::ResultArtifacts, results::TestOutcome};
use camino::Utf8Path;
use color_eyre::eyre::Result;
use fixture_data::models::{ArtifactsFixture, CaseFixtureStatus, encode_latin1};

/// Writes `fixture` to `dir` the way a test run would, encoded as ISO-8859-1.
pub(crate) fn write_artifacts(dir: &Utf8Path, fixture: &ArtifactsFixture) -> Result<ResultArtifacts> {
    let write = |name: &str, content: &str| -> Result<_> {
        let path = dir.join(name);
        fs_err::write(&path, encode_latin1(content))?;
        Ok(Some(path))
    };

    Ok(ResultArtifacts {
        report: write("BoostUnitTest.test.report.xml", fixture.report)?,
        log: write("BoostUnitTest.test.log.xml", fixture.log)?,
        stdout: write("BoostUnitTest.test.stdout.log", fixture.stdout)?,
        stderr: write("BoostUnitTest.test.stderr.log", fixture.stderr)?,
    })
}

pub(crate) fn expected_outcome(status: CaseFixtureStatus) -> TestOutcome {
    match status {
        CaseFixtureStatus::Pass => TestOutcome::Passed,
        CaseFixtureStatus::Fail => TestOutcome::Failed,
        CaseFixtureStatus::Skip => TestOutcome::Skipped,
        CaseFixtureStatus::Abort => TestOutcome::Aborted,
    }
}
