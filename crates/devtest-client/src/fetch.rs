//! Downloads the report tree of an ended run into the layout `ReportParser` reads.

use std::path::{Component, Path};

use devtest_report::parser::{CYCLES_FILE, SUITE_FILE, SUITE_TESTS_FILE, TESTS_DIR, TEST_FILE};
use devtest_report::ReportParser;
use tracing::info;

use crate::client::DevTestClient;
use crate::error::DevTestError;
use crate::run::RunKind;
use crate::Result;

/// Accept a server-issued id only if it is a single plain path segment.
///
/// Run and case ids become directory names and URL path segments, so an
/// empty id, `.`, `..`, an absolute path or anything with a separator is
/// rejected.
pub fn checked_id<'i>(id: &'i str, what: &str) -> Result<&'i str> {
    let mut components = Path::new(id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || id.contains(['/', '\\']) {
        return Err(DevTestError::InvalidResponse(format!(
            "{what} id {id:?} is not a plain path segment"
        )));
    }
    Ok(id)
}

/// Pulls reports for one run; every failed download aborts the fetch.
pub struct ReportFetcher<'a> {
    client: &'a DevTestClient,
}

impl<'a> ReportFetcher<'a> {
    pub fn new(client: &'a DevTestClient) -> Self {
        ReportFetcher { client }
    }

    /// Fetch by run kind into `dest`.
    pub async fn fetch(&self, kind: RunKind, run_id: &str, dest: &Path) -> Result<()> {
        match kind {
            RunKind::Test => self.fetch_test_report(run_id, dest).await,
            RunKind::Suite => self.fetch_suite_report(run_id, dest).await,
        }
    }

    /// `test.json` and `cycles.json` of a standalone test run.
    pub async fn fetch_test_report(&self, run_id: &str, dest: &Path) -> Result<()> {
        let run_id = checked_id(run_id, "run")?;
        let endpoints = self.client.endpoints();
        info!(run_id, dest = %dest.display(), "fetching test report");
        self.client
            .download(&endpoints.test_report(run_id), &dest.join(TEST_FILE))
            .await?;
        self.client
            .download(&endpoints.test_cycles(run_id), &dest.join(CYCLES_FILE))
            .await?;
        Ok(())
    }

    /// Suite report, its test listing, then every listed case under `tests/case<N>`.
    pub async fn fetch_suite_report(&self, run_id: &str, dest: &Path) -> Result<()> {
        let run_id = checked_id(run_id, "run")?;
        let endpoints = self.client.endpoints();
        info!(run_id, dest = %dest.display(), "fetching suite report");
        self.client
            .download(&endpoints.suite_report(run_id), &dest.join(SUITE_FILE))
            .await?;
        let listing = self
            .client
            .download(&endpoints.suite_tests(run_id), &dest.join(SUITE_TESTS_FILE))
            .await?;

        let case_ids = ReportParser::case_ids_from_suite(&listing).into_value();
        for case_id in &case_ids {
            checked_id(case_id, "test case")?;
        }
        info!(run_id, cases = case_ids.len(), "fetching suite test cases");
        for (index, case_id) in case_ids.iter().enumerate() {
            let case_dir = dest.join(TESTS_DIR).join(format!("case{}", index + 1));
            self.client
                .download(
                    &endpoints.suite_case_report(run_id, case_id),
                    &case_dir.join(TEST_FILE),
                )
                .await?;
            self.client
                .download(
                    &endpoints.suite_case_cycles(run_id, case_id),
                    &case_dir.join(CYCLES_FILE),
                )
                .await?;
        }
        Ok(())
    }
}
