//! The test-run build step: submit, wait, fetch, classify, count.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use devtest_report::{ParseIssue, ReportParser};
use serde::Serialize;
use tracing::info;

use crate::cancel::Cancellation;
use crate::client::DevTestClient;
use crate::fetch::{checked_id, ReportFetcher};
use crate::outcome::BuildOutcome;
use crate::run::{PollConfig, RunKind, RunPoller, RunRequest};
use crate::Result;

/// Directory under the work dir holding one subdirectory per run.
pub const REPORT_DIR: &str = "report";

/// What a finished step reports back.
#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub run_id: String,
    pub status: String,
    pub outcome: BuildOutcome,
    #[serde(skip)]
    pub response_body: String,
    pub report_dir: PathBuf,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    #[serde(skip)]
    pub issues: Vec<ParseIssue>,
}

/// Runs a test or suite end to end against one registry.
pub struct TestRunStep {
    client: DevTestClient,
    poll: PollConfig,
    cancel: Cancellation,
    work_dir: PathBuf,
}

impl TestRunStep {
    pub fn new(client: DevTestClient, work_dir: impl Into<PathBuf>) -> Self {
        TestRunStep {
            client,
            poll: PollConfig::default(),
            cancel: Cancellation::never(),
            work_dir: work_dir.into(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// `<work dir>/report`, the publisher's input.
    pub fn report_root(&self) -> PathBuf {
        self.work_dir.join(REPORT_DIR)
    }

    /// Where a run's documents land, by kind. Always below `report_root`.
    pub fn run_report_dir(report_root: &Path, kind: RunKind, run_id: &str) -> Result<PathBuf> {
        let run_dir = report_root.join(checked_id(run_id, "run")?);
        Ok(match kind {
            RunKind::Test => run_dir.join("tests").join("case"),
            RunKind::Suite => run_dir.join("suites").join("suite"),
        })
    }

    pub async fn run(&self, request: &RunRequest) -> Result<StepSummary> {
        request.validate()?;
        info!(
            registry = %self.client.endpoints().base_url(),
            kind = %request.kind,
            artifact = %request.artifact.display(),
            "running DevTest {}", request.kind
        );

        let poller = RunPoller::new(Arc::new(self.client.clone()), self.poll, self.cancel.clone());
        let status = poller.submit_and_wait(request).await?;

        let report_root = self.report_root();
        let report_dir = Self::run_report_dir(&report_root, request.kind, &status.run_id)?;
        self.cancel.check()?;
        ReportFetcher::new(&self.client)
            .fetch(request.kind, &status.run_id, &report_dir)
            .await?;

        let outcome = BuildOutcome::from_status(&status.status);
        let parsed = ReportParser::parse_step(&report_root.join(&status.run_id));
        let report = &parsed.value;
        let (total, passed, failed) = (
            report.total_count(),
            report.success_count(),
            report.fail_count(),
        );
        info!(
            run_id = %status.run_id,
            status = %status.status,
            %outcome,
            total,
            passed,
            failed,
            "DevTest run finished"
        );

        Ok(StepSummary {
            run_id: status.run_id,
            status: status.status,
            outcome,
            response_body: status.body,
            report_dir,
            total,
            passed,
            failed,
            issues: parsed.issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_report_dir_layout() {
        let root = Path::new("/w/report");
        assert_eq!(
            TestRunStep::run_report_dir(root, RunKind::Test, "R1").unwrap(),
            PathBuf::from("/w/report/R1/tests/case")
        );
        assert_eq!(
            TestRunStep::run_report_dir(root, RunKind::Suite, "R2").unwrap(),
            PathBuf::from("/w/report/R2/suites/suite")
        );
    }

    #[test]
    fn test_run_report_dir_stays_under_root() {
        let root = Path::new("/w/report");
        for run_id in ["/etc/evil", "../../../tmp/evil", "..", ""] {
            let err = TestRunStep::run_report_dir(root, RunKind::Test, run_id).unwrap_err();
            assert!(
                matches!(err, crate::DevTestError::InvalidResponse(_)),
                "{run_id:?}: {err}"
            );
        }
    }
}
