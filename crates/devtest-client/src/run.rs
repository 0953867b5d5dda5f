//! Run submission and status polling.
//!
//! [`RunPoller`] submits a test or suite run and polls its status resource at
//! a fixed interval until the run reaches a terminal [`TestState`]. There is
//! no backoff; unless [`PollConfig::max_attempts`] is set, a run that never
//! ends is polled until the [`Cancellation`] token fires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devtest_report::TestState;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::cancel::Cancellation;
use crate::client::DevTestClient;
use crate::error::DevTestError;
use crate::Result;

/// Default delay between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1900);

/// Test-invoke resource family a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Test,
    Suite,
}

impl RunKind {
    /// Path segment: `tests` or `suites`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Test => "tests",
            RunKind::Suite => "suites",
        }
    }
}

impl std::fmt::Display for RunKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test or suite run to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub kind: RunKind,
    /// `.tst` / `.ste` document or archive under test
    pub artifact: PathBuf,
    pub staging_doc: Option<String>,
    pub staging_doc_file: Option<PathBuf>,
    pub config: Option<String>,
    pub config_file: Option<PathBuf>,
    pub coordinator_server_name: Option<String>,
}

impl RunRequest {
    pub fn new(kind: RunKind, artifact: impl Into<PathBuf>) -> Self {
        RunRequest {
            kind,
            artifact: artifact.into(),
            staging_doc: None,
            staging_doc_file: None,
            config: None,
            config_file: None,
            coordinator_server_name: None,
        }
    }

    pub fn with_staging_doc(mut self, doc: &str) -> Self {
        self.staging_doc = Some(doc.to_string());
        self
    }

    pub fn with_staging_doc_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_doc_file = Some(path.into());
        self
    }

    pub fn with_config(mut self, config: &str) -> Self {
        self.config = Some(config.to_string());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_coordinator_server_name(mut self, name: &str) -> Self {
        self.coordinator_server_name = Some(name.to_string());
        self
    }

    /// The artifact path must be non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.artifact.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(DevTestError::InvalidInput(format!(
                "no {} document to run",
                self.kind
            )));
        }
        Ok(())
    }

    /// Multipart body: the artifact as `file` plus every non-blank option.
    pub async fn to_form(&self) -> Result<Form> {
        self.validate()?;
        let mut form = Form::new().part("file", file_part(&self.artifact).await?);

        if let Some(doc) = non_blank(&self.staging_doc) {
            form = form.text("stagingDoc", doc);
        }
        if let Some(path) = non_blank_path(&self.staging_doc_file) {
            form = form.part("stagingDocFile", file_part(&path).await?);
        }
        if let Some(config) = non_blank(&self.config) {
            form = form.text("config", config);
        }
        if let Some(path) = non_blank_path(&self.config_file) {
            form = form.part("configFile", file_part(&path).await?);
        }
        if let Some(name) = non_blank(&self.coordinator_server_name) {
            form = form.text("coordinatorServerName", name);
        }
        Ok(form)
    }
}

/// Trimmed value when present and not blank.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn non_blank_path(value: &Option<PathBuf>) -> Option<PathBuf> {
    value
        .as_ref()
        .and_then(|p| p.to_str())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Upload part for a local file; a missing file aborts.
pub(crate) async fn file_part(path: &Path) -> Result<Part> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(DevTestError::MissingFile(path.to_path_buf()));
    }
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// `key` from a JSON object body as a string; `""` when absent.
///
/// Fails only when the body is not JSON at all.
pub fn response_field(body: &str, key: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DevTestError::InvalidResponse(format!("{e}: {body}")))?;
    Ok(match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

/// Remote side of the poller.
#[async_trait]
pub trait RunApi: Send + Sync {
    /// Submit a run and return the response body of a 200 answer.
    async fn submit(&self, request: &RunRequest) -> Result<String>;

    /// Fetch the status resource body of a run.
    async fn status(&self, kind: RunKind, run_id: &str) -> Result<String>;
}

#[async_trait]
impl RunApi for DevTestClient {
    async fn submit(&self, request: &RunRequest) -> Result<String> {
        let url = self.endpoints().submit(request.kind);
        let form = request.to_form().await?;
        info!(url = %url, artifact = %request.artifact.display(), "submitting DevTest run");
        let reply = self.post_multipart(&url, form, None).await?;
        Ok(reply.expect_status(200)?.body)
    }

    async fn status(&self, kind: RunKind, run_id: &str) -> Result<String> {
        let url = self.endpoints().poll(kind, run_id);
        let reply = self.get(&url, None).await?;
        if !reply.is_success() {
            return Err(reply.into_unexpected());
        }
        Ok(reply.body)
    }
}

/// Poll loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Give up after this many status checks; `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Terminal result of a polled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub run_id: String,
    /// `testStatus` exactly as reported
    pub status: String,
    /// Last status body
    pub body: String,
}

impl RunStatus {
    pub fn state(&self) -> Option<TestState> {
        TestState::from_wire(&self.status)
    }
}

/// Whether a reported `testStatus` ends the poll loop.
pub fn is_terminal_status(status: &str) -> bool {
    TestState::from_wire(status).is_some_and(|state| state.is_terminal())
}

/// Submits runs and waits for them to end.
pub struct RunPoller {
    api: Arc<dyn RunApi>,
    config: PollConfig,
    cancel: Cancellation,
}

impl RunPoller {
    pub fn new(api: Arc<dyn RunApi>, config: PollConfig, cancel: Cancellation) -> Self {
        RunPoller {
            api,
            config,
            cancel,
        }
    }

    /// Submit the run; returns `(run id, response body)`. The id is `""`
    /// when the response has none.
    pub async fn submit(&self, request: &RunRequest) -> Result<(String, String)> {
        self.cancel.check()?;
        let body = self.api.submit(request).await?;
        let run_id = response_field(&body, "id")?;
        info!(run_id = %run_id, kind = %request.kind, "DevTest run submitted");
        Ok((run_id, body))
    }

    /// Poll until the run reaches a terminal status.
    pub async fn wait_for_end(&self, kind: RunKind, run_id: &str) -> Result<RunStatus> {
        let mut attempts: u32 = 0;
        let mut last_status = String::new();
        loop {
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(DevTestError::PollLimitExceeded {
                        run_id: run_id.to_string(),
                        attempts,
                        last_status,
                    });
                }
            }

            self.cancel.check()?;
            self.cancel.sleep(self.config.interval).await?;
            self.cancel.check()?;

            let body = self.api.status(kind, run_id).await?;
            attempts += 1;
            let status = response_field(&body, "testStatus")?;
            debug!(run_id, attempt = attempts, status = %status, "run status");

            if is_terminal_status(&status) {
                info!(run_id, status = %status, attempts, "DevTest run ended");
                return Ok(RunStatus {
                    run_id: run_id.to_string(),
                    status,
                    body,
                });
            }
            last_status = status;
        }
    }

    /// Submit and block until the run ends. An empty run id is an error here.
    pub async fn submit_and_wait(&self, request: &RunRequest) -> Result<RunStatus> {
        let (run_id, body) = self.submit(request).await?;
        if run_id.is_empty() {
            return Err(DevTestError::MissingRunId { body });
        }
        self.wait_for_end(request.kind, &run_id).await
    }
}
