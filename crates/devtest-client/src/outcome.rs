//! Build result derived from a run's terminal status.

use devtest_report::TestState;
use serde::Serialize;

/// Three-way build result: tests failing is not the same as the run failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildOutcome {
    Success,
    /// Tests ran and some failed
    Unstable,
    /// The run itself could not complete
    Failure,
}

impl BuildOutcome {
    /// Map a terminal `testStatus`, ignoring case.
    pub fn from_status(status: &str) -> Self {
        let status = status.trim();
        if status.eq_ignore_ascii_case("FAILED") {
            BuildOutcome::Unstable
        } else if status.eq_ignore_ascii_case("ABORTED")
            || status.eq_ignore_ascii_case("FAILED_TO_STAGE")
        {
            BuildOutcome::Failure
        } else {
            BuildOutcome::Success
        }
    }

    pub fn from_state(state: TestState) -> Self {
        Self::from_status(state.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildOutcome::Success => "SUCCESS",
            BuildOutcome::Unstable => "UNSTABLE",
            BuildOutcome::Failure => "FAILURE",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildOutcome::Success => 0,
            BuildOutcome::Failure => 1,
            BuildOutcome::Unstable => 2,
        }
    }
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
