//! Test execution states reported by the DevTest test-invoke API.

use serde::{Deserialize, Serialize};

/// State of a test run, test case or test cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestState {
    Passed,
    Failed,
    NotInitiated,
    Initiated,
    Running,
    Ended,
    Aborted,
    FailedToStage,
    Unknown,
}

impl TestState {
    /// All states, in wire order.
    pub const ALL: [TestState; 9] = [
        TestState::Passed,
        TestState::Failed,
        TestState::NotInitiated,
        TestState::Initiated,
        TestState::Running,
        TestState::Ended,
        TestState::Aborted,
        TestState::FailedToStage,
        TestState::Unknown,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestState::Passed => "PASSED",
            TestState::Failed => "FAILED",
            TestState::NotInitiated => "NOT_INITIATED",
            TestState::Initiated => "INITIATED",
            TestState::Running => "RUNNING",
            TestState::Ended => "ENDED",
            TestState::Aborted => "ABORTED",
            TestState::FailedToStage => "FAILED_TO_STAGE",
            TestState::Unknown => "UNKNOWN",
        }
    }

    /// Parse the exact wire representation.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.as_str() == s)
    }

    /// Parse a report field, falling back to `Failed` for anything unrecognised.
    pub fn parse_or_failed(s: &str) -> Self {
        Self::from_wire(s).unwrap_or(TestState::Failed)
    }

    /// `PASSED` is the only successful state.
    pub fn is_successful(&self) -> bool {
        *self == TestState::Passed
    }

    /// Whether a run in this state will not change any more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TestState::Ended
                | TestState::Passed
                | TestState::Failed
                | TestState::Aborted
                | TestState::FailedToStage
        )
    }
}

impl Default for TestState {
    fn default() -> Self {
        TestState::Failed
    }
}

impl std::fmt::Display for TestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
