//! DevTest Registry client.
//!
//! Submits test and suite runs, polls them until they end, downloads their
//! JSON reports for `devtest_report::ReportParser`, and manages virtual
//! services on a Virtual Service Environment.
//!
//! Every component receives its [`RegistryConfig`] (or a [`DevTestClient`]
//! built from one) explicitly; nothing is looked up globally.

pub mod cancel;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod outcome;
pub mod run;
pub mod step;
pub mod telemetry;
pub mod virtual_service;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use client::{DevTestClient, Reply};
pub use config::RegistryConfig;
pub use endpoints::Endpoints;
pub use error::DevTestError;
pub use fetch::ReportFetcher;
pub use outcome::BuildOutcome;
pub use run::{
    is_terminal_status, response_field, PollConfig, RunApi, RunKind, RunPoller, RunRequest,
    RunStatus,
};
pub use step::{StepSummary, TestRunStep};
pub use telemetry::init_tracing;
pub use virtual_service::{split_names, CreateServiceRequest, UndeployOutcome, VirtualServices};

/// Result type for devtest-client operations
pub type Result<T> = std::result::Result<T, DevTestError>;
