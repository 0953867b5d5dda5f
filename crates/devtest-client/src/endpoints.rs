//! URL templates of the DevTest Registry REST APIs.

use crate::run::RunKind;

const TEST_INVOKE: &str = "/lisa-test-invoke/api/v1";
const DCM: &str = "/api/Dcm";
const VIRTUALIZE_INVOKE: &str = "/lisa-virtualize-invoke/api/v3";

/// Accept header for the DCM connectivity check.
pub const DCM_ACCEPT: &str = "application/vnd.ca.lisaInvoke.dcm+json";

/// Accept header for virtual-service actions.
pub const VIRTUAL_SERVICE_ACCEPT: &str = "application/vnd.ca.lisaInvoke.virtualService+json";

/// Absolute URLs for one registry, built from its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Endpoints {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn reports(&self, kind: RunKind, run_id: &str) -> String {
        self.url(&format!("{TEST_INVOKE}/{}/reports/{run_id}", kind.as_str()))
    }

    pub fn dcm(&self) -> String {
        self.url(&format!("{DCM}/"))
    }

    pub fn submit(&self, kind: RunKind) -> String {
        self.url(&format!("{TEST_INVOKE}/{}/run", kind.as_str()))
    }

    pub fn poll(&self, kind: RunKind, run_id: &str) -> String {
        format!("{}/{run_id}", self.submit(kind))
    }

    pub fn test_report(&self, run_id: &str) -> String {
        self.reports(RunKind::Test, run_id)
    }

    pub fn test_cycles(&self, run_id: &str) -> String {
        format!("{}/cycles", self.test_report(run_id))
    }

    pub fn suite_report(&self, run_id: &str) -> String {
        self.reports(RunKind::Suite, run_id)
    }

    pub fn suite_tests(&self, run_id: &str) -> String {
        format!("{}/tests", self.suite_report(run_id))
    }

    pub fn suite_case_report(&self, run_id: &str, case_id: &str) -> String {
        format!("{}/{case_id}", self.suite_tests(run_id))
    }

    pub fn suite_case_cycles(&self, run_id: &str, case_id: &str) -> String {
        format!("{}/cycles", self.suite_case_report(run_id, case_id))
    }

    pub fn deploy_mar(&self, vse: &str) -> String {
        self.url(&format!("{DCM}/VSEs/{vse}/actions/deployMar/"))
    }

    pub fn start_vs(&self, vse: &str, vs: &str) -> String {
        self.url(&format!("{DCM}/VSEs/{vse}/{vs}/actions/start/"))
    }

    pub fn stop_vs(&self, vse: &str, vs: &str) -> String {
        self.url(&format!("{DCM}/VSEs/{vse}/{vs}/actions/stop/"))
    }

    pub fn undeploy_vs(&self, vse: &str, vs: &str) -> String {
        self.url(&format!("{DCM}/VSEs/{vse}/{vs}/"))
    }

    pub fn create_vs(&self, vse: &str) -> String {
        self.url(&format!("{VIRTUALIZE_INVOKE}/vses/{vse}/services"))
    }
}
