//! Report tree: `Report` → `TestSuite` → `TestCase` → `TestCycle`.
//!
//! Every node is built once from a `*Fields` value whose `Default` carries the
//! lenient defaults (zero counters, no timestamps, state `FAILED`) and is
//! immutable afterwards. Pass/fail partitions are derived from the state of
//! the contained nodes: `PASSED` is the only successful state.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::state::TestState;

/// Construction values for a [`TestCycle`].
#[derive(Debug, Clone, Default)]
pub struct TestCycleFields {
    pub id: Option<String>,
    /// Zero-based cycle index.
    pub cycle: u32,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    pub state: TestState,
    pub elapsed_time_in_millis: u64,
    pub messages: Vec<String>,
    /// Cycle JSON with keys in received order, pretty-printed for display.
    pub raw_report: String,
}

/// One execution cycle of a test case. Leaf of the report tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCycle {
    id: Option<String>,
    cycle: u32,
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
    state: TestState,
    elapsed_time_in_millis: u64,
    messages: Vec<String>,
    raw_report: String,
}

impl TestCycle {
    pub fn new(fields: TestCycleFields) -> Self {
        Self {
            id: fields.id,
            cycle: fields.cycle,
            start: fields.start,
            stop: fields.stop,
            state: fields.state,
            elapsed_time_in_millis: fields.elapsed_time_in_millis,
            messages: fields.messages,
            raw_report: fields.raw_report,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// One-based label, e.g. `"1 cycle"` for index 0.
    pub fn display_name(&self) -> String {
        format!("{} cycle", u64::from(self.cycle) + 1)
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn stop(&self) -> Option<NaiveDateTime> {
        self.stop
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn is_successful(&self) -> bool {
        self.state.is_successful()
    }

    pub fn elapsed_time_in_millis(&self) -> u64 {
        self.elapsed_time_in_millis
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn raw_report(&self) -> &str {
        &self.raw_report
    }
}

/// Construction values for a [`TestCase`].
#[derive(Debug, Clone, Default)]
pub struct TestCaseFields {
    pub id: Option<String>,
    pub name: Option<String>,
    pub state: TestState,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    pub elapsed_time_in_millis: u64,
    pub cycles: Vec<TestCycle>,
}

/// A single test run, either standalone or part of a suite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    id: Option<String>,
    name: Option<String>,
    /// Name of the owning suite, filled in by [`TestSuite::new`].
    suite_name: Option<String>,
    state: TestState,
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
    elapsed_time_in_millis: u64,
    cycles: Vec<TestCycle>,
}

impl TestCase {
    pub fn new(fields: TestCaseFields) -> Self {
        Self {
            id: fields.id,
            name: fields.name,
            suite_name: None,
            state: fields.state,
            start: fields.start,
            stop: fields.stop,
            elapsed_time_in_millis: fields.elapsed_time_in_millis,
            cycles: fields.cycles,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Owning suite name, empty for standalone cases.
    pub fn suite_name(&self) -> &str {
        self.suite_name.as_deref().unwrap_or_default()
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn is_successful(&self) -> bool {
        self.state.is_successful()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn stop(&self) -> Option<NaiveDateTime> {
        self.stop
    }

    pub fn elapsed_time_in_millis(&self) -> u64 {
        self.elapsed_time_in_millis
    }

    pub fn cycles(&self) -> &[TestCycle] {
        &self.cycles
    }

    pub fn failed_cycles(&self) -> Vec<&TestCycle> {
        self.cycles.iter().filter(|c| !c.is_successful()).collect()
    }

    pub fn successful_cycles(&self) -> Vec<&TestCycle> {
        self.cycles.iter().filter(|c| c.is_successful()).collect()
    }

    pub fn find_cycle(&self, id: &str) -> Option<&TestCycle> {
        self.cycles.iter().find(|c| c.id() == Some(id))
    }

    fn set_suite_name(&mut self, suite_name: Option<&str>) {
        self.suite_name = suite_name.map(str::to_string);
    }
}

/// Construction values for a [`TestSuite`].
#[derive(Debug, Clone, Default)]
pub struct TestSuiteFields {
    pub name: Option<String>,
    /// Passed through as reported, never parsed.
    pub elapsed_time: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    pub total_tests_count: u32,
    pub pass_count: u32,
    pub fail_count: u32,
    pub warning_count: u32,
    pub abort_count: u32,
    pub test_cases: Vec<TestCase>,
}

/// A suite run with its server-side counters and the cases fetched for it.
///
/// The counters come from the suite report and are independent of how many
/// cases were actually fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSuite {
    name: Option<String>,
    elapsed_time: Option<String>,
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
    total_tests_count: u32,
    pass_count: u32,
    fail_count: u32,
    warning_count: u32,
    abort_count: u32,
    test_cases: Vec<TestCase>,
}

impl TestSuite {
    /// Build the suite and back-fill its name onto every contained case.
    pub fn new(fields: TestSuiteFields) -> Self {
        let mut test_cases = fields.test_cases;
        for case in &mut test_cases {
            case.set_suite_name(fields.name.as_deref());
        }

        Self {
            name: fields.name,
            elapsed_time: fields.elapsed_time,
            start: fields.start,
            stop: fields.stop,
            total_tests_count: fields.total_tests_count,
            pass_count: fields.pass_count,
            fail_count: fields.fail_count,
            warning_count: fields.warning_count,
            abort_count: fields.abort_count,
            test_cases,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn elapsed_time(&self) -> Option<&str> {
        self.elapsed_time.as_deref()
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn stop(&self) -> Option<NaiveDateTime> {
        self.stop
    }

    pub fn total_tests_count(&self) -> u32 {
        self.total_tests_count
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    pub fn fail_count(&self) -> u32 {
        self.fail_count
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn abort_count(&self) -> u32 {
        self.abort_count
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    pub fn failed_tests(&self) -> Vec<&TestCase> {
        self.test_cases.iter().filter(|c| !c.is_successful()).collect()
    }

    pub fn successful_tests(&self) -> Vec<&TestCase> {
        self.test_cases.iter().filter(|c| c.is_successful()).collect()
    }
}

/// Root of the report tree for one run, one build step or a whole build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    suites: Vec<TestSuite>,
    stand_alone_cases: Vec<TestCase>,
    /// Identifier of the owning build, attached after parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
}

impl Report {
    pub fn new(suites: Vec<TestSuite>, stand_alone_cases: Vec<TestCase>) -> Self {
        Self {
            suites,
            stand_alone_cases,
            run: None,
        }
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    pub fn stand_alone_cases(&self) -> &[TestCase] {
        &self.stand_alone_cases
    }

    pub fn run(&self) -> Option<&str> {
        self.run.as_deref()
    }

    pub fn set_run(&mut self, run: impl Into<String>) {
        self.run = Some(run.into());
    }

    /// Standalone cases first, then each suite's cases in suite order.
    pub fn all_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.stand_alone_cases
            .iter()
            .chain(self.suites.iter().flat_map(|s| s.test_cases.iter()))
    }

    /// Number of cases actually present in the tree.
    pub fn case_count(&self) -> usize {
        self.stand_alone_cases.len()
            + self
                .suites
                .iter()
                .map(|s| s.test_cases.len())
                .sum::<usize>()
    }

    pub fn failed_tests(&self) -> Vec<&TestCase> {
        self.all_cases().filter(|c| !c.is_successful()).collect()
    }

    pub fn successful_tests(&self) -> Vec<&TestCase> {
        self.all_cases().filter(|c| c.is_successful()).collect()
    }

    pub fn fail_count(&self) -> usize {
        self.all_cases().filter(|c| !c.is_successful()).count()
    }

    pub fn success_count(&self) -> usize {
        self.all_cases().filter(|c| c.is_successful()).count()
    }

    /// Standalone cases plus each suite's reported `totalTestsExecuted`.
    pub fn total_count(&self) -> usize {
        self.stand_alone_cases.len()
            + self
                .suites
                .iter()
                .map(|s| s.total_tests_count as usize)
                .sum::<usize>()
    }

    pub fn find_case(&self, id: &str) -> Option<&TestCase> {
        self.all_cases().find(|c| c.id() == Some(id))
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty() && self.stand_alone_cases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, state: TestState) -> TestCase {
        TestCase::new(TestCaseFields {
            id: Some(id.to_string()),
            name: Some(format!("case-{id}")),
            state,
            ..Default::default()
        })
    }

    fn cycle(index: u32, state: TestState) -> TestCycle {
        TestCycle::new(TestCycleFields {
            id: Some(format!("cy{index}")),
            cycle: index,
            state,
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults_are_lenient() {
        let cycle = TestCycle::new(TestCycleFields::default());
        assert_eq!(cycle.state(), TestState::Failed);
        assert_eq!(cycle.cycle(), 0);
        assert_eq!(cycle.elapsed_time_in_millis(), 0);
        assert!(cycle.start().is_none());
        assert!(cycle.messages().is_empty());

        let case = TestCase::new(TestCaseFields::default());
        assert_eq!(case.state(), TestState::Failed);
        assert_eq!(case.suite_name(), "");
        assert!(case.cycles().is_empty());

        let suite = TestSuite::new(TestSuiteFields::default());
        assert_eq!(suite.total_tests_count(), 0);
        assert!(suite.name().is_none());
    }

    #[test]
    fn test_cycle_display_name_is_one_based() {
        assert_eq!(cycle(0, TestState::Passed).display_name(), "1 cycle");
        assert_eq!(cycle(4, TestState::Passed).display_name(), "5 cycle");
    }

    #[test]
    fn test_case_partitions_cycles() {
        let case = TestCase::new(TestCaseFields {
            cycles: vec![
                cycle(0, TestState::Passed),
                cycle(1, TestState::Ended),
                cycle(2, TestState::Aborted),
            ],
            ..Default::default()
        });
        assert_eq!(case.successful_cycles().len(), 1);
        assert_eq!(case.failed_cycles().len(), 2);
        assert_eq!(case.find_cycle("cy2").map(TestCycle::cycle), Some(2));
        assert!(case.find_cycle("nope").is_none());
    }

    #[test]
    fn test_suite_back_fills_suite_name() {
        let suite = TestSuite::new(TestSuiteFields {
            name: Some("AllTestsSuite".to_string()),
            test_cases: vec![case("a", TestState::Passed), case("b", TestState::Failed)],
            ..Default::default()
        });
        assert!(suite
            .test_cases()
            .iter()
            .all(|c| c.suite_name() == "AllTestsSuite"));
        assert_eq!(suite.failed_tests().len(), 1);
        assert_eq!(suite.successful_tests().len(), 1);
    }

    #[test]
    fn test_report_partition_is_exhaustive_and_disjoint() {
        let suite = TestSuite::new(TestSuiteFields {
            name: Some("s".to_string()),
            total_tests_count: 10,
            test_cases: vec![
                case("s1", TestState::Passed),
                case("s2", TestState::Running),
                case("s3", TestState::Unknown),
            ],
            ..Default::default()
        });
        let report = Report::new(
            vec![suite],
            vec![case("a1", TestState::Passed), case("a2", TestState::Failed)],
        );

        let failed: Vec<_> = report.failed_tests().iter().filter_map(|c| c.id()).collect();
        let passed: Vec<_> = report
            .successful_tests()
            .iter()
            .filter_map(|c| c.id())
            .collect();

        assert_eq!(failed, vec!["a2", "s2", "s3"]);
        assert_eq!(passed, vec!["a1", "s1"]);
        assert_eq!(failed.len() + passed.len(), report.case_count());
        assert!(failed.iter().all(|id| !passed.contains(id)));

        assert_eq!(report.fail_count(), 3);
        assert_eq!(report.success_count(), 2);
        // two standalone cases + the suite's declared total
        assert_eq!(report.total_count(), 12);
    }

    #[test]
    fn test_every_non_passed_state_fails_a_case() {
        for state in TestState::ALL {
            let report = Report::new(vec![], vec![case("x", state)]);
            let expected_failures = usize::from(state != TestState::Passed);
            assert_eq!(report.fail_count(), expected_failures, "{state}");
        }
    }

    #[test]
    fn test_run_is_attached_after_construction() {
        let mut report = Report::new(vec![], vec![case("a", TestState::Passed)]);
        assert!(report.run().is_none());
        report.set_run("build-42");
        assert_eq!(report.run(), Some("build-42"));
        assert!(report.find_case("a").is_some());
    }

    #[test]
    fn test_empty_report() {
        let report = Report::default();
        assert!(report.is_empty());
        assert_eq!(report.total_count(), 0);
        assert_eq!(report.fail_count(), 0);
    }
}
