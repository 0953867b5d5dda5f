//! Lenient parser for downloaded DevTest report trees.
//!
//! Layout of one build-step directory:
//!
//! ```text
//! <step>/suites/<suite>/suite.json
//! <step>/suites/<suite>/tests/<case>/test.json
//! <step>/suites/<suite>/tests/<case>/cycles.json
//! <step>/tests/<case>/test.json
//! <step>/tests/<case>/cycles.json
//! ```
//!
//! Nothing in here fails. Missing fields fall back to the model defaults,
//! unreadable or malformed documents drop the node they describe, and every
//! such defect is logged and returned as a [`ParseIssue`] next to the value.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::model::{
    Report, TestCase, TestCaseFields, TestCycle, TestCycleFields, TestSuite, TestSuiteFields,
};
use crate::state::TestState;
use crate::timestamp::parse_timestamp;

pub const SUITES_DIR: &str = "suites";
pub const TESTS_DIR: &str = "tests";
pub const SUITE_FILE: &str = "suite.json";
pub const SUITE_TESTS_FILE: &str = "testsSuite.json";
pub const TEST_FILE: &str = "test.json";
pub const CYCLES_FILE: &str = "cycles.json";

/// A report defect that was recovered from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIssue {
    #[error("cannot read {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("malformed JSON in {origin}: {message}")]
    MalformedJson { origin: String, message: String },

    #[error("{origin} is not a JSON object")]
    NotAnObject { origin: String },

    #[error("field '{field}' does not exist in {origin}")]
    MissingField { origin: String, field: String },

    #[error("field '{field}' in {origin} has unusable value {value}")]
    InvalidValue {
        origin: String,
        field: String,
        value: String,
    },

    #[error("test case could not be parsed in {}", dir.display())]
    CaseSkipped { dir: PathBuf },

    #[error("test suite could not be parsed in {}", dir.display())]
    SuiteSkipped { dir: PathBuf },
}

/// Best-effort parse result together with every defect that was defaulted.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub issues: Vec<ParseIssue>,
}

impl<T> Parsed<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    /// True when nothing had to be defaulted or skipped.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            issues: self.issues,
        }
    }
}

/// Builds [`Report`] trees from report directories and JSON fragments.
pub struct ReportParser;

impl ReportParser {
    /// Aggregate every build-step directory directly under `root_dir`.
    pub fn parse(root_dir: &Path) -> Parsed<Report> {
        info!(root = %root_dir.display(), "parsing DevTest reports");
        let mut collector = Collector::default();
        let mut suites = Vec::new();
        let mut cases = Vec::new();
        for step_dir in collector.sub_dirs(root_dir) {
            let (step_suites, step_cases) = collector.step(&step_dir);
            suites.extend(step_suites);
            cases.extend(step_cases);
        }
        collector.finish(Report::new(suites, cases))
    }

    /// Parse a single build-step directory.
    pub fn parse_step(step_dir: &Path) -> Parsed<Report> {
        debug!(step = %step_dir.display(), "parsing DevTest step report");
        let mut collector = Collector::default();
        let (suites, cases) = collector.step(step_dir);
        collector.finish(Report::new(suites, cases))
    }

    /// Test-case ids listed in a suite's `testsSuite.json`, in document order.
    pub fn case_ids_from_suite(suite_cases_json: &str) -> Parsed<Vec<String>> {
        let mut collector = Collector::default();
        let ids = collector
            .json(suite_cases_json, SUITE_TESTS_FILE)
            .map(|listing| collector.case_ids(&listing, SUITE_TESTS_FILE))
            .unwrap_or_default();
        collector.finish(ids)
    }

    /// Build a suite from `suite.json` content and the cases already parsed for it.
    pub fn suite_from_json(json: &str, cases: Vec<TestCase>) -> Parsed<Option<TestSuite>> {
        let mut collector = Collector::default();
        let suite = collector
            .json(json, SUITE_FILE)
            .and_then(|report| collector.suite(&report, cases, SUITE_FILE));
        collector.finish(suite)
    }

    /// Build a case from `test.json` content and its cycles.
    pub fn case_from_json(json: &str, cycles: Vec<TestCycle>) -> Parsed<Option<TestCase>> {
        let mut collector = Collector::default();
        let case = collector
            .json(json, TEST_FILE)
            .and_then(|report| collector.case(&report, cycles, TEST_FILE));
        collector.finish(case)
    }

    /// Cycles listed in `cycles.json` content.
    pub fn cycles_from_json(json: &str) -> Parsed<Vec<TestCycle>> {
        let mut collector = Collector::default();
        let cycles = collector
            .json(json, CYCLES_FILE)
            .map(|report| collector.cycles(&report, CYCLES_FILE))
            .unwrap_or_default();
        collector.finish(cycles)
    }
}

#[derive(Default)]
struct Collector {
    issues: Vec<ParseIssue>,
}

impl Collector {
    fn finish<T>(self, value: T) -> Parsed<T> {
        Parsed {
            value,
            issues: self.issues,
        }
    }

    fn record(&mut self, issue: ParseIssue) {
        warn!(%issue, "report defect");
        self.issues.push(issue);
    }

    // -- directory walking ---------------------------------------------------

    fn step(&mut self, step_dir: &Path) -> (Vec<TestSuite>, Vec<TestCase>) {
        let mut suites = Vec::new();
        for suite_dir in self.sub_dirs(&step_dir.join(SUITES_DIR)) {
            match self.suite_dir(&suite_dir) {
                Some(suite) => suites.push(suite),
                None => self.record(ParseIssue::SuiteSkipped { dir: suite_dir }),
            }
        }

        let mut cases = Vec::new();
        for case_dir in self.sub_dirs(&step_dir.join(TESTS_DIR)) {
            match self.case_dir(&case_dir) {
                Some(case) => cases.push(case),
                None => self.record(ParseIssue::CaseSkipped { dir: case_dir }),
            }
        }

        (suites, cases)
    }

    fn suite_dir(&mut self, suite_dir: &Path) -> Option<TestSuite> {
        let mut cases = Vec::new();
        for case_dir in self.sub_dirs(&suite_dir.join(TESTS_DIR)) {
            match self.case_dir(&case_dir) {
                Some(case) => cases.push(case),
                None => self.record(ParseIssue::CaseSkipped { dir: case_dir }),
            }
        }

        let path = suite_dir.join(SUITE_FILE);
        let origin = path.display().to_string();
        let report = self.read(&path).and_then(|text| self.json(&text, &origin))?;
        self.suite(&report, cases, &origin)
    }

    fn case_dir(&mut self, case_dir: &Path) -> Option<TestCase> {
        let test_path = case_dir.join(TEST_FILE);
        let test_origin = test_path.display().to_string();
        let report = self
            .read(&test_path)
            .and_then(|text| self.json(&text, &test_origin));

        let cycles_path = case_dir.join(CYCLES_FILE);
        let cycles_origin = cycles_path.display().to_string();
        let cycles = self
            .read(&cycles_path)
            .and_then(|text| self.json(&text, &cycles_origin))
            .map(|value| self.cycles(&value, &cycles_origin))
            .unwrap_or_default();

        self.case(&report?, cycles, &test_origin)
    }

    /// Immediate subdirectories in natural name order. A missing directory is empty.
    fn sub_dirs(&mut self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                self.record(ParseIssue::Unreadable {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                });
                return Vec::new();
            }
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        dirs
    }

    fn read(&mut self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                self.record(ParseIssue::Unreadable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn json(&mut self, text: &str, origin: &str) -> Option<Value> {
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(ParseIssue::MalformedJson {
                    origin: origin.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    // -- documents -----------------------------------------------------------

    fn object<'v>(&mut self, value: &'v Value, origin: &str) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.record(ParseIssue::NotAnObject {
                origin: origin.to_string(),
            });
        }
        object
    }

    fn suite(&mut self, report: &Value, cases: Vec<TestCase>, origin: &str) -> Option<TestSuite> {
        let obj = self.object(report, origin)?;
        Some(TestSuite::new(TestSuiteFields {
            name: self.string(obj, "suiteName", origin),
            elapsed_time: self.string(obj, "elapsedTimeInMillSec", origin),
            start: self.timestamp(obj, "startTime", origin),
            stop: self.timestamp(obj, "endTime", origin),
            total_tests_count: self.number(obj, "totalTestsExecuted", origin),
            pass_count: self.number(obj, "passCount", origin),
            fail_count: self.number(obj, "failCount", origin),
            warning_count: self.number(obj, "warningCount", origin),
            abort_count: self.number(obj, "abortCount", origin),
            test_cases: cases,
        }))
    }

    fn case(&mut self, report: &Value, cycles: Vec<TestCycle>, origin: &str) -> Option<TestCase> {
        let obj = self.object(report, origin)?;
        Some(TestCase::new(TestCaseFields {
            id: self.string(obj, "testRunUniqueId", origin),
            name: self.string(obj, "testcaseName", origin),
            state: self.state(obj, "endedState", origin),
            elapsed_time_in_millis: self.number(obj, "elapsedTimeInMillSec", origin),
            start: self.timestamp(obj, "startTime", origin),
            stop: self.timestamp(obj, "endTime", origin),
            cycles,
        }))
    }

    fn cycles(&mut self, report: &Value, origin: &str) -> Vec<TestCycle> {
        let Some(items) = embedded_array(report, "CycleHistory") else {
            debug!(origin, "no cycle history");
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| self.cycle(item, origin))
            .collect()
    }

    fn cycle(&mut self, item: &Value, origin: &str) -> Option<TestCycle> {
        let obj = self.object(item, origin)?;
        Some(TestCycle::new(TestCycleFields {
            id: self.string(obj, "cycleUniqueId", origin),
            cycle: self.number(obj, "cycle", origin),
            elapsed_time_in_millis: self.number(obj, "elapsedTimeInMillSec", origin),
            start: self.timestamp(obj, "startTime", origin),
            stop: self.timestamp(obj, "endTime", origin),
            state: self.state(obj, "endedState", origin),
            messages: self.messages(obj, origin),
            raw_report: serde_json::to_string_pretty(item).unwrap_or_else(|_| item.to_string()),
        }))
    }

    fn case_ids(&mut self, listing: &Value, origin: &str) -> Vec<String> {
        let Some(items) = embedded_array(listing, "Tests") else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        for item in items {
            let Some(obj) = self.object(item, origin) else {
                continue;
            };
            if let Some(id) = self.string(obj, "testRunUniqueId", origin) {
                ids.push(id);
            }
        }
        ids
    }

    // -- fields --------------------------------------------------------------

    fn string(&mut self, obj: &Map<String, Value>, field: &str, origin: &str) -> Option<String> {
        match obj.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            None | Some(Value::Null) => {
                self.record(ParseIssue::MissingField {
                    origin: origin.to_string(),
                    field: field.to_string(),
                });
                None
            }
            Some(other) => {
                self.invalid(origin, field, other.to_string());
                None
            }
        }
    }

    fn number<N: std::str::FromStr + Default>(
        &mut self,
        obj: &Map<String, Value>,
        field: &str,
        origin: &str,
    ) -> N {
        let Some(raw) = self.string(obj, field, origin) else {
            return N::default();
        };
        raw.trim().parse().unwrap_or_else(|_| {
            self.invalid(origin, field, raw);
            N::default()
        })
    }

    fn timestamp(
        &mut self,
        obj: &Map<String, Value>,
        field: &str,
        origin: &str,
    ) -> Option<chrono::NaiveDateTime> {
        let raw = self.string(obj, field, origin)?;
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            self.invalid(origin, field, raw);
        }
        parsed
    }

    fn state(&mut self, obj: &Map<String, Value>, field: &str, origin: &str) -> TestState {
        let Some(raw) = self.string(obj, field, origin) else {
            return TestState::default();
        };
        TestState::from_wire(&raw).unwrap_or_else(|| {
            self.invalid(origin, field, raw);
            TestState::default()
        })
    }

    fn messages(&mut self, obj: &Map<String, Value>, origin: &str) -> Vec<String> {
        let Some(items) = obj
            .get("_embedded")
            .and_then(|embedded| embedded.get("messages"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => messages.push(s.clone()),
                Value::Number(n) => messages.push(n.to_string()),
                Value::Bool(b) => messages.push(b.to_string()),
                other => self.invalid(origin, "messages", other.to_string()),
            }
        }
        messages
    }

    fn invalid(&mut self, origin: &str, field: &str, value: String) {
        self.record(ParseIssue::InvalidValue {
            origin: origin.to_string(),
            field: field.to_string(),
            value,
        });
    }
}

/// `report._embedded.<key>` when it is an array.
fn embedded_array<'v>(report: &'v Value, key: &str) -> Option<&'v Vec<Value>> {
    report
        .as_object()?
        .get("_embedded")?
        .as_object()?
        .get(key)?
        .as_array()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compare names chunk by chunk, digit runs numerically: `case2` < `case10`.
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a_rest, mut b_rest) = (a, b);
    loop {
        match (next_chunk(a_rest), next_chunk(b_rest)) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((a_chunk, a_tail)), Some((b_chunk, b_tail))) => {
                let ordering = match (is_digits(a_chunk), is_digits(b_chunk)) {
                    (true, true) => {
                        let a_num = a_chunk.trim_start_matches('0');
                        let b_num = b_chunk.trim_start_matches('0');
                        a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num))
                    }
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => a_chunk.cmp(b_chunk),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a_rest = a_tail;
                b_rest = b_tail;
            }
        }
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

/// Split off the leading run of digits or non-digits.
fn next_chunk(s: &str) -> Option<(&str, &str)> {
    let first = s.chars().next()?;
    let digit = first.is_ascii_digit();
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digit)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some(s.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYCLES: &str = r#"{
        "_embedded": {
            "CycleHistory": [
                {
                    "cycleUniqueId": "442F2822E5B211E7B46E020027E349EE",
                    "cycle": "0",
                    "elapsedTimeInMillSec": "4443",
                    "startTime": "2017-12-20T13:19:06-0500",
                    "endTime": "2017-12-20T13:19:11-0500",
                    "endedState": "FAILED",
                    "_embedded": { "messages": [] }
                },
                {
                    "cycleUniqueId": "55AA",
                    "cycle": 1,
                    "elapsedTimeInMillSec": 120,
                    "endedState": "PASSED",
                    "_embedded": { "messages": ["step one ok", "step two ok"] }
                }
            ]
        }
    }"#;

    #[test]
    fn test_cycle_raw_report_keeps_key_order() {
        let parsed = ReportParser::cycles_from_json(
            r#"{"_embedded":{"CycleHistory":[{"zeta":"1","cycleUniqueId":"C","alpha":"2"}]}}"#,
        );
        let raw = parsed.value[0].raw_report();
        let position = |key: &str| raw.find(key).unwrap();
        assert!(position("zeta") < position("cycleUniqueId"), "{raw}");
        assert!(position("cycleUniqueId") < position("alpha"), "{raw}");
    }

    #[test]
    fn test_parse_cycles() {
        let parsed = ReportParser::cycles_from_json(CYCLES);
        let cycles = &parsed.value;
        assert_eq!(cycles.len(), 2);

        let first = &cycles[0];
        assert_eq!(first.id(), Some("442F2822E5B211E7B46E020027E349EE"));
        assert_eq!(first.cycle(), 0);
        assert_eq!(first.elapsed_time_in_millis(), 4443);
        assert!(first.messages().is_empty());
        assert_eq!(first.start(), parse_timestamp("2017-12-20T13:19:06-0500"));
        assert_eq!(first.stop(), parse_timestamp("2017-12-20T13:19:11-0500"));
        assert_eq!(first.state(), TestState::Failed);
        assert!(first.raw_report().contains("442F2822E5B211E7B46E020027E349EE"));

        let second = &cycles[1];
        assert_eq!(second.cycle(), 1);
        assert_eq!(second.elapsed_time_in_millis(), 120);
        assert_eq!(second.state(), TestState::Passed);
        assert_eq!(second.messages(), ["step one ok", "step two ok"]);

        // the second cycle has no timestamps
        assert_eq!(
            parsed
                .issues
                .iter()
                .filter(|i| matches!(i, ParseIssue::MissingField { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_empty_cycle_gets_defaults() {
        let parsed = ReportParser::cycles_from_json(r#"{"_embedded": {"CycleHistory": [{}]}}"#);
        assert_eq!(parsed.value.len(), 1);
        let cycle = &parsed.value[0];
        assert_eq!(cycle.cycle(), 0);
        assert_eq!(cycle.elapsed_time_in_millis(), 0);
        assert!(cycle.messages().is_empty());
        assert!(cycle.start().is_none());
        assert!(cycle.stop().is_none());
        assert_eq!(cycle.state(), TestState::Failed);
        assert!(!parsed.is_clean());
    }

    #[test]
    fn test_cycles_without_history_are_empty() {
        assert!(ReportParser::cycles_from_json("{}").value.is_empty());
        assert!(ReportParser::cycles_from_json("[]").value.is_empty());

        let parsed = ReportParser::cycles_from_json("{ not json");
        assert!(parsed.value.is_empty());
        assert!(matches!(parsed.issues[0], ParseIssue::MalformedJson { .. }));
    }

    #[test]
    fn test_parse_case() {
        let json = r#"{
            "testRunUniqueId": "EAC6BDD9E5AF11E7BADA020027E349EE",
            "testcaseName": "Run1User1Cycle",
            "endedState": "FAILED",
            "elapsedTimeInMillSec": "55050",
            "startTime": "2017-12-20T13:02:20-0500",
            "endTime": "2017-12-20T13:02:25-0500"
        }"#;
        let parsed = ReportParser::case_from_json(json, Vec::new());
        assert!(parsed.is_clean());
        let case = parsed.value.unwrap();
        assert_eq!(case.id(), Some("EAC6BDD9E5AF11E7BADA020027E349EE"));
        assert_eq!(case.name(), Some("Run1User1Cycle"));
        assert_eq!(case.elapsed_time_in_millis(), 55050);
        assert_eq!(case.state(), TestState::Failed);
        assert_eq!(case.start(), parse_timestamp("2017-12-20T13:02:20-0500"));
        assert!(case.cycles().is_empty());
    }

    #[test]
    fn test_empty_case_gets_defaults() {
        let parsed = ReportParser::case_from_json("{}", Vec::new());
        let case = parsed.value.unwrap();
        assert!(case.id().is_none());
        assert!(case.name().is_none());
        assert_eq!(case.state(), TestState::Failed);
        assert_eq!(case.elapsed_time_in_millis(), 0);
        assert!(case.start().is_none());
        assert_eq!(parsed.issues.len(), 6);
    }

    #[test]
    fn test_case_with_bad_values_defaults_each_field() {
        let json = r#"{
            "testRunUniqueId": "X",
            "testcaseName": "n",
            "endedState": "EXPLODED",
            "elapsedTimeInMillSec": "soon",
            "startTime": "noon",
            "endTime": "2017-12-20T13:02:25-0500"
        }"#;
        let parsed = ReportParser::case_from_json(json, Vec::new());
        let case = parsed.value.unwrap();
        assert_eq!(case.state(), TestState::Failed);
        assert_eq!(case.elapsed_time_in_millis(), 0);
        assert!(case.start().is_none());
        assert!(case.stop().is_some());
        assert_eq!(parsed.issues.len(), 3);
        assert!(parsed
            .issues
            .iter()
            .all(|i| matches!(i, ParseIssue::InvalidValue { .. })));
    }

    #[test]
    fn test_non_object_case_is_skipped() {
        assert!(ReportParser::case_from_json("null", Vec::new()).value.is_none());
        assert!(ReportParser::case_from_json("[1,2]", Vec::new()).value.is_none());
        assert!(ReportParser::case_from_json("", Vec::new()).value.is_none());
    }

    #[test]
    fn test_parse_suite() {
        let json = r#"{
            "suiteName": "AllTestsSuite",
            "elapsedTimeInMillSec": "9887",
            "startTime": "2018-05-22T10:05:25-0400",
            "endTime": "2018-05-22T10:05:35-0400",
            "totalTestsExecuted": "10",
            "passCount": "0",
            "failCount": "0",
            "warningCount": "0",
            "abortCount": "1"
        }"#;
        let parsed = ReportParser::suite_from_json(json, Vec::new());
        assert!(parsed.is_clean());
        let suite = parsed.value.unwrap();
        assert_eq!(suite.name(), Some("AllTestsSuite"));
        assert_eq!(suite.elapsed_time(), Some("9887"));
        assert_eq!(suite.total_tests_count(), 10);
        assert_eq!(suite.abort_count(), 1);
        assert_eq!(suite.fail_count(), 0);
        assert_eq!(suite.start(), parse_timestamp("2018-05-22T10:05:25-0400"));
        assert!(suite.test_cases().is_empty());
    }

    #[test]
    fn test_empty_suite_gets_defaults() {
        let parsed = ReportParser::suite_from_json("{}", Vec::new());
        let suite = parsed.value.unwrap();
        assert!(suite.name().is_none());
        assert!(suite.elapsed_time().is_none());
        assert_eq!(suite.total_tests_count(), 0);
        assert_eq!(suite.pass_count(), 0);
        assert_eq!(suite.warning_count(), 0);
        assert!(suite.start().is_none());
        assert!(suite.stop().is_none());
    }

    #[test]
    fn test_case_ids_from_suite() {
        let json = r#"{
            "_embedded": {
                "Tests": [
                    { "testRunUniqueId": "A1", "testcaseName": "first" },
                    { "testRunUniqueId": "B2", "testcaseName": "second" }
                ]
            }
        }"#;
        let parsed = ReportParser::case_ids_from_suite(json);
        assert_eq!(parsed.value, vec!["A1".to_string(), "B2".to_string()]);
        assert!(parsed.is_clean());
    }

    #[test]
    fn test_case_ids_from_malformed_suite_is_empty() {
        let parsed = ReportParser::case_ids_from_suite("{,,,//}");
        assert!(parsed.value.is_empty());
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn test_case_ids_skip_entries_without_id() {
        let json = r#"{"_embedded": {"Tests": [{}, {"testRunUniqueId": 7}, "junk"]}}"#;
        let parsed = ReportParser::case_ids_from_suite(json);
        assert_eq!(parsed.value, vec!["7".to_string()]);
        assert_eq!(parsed.issues.len(), 2);
    }

    #[test]
    fn test_natural_order() {
        let mut names = vec!["case10", "case2", "case1", "case", "a", "case02b"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["a", "case", "case1", "case2", "case02b", "case10"]);
    }

    #[test]
    fn test_issue_messages_name_the_field() {
        let parsed = ReportParser::suite_from_json(r#"{"suiteName": "s"}"#, Vec::new());
        let text: Vec<String> = parsed.issues.iter().map(ToString::to_string).collect();
        assert!(text
            .iter()
            .any(|t| t.contains("totalTestsExecuted") && t.contains("suite.json")));
    }
}
