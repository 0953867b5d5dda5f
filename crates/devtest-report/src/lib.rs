//! DevTest report model and parser.
//!
//! Reports downloaded from a DevTest Registry are stored as JSON files under
//! a per-run directory. [`ReportParser`] walks those directories and builds a
//! [`Report`] tree that downstream publishers aggregate and render.

pub mod model;
pub mod parser;
pub mod state;
pub mod timestamp;

pub use model::{
    Report, TestCase, TestCaseFields, TestCycle, TestCycleFields, TestSuite, TestSuiteFields,
};
pub use parser::{ParseIssue, Parsed, ReportParser};
pub use state::TestState;
pub use timestamp::parse_timestamp;
