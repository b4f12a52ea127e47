//! Scoring parsed profiles

pub mod coverage;
pub mod regression;
pub mod semantics;

use std::path::PathBuf;

use serde::Serialize;

use crate::config::TestMode;
use crate::format::Palette;
use crate::logtee::CaseLog;
use crate::runner::TestCase;

pub use coverage::{ClassTally, CoverageEvaluator, CoverageSummary};
pub use regression::{RegressionEvaluator, RegressionSummary};
pub use semantics::{SemanticFault, SemanticsEvaluator, SemanticsSummary};

/// Turns a parsed profile into a verdict
pub trait Evaluator {
    fn mode(&self) -> TestMode;

    /// Paths besides the skeleton that must exist for the case to run
    fn prerequisites(&self, _case: &TestCase) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Score the profile at `case.destination`
    fn evaluate(&self, case: &TestCase, log: &CaseLog) -> gtest_tsdb::Result<Evaluation>;
}

/// Result of evaluating one test case
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub passed: bool,
    pub summary: Summary,
}

/// Mode-specific figures of an evaluation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Summary {
    Regression(RegressionSummary),
    Coverage(CoverageSummary),
    Semantics(SemanticsSummary),
}

impl Summary {
    /// Lines printed under the test case heading
    pub fn render(&self, palette: &Palette) -> Vec<String> {
        match self {
            Self::Regression(_) => Vec::new(),
            Self::Coverage(summary) => summary.render(palette),
            Self::Semantics(summary) => summary.render(),
        }
    }
}
