//! Comparing parser output to gold profiles

use std::path::{Path, PathBuf};

use gtest_mrs::{compare_bags, decode, BagComparison, Mrs};
use gtest_tsdb::{match_rows, ParseResult, Profile};
use serde::Serialize;
use similar::TextDiff;

use super::{Evaluation, Evaluator, Summary};
use crate::config::TestMode;
use crate::logtee::CaseLog;
use crate::paths::relpath;
use crate::runner::TestCase;

/// Figures of a profile comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegressionSummary {
    /// Distinct `parse-id` values on either side
    pub keys: usize,
    /// Keys whose readings differ
    pub mismatched: usize,
    pub test_unique: usize,
    pub shared: usize,
    pub gold_unique: usize,
}

impl RegressionSummary {
    pub fn is_match(&self) -> bool {
        self.mismatched == 0
    }
}

/// Regression tests: each skeleton has a gold profile at the same relative
/// path under the gold directory
#[derive(Debug, Clone)]
pub struct RegressionEvaluator {
    skeletons: PathBuf,
    gold: PathBuf,
}

impl RegressionEvaluator {
    pub fn new(skeletons: impl Into<PathBuf>, gold: impl Into<PathBuf>) -> Self {
        Self { skeletons: skeletons.into(), gold: gold.into() }
    }

    /// Mirror a skeleton path under the gold directory
    pub fn gold_path(&self, skeleton: &Path) -> PathBuf {
        self.gold.join(relpath(skeleton, &self.skeletons))
    }

    pub fn has_gold(&self, skeleton: &Path) -> bool {
        self.gold_path(skeleton).exists()
    }
}

impl Evaluator for RegressionEvaluator {
    fn mode(&self) -> TestMode {
        TestMode::Regression
    }

    fn prerequisites(&self, case: &TestCase) -> Vec<PathBuf> {
        vec![self.gold_path(case.source())]
    }

    fn evaluate(&self, case: &TestCase, log: &CaseLog) -> gtest_tsdb::Result<Evaluation> {
        let gold = self.gold_path(case.source());
        let summary = compare_profiles(&case.destination, &gold, log)?;
        Ok(Evaluation { passed: summary.is_match(), summary: Summary::Regression(summary) })
    }
}

/// Compare the `result` tables of two profiles, grouped by `parse-id`.
///
/// Each key's readings are compared as bags of MRSs; a reading that does not
/// decode matches nothing.
pub fn compare_profiles(test: &Path, gold: &Path, log: &CaseLog) -> gtest_tsdb::Result<RegressionSummary> {
    log.debug(format_args!("Comparing output ({}) to gold ({})", test.display(), gold.display()));
    let test_rows: Vec<ParseResult> = Profile::open(test)?.records()?;
    let gold_rows: Vec<ParseResult> = Profile::open(gold)?.records()?;

    let mut summary = RegressionSummary::default();
    for (key, test_group, gold_group) in match_rows(&test_rows, &gold_rows, |r| r.parse_id) {
        let (test_bag, test_bad) = decode_bag(&test_group, log);
        let (gold_bag, gold_bad) = decode_bag(&gold_group, log);

        let cmp = compare_bags(&test_bag, &gold_bag);
        let cmp = BagComparison {
            test_unique: cmp.test_unique + test_bad,
            shared: cmp.shared,
            gold_unique: cmp.gold_unique + gold_bad,
        };
        log.info(format_args!("{}\t<{},{},{}>", key, cmp.test_unique, cmp.shared, cmp.gold_unique));

        summary.keys += 1;
        summary.test_unique += cmp.test_unique;
        summary.shared += cmp.shared;
        summary.gold_unique += cmp.gold_unique;
        if !cmp.is_match() {
            summary.mismatched += 1;
            log.write_block(&reading_diff(&test_group, &gold_group));
        }
    }

    log.debug(format_args!(
        "Completed comparison. Test {}.",
        if summary.is_match() { "succeeded" } else { "failed" }
    ));
    Ok(summary)
}

fn decode_bag(rows: &[&ParseResult], log: &CaseLog) -> (Vec<Mrs>, usize) {
    let mut bag = Vec::with_capacity(rows.len());
    let mut bad = 0;
    for row in rows {
        match decode(&row.mrs) {
            Ok(mrs) => bag.push(mrs),
            Err(e) => {
                log.debug(format_args!("{}-{}\tcannot decode: {}", row.parse_id, row.result_id, e));
                bad += 1;
            }
        }
    }
    (bag, bad)
}

fn reading_diff(test: &[&ParseResult], gold: &[&ParseResult]) -> String {
    let text = |rows: &[&ParseResult]| -> String { rows.iter().map(|r| format!("{}\n", r.mrs)).collect() };
    let (gold_text, test_text) = (text(gold), text(test));
    TextDiff::from_lines(&gold_text, &test_text).unified_diff().header("gold", "test").to_string()
}
