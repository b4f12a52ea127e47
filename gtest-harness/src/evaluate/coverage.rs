//! Parser coverage

use std::collections::HashMap;

use gtest_tsdb::records::wf;
use gtest_tsdb::{join, Item, Parse, Profile};
use serde::Serialize;

use super::{Evaluation, Evaluator, Summary};
use crate::config::TestMode;
use crate::format::{Palette, RateClass};
use crate::logtee::CaseLog;
use crate::runner::TestCase;

/// Counts for one class of items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassTally {
    pub items: usize,
    /// Items with at least one reading
    pub parsed: usize,
    pub readings: u64,
}

impl ClassTally {
    /// Fraction of items parsed; `None` without items
    pub fn rate(&self) -> Option<f64> {
        (self.items > 0).then(|| self.parsed as f64 / self.items as f64)
    }

    pub fn readings_per_parse(&self) -> Option<f64> {
        (self.parsed > 0).then(|| self.readings as f64 / self.parsed as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub grammatical: ClassTally,
    pub ungrammatical: ClassTally,
    /// Items flagged to be ignored
    pub ignored: usize,
}

impl CoverageSummary {
    /// Tally items against their parses, joined on `i-id`
    pub fn from_records(items: &[Item], parses: &[Parse]) -> Self {
        let mut readings: HashMap<i64, u64> = HashMap::new();
        for (item, parse) in join(items, parses, |i| i.i_id, |p| p.i_id) {
            if parse.readings > 0 {
                *readings.entry(item.i_id).or_default() += parse.readings as u64;
            }
        }

        let mut summary = Self::default();
        for item in items {
            let tally = match item.i_wf {
                wf::GRAMMATICAL => &mut summary.grammatical,
                wf::UNGRAMMATICAL => &mut summary.ungrammatical,
                _ => {
                    summary.ignored += 1;
                    continue;
                }
            };
            tally.items += 1;
            if let Some(&n) = readings.get(&item.i_id) {
                tally.parsed += 1;
                tally.readings += n;
            }
        }
        summary
    }

    pub fn render(&self, palette: &Palette) -> Vec<String> {
        let mut lines = vec![
            rate_line(palette, "grammatical", &self.grammatical, RateClass::of),
            rate_line(palette, "ungrammatical", &self.ungrammatical, RateClass::of_inverted),
        ];
        if let Some(per_parse) = self.grammatical.readings_per_parse() {
            lines.push(format!(
                "  {:<14}: {:>11} ({:.4})",
                "readings/parse",
                format!("{}/{}", self.grammatical.readings, self.grammatical.parsed),
                per_parse
            ));
        }
        lines
    }
}

fn rate_line(palette: &Palette, label: &str, tally: &ClassTally, classify: fn(f64) -> RateClass) -> String {
    match tally.rate() {
        Some(rate) => format!(
            "  {:<14}: {:>11} ({})",
            label,
            format!("{}/{}", tally.parsed, tally.items),
            palette.rate(&format!("{:.4}", rate), classify(rate))
        ),
        None => format!("  {:<14}: no items", label),
    }
}

/// Coverage tests: how many items get a parse
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageEvaluator;

impl Evaluator for CoverageEvaluator {
    fn mode(&self) -> TestMode {
        TestMode::Coverage
    }

    fn evaluate(&self, case: &TestCase, log: &CaseLog) -> gtest_tsdb::Result<Evaluation> {
        let profile = Profile::open(&case.destination)?;
        let items: Vec<Item> = profile.records()?;
        let parses: Vec<Parse> = profile.records()?;
        let summary = CoverageSummary::from_records(&items, &parses);
        log.info(format_args!(
            "Coverage of {}: {}/{} grammatical, {}/{} ungrammatical, {} ignored",
            case.key(),
            summary.grammatical.parsed,
            summary.grammatical.items,
            summary.ungrammatical.parsed,
            summary.ungrammatical.items,
            summary.ignored
        ));
        Ok(Evaluation { passed: true, summary: Summary::Coverage(summary) })
    }
}
