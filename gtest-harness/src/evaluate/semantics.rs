//! Semantic validity of parse results

use std::collections::BTreeSet;
use std::fmt;

use gtest_mrs::{decode, DecodeError};
use gtest_tsdb::{join, Parse, ParseResult, Profile};
use serde::Serialize;

use super::{Evaluation, Evaluator, Summary};
use crate::config::TestMode;
use crate::logtee::CaseLog;
use crate::runner::TestCase;

/// Something wrong with one reading's MRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticFault {
    /// The result has no MRS at all
    NoMrs,
    /// The MRS does not decode
    BadMrs,
    IllFormed,
    Disconnected,
    NonHeaded,
    /// Not a SimpleMRS the decoder understands
    Error,
}

impl SemanticFault {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoMrs => "no-mrs",
            Self::BadMrs => "bad-mrs",
            Self::IllFormed => "ill-formed",
            Self::Disconnected => "disconnected",
            Self::NonHeaded => "non-headed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SemanticFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Faults of one serialized MRS, plus the decode error behind `BadMrs` or
/// `Error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub faults: Vec<SemanticFault>,
    pub error: Option<DecodeError>,
}

impl Diagnosis {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

pub fn diagnose(mrs: &str) -> Diagnosis {
    if mrs.trim().is_empty() {
        return Diagnosis { faults: vec![SemanticFault::NoMrs], error: None };
    }

    match decode(mrs) {
        Ok(m) => {
            let mut faults = Vec::new();
            if !m.is_well_formed() {
                faults.push(SemanticFault::IllFormed);
            }
            if !m.is_connected() {
                faults.push(SemanticFault::Disconnected);
            }
            if !m.is_headed() {
                faults.push(SemanticFault::NonHeaded);
            }
            Diagnosis { faults, error: None }
        }
        Err(e) if e.is_malformed() => Diagnosis { faults: vec![SemanticFault::BadMrs], error: Some(e) },
        Err(e) => Diagnosis { faults: vec![SemanticFault::Error], error: Some(e) },
    }
}

/// Fault counts over a profile's results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticsSummary {
    /// Distinct items with at least one result
    pub items: usize,
    pub results: usize,
    pub no_mrs: usize,
    pub bad_mrs: usize,
    pub ill_formed: usize,
    pub disconnected: usize,
    pub non_headed: usize,
    pub error: usize,
}

impl SemanticsSummary {
    fn count(&mut self, fault: SemanticFault) {
        let counter = match fault {
            SemanticFault::NoMrs => &mut self.no_mrs,
            SemanticFault::BadMrs => &mut self.bad_mrs,
            SemanticFault::IllFormed => &mut self.ill_formed,
            SemanticFault::Disconnected => &mut self.disconnected,
            SemanticFault::NonHeaded => &mut self.non_headed,
            SemanticFault::Error => &mut self.error,
        };
        *counter += 1;
    }

    /// Results that carry an MRS
    pub fn with_mrs(&self) -> usize {
        self.results - self.no_mrs
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.items == 0 {
            return lines;
        }

        lines.push(format!(
            "  {:<12}: {:>5}/{:<5} ({:>6.4} per item)",
            "results",
            self.results,
            self.items,
            self.results as f64 / self.items as f64
        ));
        if self.results == 0 {
            return lines;
        }

        lines.push(percent_line("No MRS", self.no_mrs, self.results, " of results"));
        let present = self.with_mrs();
        if present == 0 {
            return lines;
        }

        for (label, n) in [
            ("Bad MRS", self.bad_mrs),
            ("Ill-formed", self.ill_formed),
            ("Disconnected", self.disconnected),
            ("Non-headed", self.non_headed),
        ] {
            lines.push(percent_line(label, n, present, ""));
        }
        lines
    }
}

fn percent_line(label: &str, n: usize, of: usize, suffix: &str) -> String {
    let pct = format!("{:.2}%", n as f64 * 100.0 / of as f64);
    format!("  {:<12}: {:>5}/{:<5} ({:>7}{})", label, n, of, pct, suffix)
}

/// Semantic tests: every reading should have a clean MRS
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticsEvaluator;

impl Evaluator for SemanticsEvaluator {
    fn mode(&self) -> TestMode {
        TestMode::Semantics
    }

    fn evaluate(&self, case: &TestCase, log: &CaseLog) -> gtest_tsdb::Result<Evaluation> {
        let profile = Profile::open(&case.destination)?;
        let parses: Vec<Parse> = profile.records()?;
        let results: Vec<ParseResult> = profile.records()?;

        let mut summary = SemanticsSummary::default();
        let mut items = BTreeSet::new();
        for (parse, result) in join(&parses, &results, |p| p.parse_id, |r| r.parse_id) {
            items.insert(parse.i_id);
            summary.results += 1;

            let diagnosis = diagnose(&result.mrs);
            if diagnosis.is_clean() {
                log.debug(format_args!("{}-{}", parse.i_id, result.result_id));
                continue;
            }

            let names: Vec<&str> = diagnosis.faults.iter().map(SemanticFault::name).collect();
            log.info(format_args!("{}-{}\t{}", parse.i_id, result.result_id, names.join(" ")));
            if diagnosis.faults.contains(&SemanticFault::Error) {
                if let Some(e) = &diagnosis.error {
                    log.warn(format_args!(
                        "Unexpected representation for {}-{} in {}: {}\n{}",
                        parse.i_id,
                        result.result_id,
                        case.destination.display(),
                        e,
                        result.mrs
                    ));
                }
            }
            for fault in diagnosis.faults {
                summary.count(fault);
            }
        }
        summary.items = items.len();

        Ok(Evaluation { passed: true, summary: Summary::Semantics(summary) })
    }
}
