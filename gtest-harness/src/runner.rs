//! Running one test case from skeleton to verdict

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::evaluate::Evaluator;
use crate::grammar::GrammarImage;
use crate::logtee::CaseLog;
use crate::paths::{absolutize, KeyPath};
use crate::report::CaseResult;
use crate::toolchain::Toolchain;
use crate::workdir::WorkingDirectory;
use crate::{HarnessError, Result};

/// Final verdict of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// How far a test case got before reaching its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Nothing checked yet
    Pending,
    /// Skeleton and prerequisites exist
    Prepared,
    /// Parsed profile is in place
    Parsed,
    Evaluated,
}

/// A test case scheduled for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub keypath: KeyPath,
    /// File-name-safe form of the key
    pub stem: String,
    /// Profile that gets evaluated
    pub destination: PathBuf,
    pub log: PathBuf,
}

impl TestCase {
    pub fn key(&self) -> &str {
        &self.keypath.key
    }

    /// The skeleton (or, for in-place analysis, the profile) being tested
    pub fn source(&self) -> &Path {
        &self.keypath.path
    }
}

/// Reject test lists where two cases would share working-directory artifacts
pub fn check_unique_stems(tests: &[KeyPath]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for kp in tests {
        if let Some(first) = seen.insert(kp.stem(), &kp.key) {
            return Err(HarnessError::DuplicateTestKey {
                stem: kp.stem(),
                first: first.to_string(),
                second: kp.key.clone(),
            });
        }
    }
    Ok(())
}

/// Reject cases whose working-directory profile would overlap a profile the
/// run reads: the source or one of the evaluator's prerequisites.
pub fn check_destinations(cases: &[TestCase], evaluator: &dyn Evaluator) -> Result<()> {
    for case in cases {
        let dest = absolutize(&case.destination);
        let inputs = std::iter::once(case.source().to_path_buf()).chain(evaluator.prerequisites(case));
        for input in inputs {
            let input = absolutize(&input);
            if input.starts_with(&dest) || dest.starts_with(&input) {
                return Err(HarnessError::Config(format!(
                    "Output profile {} for {} overlaps {}; choose a working directory outside the test suites",
                    dest.display(),
                    case.key(),
                    input.display()
                )));
            }
        }
    }
    Ok(())
}

/// Assign working-directory paths to each test.
///
/// With `in_place` the profile is evaluated where it is instead of being
/// rebuilt from a skeleton.
pub fn plan_cases(tests: Vec<KeyPath>, workdir: &WorkingDirectory, in_place: bool) -> Vec<TestCase> {
    tests
        .into_iter()
        .map(|keypath| {
            let stem = keypath.stem();
            let destination = if in_place { keypath.path.clone() } else { workdir.profile_dest(&stem) };
            let log = workdir.case_log(&stem);
            TestCase { keypath, stem, destination, log }
        })
        .collect()
}

/// Drives test cases through preparation, parsing and evaluation.
///
/// Failures here are local to the case; they are logged and turned into a
/// verdict, never returned.
pub struct TestRunner<'a> {
    toolchain: &'a Toolchain,
    /// `None` skips parsing entirely
    grammar: Option<&'a GrammarImage>,
    evaluator: &'a dyn Evaluator,
}

impl<'a> TestRunner<'a> {
    pub fn new(toolchain: &'a Toolchain, grammar: Option<&'a GrammarImage>, evaluator: &'a dyn Evaluator) -> Self {
        Self { toolchain, grammar, evaluator }
    }

    pub fn run(&self, case: &TestCase) -> CaseResult {
        let log = match CaseLog::create(&case.log) {
            Ok(log) => log,
            Err(e) => {
                let message = format!("Cannot create log file {}: {}", case.log.display(), e);
                log::error!("{}", message);
                return CaseResult::new(case, Outcome::Failed, Stage::Pending).with_message(message);
            }
        };
        log.info(format_args!("{} testing profile: {}", capitalized(self.evaluator.mode().name()), case.key()));

        // Pending -> Prepared
        let required = std::iter::once(case.source().to_path_buf()).chain(self.evaluator.prerequisites(case));
        for path in required {
            if !path.exists() {
                let message = format!("Path does not exist: {}", path.display());
                log.warn(&message);
                return CaseResult::new(case, Outcome::Skipped, Stage::Pending).with_message(message);
            }
        }

        // Prepared -> Parsed
        if let Some(grammar) = self.grammar {
            let parsed = self
                .toolchain
                .mkprof(case.source(), &case.destination, &log)
                .and_then(|_| self.toolchain.art(&grammar.path, &case.destination, &log));
            if let Err(e) = parsed {
                log.error(&e);
                return CaseResult::new(case, Outcome::Failed, Stage::Prepared).with_message(e.to_string());
            }
        }

        // Parsed -> Evaluated
        match self.evaluator.evaluate(case, &log) {
            Ok(evaluation) => {
                let outcome = if evaluation.passed { Outcome::Passed } else { Outcome::Failed };
                log.debug(format_args!("{}: {:?}", case.key(), outcome));
                CaseResult::new(case, outcome, Stage::Evaluated).with_summary(evaluation.summary)
            }
            Err(e) => {
                let message = format!("Could not evaluate {}: {}", case.destination.display(), e);
                log.error(&message);
                CaseResult::new(case, Outcome::Failed, Stage::Parsed).with_message(message)
            }
        }
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolchainConfig;
    use crate::evaluate::{CoverageEvaluator, RegressionEvaluator, SemanticsEvaluator, Summary};
    use std::fs;
    use tempfile::TempDir;

    const RELATIONS: &str = "item:\n  i-id :integer :key\n  i-input :string\n  i-wf :integer\n\n\
        parse:\n  parse-id :integer :key\n  i-id :integer\n  readings :integer\n\n\
        result:\n  parse-id :integer :key\n  result-id :integer\n  mrs :string\n";

    fn parsed_profile(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("relations"), RELATIONS).unwrap();
        fs::write(dir.join("item"), "1@it rains@1\n2@rains it@0\n").unwrap();
        fs::write(dir.join("parse"), "1@1@1\n2@2@0\n").unwrap();
        fs::write(
            dir.join("result"),
            "1@0@[ LTOP: h0 INDEX: e2 RELS: < [ _rain_v_1 LBL: h1 ARG0: e2 ] > HCONS: < h0 qeq h1 > ]\n",
        )
        .unwrap();
    }

    fn keypath(key: &str, path: PathBuf) -> KeyPath {
        KeyPath { key: key.to_string(), path }
    }

    #[test]
    fn test_duplicate_stems_rejected() {
        let tests = vec![
            keypath(":a/b", PathBuf::from("/s/a/b")),
            keypath(":c", PathBuf::from("/s/c")),
            keypath(":a_b", PathBuf::from("/s/a_b")),
        ];
        match check_unique_stems(&tests) {
            Err(HarnessError::DuplicateTestKey { stem, first, second }) => {
                assert_eq!(stem, "a_b");
                assert_eq!(first, ":a/b");
                assert_eq!(second, ":a_b");
            }
            other => panic!("expected duplicate key error, got {:?}", other),
        }
        assert!(check_unique_stems(&tests[..2]).is_ok());
    }

    #[test]
    fn test_destination_overlapping_inputs_rejected() {
        let tmp = TempDir::new().unwrap();
        let skeletons = tmp.path().join("skeletons");
        let gold = tmp.path().join("gold");
        let evaluator = RegressionEvaluator::new(&skeletons, &gold);

        let wd = WorkingDirectory::prepare(Some(tmp.path())).unwrap();
        let tests = vec![keypath(":a", skeletons.join("a"))];
        assert!(check_destinations(&plan_cases(tests.clone(), &wd, false), &evaluator).is_ok());

        // the destination is the skeleton itself
        let case = TestCase { destination: skeletons.join("a"), ..plan_cases(tests.clone(), &wd, false).remove(0) };
        assert!(matches!(check_destinations(&[case], &evaluator), Err(HarnessError::Config(_))));

        // the destination contains the gold profile
        let case = TestCase { destination: gold.clone(), ..plan_cases(tests.clone(), &wd, false).remove(0) };
        assert!(matches!(check_destinations(&[case], &evaluator), Err(HarnessError::Config(_))));

        // the destination lies inside the skeleton
        let case = TestCase { destination: skeletons.join("a").join("out"), ..plan_cases(tests, &wd, false).remove(0) };
        assert!(matches!(check_destinations(&[case], &evaluator), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_plan_cases() {
        let tmp = TempDir::new().unwrap();
        let wd = WorkingDirectory::prepare(Some(tmp.path())).unwrap();
        let tests = vec![keypath(":tanaka/a", PathBuf::from("/s/tanaka/a"))];

        let cases = plan_cases(tests.clone(), &wd, false);
        assert_eq!(cases[0].stem, "tanaka_a");
        assert_eq!(cases[0].destination, tmp.path().join("tanaka_a"));
        assert_eq!(cases[0].log, tmp.path().join("run-tanaka_a.log"));

        let cases = plan_cases(tests, &wd, true);
        assert_eq!(cases[0].destination, PathBuf::from("/s/tanaka/a"));
    }

    #[test]
    fn test_missing_skeleton_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let wd = WorkingDirectory::prepare(Some(tmp.path())).unwrap();
        let cases = plan_cases(vec![keypath(":gone", tmp.path().join("gone"))], &wd, false);

        let toolchain = Toolchain::new(ToolchainConfig::default());
        let evaluator = CoverageEvaluator;
        let runner = TestRunner::new(&toolchain, None, &evaluator);
        let result = runner.run(&cases[0]);
        assert_eq!(result.outcome, Outcome::Skipped);
        assert_eq!(result.stage, Stage::Pending);
        assert!(fs::read_to_string(&cases[0].log).unwrap().contains("Path does not exist"));
    }

    #[test]
    fn test_missing_gold_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let skel = tmp.path().join("skeletons").join("a");
        parsed_profile(&skel);
        let wd_dir = tmp.path().join("wd");
        fs::create_dir(&wd_dir).unwrap();
        let wd = WorkingDirectory::prepare(Some(&wd_dir)).unwrap();
        let cases = plan_cases(vec![keypath(":a", skel)], &wd, true);

        let toolchain = Toolchain::new(ToolchainConfig::default());
        let evaluator = RegressionEvaluator::new(tmp.path().join("skeletons"), tmp.path().join("gold"));
        let result = TestRunner::new(&toolchain, None, &evaluator).run(&cases[0]);
        assert_eq!(result.outcome, Outcome::Skipped);
    }

    #[test]
    fn test_parse_failure_is_local() {
        let tmp = TempDir::new().unwrap();
        let skel = tmp.path().join("a");
        parsed_profile(&skel);
        let wd_dir = tmp.path().join("wd");
        fs::create_dir(&wd_dir).unwrap();
        let wd = WorkingDirectory::prepare(Some(&wd_dir)).unwrap();
        let cases = plan_cases(vec![keypath(":a", skel)], &wd, false);

        let toolchain = Toolchain::new(ToolchainConfig { mkprof: "/nonexistent/mkprof".to_string(), ..Default::default() });
        let image = GrammarImage { path: tmp.path().join("gram.dat"), compiled: false };
        let evaluator = CoverageEvaluator;
        let result = TestRunner::new(&toolchain, Some(&image), &evaluator).run(&cases[0]);
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.stage, Stage::Prepared);
        assert!(fs::read_to_string(&cases[0].log).unwrap().contains("Failed to prepare profile with mkprof"));
    }

    #[test]
    fn test_in_place_evaluation() {
        let tmp = TempDir::new().unwrap();
        let prof = tmp.path().join("gold").join("a");
        parsed_profile(&prof);
        let wd_dir = tmp.path().join("wd");
        fs::create_dir(&wd_dir).unwrap();
        let wd = WorkingDirectory::prepare(Some(&wd_dir)).unwrap();
        let cases = plan_cases(vec![keypath(":a", prof)], &wd, true);

        let toolchain = Toolchain::new(ToolchainConfig::default());
        let evaluator = SemanticsEvaluator;
        let result = TestRunner::new(&toolchain, None, &evaluator).run(&cases[0]);
        assert_eq!(result.outcome, Outcome::Passed);
        assert_eq!(result.stage, Stage::Evaluated);
        match result.summary {
            Some(Summary::Semantics(summary)) => {
                assert_eq!(summary.items, 1);
                assert_eq!(summary.results, 1);
                assert_eq!(summary.non_headed, 0);
            }
            other => panic!("unexpected summary {:?}", other),
        }
    }

    #[test]
    fn test_capitalized() {
        assert_eq!(capitalized("regression"), "Regression");
        assert_eq!(capitalized(""), "");
    }
}
