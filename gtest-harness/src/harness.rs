//! Entry points for the three kinds of test

use std::io::Write;

use gtest_tsdb::ProfileKind;
use log::{debug, info};

use crate::config::{HarnessConfig, TestMode, DEFAULT_GOLD, DEFAULT_SKELETONS};
use crate::discovery::prepare_test_list;
use crate::evaluate::{CoverageEvaluator, Evaluator, RegressionEvaluator, SemanticsEvaluator};
use crate::format::{verdict_line, Palette};
use crate::grammar::ensure_grammar_image;
use crate::paths::{absolutize, KeyPath};
use crate::report::{CaseResult, RunReport};
use crate::runner::{check_destinations, check_unique_stems, plan_cases, Outcome, TestRunner};
use crate::toolchain::Toolchain;
use crate::workdir::WorkingDirectory;
use crate::Result;

/// Options of the regression command
#[derive(Debug, Clone)]
pub struct RegressionOptions {
    pub patterns: Vec<String>,
    /// Skeleton directory (colon-relative to the grammar directory)
    pub skeletons: String,
    /// Gold profile directory (colon-relative to the grammar directory)
    pub gold: String,
}

impl Default for RegressionOptions {
    fn default() -> Self {
        Self { patterns: Vec::new(), skeletons: DEFAULT_SKELETONS.to_string(), gold: DEFAULT_GOLD.to_string() }
    }
}

/// Options of the coverage command
#[derive(Debug, Clone)]
pub struct CoverageOptions {
    pub patterns: Vec<String>,
    pub skeletons: String,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self { patterns: Vec::new(), skeletons: DEFAULT_SKELETONS.to_string() }
    }
}

/// Options of the semantics command
#[derive(Debug, Clone)]
pub struct SemanticsOptions {
    pub patterns: Vec<String>,
    /// Skeleton directory, or profile directory with `static_analysis`
    pub profiles: String,
    /// Analyse parsed profiles in place instead of parsing skeletons
    pub static_analysis: bool,
}

impl Default for SemanticsOptions {
    fn default() -> Self {
        Self { patterns: Vec::new(), profiles: DEFAULT_SKELETONS.to_string(), static_analysis: false }
    }
}

/// Grammar test harness
pub struct GrammarHarness {
    config: HarnessConfig,
    palette: Palette,
    toolchain: Toolchain,
}

impl GrammarHarness {
    /// Validate `config` and set up the harness
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let palette = Palette::new(config.color);
        let toolchain = Toolchain::new(config.toolchain.clone());
        Ok(Self { config, palette, toolchain })
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn resolve(&self, spec: &str) -> KeyPath {
        KeyPath::resolve(spec, &self.config.grammar_dir)
    }

    fn regression_plan(&self, options: &RegressionOptions) -> (RegressionEvaluator, Vec<KeyPath>) {
        let skeletons = self.resolve(&options.skeletons);
        let gold = self.resolve(&options.gold);
        debug!("Skeletons at {}, gold profiles at {}", skeletons.path.display(), gold.path.display());

        let evaluator = RegressionEvaluator::new(absolutize(&skeletons.path), absolutize(&gold.path));
        let tests = prepare_test_list(&options.patterns, &skeletons.path, ProfileKind::Skeleton, |p| evaluator.has_gold(p));
        (evaluator, tests)
    }

    fn coverage_plan(&self, options: &CoverageOptions) -> Vec<KeyPath> {
        let skeletons = self.resolve(&options.skeletons);
        prepare_test_list(&options.patterns, &skeletons.path, ProfileKind::Skeleton, |_| true)
    }

    fn semantics_plan(&self, options: &SemanticsOptions) -> Vec<KeyPath> {
        let profiles = self.resolve(&options.profiles);
        let kind = if options.static_analysis { ProfileKind::Profile } else { ProfileKind::Skeleton };
        prepare_test_list(&options.patterns, &profiles.path, kind, |_| true)
    }

    /// Skeletons that have a gold profile, without running anything
    pub fn list_regression(&self, options: &RegressionOptions) -> Vec<KeyPath> {
        self.regression_plan(options).1
    }

    pub fn list_coverage(&self, options: &CoverageOptions) -> Vec<KeyPath> {
        self.coverage_plan(options)
    }

    pub fn list_semantics(&self, options: &SemanticsOptions) -> Vec<KeyPath> {
        self.semantics_plan(options)
    }

    /// Parse each skeleton and compare the results to its gold profile
    pub fn run_regression(&self, options: &RegressionOptions, out: &mut dyn Write) -> Result<RunReport> {
        let (evaluator, tests) = self.regression_plan(options);
        self.run(tests, &evaluator, true, out)
    }

    /// Parse each skeleton and report how many items got a parse
    pub fn run_coverage(&self, options: &CoverageOptions, out: &mut dyn Write) -> Result<RunReport> {
        let tests = self.coverage_plan(options);
        self.run(tests, &CoverageEvaluator, true, out)
    }

    /// Check the semantic representations of parsed (or freshly parsed)
    /// profiles
    pub fn run_semantics(&self, options: &SemanticsOptions, out: &mut dyn Write) -> Result<RunReport> {
        let tests = self.semantics_plan(options);
        self.run(tests, &SemanticsEvaluator, !options.static_analysis, out)
    }

    fn run(&self, tests: Vec<KeyPath>, evaluator: &dyn Evaluator, parse: bool, out: &mut dyn Write) -> Result<RunReport> {
        let mode = evaluator.mode();
        check_unique_stems(&tests)?;

        let workdir = WorkingDirectory::prepare(self.config.working_dir.as_deref())?;
        let cases = plan_cases(tests, &workdir, !parse);
        if parse {
            check_destinations(&cases, evaluator)?;
        }

        let grammar = if parse {
            let ace_config = self.resolve(&self.config.ace_config);
            let compiled = self.config.compiled_grammar.as_deref().map(|spec| self.resolve(spec));
            Some(ensure_grammar_image(workdir.path(), &ace_config, compiled.as_ref(), &self.toolchain)?)
        } else {
            None
        };

        info!("Running {} tests on {} profile(s)", mode.name(), cases.len());
        let mut report = RunReport::new(mode, workdir.path(), grammar.as_ref().map(|g| g.path.clone()));
        let runner = TestRunner::new(&self.toolchain, grammar.as_ref(), evaluator);
        for case in &cases {
            let result = runner.run(case);
            self.print_case(mode, &result, out)?;
            report.push(result);
        }

        if !self.config.quiet {
            writeln!(out, "{}", report.summary_line())?;
        }
        if let Some(path) = &self.config.report {
            report.write_json(path)?;
        }
        Ok(report)
    }

    fn print_case(&self, mode: TestMode, result: &CaseResult, out: &mut dyn Write) -> Result<()> {
        let evaluated = result.outcome == Outcome::Passed && result.summary.is_some();
        if mode == TestMode::Regression || !evaluated {
            writeln!(out, "{}", verdict_line(&self.palette, result.outcome, &result.key, &result.log))?;
            return Ok(());
        }

        if !self.config.quiet {
            writeln!(out, "{}\t{}", self.palette.bold(&result.key), result.destination.display())?;
        }
        if let Some(summary) = &result.summary {
            for line in summary.render(&self.palette) {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(())
    }
}
