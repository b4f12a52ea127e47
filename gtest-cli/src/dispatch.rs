//! Command dispatch
//!
//! Turns parsed arguments into a harness configuration and runs (or lists)
//! the selected tests.

use std::io::{self, Write};

use anyhow::{Context, Result};
use gtest_harness::{
    CoverageOptions, GrammarHarness, HarnessConfig, KeyPath, RegressionOptions, RunReport, SemanticsOptions,
    ToolchainConfig,
};
use log::debug;

use crate::cli::{Cli, Commands};

/// Build the harness configuration from the command line
pub fn harness_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut toolchain = ToolchainConfig {
        ace: cli.ace.clone(),
        art: cli.art.clone(),
        mkprof: cli.mkprof.clone(),
        yy_mode: cli.yy_mode,
        preprocessor: cli.preprocessor.clone(),
        timeout_secs: cli.timeout,
        ..Default::default()
    };
    if let Some(opts) = &cli.ace_opts {
        toolchain.ace_opts = ToolchainConfig::split_options(opts).context("Invalid --ace-opts")?;
    }
    if let Some(opts) = &cli.art_opts {
        toolchain.art_opts = ToolchainConfig::split_options(opts).context("Invalid --art-opts")?;
    }

    let mut config = HarnessConfig::new(&cli.grammar_dir);
    config.working_dir = cli.working_dir.clone();
    config.ace_config = cli.ace_config.clone();
    config.compiled_grammar = cli.compiled_grammar.clone();
    config.toolchain = toolchain;
    config.color = cli.color;
    config.exit_policy = cli.exit_status;
    config.report = cli.report.clone();
    config.quiet = cli.quiet;
    Ok(config)
}

/// Main command dispatcher
pub struct Dispatcher {
    harness: GrammarHarness,
}

impl Dispatcher {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = harness_config(cli)?;
        debug!("Harness configuration: {:?}", config);
        let harness = GrammarHarness::new(config)?;
        Ok(Self { harness })
    }

    /// Execute the command and return the process exit code
    pub fn execute(&self, command: &Commands) -> Result<i32> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        let report = match command {
            Commands::Regression(args) => {
                let options = RegressionOptions {
                    patterns: args.selection.patterns.clone(),
                    skeletons: args.skeletons.clone(),
                    gold: args.gold.clone(),
                };
                if args.selection.list_profiles {
                    return list(&self.harness.list_regression(&options), &mut out);
                }
                self.harness.run_regression(&options, &mut out)?
            }
            Commands::Coverage(args) => {
                let options = CoverageOptions { patterns: args.selection.patterns.clone(), skeletons: args.skeletons.clone() };
                if args.selection.list_profiles {
                    return list(&self.harness.list_coverage(&options), &mut out);
                }
                self.harness.run_coverage(&options, &mut out)?
            }
            Commands::Semantics(args) => {
                let options = SemanticsOptions {
                    patterns: args.selection.patterns.clone(),
                    profiles: args.profiles.clone(),
                    static_analysis: args.static_analysis,
                };
                if args.selection.list_profiles {
                    return list(&self.harness.list_semantics(&options), &mut out);
                }
                self.harness.run_semantics(&options, &mut out)?
            }
        };

        Ok(self.exit_code(&report))
    }

    fn exit_code(&self, report: &RunReport) -> i32 {
        report.exit_code(self.harness.config().exit_policy)
    }
}

fn list(tests: &[KeyPath], out: &mut dyn Write) -> Result<i32> {
    for kp in tests {
        writeln!(out, "{}", kp)?;
    }
    Ok(0)
}
