//! Command-line interface definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use gtest_harness::config::{DEFAULT_ACE_CONFIG, DEFAULT_GOLD, DEFAULT_SKELETONS};
use gtest_harness::{ColorChoice, ExitPolicy};

/// gtest - test DELPH-IN grammars against [incr tsdb()] profiles
#[derive(Parser, Debug)]
#[command(name = "gtest")]
#[command(version, about = "Test DELPH-IN grammars for regressions, coverage and semantic well-formedness", long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors and test verdicts
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// When to colour the output
    #[arg(short = 'c', long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    /// Root directory of the grammar
    #[arg(short = 'G', long = "grammar-dir", default_value = "./", global = true)]
    pub grammar_dir: PathBuf,

    /// Existing directory for test artifacts (a temporary one by default)
    #[arg(short = 'W', long = "working-dir", global = true)]
    pub working_dir: Option<PathBuf>,

    /// ACE configuration file; a leading colon is relative to the grammar
    #[arg(short = 'A', long = "ace-config", default_value = DEFAULT_ACE_CONFIG, global = true)]
    pub ace_config: String,

    /// Use this compiled grammar image instead of compiling one
    #[arg(short = 'C', long = "compiled-grammar", global = true)]
    pub compiled_grammar: Option<String>,

    /// Parse in yy-mode
    #[arg(short = 'Y', long = "yy-mode", global = true)]
    pub yy_mode: bool,

    /// Command whose output is piped into ACE when parsing
    #[arg(short = 'P', long = "preprocessor", global = true)]
    pub preprocessor: Option<String>,

    /// Extra options passed to ACE when parsing
    #[arg(long = "ace-opts", allow_hyphen_values = true, global = true)]
    pub ace_opts: Option<String>,

    /// Extra options passed to art
    #[arg(long = "art-opts", allow_hyphen_values = true, global = true)]
    pub art_opts: Option<String>,

    /// ACE executable
    #[arg(long = "ace", env = "GTEST_ACE", default_value = "ace", global = true)]
    pub ace: String,

    /// art executable
    #[arg(long = "art", env = "GTEST_ART", default_value = "art", global = true)]
    pub art: String,

    /// mkprof executable
    #[arg(long = "mkprof", env = "GTEST_MKPROF", default_value = "mkprof", global = true)]
    pub mkprof: String,

    /// Kill external processes after this many seconds (0 waits forever)
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 0, global = true)]
    pub timeout: u64,

    /// Whether failing test cases make the process exit with status 1
    #[arg(long = "exit-status", value_enum, default_value_t = ExitPolicy::Never, global = true)]
    pub exit_status: ExitPolicy,

    /// Write a JSON report of the run to this file
    #[arg(long = "report", value_name = "FILE", global = true)]
    pub report: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare parses of test suites to gold profiles (aliases: r, R)
    #[command(name = "regression", aliases = &["r", "R"])]
    Regression(RegressionArgs),

    /// Report parsing coverage of test suites (aliases: c, C)
    #[command(name = "coverage", aliases = &["c", "C"])]
    Coverage(CoverageArgs),

    /// Check the semantic representations of parse results (aliases: m, M)
    #[command(name = "semantics", aliases = &["m", "M"])]
    Semantics(SemanticsArgs),
}

/// Options every command takes
#[derive(Args, Debug)]
pub struct SelectionArgs {
    /// Test suites to run; a leading colon is relative to the suite directory
    #[arg(value_name = "TEST")]
    pub patterns: Vec<String>,

    /// List the matched test suites and exit
    #[arg(short = 'l', long = "list-profiles")]
    pub list_profiles: bool,
}

#[derive(Args, Debug)]
pub struct RegressionArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Directory of skeletons
    #[arg(long = "skeletons", default_value = DEFAULT_SKELETONS)]
    pub skeletons: String,

    /// Directory of gold profiles
    #[arg(long = "gold", default_value = DEFAULT_GOLD)]
    pub gold: String,
}

#[derive(Args, Debug)]
pub struct CoverageArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Directory of skeletons
    #[arg(long = "skeletons", default_value = DEFAULT_SKELETONS)]
    pub skeletons: String,
}

#[derive(Args, Debug)]
pub struct SemanticsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Directory of skeletons, or of parsed profiles with --static
    #[arg(long = "profiles", default_value = DEFAULT_SKELETONS)]
    pub profiles: String,

    /// Analyse already-parsed profiles in place without parsing
    #[arg(short = 's', long = "static")]
    pub static_analysis: bool,
}

impl Cli {
    /// Log level filter implied by `-v`/`-q`
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
