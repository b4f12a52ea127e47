//! # Grammar test harness
//!
//! Drives regression, coverage and semantic tests of DELPH-IN grammars.
//!
//! ## Architecture
//!
//! - `paths`: colon-relative test paths and key/path pairs
//! - `discovery`: finding skeletons and profiles and matching patterns to them
//! - `workdir`: the per-run working directory
//! - `toolchain`: running `ace`, `mkprof` and `art`
//! - `grammar`: providing the compiled grammar image
//! - `logtee`: per-case log files mirrored to the `log` facade
//! - `runner`: the per-case state machine
//! - `evaluate`: regression, coverage and semantics evaluators
//! - `format`: terminal colour handling
//! - `report`: run results and the JSON report
//! - `harness`: the entry points used by the command line

pub mod config;
pub mod discovery;
pub mod evaluate;
pub mod format;
pub mod grammar;
pub mod harness;
pub mod logtee;
pub mod paths;
pub mod report;
pub mod runner;
pub mod toolchain;
pub mod workdir;

use std::path::PathBuf;

pub use config::{ColorChoice, ExitPolicy, HarnessConfig, TestMode, ToolchainConfig};
pub use harness::{CoverageOptions, GrammarHarness, RegressionOptions, SemanticsOptions};
pub use paths::KeyPath;
pub use report::{CaseResult, RunReport};
pub use runner::{Outcome, Stage};
pub use toolchain::ToolchainError;

/// Current version of the harness
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that abort a whole run
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("Failed to compile grammar; see {}", log.display())]
    Compile {
        log: PathBuf,
        #[source]
        source: ToolchainError,
    },

    #[error("Test cases {first} and {second} would both write to '{stem}'")]
    DuplicateTestKey { stem: String, first: String, second: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not write report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
