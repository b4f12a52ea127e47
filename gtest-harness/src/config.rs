//! Configuration for a test run

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{HarnessError, Result};

/// Default location of the ACE configuration file, relative to the grammar
pub const DEFAULT_ACE_CONFIG: &str = ":ace/config.tdl";
/// Default skeleton directory, relative to the grammar
pub const DEFAULT_SKELETONS: &str = ":tsdb/skeletons/";
/// Default gold profile directory, relative to the grammar
pub const DEFAULT_GOLD: &str = ":tsdb/gold/";

/// When to use ANSI colours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// Whether failing test cases affect the process exit status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Exit successfully whenever the run completes
    #[default]
    Never,
    /// Exit with status 1 when any test case failed
    Failures,
}

/// The kind of test being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Regression,
    Coverage,
    Semantics,
}

impl TestMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Regression => "regression",
            Self::Coverage => "coverage",
            Self::Semantics => "semantics",
        }
    }
}

/// External programs and the options passed to them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub ace: String,
    pub art: String,
    pub mkprof: String,
    /// Extra options for ACE when parsing
    pub ace_opts: Vec<String>,
    /// Extra options for art
    pub art_opts: Vec<String>,
    pub yy_mode: bool,
    /// Command whose output is piped into ACE
    pub preprocessor: Option<String>,
    /// Seconds before an external process is killed; 0 waits forever
    pub timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            ace: "ace".to_string(),
            art: "art".to_string(),
            mkprof: "mkprof".to_string(),
            ace_opts: Vec::new(),
            art_opts: Vec::new(),
            yy_mode: false,
            preprocessor: None,
            timeout_secs: 0,
        }
    }
}

impl ToolchainConfig {
    /// Split an option string the way a shell would
    pub fn split_options(options: &str) -> Result<Vec<String>> {
        shlex::split(options)
            .ok_or_else(|| HarnessError::Config(format!("Cannot split option string: {}", options)))
    }

    /// Options for ACE, including the yy-mode flag
    pub fn ace_args(&self) -> Vec<String> {
        let mut args = self.ace_opts.clone();
        if self.yy_mode {
            args.push("-y".to_string());
        }
        args
    }

    /// Options for art, including the yy-mode flag
    pub fn art_args(&self) -> Vec<String> {
        let mut args = self.art_opts.clone();
        if self.yy_mode {
            args.push("-Y".to_string());
        }
        args
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Settings shared by every command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub grammar_dir: PathBuf,
    /// Existing directory for run artifacts; a temporary one is made if unset
    pub working_dir: Option<PathBuf>,
    /// ACE configuration file (colon-relative to the grammar directory)
    pub ace_config: String,
    /// Precompiled grammar image; when set nothing is compiled
    pub compiled_grammar: Option<String>,
    pub toolchain: ToolchainConfig,
    pub color: ColorChoice,
    pub exit_policy: ExitPolicy,
    /// Where to write the JSON run report
    pub report: Option<PathBuf>,
    pub quiet: bool,
}

impl HarnessConfig {
    pub fn new(grammar_dir: impl Into<PathBuf>) -> Self {
        Self {
            grammar_dir: grammar_dir.into(),
            working_dir: None,
            ace_config: DEFAULT_ACE_CONFIG.to_string(),
            compiled_grammar: None,
            toolchain: ToolchainConfig::default(),
            color: ColorChoice::default(),
            exit_policy: ExitPolicy::default(),
            report: None,
            quiet: false,
        }
    }

    /// Check the directories before anything runs
    pub fn validate(&self) -> Result<()> {
        if !self.grammar_dir.is_dir() {
            return Err(HarnessError::Config(format!(
                "--grammar-dir must point to a directory: {}",
                self.grammar_dir.display()
            )));
        }

        if let Some(wd) = &self.working_dir {
            if !wd.is_dir() {
                return Err(HarnessError::Config(format!(
                    "--working-dir, if set, must point to a directory: {}",
                    wd.display()
                )));
            }
        }

        if self.ace_config.is_empty() {
            return Err(HarnessError::Config("ACE configuration path is empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_yy_mode_flags() {
        let mut tc = ToolchainConfig { ace_opts: vec!["-n5".to_string()], ..Default::default() };
        assert_eq!(tc.ace_args(), vec!["-n5"]);
        assert!(tc.art_args().is_empty());

        tc.yy_mode = true;
        assert_eq!(tc.ace_args(), vec!["-n5", "-y"]);
        assert_eq!(tc.art_args(), vec!["-Y"]);
    }

    #[test]
    fn test_split_options() {
        let opts = ToolchainConfig::split_options("-n5 --max-chart-megabytes=1000 '-r root_strict'").unwrap();
        assert_eq!(opts, vec!["-n5", "--max-chart-megabytes=1000", "-r root_strict"]);
        assert!(ToolchainConfig::split_options("'unterminated").is_err());
    }

    #[test]
    fn test_timeout() {
        let mut tc = ToolchainConfig::default();
        assert_eq!(tc.timeout(), None);
        tc.timeout_secs = 3;
        assert_eq!(tc.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_validate() {
        let grammar = TempDir::new().unwrap();
        let mut config = HarnessConfig::new(grammar.path());
        assert!(config.validate().is_ok());

        config.working_dir = Some(grammar.path().join("missing"));
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));

        let config = HarnessConfig::new(grammar.path().join("nope"));
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }
}
