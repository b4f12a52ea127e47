//! Results of a run

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::config::{ExitPolicy, TestMode};
use crate::evaluate::Summary;
use crate::runner::{Outcome, Stage, TestCase};
use crate::Result;

/// Verdict and artifacts of one test case
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub key: String,
    pub path: PathBuf,
    pub destination: PathBuf,
    pub log: PathBuf,
    pub outcome: Outcome,
    /// Last stage the case completed
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl CaseResult {
    pub fn new(case: &TestCase, outcome: Outcome, stage: Stage) -> Self {
        Self {
            key: case.key().to_string(),
            path: case.source().to_path_buf(),
            destination: case.destination.clone(),
            log: case.log.clone(),
            outcome,
            stage,
            message: None,
            summary: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: TestMode,
    pub timestamp: DateTime<Utc>,
    pub working_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_image: Option<PathBuf>,
    pub cases: Vec<CaseResult>,
}

impl RunReport {
    pub fn new(mode: TestMode, working_dir: &Path, grammar_image: Option<PathBuf>) -> Self {
        Self { mode, timestamp: Utc::now(), working_dir: working_dir.to_path_buf(), grammar_image, cases: Vec::new() }
    }

    pub fn push(&mut self, result: CaseResult) {
        self.cases.push(result);
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.cases.iter().filter(|c| c.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    /// `N passed, M failed, K skipped`
    pub fn summary_line(&self) -> String {
        format!("{} passed, {} failed, {} skipped", self.passed(), self.failed(), self.skipped())
    }

    /// Process exit status for this run under `policy`
    pub fn exit_code(&self, policy: ExitPolicy) -> i32 {
        match policy {
            ExitPolicy::Failures if self.failed() > 0 => 1,
            _ => 0,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Run report written to {}", path.display());
        Ok(())
    }
}
