//! The working directory of a run

use std::path::{Path, PathBuf};

use log::info;

use crate::{HarnessError, Result};

/// File name of the grammar image compiled during a run
pub const GRAMMAR_IMAGE: &str = "gram.dat";
/// File name of the compiler log
pub const ACE_LOG: &str = "ace.log";

/// Scratch space for one run: parsed profiles, logs and the grammar image.
///
/// Never deleted by the harness, even when temporary.
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    path: PathBuf,
    temporary: bool,
}

impl WorkingDirectory {
    /// Use `requested` if given (it must already exist), otherwise create a
    /// fresh temporary directory
    pub fn prepare(requested: Option<&Path>) -> Result<Self> {
        let wd = match requested {
            Some(path) => {
                if !path.is_dir() {
                    return Err(HarnessError::Config(format!(
                        "Working directory does not exist: {}",
                        path.display()
                    )));
                }
                Self { path: path.to_path_buf(), temporary: false }
            }
            None => {
                let path = tempfile::Builder::new().prefix("gtest-").tempdir()?.keep();
                Self { path, temporary: true }
            }
        };
        info!("Using {} working directory: {}", if wd.temporary { "temporary" } else { "existing" }, wd.path.display());
        Ok(wd)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Where the parsed profile for a test case goes
    pub fn profile_dest(&self, stem: &str) -> PathBuf {
        self.path.join(stem)
    }

    /// Log file of a test case
    pub fn case_log(&self, stem: &str) -> PathBuf {
        self.path.join(format!("run-{}.log", stem))
    }

    pub fn ace_log(&self) -> PathBuf {
        self.path.join(ACE_LOG)
    }

    pub fn grammar_image(&self) -> PathBuf {
        self.path.join(GRAMMAR_IMAGE)
    }
}
