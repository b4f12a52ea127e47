//! Log files that also feed the `log` facade

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{log, warn, Level};

/// A log file for one step of a run (one test case, or grammar compilation).
///
/// Messages go both to the file and to the `log` facade; child processes
/// can write their output straight into the same file.
#[derive(Debug)]
pub struct CaseLog {
    path: PathBuf,
    file: File,
}

impl CaseLog {
    /// Create or truncate the log file at `path`
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A handle for a child process's stdout or stderr
    pub fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::from(self.file.try_clone()?))
    }

    pub fn debug(&self, message: impl Display) {
        self.tee(Level::Debug, message);
    }

    pub fn info(&self, message: impl Display) {
        self.tee(Level::Info, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.tee(Level::Warn, message);
    }

    pub fn error(&self, message: impl Display) {
        self.tee(Level::Error, message);
    }

    /// Write text to the file only
    pub fn write_block(&self, text: &str) {
        let mut file = &self.file;
        if let Err(e) = file.write_all(text.as_bytes()).and_then(|_| file.flush()) {
            warn!("Could not write to {}: {}", self.path.display(), e);
        }
    }

    fn tee(&self, level: Level, message: impl Display) {
        let line = message.to_string();
        log!(level, "{}", line);
        let mut file = &self.file;
        if let Err(e) = writeln!(file, "{}", line) {
            warn!("Could not write to {}: {}", self.path.display(), e);
        }
    }
}
