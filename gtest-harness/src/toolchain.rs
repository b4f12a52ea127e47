//! Running the external DELPH-IN tools

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ToolchainConfig;
use crate::logtee::CaseLog;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// File marking a profile directory as prepared by this harness; only such
/// directories are ever replaced
pub const PROFILE_MARKER: &str = ".gtest-profile";

/// Failures of a single external process
#[derive(thiserror::Error, Debug)]
pub enum ToolchainError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited unsuccessfully ({status})")]
    Failed { program: String, status: ExitStatus },

    #[error("{program} was killed after {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("Refusing to replace {}: not a profile prepared by gtest", path.display())]
    Occupied { path: PathBuf },

    #[error("Cannot quote command for {program}")]
    Quote { program: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Compiler, profile preparation and parser invocations
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// `ace -g <config> -G <image>`
    pub fn compile(&self, ace_config: &Path, image: &Path, log: &CaseLog) -> Result<(), ToolchainError> {
        log.debug(format_args!("Compiling grammar at {}", ace_config.display()));
        let mut cmd = Command::new(&self.config.ace);
        cmd.arg("-g").arg(ace_config).arg("-G").arg(image);
        self.run(&self.config.ace, cmd, log)?;
        log.debug(format_args!("Compiled grammar written to {}", image.display()));
        Ok(())
    }

    /// `mkprof -s <skeleton> <dest>`, replacing whatever is at `dest`
    pub fn mkprof(&self, skeleton: &Path, dest: &Path, log: &CaseLog) -> Result<(), ToolchainError> {
        log.debug(format_args!("Preparing profile: {}", skeleton.display()));
        if dest.exists() {
            if !dest.join(PROFILE_MARKER).is_file() {
                let err = ToolchainError::Occupied { path: dest.to_path_buf() };
                log.error(&err);
                return Err(err);
            }
            log.debug(format_args!("Removing stale profile at {}", dest.display()));
            fs::remove_dir_all(dest)?;
        }
        let mut cmd = Command::new(&self.config.mkprof);
        cmd.arg("-s").arg(skeleton).arg(dest);
        if let Err(e) = self.run(&self.config.mkprof, cmd, log) {
            log.error(format_args!("Failed to prepare profile with mkprof. See {}", log.path().display()));
            return Err(e);
        }
        fs::write(dest.join(PROFILE_MARKER), "")?;
        log.debug(format_args!("Completed running mkprof. Output at {}", dest.display()));
        Ok(())
    }

    /// `art -a "<ace command>" <dest> <art options>`
    pub fn art(&self, image: &Path, dest: &Path, log: &CaseLog) -> Result<(), ToolchainError> {
        log.debug(format_args!("Parsing profile: {}", dest.display()));
        let ace = self.ace_command(image)?;
        let mut cmd = Command::new(&self.config.art);
        cmd.arg("-a").arg(&ace).arg(dest).args(self.config.art_args());
        if let Err(e) = self.run(&self.config.art, cmd, log) {
            log.error(format_args!("Failed to parse profile with art. See {}", log.path().display()));
            return Err(e);
        }
        log.debug(format_args!("Completed running art. Output at {}", dest.display()));
        Ok(())
    }

    /// The parser command line art runs for each item
    pub fn ace_command(&self, image: &Path) -> Result<String, ToolchainError> {
        let image = image.to_string_lossy();
        let mut words: Vec<&str> = vec![self.config.ace.as_str(), "-g", &*image];
        let args = self.config.ace_args();
        words.extend(args.iter().map(String::as_str));

        let ace = shlex::try_join(words).map_err(|_| ToolchainError::Quote { program: self.config.ace.clone() })?;
        Ok(match &self.config.preprocessor {
            Some(pre) => format!("{} | {}", pre, ace),
            None => ace,
        })
    }

    /// Run to completion with output appended to `log`
    fn run(&self, program: &str, mut cmd: Command, log: &CaseLog) -> Result<(), ToolchainError> {
        cmd.stdout(log.stdio()?).stderr(log.stdio()?);
        log::trace!("Running {:?}", cmd);

        let mut child =
            cmd.spawn().map_err(|source| ToolchainError::Launch { program: program.to_string(), source })?;

        let status = match self.config.timeout() {
            Some(timeout) => wait_with_timeout(program, &mut child, timeout)?,
            None => child.wait()?,
        };

        if status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Failed { program: program.to_string(), status })
        }
    }
}

fn wait_with_timeout(program: &str, child: &mut Child, timeout: Duration) -> Result<ExitStatus, ToolchainError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolchainError::Timeout { program: program.to_string(), timeout });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ace_command() {
        let toolchain = Toolchain::new(ToolchainConfig {
            ace_opts: vec!["-n5".to_string()],
            yy_mode: true,
            ..Default::default()
        });
        let cmd = toolchain.ace_command(&PathBuf::from("/tmp/gtest-1/gram.dat")).unwrap();
        assert_eq!(cmd, "ace -g /tmp/gtest-1/gram.dat -n5 -y");
    }

    #[test]
    fn test_ace_command_quotes_and_preprocessor() {
        let toolchain = Toolchain::new(ToolchainConfig {
            preprocessor: Some("tokenize.py --yy".to_string()),
            ..Default::default()
        });
        let cmd = toolchain.ace_command(&PathBuf::from("/my grammars/gram.dat")).unwrap();
        assert_eq!(cmd, "tokenize.py --yy | ace -g '/my grammars/gram.dat'");
    }

    #[test]
    fn test_mkprof_leaves_foreign_directory_alone() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("mrs");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("item"), "1@it rains@1\n").unwrap();
        let log = CaseLog::create(tmp.path().join("run.log")).unwrap();

        let toolchain = Toolchain::new(ToolchainConfig { mkprof: "/nonexistent/mkprof".to_string(), ..Default::default() });
        let err = toolchain.mkprof(&tmp.path().join("skeleton"), &dest, &log).unwrap_err();
        assert!(matches!(err, ToolchainError::Occupied { .. }));
        assert_eq!(fs::read_to_string(dest.join("item")).unwrap(), "1@it rains@1\n");
        assert!(fs::read_to_string(log.path()).unwrap().contains("Refusing to replace"));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        #[test]
        fn test_mkprof_replaces_own_profile() {
            let tmp = TempDir::new().unwrap();
            let mkprof = tmp.path().join("mkprof");
            fs::write(&mkprof, "#!/bin/sh\nmkdir -p \"$3\" && echo fresh > \"$3/item\"\n").unwrap();
            fs::set_permissions(&mkprof, fs::Permissions::from_mode(0o755)).unwrap();

            let dest = tmp.path().join("mrs");
            fs::create_dir(&dest).unwrap();
            fs::write(dest.join(PROFILE_MARKER), "").unwrap();
            fs::write(dest.join("parse"), "stale\n").unwrap();
            let log = CaseLog::create(tmp.path().join("run.log")).unwrap();

            let toolchain = Toolchain::new(ToolchainConfig { mkprof: mkprof.display().to_string(), ..Default::default() });
            toolchain.mkprof(&tmp.path().join("skeleton"), &dest, &log).unwrap();
            assert!(!dest.join("parse").exists());
            assert_eq!(fs::read_to_string(dest.join("item")).unwrap(), "fresh\n");
            assert!(dest.join(PROFILE_MARKER).is_file());
        }

        fn toolchain(timeout_secs: u64) -> Toolchain {
            Toolchain::new(ToolchainConfig { timeout_secs, ..Default::default() })
        }

        #[test]
        fn test_output_goes_to_log() {
            let tmp = TempDir::new().unwrap();
            let log = CaseLog::create(tmp.path().join("run.log")).unwrap();
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg("echo out; echo err >&2");
            toolchain(0).run("sh", cmd, &log).unwrap();

            let content = fs::read_to_string(log.path()).unwrap();
            assert!(content.contains("out"));
            assert!(content.contains("err"));
        }

        #[test]
        fn test_nonzero_exit() {
            let tmp = TempDir::new().unwrap();
            let log = CaseLog::create(tmp.path().join("run.log")).unwrap();
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg("exit 3");
            let err = toolchain(0).run("sh", cmd, &log).unwrap_err();
            assert!(matches!(err, ToolchainError::Failed { .. }));
        }

        #[test]
        fn test_missing_program() {
            let tmp = TempDir::new().unwrap();
            let log = CaseLog::create(tmp.path().join("run.log")).unwrap();
            let cmd = Command::new("/nonexistent/gtest-ace");
            let err = toolchain(0).run("/nonexistent/gtest-ace", cmd, &log).unwrap_err();
            assert!(matches!(err, ToolchainError::Launch { .. }));
        }

        #[test]
        fn test_timeout_kills_child() {
            let tmp = TempDir::new().unwrap();
            let log = CaseLog::create(tmp.path().join("run.log")).unwrap();
            let mut cmd = Command::new("sleep");
            cmd.arg("30");
            let start = Instant::now();
            let err = toolchain(1).run("sleep", cmd, &log).unwrap_err();
            assert!(matches!(err, ToolchainError::Timeout { .. }));
            assert!(start.elapsed() < Duration::from_secs(20));
        }
    }
}
