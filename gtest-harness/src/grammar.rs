//! The compiled grammar image shared by every test case

use std::path::{Path, PathBuf};

use log::info;

use crate::logtee::CaseLog;
use crate::paths::KeyPath;
use crate::toolchain::Toolchain;
use crate::workdir::{ACE_LOG, GRAMMAR_IMAGE};
use crate::{HarnessError, Result};

/// A grammar image ready for parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarImage {
    pub path: PathBuf,
    /// Whether the image was compiled during this run
    pub compiled: bool,
}

/// Provide the grammar image for a run.
///
/// A precompiled image is used as-is when given; otherwise `ace_config` is
/// compiled into `<working_dir>/gram.dat` with output in
/// `<working_dir>/ace.log`. A compiler failure is fatal.
pub fn ensure_grammar_image(
    working_dir: &Path,
    ace_config: &KeyPath,
    compiled_grammar: Option<&KeyPath>,
    toolchain: &Toolchain,
) -> Result<GrammarImage> {
    if !working_dir.is_dir() {
        return Err(HarnessError::Config("Cannot compile grammar without a working directory".to_string()));
    }

    let image = match compiled_grammar {
        Some(precompiled) => {
            if !precompiled.path.exists() {
                return Err(HarnessError::NotFound { what: "Compiled grammar", path: precompiled.path.clone() });
            }
            GrammarImage { path: precompiled.path.clone(), compiled: false }
        }
        None => {
            let path = working_dir.join(GRAMMAR_IMAGE);
            let log = CaseLog::create(working_dir.join(ACE_LOG))?;
            if let Err(source) = toolchain.compile(&ace_config.path, &path, &log) {
                log.error(format_args!("Failed to compile grammar. See {}", log.path().display()));
                return Err(HarnessError::Compile { log: log.path().to_path_buf(), source });
            }
            GrammarImage { path, compiled: true }
        }
    };

    info!("Using grammar image: {}", image.path.display());
    Ok(image)
}
