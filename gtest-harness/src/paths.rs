//! Colon-relative test paths and key/path pairs
//!
//! A path argument starting with `:` is relative to a context-dependent base
//! directory (the grammar directory, or the skeleton directory when selecting
//! tests). Anything else is an ordinary filesystem path.

use std::env;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Marks a path argument as relative to a base directory
pub const KEY_PREFIX: char = ':';

/// A user-facing key paired with the filesystem path it names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPath {
    pub key: String,
    pub path: PathBuf,
}

impl KeyPath {
    /// Resolve a path argument against `base`.
    ///
    /// Colon-prefixed arguments keep their key and are joined onto
    /// `base`. Other arguments are taken literally as the path and get a
    /// key from [`make_key`]. Existence of the result is not checked.
    pub fn resolve(spec: &str, base: &Path) -> Self {
        match spec.strip_prefix(KEY_PREFIX) {
            Some(rest) => Self { key: spec.to_string(), path: base.join(rest) },
            None => Self { key: make_key(Path::new(spec), base), path: PathBuf::from(spec) },
        }
    }

    /// Key/path pair for a path found on disk
    pub fn from_path(path: &Path, base: &Path) -> Self {
        Self { key: make_key(path, base), path: path.to_path_buf() }
    }

    /// The key made safe for use as a file name: no leading colon, path
    /// separators replaced by `_`
    pub fn stem(&self) -> String {
        let key = self.key.strip_prefix(KEY_PREFIX).unwrap_or(&self.key);
        let key = key.trim_end_matches(['/', '\\']);
        let stem: String = key.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }).collect();
        if stem.is_empty() {
            "profile".to_string()
        } else {
            stem
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.key, self.path.display())
    }
}

/// Key for a literal path: `:relpath` when the path lies under `base`, else
/// the path relative to the current directory when that exists, else the
/// path unchanged.
///
/// Paths outside `base` never get a colon key, so there are no `:../x`
/// keys; their stems and gold mirrors would land outside the working and
/// gold directories.
pub fn make_key(path: &Path, base: &Path) -> String {
    let rel = relpath(path, base);
    if !base.as_os_str().is_empty() && base.join(&rel).exists() && !rel.starts_with("..") {
        return format!("{}{}", KEY_PREFIX, rel.display());
    }

    if let Ok(cwd) = env::current_dir() {
        let rel = relpath(path, &cwd);
        if rel.exists() {
            return rel.display().to_string();
        }
    }

    path.display().to_string()
}

/// Absolute, lexically normalised form of `path`
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Remove `.` components and fold `..` into their parents without touching
/// the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                match last {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                    _ => out.push(".."),
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` relative to `base`, computed lexically on absolute forms
pub fn relpath(path: &Path, base: &Path) -> PathBuf {
    let path = absolutize(path);
    let base = if base.as_os_str().is_empty() { absolutize(Path::new(".")) } else { absolutize(base) };

    let mut ours = path.components().peekable();
    let mut theirs = base.components().peekable();
    while let (Some(a), Some(b)) = (ours.peek(), theirs.peek()) {
        if a != b {
            break;
        }
        ours.next();
        theirs.next();
    }

    let mut rel = PathBuf::new();
    for component in theirs {
        if let Component::Prefix(_) = component {
            // different drives; no relative form
            return path;
        }
        rel.push("..");
    }
    for component in ours {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}
