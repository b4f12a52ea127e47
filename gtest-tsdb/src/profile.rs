//! Profile directories

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::records::Record;
use crate::relations::Relations;
use crate::table::Table;
use crate::{Result, TsdbError};

/// Name of the schema file inside every profile
pub const RELATIONS_FILE: &str = "relations";

/// Shape a directory must have to be treated as a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    /// Unparsed test items
    Skeleton,
    /// Parser output
    Profile,
}

impl ProfileKind {
    /// Files that must exist and be non-empty
    pub fn required_files(&self) -> &'static [&'static str] {
        match self {
            Self::Skeleton => &["item", RELATIONS_FILE],
            Self::Profile => &["item", RELATIONS_FILE, "parse", "result"],
        }
    }
}

/// Whether `path` has the minimal shape of the given kind of profile.
///
/// Unreadable paths are never profiles.
pub fn is_profile_dir(path: &Path, kind: ProfileKind) -> bool {
    kind.required_files()
        .iter()
        .all(|name| fs::metadata(path.join(name)).map(|m| m.is_file() && m.len() > 0).unwrap_or(false))
}

/// An opened profile
#[derive(Debug, Clone)]
pub struct Profile {
    root: PathBuf,
    relations: Relations,
}

impl Profile {
    /// Open the profile at `root` by reading its relations file
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let relations = Relations::from_file(&root.join(RELATIONS_FILE))?;
        debug!("Opened profile {} ({} relations)", root.display(), relations.relations.len());
        Ok(Self { root, relations })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relations(&self) -> &Relations {
        &self.relations
    }

    /// Read all rows of a declared table
    pub fn read_table(&self, name: &str) -> Result<Table> {
        let relation = self.relations.get(name).cloned().ok_or_else(|| TsdbError::UnknownTable {
            table: name.to_string(),
            profile: self.root.clone(),
        })?;
        Table::from_file(&self.root.join(name), relation)
    }

    /// Read a table as typed records
    pub fn records<T: Record>(&self) -> Result<Vec<T>> {
        let table = self.read_table(T::TABLE)?;
        T::from_table(&table)
    }
}
