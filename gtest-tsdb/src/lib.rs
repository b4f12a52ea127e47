//! # [incr tsdb()] profile access
//!
//! Read-only access to the tabular test profiles used by DELPH-IN grammar
//! testing tools. A profile is a directory holding a `relations` schema file
//! and one plain-text file per table.
//!
//! ## Modules
//!
//! - `relations`: the schema file (table and field declarations)
//! - `table`: raw rows of a single table, with field escaping
//! - `profile`: opening a profile directory and the skeleton/profile shape check
//! - `records`: strongly-typed rows for the `item`, `parse` and `result` tables
//! - `join`: inner joins and key-grouped row matching over typed rows

pub mod join;
pub mod profile;
pub mod records;
pub mod relations;
pub mod table;

use std::path::PathBuf;

pub use join::{join, match_rows};
pub use profile::{is_profile_dir, Profile, ProfileKind};
pub use records::{Item, Parse, ParseResult, Record};
pub use relations::{DataType, Field, Relation, Relations};
pub use table::{Row, Table};

/// Errors raised while reading profiles
#[derive(thiserror::Error, Debug)]
pub enum TsdbError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid relations file {path} at line {line}: {message}")]
    Relations { path: PathBuf, line: usize, message: String },

    #[error("Table '{table}' is not declared in the relations file of {profile}")]
    UnknownTable { table: String, profile: PathBuf },

    #[error("Table '{table}' has no field '{field}'")]
    MissingField { table: String, field: String },

    #[error("Invalid value '{value}' for {table}:{field} at line {line}")]
    InvalidValue { table: String, field: String, value: String, line: usize },
}

pub type Result<T> = std::result::Result<T, TsdbError>;
