//! The `relations` schema file

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{Result, TsdbError};

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    String,
    Date,
    Position,
}

impl DataType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            "date" => Some(Self::Date),
            "position" => Some(Self::Position),
            _ => None,
        }
    }
}

/// A single field (column) of a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
    pub key: bool,
}

/// A table declaration: its name and ordered fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Relation {
    /// Column index of a field, if declared
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == field)
    }
}

/// All relations declared by a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relations {
    pub relations: Vec<Relation>,
}

impl Relations {
    /// Read and parse a relations file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|source| TsdbError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&content, path)
    }

    /// Parse relations text; `path` is only used for error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut relations: Vec<Relation> = Vec::new();
        let mut current: Option<Relation> = None;

        for (i, raw) in content.lines().enumerate() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            };

            if line.trim().is_empty() {
                if let Some(rel) = current.take() {
                    relations.push(rel);
                }
                continue;
            }

            let indented = line.starts_with(char::is_whitespace);
            let line = line.trim();

            if !indented {
                let name = line.strip_suffix(':').ok_or_else(|| TsdbError::Relations {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: format!("expected a table declaration, found '{}'", line),
                })?;
                if let Some(rel) = current.take() {
                    relations.push(rel);
                }
                current = Some(Relation { name: name.trim().to_string(), fields: Vec::new() });
                continue;
            }

            let relation = current.as_mut().ok_or_else(|| TsdbError::Relations {
                path: path.to_path_buf(),
                line: i + 1,
                message: "field declared outside of a table".to_string(),
            })?;
            relation.fields.push(parse_field(line).ok_or_else(|| TsdbError::Relations {
                path: path.to_path_buf(),
                line: i + 1,
                message: format!("invalid field declaration '{}'", line),
            })?);
        }

        if let Some(rel) = current.take() {
            relations.push(rel);
        }

        Ok(Self { relations })
    }

    /// Look up a relation by table name
    pub fn get(&self, table: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == table)
    }
}

fn parse_field(line: &str) -> Option<Field> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_string();
    let mut datatype = None;
    let mut key = false;

    for part in parts {
        match part.strip_prefix(':')? {
            "key" => key = true,
            "partial" | "unique" => {}
            other => datatype = Some(DataType::parse(other)?),
        }
    }

    Some(Field { name, datatype: datatype?, key })
}
