//! Raw table data

use std::fs;
use std::path::Path;

use crate::relations::Relation;
use crate::{Result, TsdbError};

/// Field separator in table files
pub const FIELD_SEPARATOR: char = '@';

/// A single row with its 1-based line number in the table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

/// The rows of one table together with its declaration
#[derive(Debug, Clone)]
pub struct Table {
    pub relation: Relation,
    pub rows: Vec<Row>,
}

impl Table {
    /// Read a table file, decoding each row against `relation`
    pub fn from_file(path: &Path, relation: Relation) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            // a declared but absent table is simply empty
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => return Err(TsdbError::Io { path: path.to_path_buf(), source }),
        };
        Ok(Self::parse(&content, relation))
    }

    /// Decode table text
    pub fn parse(content: &str, relation: Relation) -> Self {
        let width = relation.fields.len();
        let rows = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(i, line)| {
                let mut fields: Vec<String> = line.split(FIELD_SEPARATOR).map(unescape).collect();
                if fields.len() < width {
                    fields.resize(width, String::new());
                }
                Row { line: i + 1, fields }
            })
            .collect();

        Self { relation, rows }
    }

    pub fn name(&self) -> &str {
        &self.relation.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column index of a field, or an error naming the table
    pub fn column(&self, field: &str) -> Result<usize> {
        self.relation.index_of(field).ok_or_else(|| TsdbError::MissingField {
            table: self.relation.name.clone(),
            field: field.to_string(),
        })
    }
}

/// Decode the `\s`, `\n` and `\\` escapes used inside fields
pub fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(FIELD_SEPARATOR),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
