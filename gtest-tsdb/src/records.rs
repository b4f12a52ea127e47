//! Typed rows for the tables the harness reads

use serde::{Deserialize, Serialize};

use crate::table::{Row, Table};
use crate::{Result, TsdbError};

/// A strongly-typed table row
pub trait Record: Sized {
    /// Name of the table the record is read from
    const TABLE: &'static str;

    /// Decode one row; column lookups go through `table`
    fn from_row(table: &Table, row: &Row) -> Result<Self>;

    /// Decode every row of `table`
    fn from_table(table: &Table) -> Result<Vec<Self>> {
        table.rows.iter().map(|row| Self::from_row(table, row)).collect()
    }
}

/// Well-formedness flag of an `item` row
pub mod wf {
    pub const UNGRAMMATICAL: i32 = 0;
    pub const GRAMMATICAL: i32 = 1;
    pub const IGNORED: i32 = 2;
}

/// A test item (input sentence)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub i_id: i64,
    pub i_input: String,
    pub i_wf: i32,
}

impl Record for Item {
    const TABLE: &'static str = "item";

    fn from_row(table: &Table, row: &Row) -> Result<Self> {
        Ok(Self {
            i_id: int_field(table, row, "i-id", None)?,
            i_input: optional_field(table, row, "i-input").unwrap_or_default(),
            i_wf: i32_field(table, row, "i-wf", Some(wf::GRAMMATICAL))?,
        })
    }
}

/// A parse attempt for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parse {
    pub parse_id: i64,
    pub i_id: i64,
    pub readings: i64,
}

impl Record for Parse {
    const TABLE: &'static str = "parse";

    fn from_row(table: &Table, row: &Row) -> Result<Self> {
        Ok(Self {
            parse_id: int_field(table, row, "parse-id", None)?,
            i_id: int_field(table, row, "i-id", None)?,
            readings: int_field(table, row, "readings", Some(0))?,
        })
    }
}

/// One reading of a parse, carrying its semantic representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub parse_id: i64,
    pub result_id: i64,
    pub mrs: String,
}

impl Record for ParseResult {
    const TABLE: &'static str = "result";

    fn from_row(table: &Table, row: &Row) -> Result<Self> {
        Ok(Self {
            parse_id: int_field(table, row, "parse-id", None)?,
            result_id: int_field(table, row, "result-id", Some(0))?,
            mrs: optional_field(table, row, "mrs").unwrap_or_default(),
        })
    }
}

fn optional_field(table: &Table, row: &Row, field: &str) -> Option<String> {
    let column = table.relation.index_of(field)?;
    row.fields.get(column).cloned()
}

fn int_field(table: &Table, row: &Row, field: &str, default: Option<i64>) -> Result<i64> {
    let column = table.column(field)?;
    let value = row.fields.get(column).map(|s| s.trim()).unwrap_or("");

    if value.is_empty() {
        if let Some(default) = default {
            return Ok(default);
        }
    }

    value.parse().map_err(|_| TsdbError::InvalidValue {
        table: table.name().to_string(),
        field: field.to_string(),
        value: value.to_string(),
        line: row.line,
    })
}

fn i32_field(table: &Table, row: &Row, field: &str, default: Option<i32>) -> Result<i32> {
    let value = int_field(table, row, field, default.map(i64::from))?;
    i32::try_from(value).map_err(|_| TsdbError::InvalidValue {
        table: table.name().to_string(),
        field: field.to_string(),
        value: value.to_string(),
        line: row.line,
    })
}
