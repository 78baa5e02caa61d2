//! Result extraction modes and their outputs.

use crudkit_core::{Error, Result, Row, TypeError, Value};
use std::fmt;

/// How the result of a statement is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnMode {
    /// First row, or none
    SingleRow,
    /// Every row
    AllRows,
    /// First column of every row
    SingleColumn,
    /// Rows affected
    RowCount,
    /// Id generated by the insert
    LastInsertId,
    /// Whether the statement ran
    Success,
}

impl ReturnMode {
    /// Does this mode read a result set (as opposed to an affected count)?
    pub const fn returns_rows(self) -> bool {
        matches!(
            self,
            ReturnMode::SingleRow | ReturnMode::AllRows | ReturnMode::SingleColumn
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ReturnMode::SingleRow => "single_row",
            ReturnMode::AllRows => "all_rows",
            ReturnMode::SingleColumn => "single_column",
            ReturnMode::RowCount => "row_count",
            ReturnMode::LastInsertId => "last_insert_id",
            ReturnMode::Success => "success",
        }
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one statement, tagged by the [`ReturnMode`] that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Row(Option<Row>),
    Rows(Vec<Row>),
    Column(Vec<Value>),
    RowCount(u64),
    LastInsertId(u64),
    Success(bool),
}

impl QueryOutput {
    /// Shape a result set according to a row-reading mode.
    ///
    /// Count modes have no result set to shape and map to `Success(true)`.
    pub fn from_rows(mode: ReturnMode, rows: Vec<Row>) -> Self {
        match mode {
            ReturnMode::SingleRow => QueryOutput::Row(rows.into_iter().next()),
            ReturnMode::AllRows => QueryOutput::Rows(rows),
            ReturnMode::SingleColumn => QueryOutput::Column(
                rows.into_iter()
                    .filter_map(|row| row.into_values().into_iter().next())
                    .collect(),
            ),
            ReturnMode::RowCount | ReturnMode::LastInsertId | ReturnMode::Success => {
                QueryOutput::Success(true)
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryOutput::Row(_) => "single row",
            QueryOutput::Rows(_) => "rows",
            QueryOutput::Column(_) => "column",
            QueryOutput::RowCount(_) => "row count",
            QueryOutput::LastInsertId(_) => "last insert id",
            QueryOutput::Success(_) => "success flag",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::Type(TypeError {
            expected,
            actual: self.kind().to_string(),
            column: None,
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn into_row(self) -> Result<Option<Row>> {
        match self {
            QueryOutput::Row(row) => Ok(row),
            other => Err(other.mismatch("single row")),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            other => Err(other.mismatch("rows")),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn into_column(self) -> Result<Vec<Value>> {
        match self {
            QueryOutput::Column(values) => Ok(values),
            other => Err(other.mismatch("column")),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn into_row_count(self) -> Result<u64> {
        match self {
            QueryOutput::RowCount(count) => Ok(count),
            other => Err(other.mismatch("row count")),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn into_last_insert_id(self) -> Result<u64> {
        match self {
            QueryOutput::LastInsertId(id) => Ok(id),
            other => Err(other.mismatch("last insert id")),
        }
    }

    #[allow(clippy::result_large_err)]
    pub fn into_success(self) -> Result<bool> {
        match self {
            QueryOutput::Success(ok) => Ok(ok),
            other => Err(other.mismatch("success flag")),
        }
    }
}
