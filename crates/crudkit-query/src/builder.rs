//! Query builders for SELECT, INSERT, UPDATE and DELETE.
//!
//! Every builder is a pure function from a table name and [`Params`] maps to
//! a [`QuerySpec`]. Column names coming from `Params` are backtick-quoted;
//! values are always bound through `?` placeholders.
//!
//! Table names, the SELECT column list and the ORDER BY expression are
//! emitted verbatim. They are trusted input: never build them from user
//! data.

use crate::display::{placeholder_offsets, render_for_display};
use crate::params::Params;
use crudkit_core::{Error, Result, Value, quote_ident};
use std::fmt;

/// SQL text with positional `?` placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    sql: String,
    values: Vec<Value>,
}

impl QuerySpec {
    /// Wrap hand-written SQL and its parameters.
    pub fn raw(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound values, in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Split into SQL text and values.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }

    /// Count the `?` placeholders outside quoted strings and identifiers.
    pub fn placeholder_count(&self) -> usize {
        placeholder_offsets(&self.sql).len()
    }

    /// The statement with values interpolated, for logs only.
    pub fn render(&self) -> String {
        render_for_display(&self.sql, &self.values)
    }
}

impl fmt::Display for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Conflict handling for INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDuplicate {
    /// `INSERT IGNORE`: silently skip rows that hit a unique key
    Ignore,
    /// `ON DUPLICATE KEY UPDATE` with the same assignments as the insert
    Update,
}

/// A SELECT request against one table.
#[derive(Debug, Clone, Default)]
pub struct Select {
    table: String,
    criteria: Params,
    limit: Option<u64>,
    order_by: Option<String>,
    column: Option<String>,
}

impl Select {
    /// Select from the given table.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Replace the equality criteria.
    pub fn filter(mut self, criteria: Params) -> Self {
        self.criteria = criteria;
        self
    }

    /// Add one `column = value` criterion.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria.insert(column, value);
        self
    }

    /// Limit the number of rows. Zero means no limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    /// Raw ORDER BY expression, e.g. `created_at DESC`.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        let expr = expr.into();
        self.order_by = (!expr.trim().is_empty()).then_some(expr);
        self
    }

    /// Raw column (or column list) to select instead of `*`.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        self.column = (!column.trim().is_empty()).then_some(column);
        self
    }

    /// Target table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Equality criteria.
    pub fn criteria(&self) -> &Params {
        &self.criteria
    }

    /// Requested column, if not `*`.
    pub fn selected_column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Build the statement.
    pub fn build(&self) -> QuerySpec {
        build_select(self)
    }
}

/// Append ` WHERE `a`=? AND `b`=?` for non-empty criteria.
fn push_where(sql: &mut String, values: &mut Vec<Value>, criteria: Option<&Params>) {
    let Some(criteria) = criteria.filter(|c| !c.is_empty()) else {
        return;
    };
    let conditions: Vec<String> = criteria
        .columns()
        .map(|column| format!("{}=?", quote_ident(column)))
        .collect();
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    values.extend(criteria.values().cloned());
}

/// Render `` `a`=?,`b`=? `` for the SET list.
fn assignments(input: &Params) -> String {
    input
        .columns()
        .map(|column| format!("{}=?", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `SELECT <column|*> FROM <table> [WHERE ...] [ORDER BY ...] [LIMIT n]`
pub fn build_select(select: &Select) -> QuerySpec {
    let mut sql = format!(
        "SELECT {} FROM {}",
        select.column.as_deref().unwrap_or("*"),
        select.table
    );
    let mut values = Vec::with_capacity(select.criteria.len());

    push_where(&mut sql, &mut values, Some(&select.criteria));

    if let Some(order_by) = &select.order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }
    if let Some(limit) = select.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    QuerySpec { sql, values }
}

/// `INSERT [IGNORE] INTO <table> SET ... [ON DUPLICATE KEY UPDATE ...]`
///
/// With [`OnDuplicate::Update`] the assignment list appears twice, so the
/// bound values are doubled to match.
#[allow(clippy::result_large_err)]
pub fn build_insert(
    table: &str,
    input: &Params,
    on_duplicate: Option<OnDuplicate>,
) -> Result<QuerySpec> {
    if input.is_empty() {
        return Err(Error::EmptyInput {
            table: table.to_string(),
        });
    }

    let sets = assignments(input);
    let ignore = if on_duplicate == Some(OnDuplicate::Ignore) {
        "IGNORE "
    } else {
        ""
    };
    let mut sql = format!("INSERT {}INTO {} SET {}", ignore, table, sets);
    let mut values: Vec<Value> = input.values().cloned().collect();

    if on_duplicate == Some(OnDuplicate::Update) {
        sql.push_str(" ON DUPLICATE KEY UPDATE ");
        sql.push_str(&sets);
        values.extend_from_within(..);
    }

    Ok(QuerySpec { sql, values })
}

/// `UPDATE <table> SET ... [WHERE ...]`
#[allow(clippy::result_large_err)]
pub fn build_update(table: &str, input: &Params, criteria: Option<&Params>) -> Result<QuerySpec> {
    if input.is_empty() {
        return Err(Error::EmptyInput {
            table: table.to_string(),
        });
    }

    let mut sql = format!("UPDATE {} SET {}", table, assignments(input));
    let mut values: Vec<Value> = input.values().cloned().collect();
    push_where(&mut sql, &mut values, criteria);

    Ok(QuerySpec { sql, values })
}

/// `DELETE FROM <table> [WHERE ...]`
///
/// Without criteria this deletes every row of the table. There is no
/// guard against that.
pub fn build_delete(table: &str, criteria: Option<&Params>) -> QuerySpec {
    let mut sql = format!("DELETE FROM {}", table);
    let mut values = Vec::new();
    push_where(&mut sql, &mut values, criteria);
    QuerySpec { sql, values }
}
