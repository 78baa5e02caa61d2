//! Identifier and literal quoting for MySQL SQL text.
//!
//! Identifiers are quoted with backticks. Literals follow the escaping rules
//! of `mysql_real_escape_string`, which is what a driver's own `quote` does
//! when it is not talking to a server.

use crate::value::Value;

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// Embedded backticks are escaped by doubling them (`` ` `` → ``` `` ```).
///
/// # Examples
///
/// ```
/// use crudkit_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "`users`");
/// assert_eq!(quote_ident("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Escape a string for embedding inside a single-quoted MySQL literal.
///
/// The result does not include the surrounding quotes.
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\0' => result.push_str("\\0"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\x1a' => result.push_str("\\Z"),
            _ => result.push(ch),
        }
    }
    result
}

/// Format a value as a MySQL literal suitable for SQL text.
///
/// # Examples
///
/// ```
/// use crudkit_core::{Value, quote_literal};
///
/// assert_eq!(quote_literal(&Value::Int(5)), "5");
/// assert_eq!(quote_literal(&Value::Text("O'Brien".into())), "'O\\'Brien'");
/// assert_eq!(quote_literal(&Value::Null), "NULL");
/// ```
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::UnsignedBigInt(i) => i.to_string(),
        Value::Float(f) => float_literal(f64::from(*f)),
        Value::Double(f) => float_literal(*f),
        Value::Decimal(s) => format!("'{}'", escape_string(s)),
        Value::Text(s) => format!("'{}'", escape_string(s)),
        Value::Bytes(b) => hex_literal(b),
        Value::Json(j) => format!("'{}'", escape_string(&j.to_string())),
    }
}

fn float_literal(f: f64) -> String {
    // MySQL has no literal for NaN or infinities.
    if f.is_finite() {
        f.to_string()
    } else {
        "NULL".to_string()
    }
}

fn hex_literal(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut result = String::with_capacity(data.len() * 2 + 3);
    result.push_str("X'");
    for byte in data {
        let _ = write!(result, "{byte:02X}");
    }
    result.push('\'');
    result
}
