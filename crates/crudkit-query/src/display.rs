//! Human-readable rendering of parameterized SQL.
//!
//! The output is for logs and diagnostics only. It is never sent to the
//! database: statements always execute with bound parameters.

use crudkit_core::Value;

/// Backslash-escape `'`, `"`, `\` and NUL.
pub fn escape_for_display(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\'' | '"' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Byte offsets of the `?` placeholders in `sql`.
///
/// A `?` inside a quoted string (`'..'`, `".."`) or a backticked identifier
/// is text, not a placeholder. Backslash escapes are honoured inside
/// strings.
pub(crate) fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.char_indices();
    while let Some((at, ch)) = chars.next() {
        match quote {
            Some(q) if ch == '\\' && q != '`' => {
                chars.next();
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => offsets.push(at),
                _ => {}
            },
        }
    }
    offsets
}

/// Substitute `values` into the `?` placeholders of `sql`, positionally.
///
/// Every value is escaped and wrapped in single quotes, whatever its type.
/// Placeholders beyond the end of `values` are left as `?`, and a `?` inside
/// a quoted literal or identifier is never substituted. With no values the
/// SQL is returned unchanged.
///
/// # Example
///
/// ```
/// use crudkit_core::Value;
/// use crudkit_query::render_for_display;
///
/// let shown = render_for_display(
///     "SELECT * FROM t WHERE x=?",
///     &[Value::Text("O'Brien".into())],
/// );
/// assert_eq!(shown, r"SELECT * FROM t WHERE x='O\'Brien'");
/// ```
pub fn render_for_display(sql: &str, values: &[Value]) -> String {
    if values.is_empty() {
        return sql.to_string();
    }

    let mut rendered = String::with_capacity(sql.len() + values.len() * 8);
    let mut copied = 0;
    for (at, value) in placeholder_offsets(sql).into_iter().zip(values) {
        rendered.push_str(&sql[copied..at]);
        rendered.push('\'');
        rendered.push_str(&escape_for_display(&value.to_plain_string()));
        rendered.push('\'');
        copied = at + 1;
    }
    rendered.push_str(&sql[copied..]);
    rendered
}
