//! Result rows.
//!
//! A driver builds one `Arc<[String]>` of column names per result set and
//! hands it to every row, so rows stay cheap to clone.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::sync::Arc;

/// One row of a result set: column names plus positional values.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Build a row that shares column names with the rest of its result set.
    pub fn with_shared_columns(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column.
    ///
    /// With duplicate names (`SELECT a.id, b.id`) the last one wins, the
    /// way an associative fetch would collapse them.
    pub fn value(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().rposition(|name| name == column)?;
        self.values.get(index)
    }

    /// The first column's value.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Convert a named column.
    #[allow(clippy::result_large_err)]
    pub fn try_get<T: FromValue>(&self, column: &str) -> Result<T> {
        let value = self.value(column).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: "no such column".to_string(),
                column: Some(column.to_string()),
            })
        })?;
        T::from_value(value).map_err(|e| with_column(e, column))
    }

    /// Convert the value at a position.
    #[allow(clippy::result_large_err)]
    pub fn try_get_at<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.get(index).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("position {} of a {}-column row", index, self.len()),
                column: None,
            })
        })?;
        match self.columns.get(index) {
            Some(name) => T::from_value(value).map_err(|e| with_column(e, name)),
            None => T::from_value(value),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// `(column, value)` pairs in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// The row as a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.columns == other.columns
    }
}

fn with_column(err: Error, column: &str) -> Error {
    match err {
        Error::Type(mut te) => {
            te.column = Some(column.to_string());
            Error::Type(te)
        }
        other => other,
    }
}

/// Conversion out of a borrowed [`Value`].
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
    })
}

macro_rules! from_value_via {
    ($($ty:ty => $accessor:ident),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    value.$accessor().ok_or_else(|| mismatch(stringify!($ty), value))
                }
            }
        )+
    };
}

from_value_via! {
    bool => as_bool,
    i64 => as_i64,
    u64 => as_u64,
    f64 => as_f64,
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| mismatch("i32", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone()).map_err(|_| mismatch("String", value)),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("Vec<u8>", value))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

/// Build a value from a whole result row.
///
/// This is the fetch shape of the typed engine reads. [`Row`] keeps the row
/// as is, `serde_json::Value` gives an object keyed by column name,
/// `Vec<Value>` and tuples read positionally.
///
/// ```rust,ignore
/// struct User { id: i64, email: String }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> Result<Self> {
///         Ok(Self { id: row.try_get("id")?, email: row.try_get("email")? })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

impl FromRow for serde_json::Value {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.to_json())
    }
}

impl FromRow for Vec<Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.values.clone())
    }
}

macro_rules! from_row_tuple {
    ($($name:ident: $index:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: &Row) -> Result<Self> {
                Ok(($(row.try_get_at::<$name>($index)?,)+))
            }
        }
    };
}

from_row_tuple!(A: 0);
from_row_tuple!(A: 0, B: 1);
from_row_tuple!(A: 0, B: 1, C: 2);
from_row_tuple!(A: 0, B: 1, C: 2, D: 3);

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Row {
        Row::new(
            vec!["id".into(), "email".into(), "nickname".into()],
            vec![Value::Text("7".into()), Value::Text("a@x.io".into()), Value::Null],
        )
    }

    #[test]
    fn lookup_by_position_and_name() {
        let row = account();
        assert_eq!(row.len(), 3);
        assert_eq!(row.value("email"), row.get(1));
        assert_eq!(row.first(), Some(&Value::Text("7".into())));
        assert_eq!(row.value("missing"), None);
        assert_eq!(row.columns(), ["id", "email", "nickname"]);
    }

    #[test]
    fn duplicate_column_names_resolve_to_last() {
        let row = Row::new(
            vec!["id".into(), "id".into()],
            vec![Value::Int(1), Value::Int(2)],
        );
        assert_eq!(row.value("id"), Some(&Value::Int(2)));
    }

    #[test]
    fn typed_access() {
        let row = account();
        assert_eq!(row.try_get::<i64>("id").unwrap(), 7);
        assert_eq!(row.try_get_at::<String>(1).unwrap(), "a@x.io");
        assert_eq!(row.try_get::<Option<String>>("nickname").unwrap(), None);
    }

    #[test]
    fn conversion_errors_carry_the_column() {
        let row = account();
        let Err(Error::Type(te)) = row.try_get::<bool>("email") else {
            panic!("expected a type error");
        };
        assert_eq!(te.column.as_deref(), Some("email"));
        assert_eq!(te.actual, "TEXT");

        let Err(Error::Type(te)) = row.try_get_at::<i64>(9) else {
            panic!("expected a type error");
        };
        assert_eq!(te.actual, "position 9 of a 3-column row");
        assert!(row.try_get::<i64>("missing").is_err());
    }

    #[test]
    fn rows_share_column_names() {
        let first = account();
        let second = Row::with_shared_columns(
            first.shared_columns(),
            vec![Value::Int(8), Value::Text("b@x.io".into()), Value::Null],
        );
        assert!(Arc::ptr_eq(&first.shared_columns(), &second.shared_columns()));
        assert_ne!(first, second);
        assert_eq!(first, account());
    }

    #[test]
    fn row_shapes() {
        let row = account();
        let (id, email): (i64, String) = FromRow::from_row(&row).unwrap();
        assert_eq!((id, email.as_str()), (7, "a@x.io"));
        assert_eq!(Vec::<Value>::from_row(&row).unwrap().len(), 3);
        assert_eq!(Row::from_row(&row).unwrap(), row);
        assert!(<(i64, bool)>::from_row(&row).is_err());
    }

    #[test]
    fn json_object() {
        let json = account().to_json();
        assert_eq!(json["email"], "a@x.io");
        assert!(json["nickname"].is_null());
    }
}
