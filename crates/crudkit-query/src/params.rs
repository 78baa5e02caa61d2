//! Ordered column → value maps.
//!
//! `Params` is used both for WHERE criteria and for SET assignments. Its
//! iteration order is insertion order, and that order is the order of the
//! generated clauses and of the bound values.

use crudkit_core::Value;
use serde::{Deserialize, Serialize};

/// An insertion-ordered map from column name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Insert a column value.
    ///
    /// Re-inserting a column replaces its value but keeps its original
    /// position. Returns the previous value, if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((column, value));
        None
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(index).1)
    }

    /// Look up a column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (column, value) in iter {
            params.insert(column, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a [`Params`] map from `column => value` pairs.
///
/// # Example
///
/// ```
/// use crudkit_query::params;
///
/// let criteria = params! { "status" => "active", "org_id" => 42 };
/// assert_eq!(criteria.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.with($column, $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let params = Params::new().with("b", 2).with("a", 1).with("c", 3);
        assert_eq!(params.columns().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(
            params.values().cloned().collect::<Vec<_>>(),
            vec![Value::Int(2), Value::Int(1), Value::Int(3)]
        );
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut params = Params::from([("a", 1), ("b", 2)]);
        let previous = params.insert("a", 10);
        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(params.len(), 2);
        assert_eq!(params.iter().next(), Some(("a", &Value::Int(10))));
    }

    #[test]
    fn test_remove_and_get() {
        let mut params = params! { "a" => 1, "b" => "two" };
        assert_eq!(params.get("b"), Some(&Value::Text("two".into())));
        assert_eq!(params.remove("a"), Some(Value::Int(1)));
        assert_eq!(params.remove("a"), None);
        assert_eq!(params.len(), 1);
        assert!(params! {}.is_empty());
    }

    #[test]
    fn test_serde_shape() {
        let params = params! { "id" => 1 };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"[["id",{"Int":1}]]"#);
        let back: Params = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
