//! Table name prefixing
//!
//! A wrapper can be bound to a prefix such as `dev-` so that callers use
//! logical table names while every physical request targets the prefixed
//! table. Responses get the prefix stripped back off.

use aws_sdk_dynamodb::types::ConsumedCapacity;
use std::collections::HashMap;
use std::fmt;

/// Prefix added to table names in requests and removed from responses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableNamePrefix(String);

impl TableNamePrefix {
    /// Create a new prefix; an empty prefix leaves names untouched
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// The prefix itself
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the prefix is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix a table name
    ///
    /// A name already starting with the prefix is returned unchanged.
    pub fn add(&self, table_name: &str) -> String {
        if table_name.starts_with(&self.0) {
            table_name.to_string()
        } else {
            format!("{}{}", self.0, table_name)
        }
    }

    /// Strip the prefix from a table name
    ///
    /// Names returned by the service always carry the prefix, so this drops
    /// as many leading characters as the prefix has without checking them.
    /// A name lacking the prefix comes back truncated.
    pub fn remove(&self, table_name: &str) -> String {
        if self.is_empty() {
            return table_name.to_string();
        }
        table_name.chars().skip(self.0.chars().count()).collect()
    }

    /// Prefix every key of a map keyed by table name
    pub fn add_to_keys<V>(&self, map: HashMap<String, V>) -> HashMap<String, V> {
        if self.is_empty() {
            return map;
        }
        map.into_iter().map(|(name, value)| (self.add(&name), value)).collect()
    }

    /// Strip the prefix from every key of a map keyed by table name
    pub fn remove_from_keys<V>(&self, map: HashMap<String, V>) -> HashMap<String, V> {
        if self.is_empty() {
            return map;
        }
        map.into_iter().map(|(name, value)| (self.remove(&name), value)).collect()
    }

    /// Strip the prefix from the table name of a capacity record
    pub fn remove_from_capacity(&self, mut capacity: ConsumedCapacity) -> ConsumedCapacity {
        if !self.is_empty() {
            capacity.table_name = capacity.table_name.map(|name| self.remove(&name));
        }
        capacity
    }
}

impl fmt::Display for TableNamePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableNamePrefix {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}
