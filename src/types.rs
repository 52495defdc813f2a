use serde::{Deserialize, Serialize};

use crate::Value;

/// Column description returned alongside every result set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    /// Declared type, possibly parameterized, e.g. `decimal(10,2)`.
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// A result row; column order follows the result's column metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Outcome of one executed statement.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    /// Rows of a result-set statement.
    Rows(Vec<Row>),
    /// Counters of a mutation; mutations never carry rows.
    Mutation {
        insert_id: i64,
        num_updated_or_deleted_rows: u64,
    },
}

impl QueryResult {
    /// Rows of the result; always empty for mutations.
    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Mutation { .. } => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Mutation { .. } => Vec::new(),
        }
    }

    pub fn insert_id(&self) -> Option<i64> {
        match self {
            Self::Mutation { insert_id, .. } => Some(*insert_id),
            Self::Rows(_) => None,
        }
    }

    pub fn num_updated_or_deleted_rows(&self) -> Option<u64> {
        match self {
            Self::Mutation {
                num_updated_or_deleted_rows,
                ..
            } => Some(*num_updated_or_deleted_rows),
            Self::Rows(_) => None,
        }
    }
}
