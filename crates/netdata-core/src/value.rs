//! Core value types for representing category records

use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value};

/// A named collection of records sourced from same-named CSV files
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Category name (CSV file name without the extension)
    pub name: String,
    /// Records in insertion order
    pub records: Vec<Record>,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the category has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by slug
    pub fn find_by_slug(&self, slug: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.slug() == Some(slug))
    }
}

/// One row of a category: an ordered mapping from field name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from ordered fields; later duplicates replace earlier ones
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, CellValue)>,
        K: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in fields {
            record.insert(key, value);
        }
        record
    }

    /// Get a value by field name
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Get a mutable value by field name
    pub fn get_mut(&mut self, field: &str) -> Option<&mut CellValue> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v)
    }

    /// Set a field, keeping its position if it already exists
    pub fn insert(&mut self, field: impl Into<String>, value: CellValue) {
        let field = field.into();
        match self.get_mut(&field) {
            Some(existing) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Check whether the record has a field
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate mutably over values in field order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut CellValue)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Get the number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The record's slug, if it has a string slug
    pub fn slug(&self) -> Option<&str> {
        self.get("slug").and_then(CellValue::as_str)
    }

    /// Convert to an ordered JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Record::from_fields(
                map.into_iter().map(|(k, v)| (k, CellValue::from(v))),
            )),
            other => Err(D::Error::custom(format!(
                "expected a record object, found {}",
                other
            ))),
        }
    }
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Null / missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (only produced by JSON cells)
    Number(Number),
    /// Normalized string value
    String(String),
    /// Ordered list of values
    List(Vec<CellValue>),
    /// Ordered mapping of values
    Map(Vec<(String, CellValue)>),
    /// Raw CSV cell that has not been normalized yet
    Raw(String),
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Null, or a string that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) | CellValue::Raw(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow the text of a string or raw value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) | CellValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the elements of a list value
    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            CellValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert to a JSON value; raw cells become strings
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Number(n) => Value::Number(n.clone()),
            CellValue::String(s) | CellValue::Raw(s) => Value::String(s.clone()),
            CellValue::List(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
            CellValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(b),
            Value::Number(n) => CellValue::Number(n),
            Value::String(s) => CellValue::String(s),
            Value::Array(items) => CellValue::List(items.into_iter().map(CellValue::from).collect()),
            Value::Object(map) => {
                CellValue::Map(map.into_iter().map(|(k, v)| (k, CellValue::from(v))).collect())
            }
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) => n.serialize(serializer),
            CellValue::String(s) | CellValue::Raw(s) => serializer.serialize_str(s),
            CellValue::List(items) => items.serialize(serializer),
            CellValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::String(s) | CellValue::Raw(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
