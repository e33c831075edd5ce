//! Network documents: categories plus their column order

use crate::error::{Error, Result};
use crate::value::{Category, Record};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Reserved document key holding the column order; never a data category
pub const COLUMNS_KEY: &str = "columns";

/// Original field order of each category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnOrder {
    entries: Vec<(String, Vec<String>)>,
}

impl ColumnOrder {
    /// Record the field order of each category's first record
    pub fn from_categories(categories: &[Category]) -> Self {
        let entries = categories
            .iter()
            .map(|category| {
                let fields = category
                    .records
                    .first()
                    .map(|record| record.keys().map(str::to_string).collect())
                    .unwrap_or_default();
                (category.name.clone(), fields)
            })
            .collect();
        Self { entries }
    }

    /// Field order for a category
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, fields)| fields.as_slice())
    }

    /// Iterate over `(category, fields)` in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, fields)| {
                    let fields = fields.iter().cloned().map(Value::String).collect();
                    (name.clone(), Value::Array(fields))
                })
                .collect(),
        )
    }

    fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut entries = Vec::with_capacity(map.len());
        for (name, fields) in map {
            let fields = fields
                .as_array()?
                .iter()
                .map(|f| f.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?;
            entries.push((name.clone(), fields));
        }
        Some(Self { entries })
    }
}

/// A generated network document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Data categories in insertion order
    pub categories: Vec<Category>,
    /// Column order metadata, attached once aggregation is finished
    pub columns: Option<ColumnOrder>,
}

impl Document {
    /// Create a document without column metadata
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            columns: None,
        }
    }

    /// Find a category by name
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Find a category by name for mutation
    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    /// Compute and attach the column order from the current categories
    pub fn attach_column_order(&mut self) {
        self.columns = Some(ColumnOrder::from_categories(&self.categories));
    }

    /// Convert to an ordered JSON object
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for category in &self.categories {
            let records = category.records.iter().map(Record::to_json).collect();
            map.insert(category.name.clone(), Value::Array(records));
        }
        if let Some(columns) = &self.columns {
            map.insert(COLUMNS_KEY.to_string(), columns.to_json());
        }
        Value::Object(map)
    }

    /// Build a document from JSON; `source` names it in errors
    pub fn from_json(value: Value, source: &Path) -> Result<Self> {
        let invalid = |message: String| Error::InvalidDocument {
            path: source.to_path_buf(),
            message,
        };

        let Value::Object(map) = value else {
            return Err(invalid("document root must be an object".to_string()));
        };

        let mut document = Document::default();
        for (key, value) in map {
            if key == COLUMNS_KEY {
                let columns = ColumnOrder::from_json(&value).ok_or_else(|| {
                    invalid("'columns' must map category names to lists of field names".to_string())
                })?;
                document.columns = Some(columns);
                continue;
            }

            let Value::Array(items) = value else {
                return Err(invalid(format!("category '{}' must be an array", key)));
            };
            let records = items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    serde_json::from_value::<Record>(item)
                        .map_err(|e| invalid(format!("category '{}' item {}: {}", key, idx, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            document.categories.push(Category::new(key, records));
        }

        Ok(document)
    }

    /// Serialize with 4-space indentation, non-ASCII written verbatim
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        serde::Serialize::serialize(&self.to_json(), &mut serializer)?;
        String::from_utf8(buf)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Write the document to a file
    pub fn write_pretty<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_pretty_string()?)?;
        Ok(())
    }

    /// Read a document from a JSON file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let value = read_json(path)?;
        Self::from_json(value, path)
    }
}

/// Read any JSON file, preserving key order
pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(Error::Json)
}
