//! JSON schema checks over generated documents

use crate::document::{read_json, COLUMNS_KEY};
use crate::error::{Error, Result};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Field dropped from `required` lists when validating provider tables
const NETWORK_SCOPED_FIELD: &str = "chain";

/// A structural schema violation
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// JSON pointer to the offending value, e.g. `#/wallets/3/slug`
    pub pointer: String,
    pub message: String,
    /// The offending value, `null` if it cannot be resolved
    pub value: Value,
    /// Path of the failing keyword inside the schema
    pub schema_path: String,
}

impl SchemaViolation {
    fn path_key(&self) -> Vec<PathSegment> {
        self.pointer
            .trim_start_matches('#')
            .split('/')
            .skip(1)
            .map(PathSegment::parse)
            .collect()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error message : {}", self.message)?;
        writeln!(f, "JSON Pointer  : {}", self.pointer)?;
        writeln!(f, "Offending value: {}", self.value)?;
        write!(f, "Schema path   : {}", self.schema_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    fn parse(segment: &str) -> Self {
        match segment.parse::<usize>() {
            Ok(idx) => PathSegment::Index(idx),
            Err(_) => PathSegment::Key(segment.to_string()),
        }
    }
}

/// Validates a document against a schema
pub trait SchemaValidator {
    /// Violations ordered by instance path
    fn validate(&self, document: &Value, schema: &Value) -> Result<Vec<SchemaViolation>>;
}

/// Draft 7 validation backed by the `jsonschema` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Draft7Validator;

impl SchemaValidator for Draft7Validator {
    fn validate(&self, document: &Value, schema: &Value) -> Result<Vec<SchemaViolation>> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| Error::Schema(e.to_string()))?;

        let mut violations: Vec<SchemaViolation> = match compiled.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    SchemaViolation {
                        pointer: json_pointer(&path),
                        message: error.to_string(),
                        value: document.pointer(&path).cloned().unwrap_or(Value::Null),
                        schema_path: error.schema_path.to_string().trim_start_matches('/').to_string(),
                    }
                })
                .collect(),
        };

        sort_violations(&mut violations);
        Ok(violations)
    }
}

/// Stable sort by instance path, comparing array indices numerically
pub fn sort_violations(violations: &mut [SchemaViolation]) {
    violations.sort_by(|a, b| a.path_key().cmp(&b.path_key()));
}

/// Turn an RFC 6901 path (`/a/0`) into a fragment pointer (`#/a/0`)
pub fn json_pointer(path: &str) -> String {
    format!("#{}", path)
}

/// Derive the provider-table schema: `chain` is no longer required by any
/// definition except the reserved `columns` one.
pub fn providers_schema(schema: &Value) -> Value {
    let mut schema = schema.clone();

    if let Some(defs) = schema.get_mut("$defs").and_then(Value::as_object_mut) {
        for (name, definition) in defs.iter_mut() {
            if name == COLUMNS_KEY {
                continue;
            }
            if let Some(required) = definition.get_mut("required").and_then(Value::as_array_mut) {
                required.retain(|field| field.as_str() != Some(NETWORK_SCOPED_FIELD));
            }
        }
    }

    schema
}

/// Load a schema file
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<Value> {
    read_json(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "wallets": {"type": "array", "items": {"$ref": "#/$defs/wallet"}},
                "columns": {"$ref": "#/$defs/columns"}
            },
            "$defs": {
                "wallet": {
                    "type": "object",
                    "required": ["slug", "chain"],
                    "properties": {"slug": {"type": "string"}}
                },
                "columns": {"type": "object", "required": ["chain"]},
                "loose": {"type": "object"}
            }
        })
    }

    #[test]
    fn test_providers_schema_drops_chain() {
        let derived = providers_schema(&schema());

        assert_eq!(derived["$defs"]["wallet"]["required"], json!(["slug"]));
        assert_eq!(derived["$defs"]["columns"]["required"], json!(["chain"]));
        assert!(derived["$defs"]["loose"].get("required").is_none());
        // the source schema is untouched
        assert_eq!(schema()["$defs"]["wallet"]["required"], json!(["slug", "chain"]));
    }

    #[test]
    fn test_json_pointer() {
        assert_eq!(json_pointer(""), "#");
        assert_eq!(json_pointer("/wallets/1"), "#/wallets/1");
    }

    #[test]
    fn test_sort_violations_numeric_indices() {
        let violation = |pointer: &str| SchemaViolation {
            pointer: pointer.to_string(),
            message: String::new(),
            value: Value::Null,
            schema_path: String::new(),
        };
        let mut violations = vec![
            violation("#/wallets/10"),
            violation("#/wallets/2/slug"),
            violation("#"),
            violation("#/wallets/2"),
        ];

        sort_violations(&mut violations);

        let pointers: Vec<&str> = violations.iter().map(|v| v.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#", "#/wallets/2", "#/wallets/2/slug", "#/wallets/10"]);
    }

    #[test]
    fn test_draft7_validator_reports_pointers() {
        let document = json!({
            "wallets": [
                {"slug": "ok", "chain": "mainnet"},
                {"slug": 7}
            ]
        });

        let violations = Draft7Validator.validate(&document, &schema()).unwrap();

        let pointers: Vec<&str> = violations.iter().map(|v| v.pointer.as_str()).collect();
        assert_eq!(pointers, vec!["#/wallets/1", "#/wallets/1/slug"]);
        assert_eq!(violations[1].value, json!(7));
    }

    #[test]
    fn test_draft7_validator_accepts_provider_tables() {
        let document = json!({"wallets": [{"slug": "ok"}]});

        assert_eq!(Draft7Validator.validate(&document, &schema()).unwrap().len(), 1);
        assert!(Draft7Validator
            .validate(&document, &providers_schema(&schema()))
            .unwrap()
            .is_empty());
    }
}
