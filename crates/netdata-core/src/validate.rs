//! Validation entry point: schema plus rules over every generated document

use crate::document::{read_json, Document};
use crate::error::{Error, Result};
use crate::merger::load_category_folder;
use crate::normalize::normalize_checked;
use crate::rules::{CategoryViolation, RuleRegistry};
use crate::scanner::{list_documents, Layout};
use crate::schema::{load_schema, providers_schema, SchemaValidator, SchemaViolation};
use serde_json::Value;
use std::path::Path;

/// Name of the synthetic document built from the provider tables
pub const PROVIDERS_DOCUMENT: &str = "providers";

/// Validation outcome for one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub name: String,
    pub schema_violations: Vec<SchemaViolation>,
    /// Set when the document is not a map of record lists; rules are
    /// skipped for it
    pub shape_error: Option<String>,
    pub rule_violations: Vec<CategoryViolation>,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        self.schema_violations.is_empty()
            && self.shape_error.is_none()
            && self.rule_violations.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.schema_violations.len()
            + usize::from(self.shape_error.is_some())
            + self.rule_violations.len()
    }
}

/// Validation outcome for a whole run
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub documents: Vec<DocumentReport>,
}

impl ValidationReport {
    /// True when no document has any violation
    pub fn is_ok(&self) -> bool {
        self.documents.iter().all(DocumentReport::is_ok)
    }

    /// Documents with at least one violation
    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|report| !report.is_ok())
    }
}

/// Check one document against a schema and the rule registry.
///
/// Both checks always run so every violation is reported. A document
/// whose shape the rules cannot read gets a shape error instead of rule
/// violations.
pub fn validate_document(
    name: &str,
    json: &Value,
    schema: &Value,
    validator: &dyn SchemaValidator,
    rules: &RuleRegistry,
) -> Result<DocumentReport> {
    let schema_violations = validator.validate(json, schema)?;
    let parsed = Document::from_json(json.clone(), Path::new(name));
    let (shape_error, rule_violations) = match parsed {
        Ok(document) => (None, rules.validate_document(&document)),
        Err(Error::InvalidDocument { message, .. }) => {
            tracing::warn!(document = %name, %message, "Skipping rules for malformed document");
            (Some(message), Vec::new())
        }
        Err(e) => return Err(e),
    };

    Ok(DocumentReport {
        name: name.to_string(),
        schema_violations,
        shape_error,
        rule_violations,
    })
}

/// Validate every generated document, then the provider tables against
/// the provider variant of the schema.
pub fn validate_all(layout: &Layout, validator: &dyn SchemaValidator) -> Result<ValidationReport> {
    let schema = load_schema(layout.schema_path())?;
    let rules = RuleRegistry::standard();
    let mut report = ValidationReport::default();

    for (name, path) in list_documents(layout.output_dir())? {
        tracing::info!(document = %name, "Validating");
        let json = read_json(&path)?;
        report
            .documents
            .push(validate_document(&name, &json, &schema, validator, &rules)?);
    }

    let providers = load_category_folder(layout.providers_dir())?;
    let providers = normalize_checked(PROVIDERS_DOCUMENT, providers)?;
    let providers_json = Document::new(providers).to_json();

    tracing::info!(document = PROVIDERS_DOCUMENT, "Validating");
    report.documents.push(validate_document(
        PROVIDERS_DOCUMENT,
        &providers_json,
        &providers_schema(&schema),
        validator,
        &rules,
    )?);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Draft7Validator;
    use serde_json::json;

    #[test]
    fn test_schema_and_rules_both_reported() {
        let schema = json!({
            "type": "object",
            "properties": {"wallets": {"type": "array", "maxItems": 1}}
        });
        let document = json!({
            "wallets": [{"slug": "a"}, {"slug": "a"}],
            "columns": {"wallets": ["slug"]}
        });

        let report = validate_document(
            "mainnet",
            &document,
            &schema,
            &Draft7Validator,
            &RuleRegistry::standard(),
        )
        .unwrap();

        assert!(!report.is_ok());
        assert_eq!(report.schema_violations.len(), 1);
        assert_eq!(report.schema_violations[0].pointer, "#/wallets");
        assert_eq!(report.rule_violations.len(), 1);
        assert_eq!(report.violation_count(), 2);
    }

    #[test]
    fn test_malformed_document_reported_not_fatal() {
        let schema = json!({
            "type": "object",
            "additionalProperties": {"type": "array"}
        });
        let document = json!({"wallets": {"slug": "a"}});

        let report = validate_document(
            "broken",
            &document,
            &schema,
            &Draft7Validator,
            &RuleRegistry::standard(),
        )
        .unwrap();

        assert!(!report.is_ok());
        assert_eq!(report.schema_violations.len(), 1);
        assert_eq!(
            report.shape_error.as_deref(),
            Some("category 'wallets' must be an array")
        );
        assert!(report.rule_violations.is_empty());
        assert_eq!(report.violation_count(), 2);
    }

    #[test]
    fn test_columns_key_is_not_rule_checked() {
        let document = json!({"columns": {"Bad Category": ["Not-Kebab"]}});

        let report = validate_document(
            "mainnet",
            &document,
            &json!({}),
            &Draft7Validator,
            &RuleRegistry::standard(),
        )
        .unwrap();

        assert!(report.is_ok());
    }
}
