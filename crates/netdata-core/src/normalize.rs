//! Value normalization: raw CSV strings to typed values

use crate::error::{Error, Result};
use crate::value::{Category, CellValue};
use serde_json::Value;
use std::fmt;

/// A cell that looked like JSON but failed to parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationError {
    pub category: String,
    /// 0-based position of the record in its category
    pub item: usize,
    pub field: String,
    pub value: String,
    pub message: String,
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to parse value '{}' for key '{}' in category '{}' (item {}) as JSON: {}",
            self.value, self.field, self.category, self.item, self.message
        )
    }
}

/// Normalize one raw string.
///
/// Null-ish strings become `Null`, boolean-ish strings become `Bool`,
/// bracketed or braced strings are parsed as JSON and anything else is
/// kept as a trimmed string.
pub fn normalize_value(raw: &str) -> std::result::Result<CellValue, serde_json::Error> {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(CellValue::Null);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(CellValue::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(CellValue::Bool(false));
    }

    if looks_like_json(trimmed) {
        let parsed: Value = serde_json::from_str(trimmed)?;
        return Ok(CellValue::from(parsed));
    }

    Ok(CellValue::String(trimmed.to_string()))
}

fn looks_like_json(s: &str) -> bool {
    (s.starts_with('[') && s.ends_with(']')) || (s.starts_with('{') && s.ends_with('}'))
}

/// Normalize every string value of every category.
///
/// Never fails: values that cannot be parsed keep their raw text and are
/// reported in the returned error list.
pub fn normalize(categories: Vec<Category>) -> (Vec<Category>, Vec<NormalizationError>) {
    let mut errors = Vec::new();

    let categories = categories
        .into_iter()
        .map(|mut category| {
            for (item_idx, record) in category.records.iter_mut().enumerate() {
                for (field, value) in record.iter_mut() {
                    let raw = match value {
                        CellValue::Raw(s) | CellValue::String(s) => std::mem::take(s),
                        _ => continue,
                    };

                    *value = match normalize_value(&raw) {
                        Ok(normalized) => normalized,
                        Err(e) => {
                            errors.push(NormalizationError {
                                category: category.name.clone(),
                                item: item_idx,
                                field: field.to_string(),
                                value: raw.clone(),
                                message: e.to_string(),
                            });
                            CellValue::String(raw)
                        }
                    };
                }
            }
            category
        })
        .collect();

    (categories, errors)
}

/// Normalize and turn any collected errors into one fatal error
pub fn normalize_checked(source_name: &str, categories: Vec<Category>) -> Result<Vec<Category>> {
    let (categories, errors) = normalize(categories);
    if !errors.is_empty() {
        return Err(Error::Normalization {
            source_name: source_name.to_string(),
            errors,
        });
    }
    Ok(categories)
}
