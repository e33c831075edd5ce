//! Semantic rules evaluated over each category's records

use crate::document::{Document, COLUMNS_KEY};
use crate::provider::PROVIDER_FIELD;
use crate::value::{CellValue, Record};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Field holding a list of markdown links
pub const ACTION_BUTTONS_FIELD: &str = "actionButtons";

static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("kebab pattern is valid"));

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<text>.*?)\]\((?P<link>.*?)\)").expect("link pattern is valid")
});

/// A rule violation for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Name of the rule that fired
    pub rule: &'static str,
    /// 0-based position of the record in its category
    pub item: usize,
    pub message: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item {}: {}", self.item, self.message)
    }
}

/// A rule violation attributed to a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryViolation {
    pub category: String,
    pub violation: RuleViolation,
}

impl fmt::Display for CategoryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error validating {}: {}", self.category, self.violation)
    }
}

/// A semantic rule over a category's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Second and later uses of a slug are flagged
    SlugUnique,
    /// Slugs must be lowercase alphanumeric segments joined by single hyphens
    SlugKebabCase,
    /// One literal spelling per case-insensitive value of `field`
    CasingConsistent { field: String },
    /// `actionButtons` must be a list of markdown links
    ActionButtonLinks,
    /// Best-effort delimiter parity check over every string field
    UnclosedMarkdown,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::SlugUnique => "slug-unique",
            Rule::SlugKebabCase => "slug-kebab-case",
            Rule::CasingConsistent { .. } => "casing-consistent",
            Rule::ActionButtonLinks => "action-button-links",
            Rule::UnclosedMarkdown => "unclosed-markdown",
        }
    }

    /// Evaluate the rule over a category's records
    pub fn evaluate(&self, records: &[Record]) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let mut report = |item: usize, message: String| {
            violations.push(RuleViolation {
                rule: self.name(),
                item,
                message,
            })
        };

        match self {
            Rule::SlugUnique => {
                // keyed by JSON text so 1 and "1" stay distinct; missing
                // and null slugs share the `None` key
                let mut seen: HashSet<Option<String>> = HashSet::new();
                for (idx, record) in records.iter().enumerate() {
                    let slug = record.get("slug").filter(|value| !value.is_null());
                    if !seen.insert(slug.map(|value| value.to_json().to_string())) {
                        report(idx, format!("Duplicate slug '{}'", display_field(slug)));
                    }
                }
            }
            Rule::SlugKebabCase => {
                for (idx, record) in records.iter().enumerate() {
                    let valid = record.slug().is_some_and(is_kebab_case);
                    if !valid {
                        let slug = display_field(record.get("slug"));
                        report(idx, format!("slug '{}' must be kebab-case", slug));
                    }
                }
            }
            Rule::CasingConsistent { field } => {
                // normalized spelling -> literal spellings in first-seen order
                let mut seen: HashMap<String, Vec<String>> = HashMap::new();
                for (idx, record) in records.iter().enumerate() {
                    let Some(value) = record.get(field).and_then(CellValue::as_str) else {
                        continue;
                    };
                    let spellings = seen.entry(value.trim().to_lowercase()).or_default();
                    let others: Vec<String> = spellings
                        .iter()
                        .filter(|s| s.as_str() != value)
                        .map(|s| format!("'{}'", s))
                        .collect();
                    if !others.is_empty() {
                        report(
                            idx,
                            format!(
                                "Inconsistent casing for {} '{}': got {} and '{}'",
                                field,
                                value,
                                others.join(", "),
                                value
                            ),
                        );
                    }
                    if !spellings.iter().any(|s| s == value) {
                        spellings.push(value.to_string());
                    }
                }
            }
            Rule::ActionButtonLinks => {
                for (idx, record) in records.iter().enumerate() {
                    let buttons = match record.get(ACTION_BUTTONS_FIELD) {
                        None | Some(CellValue::Null) => continue,
                        Some(CellValue::List(buttons)) => buttons,
                        Some(_) => {
                            report(idx, "action_buttons must be a list".to_string());
                            continue;
                        }
                    };
                    for (button_idx, button) in buttons.iter().enumerate() {
                        if !button.as_str().is_some_and(is_markdown_link) {
                            report(
                                idx,
                                format!("action_button[{}] must be a markdown link", button_idx),
                            );
                        }
                    }
                }
            }
            Rule::UnclosedMarkdown => {
                for (idx, record) in records.iter().enumerate() {
                    for (field, value) in record.iter() {
                        if value.as_str().is_some_and(has_unclosed_markdown) {
                            report(idx, format!("Markdown unclosed in field '{}'", field));
                        }
                    }
                }
            }
        }

        violations
    }
}

/// Ordered collection of rules
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules every document is checked against
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(Rule::SlugUnique);
        registry.add(Rule::UnclosedMarkdown);
        registry.add(Rule::ActionButtonLinks);
        registry.add(Rule::CasingConsistent {
            field: PROVIDER_FIELD.to_string(),
        });
        registry.add(Rule::SlugKebabCase);
        registry
    }

    /// Append a rule
    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Run every rule over one category, in registration order
    pub fn validate(&self, records: &[Record]) -> Vec<RuleViolation> {
        self.rules
            .iter()
            .flat_map(|rule| rule.evaluate(records))
            .collect()
    }

    /// Run every rule over each data category of a document
    pub fn validate_document(&self, document: &Document) -> Vec<CategoryViolation> {
        document
            .categories
            .iter()
            .filter(|category| category.name != COLUMNS_KEY)
            .flat_map(|category| {
                self.validate(&category.records)
                    .into_iter()
                    .map(|violation| CategoryViolation {
                        category: category.name.clone(),
                        violation,
                    })
            })
            .collect()
    }
}

/// Lowercase alphanumeric segments separated by single hyphens
pub fn is_kebab_case(s: &str) -> bool {
    KEBAB_CASE.is_match(s)
}

/// `[text](url)` at the start of the string
pub fn is_markdown_link(s: &str) -> bool {
    !s.is_empty() && MARKDOWN_LINK.is_match(s)
}

/// Delimiter parity heuristic; not a markdown parser
pub fn has_unclosed_markdown(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let bold = s.matches("**").count();
    if bold % 2 != 0 {
        return true;
    }
    if s.matches('*').count() % 2 != 0 && bold == 0 {
        return true;
    }
    if s.matches('_').count() % 2 != 0 || s.matches('`').count() % 2 != 0 {
        return true;
    }

    s.matches('[').count() != s.matches(']').count()
        || s.matches('(').count() != s.matches(')').count()
}

fn display_field(value: Option<&CellValue>) -> String {
    match value {
        Some(CellValue::String(s)) | Some(CellValue::Raw(s)) => s.clone(),
        Some(CellValue::Null) | None => "None".to_string(),
        Some(other) => other.to_string(),
    }
}
