//! Provider references and field inheritance from provider records

use crate::value::{CellValue, Record};
use std::collections::HashMap;

/// Prefix marking a provider cell as a reference to a provider record
pub const PROVIDER_REF_PREFIX: &str = "!provider:";

/// Field holding the provider name or reference
pub const PROVIDER_FIELD: &str = "provider";

/// Field never inherited from a provider
const SLUG_FIELD: &str = "slug";

/// A `!provider:<slug>` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub slug: String,
}

impl ProviderRef {
    /// Parse a cell value; only strings carrying the prefix are references
    pub fn parse(value: &CellValue) -> Option<Self> {
        let rest = value.as_str()?.trim().strip_prefix(PROVIDER_REF_PREFIX)?;
        Some(Self {
            slug: rest.trim().to_string(),
        })
    }
}

/// Provider records indexed by slug
#[derive(Debug, Clone, Default)]
pub struct ProviderTable<'a> {
    by_slug: HashMap<&'a str, &'a Record>,
}

impl<'a> ProviderTable<'a> {
    /// Index provider records; the first record wins on a repeated slug
    pub fn new(records: &'a [Record]) -> Self {
        let mut by_slug = HashMap::new();
        for record in records {
            if let Some(slug) = record.slug() {
                by_slug.entry(slug).or_insert(record);
            }
        }
        Self { by_slug }
    }

    /// Find a provider record by slug
    pub fn find(&self, slug: &str) -> Option<&'a Record> {
        self.by_slug.get(slug).copied()
    }

    /// Get the number of indexed providers
    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

/// Fill an item's blank fields from the provider it references.
///
/// `slug` is never copied, `provider` is always replaced by the
/// provider's own value, and other fields are copied only when the item's
/// value is blank and the provider has the field.
pub fn apply_override(mut item: Record, providers: &ProviderTable<'_>) -> Record {
    let Some(reference) = item.get(PROVIDER_FIELD).and_then(ProviderRef::parse) else {
        return item;
    };

    let Some(provider) = providers.find(&reference.slug) else {
        tracing::warn!(slug = %reference.slug, "Failed to find provider with slug");
        return item;
    };

    for (field, value) in item.iter_mut() {
        if field == SLUG_FIELD {
            continue;
        }
        if field != PROVIDER_FIELD && !value.is_blank() {
            continue;
        }
        if let Some(inherited) = provider.get(field) {
            *value = inherited.clone();
        }
    }

    item
}
