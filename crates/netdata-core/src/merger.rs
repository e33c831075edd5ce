//! Category aggregation across the network, provider and offchain tiers

use crate::document::Document;
use crate::error::Result;
use crate::normalize::normalize_checked;
use crate::parser::load_csv;
use crate::provider::{apply_override, ProviderTable};
use crate::scanner::{list_category_files, Layout, Network};
use crate::value::Category;
use std::path::Path;

/// Build one category from its network CSV and the matching provider CSV.
///
/// Returns `Ok(None)` when the network CSV does not exist. Without a
/// provider CSV the network records are used as-is.
pub fn aggregate_category(
    name: &str,
    network_csv: &Path,
    provider_csv: &Path,
) -> Result<Option<Category>> {
    let Some(network_records) = load_csv(network_csv)? else {
        tracing::info!(
            path = %network_csv.display(),
            category = name,
            "No network data, skipping category"
        );
        return Ok(None);
    };

    let records = match load_csv(provider_csv)? {
        Some(provider_records) => {
            let table = ProviderTable::new(&provider_records);
            network_records
                .into_iter()
                .map(|item| apply_override(item, &table))
                .collect()
        }
        None => {
            tracing::info!(
                path = %provider_csv.display(),
                category = name,
                "No provider data, using network data as-is"
            );
            network_records
        }
    };

    Ok(Some(Category::new(name, records)))
}

/// Append offchain records to same-named categories, or add new categories
pub fn merge_offchain(categories: &mut Vec<Category>, offchain: &[Category]) {
    for extra in offchain {
        match categories.iter_mut().find(|c| c.name == extra.name) {
            Some(existing) => existing.records.extend(extra.records.iter().cloned()),
            None => categories.push(extra.clone()),
        }
    }
}

/// Load every CSV in a tier directory as an unnormalized category
pub fn load_category_folder<P: AsRef<Path>>(dir: P) -> Result<Vec<Category>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "Directory not found");
        return Ok(Vec::new());
    }

    let mut categories = Vec::new();
    for file in list_category_files(dir)? {
        if let Some(records) = load_csv(&file.path)? {
            categories.push(Category::new(file.name, records));
        }
    }
    Ok(categories)
}

/// Assemble the full document for one network.
///
/// `offchain` must already be normalized. Normalization errors in the
/// merged result are fatal.
pub fn build_network_document(
    layout: &Layout,
    network: &Network,
    offchain: &[Category],
) -> Result<Document> {
    let mut categories = Vec::new();
    for file in list_category_files(&network.path)? {
        let provider_csv = layout.provider_file(&file.name);
        if let Some(category) = aggregate_category(&file.name, &file.path, &provider_csv)? {
            categories.push(category);
        }
    }

    merge_offchain(&mut categories, offchain);

    let categories = normalize_checked(&network.name, categories)?;
    let mut document = Document::new(categories);
    document.attach_column_order();
    Ok(document)
}
