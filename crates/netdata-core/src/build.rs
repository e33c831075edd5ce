//! Build every network document from the CSV tiers

use crate::error::Result;
use crate::merger::{build_network_document, load_category_folder};
use crate::normalize::normalize_checked;
use crate::scanner::{scan_networks, Layout};
use std::fs;
use std::path::PathBuf;

/// One generated document
#[derive(Debug, Clone)]
pub struct BuiltDocument {
    pub network: String,
    pub path: PathBuf,
    pub categories: usize,
}

/// Summary of a build run
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub documents: Vec<BuiltDocument>,
    /// Number of offchain categories merged into each network
    pub offchain_categories: usize,
}

/// Build `<output>/<network>.json` for every network directory.
///
/// Offchain data is loaded and normalized once up front. Any structural
/// CSV failure or normalization error aborts the run.
pub fn build_all(layout: &Layout) -> Result<BuildReport> {
    let networks_dir = layout.networks_dir();
    if !networks_dir.is_dir() {
        tracing::warn!(path = %networks_dir.display(), "No networks directory found");
        return Ok(BuildReport::default());
    }

    let offchain = load_category_folder(layout.offchain_dir())?;
    let offchain = normalize_checked("offchain", offchain)?;

    let output_dir = layout.output_dir();
    fs::create_dir_all(&output_dir)?;

    let mut report = BuildReport {
        documents: Vec::new(),
        offchain_categories: offchain.len(),
    };

    for network in scan_networks(&networks_dir)? {
        let document = build_network_document(layout, &network, &offchain)?;
        let path = layout.output_file(&network.name);
        document.write_pretty(&path)?;

        tracing::info!(
            network = %network.name,
            categories = document.categories.len(),
            path = %path.display(),
            "Wrote network document"
        );

        report.documents.push(BuiltDocument {
            network: network.name,
            path,
            categories: document.categories.len(),
        });
    }

    Ok(report)
}
