//! Input layout and directory discovery for category CSV files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory conventions for a data repository.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Repository root
    pub root: PathBuf,
    /// Per-network CSV directories (`<networks>/<network>/<category>.csv`)
    pub networks: PathBuf,
    /// Provider CSVs (`<providers>/<category>.csv`)
    pub providers: PathBuf,
    /// Offchain CSVs merged into every network (`<offchain>/<category>.csv`)
    pub offchain: PathBuf,
    /// Generated documents (`<output>/<network>.json`)
    pub output: PathBuf,
    /// JSON schema for network documents
    pub schema: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            networks: PathBuf::from("networks"),
            providers: PathBuf::from("providers"),
            offchain: PathBuf::from("offchain"),
            output: PathBuf::from("json"),
            schema: PathBuf::from("schema.json"),
        }
    }
}

impl Layout {
    /// Default layout rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load a layout from JSON; missing keys use the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the layout to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn networks_dir(&self) -> PathBuf {
        self.resolve(&self.networks)
    }

    pub fn providers_dir(&self) -> PathBuf {
        self.resolve(&self.providers)
    }

    pub fn offchain_dir(&self) -> PathBuf {
        self.resolve(&self.offchain)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.resolve(&self.schema)
    }

    /// Provider CSV for a category
    pub fn provider_file(&self, category: &str) -> PathBuf {
        self.providers_dir().join(format!("{}.csv", category))
    }

    /// Output document for a network
    pub fn output_file(&self, network: &str) -> PathBuf {
        self.output_dir().join(format!("{}.json", network))
    }
}

/// A category CSV file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFile {
    /// Category name (file name without `.csv`)
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
}

/// A network directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub path: PathBuf,
}

/// List the `.csv` files directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_category_files<P: AsRef<Path>>(dir: P) -> Result<Vec<CategoryFile>> {
    let files = list_entries(dir.as_ref(), "csv")?
        .into_iter()
        .map(|(name, path)| CategoryFile { name, path })
        .collect();
    Ok(files)
}

/// List the sub-directories of the networks directory, sorted by name
pub fn scan_networks<P: AsRef<Path>>(dir: P) -> Result<Vec<Network>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut networks = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            networks.push(Network {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
            });
        }
    }

    networks.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(networks)
}

/// List the generated `.json` documents in `dir` as `(name, path)`, sorted
pub fn list_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<(String, PathBuf)>> {
    list_entries(dir.as_ref(), "json")
}

fn list_entries(dir: &Path, extension: &str) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), path.to_path_buf()));
            }
        }
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::with_root("/data");

        assert_eq!(layout.networks_dir(), PathBuf::from("/data/networks"));
        assert_eq!(
            layout.provider_file("wallets"),
            PathBuf::from("/data/providers/wallets.csv")
        );
        assert_eq!(
            layout.output_file("mainnet"),
            PathBuf::from("/data/json/mainnet.json")
        );
        assert_eq!(layout.schema_path(), PathBuf::from("/data/schema.json"));
    }

    #[test]
    fn test_layout_partial_config_uses_defaults() {
        let layout: Layout = serde_json::from_str(r#"{"output": "build"}"#).unwrap();

        assert_eq!(layout.output, PathBuf::from("build"));
        assert_eq!(layout.networks, PathBuf::from("networks"));
        assert_eq!(layout.root, PathBuf::from("."));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        assert!(list_category_files("no/such/dir").unwrap().is_empty());
        assert!(scan_networks("no/such/dir").unwrap().is_empty());
    }

    #[test]
    fn test_list_category_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("wallets.csv"), "slug\n").unwrap();
        fs::write(dir.path().join("apis.csv"), "slug\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = list_category_files(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["apis", "wallets"]);
    }

    #[test]
    fn test_scan_networks_only_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("testnet")).unwrap();
        fs::create_dir(dir.path().join("mainnet")).unwrap();
        fs::write(dir.path().join("README.md"), "x").unwrap();

        let networks = scan_networks(dir.path()).unwrap();
        let names: Vec<&str> = networks.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["mainnet", "testnet"]);
    }
}
