//! netdata-core: Core library for building per-network data documents
//!
//! This library provides functionality to:
//! - Load CSV files with encoding, character, header and row-shape checks
//! - Normalize raw cells into typed values (null, boolean, JSON, string)
//! - Inherit blank fields from provider records via `!provider:<slug>` references
//! - Aggregate network, provider and offchain tiers into one document per network
//! - Validate documents against a JSON schema and a registry of semantic rules

pub mod build;
pub mod charset;
pub mod document;
pub mod error;
pub mod merger;
pub mod normalize;
pub mod parser;
pub mod provider;
pub mod rules;
pub mod scanner;
pub mod schema;
pub mod validate;
pub mod value;

pub use build::{build_all, BuildReport, BuiltDocument};
pub use document::{ColumnOrder, Document, COLUMNS_KEY};
pub use error::{Error, Result};
pub use merger::{aggregate_category, build_network_document, load_category_folder, merge_offchain};
pub use normalize::{normalize, normalize_checked, normalize_value, NormalizationError};
pub use parser::{column_letter, load_csv, parse_csv_bytes, parse_csv_str, HeaderViolation, RowShapeMismatch};
pub use provider::{apply_override, ProviderRef, ProviderTable, PROVIDER_REF_PREFIX};
pub use rules::{CategoryViolation, Rule, RuleRegistry, RuleViolation};
pub use scanner::{list_category_files, list_documents, scan_networks, CategoryFile, Layout, Network};
pub use schema::{providers_schema, Draft7Validator, SchemaValidator, SchemaViolation};
pub use validate::{validate_all, validate_document, DocumentReport, ValidationReport};
pub use value::{Category, CellValue, Record};
