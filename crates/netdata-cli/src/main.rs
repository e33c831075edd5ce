//! netdata CLI
//!
//! Command-line tool for building per-network JSON documents from tiered
//! CSV sources and validating them.

use clap::{ArgAction, Parser, Subcommand};
use netdata_core::{build_all, load_csv, validate_all, Draft7Validator, Layout};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netdata")]
#[command(about = "Build and validate per-network data documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository root containing networks/, providers/ and offchain/
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Layout config file (JSON); overrides the default directory names
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build json/<network>.json for every network
    Build,

    /// Validate generated documents and provider tables
    Validate {
        /// Schema file; defaults to the layout's schema path
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Load and check a single CSV file
    Parse {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of records to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Write a layout config file with the default directory names
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,netdata_core={level},netdata_cli={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when validation found violations
fn run(cli: Cli) -> netdata_core::Result<bool> {
    let layout = load_layout(cli.root.as_deref(), cli.config.as_deref())?;
    tracing::debug!(?layout, "Resolved layout");

    match cli.command {
        Commands::Build => cmd_build(&layout).map(|_| true),
        Commands::Validate { schema } => cmd_validate(layout, schema),
        Commands::Parse { file, limit } => cmd_parse(&file, limit).map(|_| true),
        Commands::InitConfig { output } => cmd_init_config(&output).map(|_| true),
    }
}

fn load_layout(root: Option<&Path>, config: Option<&Path>) -> netdata_core::Result<Layout> {
    let mut layout = match config {
        Some(path) => Layout::load(path)?,
        None => Layout::default(),
    };
    if let Some(root) = root {
        layout.root = root.to_path_buf();
    }
    Ok(layout)
}

fn cmd_build(layout: &Layout) -> netdata_core::Result<()> {
    let report = build_all(layout)?;

    println!(
        "Built {} network document(s) ({} offchain categories merged):",
        report.documents.len(),
        report.offchain_categories
    );
    for doc in &report.documents {
        println!(
            "  {} -> {} ({} categories)",
            doc.network,
            doc.path.display(),
            doc.categories
        );
    }

    Ok(())
}

fn cmd_validate(mut layout: Layout, schema: Option<PathBuf>) -> netdata_core::Result<bool> {
    if let Some(schema) = schema {
        layout.schema = schema;
    }

    let report = validate_all(&layout, &Draft7Validator)?;

    for doc in &report.documents {
        println!("Validating {}...", doc.name);
        for violation in &doc.schema_violations {
            println!("{}", violation);
            println!("---");
        }
        if let Some(message) = &doc.shape_error {
            println!("Error reading {}: {}", doc.name, message);
            println!("---");
        }
        for violation in &doc.rule_violations {
            println!("{}", violation);
            println!("---");
        }
    }

    let failed: Vec<&str> = report.failures().map(|doc| doc.name.as_str()).collect();
    if failed.is_empty() {
        println!("All {} document(s) valid", report.documents.len());
        Ok(true)
    } else {
        println!("Validation failed for: {}", failed.join(", "));
        Ok(false)
    }
}

fn cmd_parse(file: &Path, limit: usize) -> netdata_core::Result<()> {
    let Some(records) = load_csv(file)? else {
        println!("File not found: {}", file.display());
        return Ok(());
    };

    println!("File: {}", file.display());
    println!("Records: {}", records.len());
    println!();

    if let Some(first) = records.first() {
        let header: Vec<&str> = first.keys().collect();
        println!("{}", header.join("\t"));
        println!("{}", "-".repeat(header.len() * 12));
    }

    for record in records.iter().take(limit) {
        let values: Vec<String> = record.iter().map(|(_, v)| v.to_string()).collect();
        println!("{}", values.join("\t"));
    }

    if records.len() > limit {
        println!("... ({} more records)", records.len() - limit);
    }

    Ok(())
}

fn cmd_init_config(output: &Path) -> netdata_core::Result<()> {
    Layout::default().save(output)?;
    println!("Created layout config: {}", output.display());
    println!();
    println!("Edit the file to change directory names, then run:");
    println!("  netdata --config {} build", output.display());

    Ok(())
}
