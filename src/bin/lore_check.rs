//! Loreweave CLI
//!
//! Loads a vault and reports parse issues and validation results, or
//! exports the merged entity graph as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loreweave::validate::{MessageSeverity, ValidationState};
use loreweave::{VaultConfig, VaultLoadResult, VaultLoader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lore-check")]
#[command(about = "Check and export schema-validated lore vaults")]
struct Cli {
    /// Vault root directory (overrides config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the vault and print issues and the validation summary
    Check,

    /// Export the merged entity graph as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = VaultConfig::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.vault.root = root;
    }

    let loader = VaultLoader::new(config);
    let result = loader.load()?;

    match cli.command {
        Commands::Check => check(&result),
        Commands::Export { output } => export(&result, output),
    }
}

fn check(result: &VaultLoadResult) -> anyhow::Result<()> {
    for issue in &result.issues {
        println!("❌ {}", issue);
    }
    for warning in &result.warnings {
        println!("⚠️  {}", warning);
    }
    for (path, blocks) in &result.orphans {
        println!(
            "⚠️  {}: {} block(s) before the first heading",
            path.display(),
            blocks.len()
        );
    }

    let mut failed = 0usize;
    let mut warned = 0usize;
    for node in &result.nodes {
        match result.report.state_of(node.uuid) {
            ValidationState::Failed | ValidationState::ChildFailed => {
                failed += 1;
                println!("❌ {} ({})", node.name, node.type_name);
            }
            ValidationState::Warning | ValidationState::ChildWarning => {
                warned += 1;
                println!("⚠️  {} ({})", node.name, node.type_name);
            }
            _ => {}
        }
        for message in result.report.messages_of(node.uuid) {
            let icon = match message.severity {
                MessageSeverity::Failed => "❌",
                MessageSeverity::Warning => "⚠️ ",
            };
            println!("   {} {}", icon, message.text);
        }
    }

    println!();
    println!(
        "{} node(s), {} collection(s), {} failing, {} warned, bundle {}",
        result.nodes.len(),
        result.collections.len(),
        failed,
        warned,
        &result.bundle_hash[..12]
    );
    if !result.issues.is_empty() || result.report.has_failures() {
        println!(
            "❌ {} parse issue(s), {} failed entit(ies)",
            result.issues.len(),
            result.report.failed_count()
        );
        std::process::exit(1);
    }
    if warned > 0 || !result.warnings.is_empty() {
        println!("⚠️  passed with warnings");
    } else {
        println!("✅ all entities passed");
    }
    Ok(())
}

fn export(result: &VaultLoadResult, output: Option<PathBuf>) -> anyhow::Result<()> {
    let graph = serde_json::json!({
        "bundle_hash": result.bundle_hash,
        "nodes": result.nodes,
        "collections": result.collections,
        "issues": result.issues,
        "report": result.report,
    });
    let json = serde_json::to_string_pretty(&graph)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json)?;
            println!("✅ Graph written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
