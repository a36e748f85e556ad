//! AccessiFix CLI
//!
//! Audits an HTML file with the built-in rule set and prints the findings.

mod output;

use afx_a11y::{ScanOptions, Scanner, ScannerConfig};
use afx_html::HtmlParser;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// In-page accessibility auditor
#[derive(Parser)]
#[command(name = "afx")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an HTML file
    Scan {
        /// HTML file to audit
        file: PathBuf,

        /// Scanner configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run only this rule (repeatable)
        #[arg(long = "rule", value_name = "ID")]
        rules: Vec<String>,

        /// Also examine elements that are not rendered
        #[arg(long)]
        include_hidden: bool,

        /// Apply available fixes, then report what remains
        #[arg(long)]
        fix: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// List the built-in rule ids
    Rules,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scanner = Scanner::with_built_in_rules().context("failed to register built-in rules")?;

    match cli.command {
        Commands::Scan {
            file,
            config,
            rules,
            include_hidden,
            fix,
            format,
        } => {
            let mut options = ScanOptions::new().include_hidden(include_hidden);
            if !rules.is_empty() {
                options = options.with_rules(rules);
            }
            if let Some(path) = config {
                options = options.with_config(load_config(&path)?);
            }
            scan(&scanner, &file, &options, fix, format)
        }
        Commands::Rules => {
            for id in scanner.rule_ids() {
                println!("{id}");
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<ScannerConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ScannerConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn scan(scanner: &Scanner, file: &Path, options: &ScanOptions, fix: bool, format: FormatArg) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let url = document_url(file);
    let mut document = HtmlParser::new().parse_with_url(&html, &url);
    tracing::info!(%url, nodes = document.tree.len(), "document loaded");

    let fixes = if fix {
        let report = scanner.apply_fixes(&mut document, options);
        for failure in &report.failures {
            tracing::warn!(%failure, "fix failed");
        }
        Some(report)
    } else {
        None
    };

    let findings = scanner.scan(&document, options);
    let report = output::Report::new(&document, &findings, fixes.as_ref());

    match format {
        FormatArg::Text => print!("{}", report.to_text()),
        FormatArg::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

/// `file://` URL of the input, so relative frame sources resolve
fn document_url(file: &Path) -> String {
    std::fs::canonicalize(file)
        .ok()
        .and_then(|abs| url::Url::from_file_path(abs).ok())
        .map(String::from)
        .unwrap_or_else(|| "about:blank".to_string())
}
