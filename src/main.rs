//! Answer Balance CLI
//!
//! Analyze, rebalance and verify correct-answer positions in question banks.

use anyhow::{Context, Result};
use answer_balance::{
    analyze_banks, compare_question, render_comparison, AnalysisReport, BalanceConfig,
    BalanceReport, BalanceRunner, RunMode, VerificationReport, VerifyRunner,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "answer-balance")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bank files to process (glob pattern, overrides the configured list)
    #[arg(long, global = true)]
    banks: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the correct-answer distribution of each bank
    Analyze {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Shuffle choices so correct answers spread evenly across positions
    Balance {
        /// Write backups and shuffled banks (default is a dry run)
        #[arg(long)]
        apply: bool,

        /// Shuffle seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Spot-check shuffled banks against their backups
    Verify {
        /// Fraction of each bank to check (overrides config)
        #[arg(long)]
        sample_fraction: Option<f64>,

        /// Sampling seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare one question with its backed-up original
    Show {
        /// Bank file
        #[arg(long)]
        bank: PathBuf,

        /// Zero-based question position
        #[arg(long)]
        index: usize,
    },
}

fn load_config(cli: &Cli) -> Result<BalanceConfig> {
    let mut config = match &cli.config {
        Some(path) => BalanceConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BalanceConfig::default(),
    };
    if let Some(pattern) = &cli.banks {
        config = config
            .with_bank_glob(pattern)
            .with_context(|| format!("Failed to discover banks matching {pattern}"))?;
    }
    Ok(config)
}

fn validated(config: BalanceConfig) -> Result<BalanceConfig> {
    config
        .validate()
        .context("No usable configuration (pass --config or --banks)")?;
    Ok(config)
}

fn print_report(
    format: OutputFormat,
    text: impl FnOnce() -> String,
    markdown: impl FnOnce() -> String,
    json: impl FnOnce() -> Result<String, serde_json::Error>,
) -> Result<()> {
    let output = match format {
        OutputFormat::Text => text(),
        OutputFormat::Markdown => markdown(),
        OutputFormat::Json => json().context("Failed to serialize report")?,
    };
    println!("{output}");
    Ok(())
}

/// Run the selected command; `Ok(false)` means the run found failures
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Analyze { format } => {
            let config = validated(load_config(cli)?)?;
            tracing::info!(banks = config.banks.len(), "Analyzing banks");

            let report = AnalysisReport::new(analyze_banks(&config.banks));
            print_report(*format, || report.to_text(), || report.to_markdown(), || report.to_json())?;
            Ok(true)
        }
        Commands::Balance { apply, seed, format } => {
            let mut config = load_config(cli)?;
            if let Some(seed) = seed {
                config.seed = *seed;
            }
            let config = validated(config)?;
            let mode = if *apply { RunMode::Apply } else { RunMode::DryRun };
            tracing::info!(banks = config.banks.len(), seed = config.seed, apply = *apply, "Starting balance run");

            let summary = BalanceRunner::from_config(&config, mode).run(&config.banks);
            let clean = summary.is_clean();
            let report = BalanceReport::new(summary, config.verification.max_reported_failures);
            print_report(*format, || report.to_text(), || report.to_markdown(), || report.to_json())?;
            Ok(clean)
        }
        Commands::Verify {
            sample_fraction,
            seed,
            format,
        } => {
            let mut config = load_config(cli)?;
            if let Some(fraction) = sample_fraction {
                config.verification.sample_fraction = *fraction;
            }
            if let Some(seed) = seed {
                config.verification.seed = *seed;
            }
            let config = validated(config)?;
            tracing::info!(
                banks = config.banks.len(),
                sample_fraction = config.verification.sample_fraction,
                "Starting verification"
            );

            let summary = VerifyRunner::new(config.verification.clone()).run(&config.banks);
            let report = VerificationReport::new(summary, config.verification.max_reported_failures);
            print_report(*format, || report.to_text(), || report.to_markdown(), || report.to_json())?;
            Ok(report.passed)
        }
        Commands::Show { bank, index } => {
            let comparison = compare_question(bank, *index)
                .with_context(|| format!("Failed to compare question {index} in {}", bank.display()))?;
            println!("{}", render_comparison(&comparison));
            Ok(comparison.result.passed)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
