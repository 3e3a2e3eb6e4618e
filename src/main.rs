use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use loupe::cache::FsStore;
use loupe::config::Config;
use loupe::corpus::{default_tokenizer, DatasetIdentity, ExactDuplicateDetector, JsonlSource};
use loupe::measure;
use loupe::output::terminal;
use loupe::stats::DatasetStatistics;

/// Loupe: descriptive and bias statistics for text datasets.
///
/// Computes vocabulary, length, duplication and nPMI bias statistics over a
/// corpus, memoizing every derived artifact in a per-dataset cache directory.
#[derive(Parser)]
#[command(name = "loupe", version, about)]
struct Cli {
    /// Newline-delimited JSON file, one record per line
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Dataset name for the cache identity (default: input file stem)
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Dataset configuration name
    #[arg(long, global = true, default_value = "default")]
    config_name: String,

    /// Split under analysis
    #[arg(long, global = true, default_value = "train")]
    split: String,

    /// Record field carrying the text
    #[arg(long, global = true, default_value = "text")]
    text_field: String,

    /// Record field carrying the label, if any
    #[arg(long, global = true)]
    label_field: Option<String>,

    /// Recompute everything, ignoring cached artifacts
    #[arg(long, global = true)]
    no_cache: bool,

    /// Do not persist freshly computed artifacts
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the vocabulary with counts and proportions
    Vocab {
        /// How many words to display
        #[arg(long, default_value = "25")]
        top: usize,

        /// Show the closed-class-filtered vocabulary instead
        #[arg(long)]
        open_only: bool,
    },

    /// Show text length statistics
    Lengths,

    /// Show general statistics (totals, missing texts, duplication)
    Stats,

    /// List identity terms available for bias comparison
    Terms,

    /// Compute nPMI bias between two identity terms
    Bias {
        /// First identity term
        term1: String,
        /// Second identity term
        term2: String,
        /// How many words to display from each end of the bias spectrum
        #[arg(long, default_value = "15")]
        top: usize,
    },

    /// Run every measurement and display a full report
    Report,

    /// Show which artifacts are cached for this dataset, without computing
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("loupe=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.no_cache {
        config.use_cache = false;
    }
    if cli.no_save {
        config.save = false;
    }

    let mut dstats = build_stats(&cli, &config)?;

    match cli.command {
        Commands::Vocab { top, open_only } => {
            if open_only {
                let filtered = dstats.filtered_vocab()?.clone();
                terminal::display_vocab(&filtered, top, "Open Vocabulary");
            } else {
                let Some(vocab) = dstats.load_or_prepare_vocab(false)? else {
                    anyhow::bail!("vocabulary preparation returned no result");
                };
                terminal::display_vocab(vocab, top, "Vocabulary");
            }
        }

        Commands::Lengths => {
            let Some(stats) = dstats.load_or_prepare_length_stats(false)? else {
                anyhow::bail!("length statistics preparation returned no result");
            };
            terminal::display_length_stats(stats);
        }

        Commands::Stats => {
            let Some(stats) = dstats.load_or_prepare_general_stats(false)?.cloned() else {
                anyhow::bail!("general statistics preparation returned no result");
            };
            let top = dstats.load_or_prepare_top_vocab(false)?;
            terminal::display_general_stats(&stats, top);
        }

        Commands::Terms => {
            let Some(terms) = dstats.available_terms(false)? else {
                anyhow::bail!("available-terms preparation returned no result");
            };
            terminal::display_available_terms(&terms);
        }

        Commands::Bias { term1, term2, top } => {
            let table = dstats.load_or_prepare_joint_bias(&term1, &term2)?;
            // The artifact is canonically ordered; show the orientation the
            // user asked for.
            if table.subgroup1 == term1 {
                terminal::display_bias(&table, top);
            } else {
                terminal::display_bias(&table.reversed(), top);
            }
        }

        Commands::Report => {
            println!(
                "Measuring {} ({} / {} / {})...",
                dstats.identity().dataset,
                dstats.identity().config,
                dstats.identity().split,
                dstats.identity().text_field,
            );
            let pb = ProgressBar::new(measure::registry().len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  Measuring [{bar:30}] {pos}/{len} {msg}")?,
            );
            for measurement in measure::registry() {
                pb.set_message(measurement.name);
                (measurement.run)(&mut dstats, false)?;
                pb.inc(1);
            }
            pb.finish_and_clear();

            let general = dstats.load_or_prepare_general_stats(false)?.cloned();
            if let Some(stats) = general {
                let top = dstats.load_or_prepare_top_vocab(false)?;
                terminal::display_general_stats(&stats, top);
            }
            if let Some(stats) = dstats.load_or_prepare_length_stats(false)?.cloned() {
                terminal::display_length_stats(&stats);
            }
            let filtered = dstats.filtered_vocab()?.clone();
            terminal::display_vocab(&filtered, 15, "Open Vocabulary");
            if let Some(terms) = dstats.available_terms(false)? {
                terminal::display_available_terms(&terms);
                println!(
                    "{}",
                    "Run `loupe bias <term1> <term2>` to compare two of them.".dimmed()
                );
            }
        }

        Commands::Status => {
            show_status(&mut dstats)?;
        }
    }

    Ok(())
}

/// Wire up the orchestrator: filesystem cache, JSONL source, default
/// tokenizer, exact duplicate detection.
fn build_stats(cli: &Cli, config: &Config) -> Result<DatasetStatistics> {
    let input = cli
        .input
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--input is required (a .jsonl file)"))?;
    let dataset = match &cli.dataset {
        Some(name) => name.clone(),
        None => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string()),
    };
    let identity = DatasetIdentity::new(&dataset, &cli.config_name, &cli.split, &cli.text_field);
    info!(
        cache_dir = %config.cache_root.join(identity.dir_name()).display(),
        "Using cache directory"
    );

    let source = JsonlSource::new(&input, &cli.text_field, cli.label_field.as_deref());
    Ok(DatasetStatistics::new(
        identity,
        config,
        Box::new(FsStore::new(&config.cache_root)),
        Box::new(source),
        default_tokenizer(),
        Box::new(ExactDuplicateDetector),
    ))
}

/// Load-only pass over the registry: report what is cached, compute nothing.
fn show_status(dstats: &mut DatasetStatistics) -> Result<()> {
    println!(
        "\n{}",
        format!("=== Cache Status: {} ===", dstats.identity().dir_name()).bold()
    );
    println!();

    let artifacts = [
        "tokenized.csv",
        "vocab_counts.csv",
        "length_stats.json",
        "general_stats.json",
        "sorted_top_vocab.csv",
        "npmi_terms.json",
    ];
    for name in artifacts {
        print_artifact_status(dstats, name);
    }

    // Per-subgroup and per-pair artifacts, enumerated from the cached terms
    // record; pair files are only listed when they exist.
    if let Some(mut terms) = dstats.available_terms(true)? {
        for term in &terms {
            for suffix in ["cooc", "pmi", "npmi"] {
                print_artifact_status(dstats, &format!("npmi/{term}_{suffix}.csv"));
            }
        }
        terms.sort_unstable();
        for (i, first) in terms.iter().enumerate() {
            for second in &terms[i + 1..] {
                let name = format!("npmi/{first}-{second}_bias.csv");
                let key = loupe::cache::ArtifactKey::new(dstats.identity(), &name);
                if dstats.cache().exists(&key) {
                    print_artifact_status(dstats, &name);
                }
            }
        }
    }
    println!();

    for measurement in measure::registry() {
        match (measurement.run)(dstats, true)? {
            Some(value) => println!("  {:<12} {}", measurement.name.bold(), value),
            None => println!(
                "  {:<12} {}",
                measurement.name.bold(),
                "absent (not yet computed)".dimmed()
            ),
        }
    }
    println!();
    Ok(())
}

fn print_artifact_status(dstats: &DatasetStatistics, name: &str) {
    let key = loupe::cache::ArtifactKey::new(dstats.identity(), name);
    match dstats.cache().modified(&key) {
        Some(time) => {
            let when: DateTime<Local> = time.into();
            println!(
                "  {} {:<24} {}",
                "+".green(),
                name,
                when.format("%Y-%m-%d %H:%M").to_string().dimmed()
            );
        }
        None => println!("  {} {:<24} {}", "-".red(), name, "not cached".dimmed()),
    }
}
