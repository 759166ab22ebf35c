use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use setlist_catalog::config::{load_config, Config};
use setlist_catalog::models::{DiffResult, WarningKind};
use setlist_catalog::pipeline::{self, PersistOutcome, RunOptions, RunPaths, RunReport};
use setlist_catalog::progress::{format_duration, log_writer, set_log_only};
use setlist_catalog::similarity::SimilarityMetric;
use setlist_catalog::sort_key::{SortKeyOverrides, TransliterationSortKeys};

#[derive(Parser)]
#[command(name = "setlist-catalog")]
#[command(about = "Build the deduplicated song catalog from live session timestamps")]
struct Args {
    /// Session log (ID, Date, Title, URL)
    #[arg(long)]
    sessions: PathBuf,

    /// Timing log (ID, LIVE_ID, Timestamp, Title, Artist)
    #[arg(long)]
    timings: PathBuf,

    /// Published catalog: read as the diff baseline, then rewritten
    #[arg(long)]
    catalog: PathBuf,

    /// Artist sort reading overrides (Artist, Sort Reading)
    #[arg(long)]
    sort_keys: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Similarity threshold in [0, 1]
    #[arg(long)]
    threshold: Option<f64>,

    /// Similarity metric (levenshtein, jaro-winkler, sorensen-dice, token-jaccard)
    #[arg(long)]
    metric: Option<SimilarityMetric>,

    /// Skip the similarity scan
    #[arg(long)]
    no_similarity: bool,

    /// Report the diff without writing the catalog
    #[arg(long)]
    dry_run: bool,

    /// Write run stats as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Hide spinners for tail-friendly output
    #[arg(long)]
    log_only: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "setlist_catalog=debug"
    } else {
        "setlist_catalog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(log_writer))
        .init();
}

/// File config with command-line overrides applied.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(threshold) = args.threshold {
        config.similarity.threshold = threshold;
    }
    if let Some(metric) = args.metric {
        config.similarity.metric = metric;
    }
    if args.no_similarity {
        config.similarity.enabled = false;
    }
    if args.dry_run {
        config.output.dry_run = true;
    }
    config.validate()?;
    Ok(config)
}

fn print_diff(diff: &DiffResult) {
    for e in &diff.added {
        println!("+ {} / {}  {}", e.performer, e.title, e.latest_url);
    }
    for e in &diff.removed {
        println!("- {} / {}", e.performer, e.title);
    }
    for (old, new) in &diff.updated {
        println!("~ {} / {}", new.performer, new.title);
        if old.latest_url != new.latest_url {
            println!("    url: {} -> {}", old.latest_url, new.latest_url);
        }
        if old.sort_key != new.sort_key {
            println!("    sort key: {} -> {}", old.sort_key, new.sort_key);
        }
    }
}

fn print_report(report: &RunReport) {
    let r = &report.reconciliation;

    if !r.similarity_warnings.is_empty() {
        println!("\nSimilar names (review for typos):");
        for w in &r.similarity_warnings {
            match (&w.kind, &w.scope) {
                (WarningKind::Title, Some(performer)) => println!(
                    "  [title] {}: '{}' / '{}' ({:.2})",
                    performer, w.item_a, w.item_b, w.score
                ),
                _ => println!("  [performer] '{}' / '{}' ({:.2})", w.item_a, w.item_b, w.score),
            }
        }
    }

    println!("\nChanges against published catalog:");
    if report.diff.is_empty() {
        println!("  (none)");
    } else {
        print_diff(&report.diff);
    }

    println!("\n{:=<60}", "");
    println!("  Entries: {}", r.catalog.len());
    println!("  Performers: {}", r.stats.performers);
    println!("  Dropped rows: {}", r.stats.dropped_rows());
    println!(
        "  Elapsed: {}",
        format_duration(std::time::Duration::from_secs_f64(r.stats.elapsed_seconds))
    );
    println!(
        "  Added / removed / updated: {} / {} / {}",
        report.diff.added.len(),
        report.diff.removed.len(),
        report.diff.updated.len()
    );
    match &report.persist {
        PersistOutcome::Written { path, rows } => {
            println!("  Wrote {} rows to {}", rows, path.display())
        }
        PersistOutcome::DryRun => println!("  Dry run: catalog not written"),
        PersistOutcome::Failed { path, reason } => {
            println!("  FAILED to write {}: {}", path.display(), reason)
        }
    }
    println!("{:=<60}", "");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    set_log_only(args.log_only);

    let config = resolve_config(&args)?;

    let overrides = match &args.sort_keys {
        Some(path) => SortKeyOverrides::load(path)
            .with_context(|| format!("Failed to load sort key overrides: {}", path.display()))?,
        None => SortKeyOverrides::default(),
    };
    let sort_keys = TransliterationSortKeys::new(overrides);

    let paths = RunPaths {
        sessions: args.sessions.clone(),
        timings: args.timings.clone(),
        catalog: args.catalog.clone(),
    };
    let options = RunOptions {
        scan: config.similarity.scan_config(),
        dry_run: config.output.dry_run,
    };

    let report = pipeline::run(&paths, &sort_keys, &config.similarity.metric, &options)
        .context("Failed to load inputs")?;

    print_report(&report);

    let stats = &report.reconciliation.stats;
    stats.log_summary();
    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats: {}", path.display()))?;
    }

    if let PersistOutcome::Failed { path, reason } = &report.persist {
        bail!("catalog was not written to {}: {}", path.display(), reason);
    }
    Ok(())
}
