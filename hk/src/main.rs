//! hitokoto - print a short quotation
//!
//! CLI entry point: bundle maintenance, export and single sentence queries.

use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use tracing::{debug, info};

use hitokoto::api::HitokotoApi;
use hitokoto::cli::Cli;
use hitokoto::config::Config;
use hitokoto::domain::Category;
use hitokoto::export::{DEFAULT_EXPORT_COUNT, DEFAULT_EXPORT_FILE, export_to_file};
use hitokoto::fetcher::{BundleFetcher, Mirror};
use hitokoto::output::{OutputFormat, format_sentence};
use hitokoto::query::QueryEngine;
use hitokoto::store::BundleStore;

/// Number of exported sentences echoed back to the terminal
const EXPORT_PREVIEW: usize = 5;

fn setup_logging(debug_flag: bool, config_log_level: Option<&str>) {
    // Priority: --debug > config file > WARN
    let level = if debug_flag {
        tracing::Level::DEBUG
    } else if let Some(s) = config_log_level {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        }
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging first, so problems found while loading the config are reported
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.debug, config_log_level.as_deref());

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(?cli, "main: parsed arguments");
    info!(bundle_dir = %config.bundle_dir.display(), "hitokoto starting");

    if cli.wants_category_list() {
        debug!("main: matched category list");
        print_categories();
        return Ok(());
    }

    let store = BundleStore::open(&config);

    if let Some(mirror) = cli.get_bundle {
        debug!("main: matched get-bundle");
        return cmd_get_bundle(store, &config, mirror.unwrap_or(config.mirror)).await;
    }
    if cli.check_bundle {
        debug!("main: matched check-bundle");
        return cmd_check(&store);
    }
    if cli.delete_bundle {
        debug!("main: matched delete-bundle");
        return cmd_delete(&store);
    }
    if cli.update_index {
        debug!("main: matched update-index");
        return cmd_update_index(&store);
    }
    if cli.wants_export() {
        debug!("main: matched export");
        return cmd_export(&store, &cli);
    }

    cmd_query(&store, &config, &cli).await
}

fn print_categories() {
    println!("Sentence types:");
    for category in Category::ALL {
        println!("  {}  {}", category.to_string().yellow(), category.name());
    }
}

async fn cmd_get_bundle(store: BundleStore, config: &Config, mirror: Mirror) -> Result<()> {
    println!("Downloading bundle from {} ({})", mirror.to_string().cyan(), mirror.base_url());

    let fetcher = BundleFetcher::from_config(store, &config.download);
    let report = fetcher.fetch(mirror).await.context("Failed to download bundle")?;

    for (served_by, files) in report.mirror_usage() {
        let note = if served_by == report.mirror { "" } else { " (fallback)" };
        println!("  {} served {} categories{}", served_by.to_string().cyan(), files, note);
    }
    if !report.is_complete() {
        let missing: Vec<String> = report.failed.iter().map(|c| format!("{} ({})", c, c.name())).collect();
        println!("{} No mirror had: {}", "!".yellow(), missing.join(", "));
    }

    println!(
        "{} Saved {} sentences to {}",
        "✓".green(),
        report.index.total,
        fetcher.store().dir().display()
    );
    if let Some(at) = report.index.provenance.downloaded_at {
        println!("  Downloaded at {}", at.to_rfc3339().dimmed());
    }
    Ok(())
}

fn cmd_check(store: &BundleStore) -> Result<()> {
    let report = store.check_integrity()?;

    if !report.is_ok() {
        println!("{} Bundle at {} has problems:", "✗".red(), store.dir().display());
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        bail!("Bundle check found {} issue(s)", report.issues.len());
    }

    println!("{} Bundle OK: {} sentences", "✓".green(), report.total);
    if let Some(index) = store.load_index()? {
        for (category, count) in &index.counts {
            println!("  {} {:<20} {}", category.to_string().yellow(), category.name(), count);
        }
        if let Some(mirror) = index.provenance.mirror {
            println!("  Source: {}", mirror.to_string().cyan());
        }
    }
    Ok(())
}

fn cmd_delete(store: &BundleStore) -> Result<()> {
    if store.delete()? {
        println!("{} Deleted bundle at {}", "✓".green(), store.dir().display());
    } else {
        println!("No bundle at {}", store.dir().display());
    }
    Ok(())
}

fn cmd_update_index(store: &BundleStore) -> Result<()> {
    let index = store.rebuild_index(store.current_provenance())?;
    println!(
        "{} Index rebuilt: {} sentences in {} categories",
        "✓".green(),
        index.total,
        index.counts.len()
    );
    Ok(())
}

fn cmd_export(store: &BundleStore, cli: &Cli) -> Result<()> {
    let count = cli
        .echo
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(DEFAULT_EXPORT_COUNT);
    let target = cli.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));

    let criteria = cli.criteria();
    let sentences = QueryEngine::new(store).sample(&criteria, count, &mut rand::rng())?;
    if criteria.id.is_none() && sentences.len() < count {
        println!(
            "{} Only {} sentences match, exporting all of them",
            "!".yellow(),
            sentences.len()
        );
    }
    let path = export_to_file(&sentences, &target, cli.include_source)
        .context(format!("Failed to export to {}", target.display()))?;

    println!("{} Exported {} sentences to {}", "✓".green(), sentences.len(), path.display());
    for sentence in sentences.iter().take(EXPORT_PREVIEW) {
        println!("  {}", format_sentence(sentence, cli.include_source, OutputFormat::Text)?);
    }
    if sentences.len() > EXPORT_PREVIEW {
        println!("  {}", format!("... and {} more", sentences.len() - EXPORT_PREVIEW).dimmed());
    }
    Ok(())
}

async fn cmd_query(store: &BundleStore, config: &Config, cli: &Cli) -> Result<()> {
    let criteria = cli.criteria();
    // --bundle and --id need the local bundle; otherwise a missing one means the API
    let bundle_required = cli.bundle || cli.id.is_some();

    let local = if cli.api.is_some() {
        None
    } else {
        match QueryEngine::new(store).select(&criteria, &mut rand::rng()) {
            Ok(sentence) => Some(sentence),
            Err(e) if e.is_store_missing() && !bundle_required => {
                debug!("cmd_query: no local bundle, using the online API");
                None
            }
            Err(e) => return Err(e.into()),
        }
    };

    let sentence = match local {
        Some(sentence) => sentence,
        None => HitokotoApi::from_config(&config.api)
            .fetch(cli.api, &criteria)
            .await
            .context("Failed to fetch a sentence from the online API")?,
    };

    println!("{}", format_sentence(&sentence, cli.include_source, cli.encode)?);
    Ok(())
}
