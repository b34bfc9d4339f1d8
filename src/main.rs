// src/main.rs
use anyhow::Context;
use bounty_scout::badge::{BadgeController, StaticTabs, TabEvent, TerminalBadge, INTERNAL_SCHEMES};
use bounty_scout::cache::DomainCache;
use bounty_scout::cli::{Cli, OutputFormat};
use bounty_scout::config::Config;
use bounty_scout::credentials::{CredentialStore, Credentials};
use bounty_scout::lookup::{normalize_domain, DomainLookup, LookupService};
use bounty_scout::messaging::MessageRouter;
use bounty_scout::output::{csv, human, json, OutputManager};
use bounty_scout::platforms;
use bounty_scout::progress::ProgressIndicator;
use bounty_scout::registry::ManualRegistry;
use bounty_scout::settings::{FileSettingsStore, SettingsStore};
use bounty_scout::stats::StatsCollector;
use bounty_scout::types::LookupReport;
use clap::Parser;
use futures_util::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Concurrent domain lookups in plain lookup mode
const LOOKUP_CONCURRENCY: usize = 4;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.validate()?;

    let config = Config::load_or_default(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config {}", cli.config))?;

    // RUST_LOG wins, then -v/-q, then the config file
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // stdout is reserved for reports and responses
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting bounty-scout...");

    let settings: Arc<dyn SettingsStore> =
        Arc::new(FileSettingsStore::open(PathBuf::from(&config.settings.path)).await?);
    let registry = ManualRegistry::new(settings.clone());

    if cli.is_registry_command() {
        return run_registry_command(&cli, &registry).await;
    }

    let credentials = CredentialStore::new();
    if cli.unlock {
        unlock_from_settings(settings.as_ref(), &credentials, &config).await?;
    }

    let lookup: Arc<dyn LookupService> = Arc::new(
        DomainLookup::from_config(&config, registry)?.with_authority(credentials.clone(), config.platforms.clone()),
    );
    let stats = StatsCollector::new();

    if cli.serve {
        run_serve(&cli, lookup, credentials).await?;
    } else if cli.badge {
        let cache = DomainCache::new(Duration::from_secs(config.cache.ttl_secs));
        run_badges(&cli, lookup, cache, &stats).await?;
    } else {
        run_lookups(&cli, lookup, &stats).await?;
    }

    if cli.stats {
        let snapshot = stats.snapshot();
        eprintln!("\n📊 Final Statistics:");
        eprintln!("  Lookups: {}", snapshot.lookups);
        eprintln!("  Cache hits: {}", snapshot.cache_hits);
        eprintln!("  Domains with programs: {}", snapshot.domains_found);
        eprintln!("  Programs found: {}", snapshot.programs_found);
        eprintln!("  Elapsed: {}", StatsCollector::format_elapsed(snapshot.elapsed_secs));
    }

    Ok(())
}

async fn run_registry_command(cli: &Cli, registry: &ManualRegistry) -> anyhow::Result<()> {
    if let Some((domain, url)) = &cli.add_manual {
        if registry.add(domain, url).await? {
            println!("Added {} -> {}", domain, url);
        } else {
            println!("Already registered: {} -> {}", domain, url);
        }
    }

    if let Some((domain, url)) = &cli.remove_manual {
        if registry.remove(domain, url).await? {
            println!("Removed {} -> {}", domain, url);
        } else {
            println!("Not registered: {} -> {}", domain, url);
        }
    }

    if cli.list_manual {
        let entries = registry.entries().await?;
        if entries.is_empty() {
            println!("No manual programs registered");
        }
        for entry in entries {
            println!(
                "{}\t{}\t{}",
                entry.domain,
                entry.url,
                entry.date_added.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

async fn unlock_from_settings(
    settings: &dyn SettingsStore,
    credentials: &CredentialStore,
    config: &Config,
) -> anyhow::Result<()> {
    let stored = Credentials::from_settings(settings).await?;
    if stored.is_empty() {
        tracing::warn!("--unlock given but no platform API keys are stored in settings");
        return Ok(());
    }

    for client in platforms::clients_for(&stored, &config.platforms)? {
        match client.test_connection().await {
            Ok(true) => tracing::info!("{} API connection successful", client.name()),
            Ok(false) => tracing::warn!("{} API connection failed (invalid credentials?)", client.name()),
            Err(e) => tracing::error!("{} API connection error: {:?}", client.name(), e),
        }
    }

    credentials.unlock(stored).await;
    Ok(())
}

async fn run_serve(cli: &Cli, lookup: Arc<dyn LookupService>, credentials: CredentialStore) -> anyhow::Result<()> {
    let tabs = Arc::new(StaticTabs::new());
    if let Some(first) = cli.domains.first() {
        tabs.open(1, &as_url(first)).await;
        tabs.activate(1).await;
    }

    let router = MessageRouter::new(lookup, tabs, credentials);
    tracing::info!("Serving JSON requests on stdin");

    router
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    Ok(())
}

async fn run_badges(
    cli: &Cli,
    lookup: Arc<dyn LookupService>,
    cache: DomainCache,
    stats: &StatsCollector,
) -> anyhow::Result<()> {
    let tabs = Arc::new(StaticTabs::new());
    let mut labels = HashMap::new();

    for (index, input) in cli.domains.iter().enumerate() {
        let id = index as u32 + 1;
        let url = as_url(input);
        tabs.open(id, &url).await;
        labels.insert(id, url);
    }

    let controller = Arc::new(
        BadgeController::new(lookup, cache, tabs, Arc::new(TerminalBadge::new(labels))).with_stats(stats.clone()),
    );

    let (tx, rx) = mpsc::channel(cli.domains.len().max(1));
    let driver = controller.run(rx);
    let feeder = async move {
        for id in 1..=cli.domains.len() as u32 {
            if tx.send(TabEvent::Navigated(id)).await.is_err() {
                break;
            }
        }
    };
    tokio::join!(driver, feeder);

    Ok(())
}

async fn run_lookups(cli: &Cli, lookup: Arc<dyn LookupService>, stats: &StatsCollector) -> anyhow::Result<()> {
    let mut output_manager = OutputManager::new();

    match cli.output_format() {
        OutputFormat::Human => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                output_manager.add_handler(Arc::new(human::HumanOutput::to_file(file)));
                tracing::info!("Writing human-readable output to: {}", path);
            } else {
                output_manager.add_handler(Arc::new(human::HumanOutput::new()));
            }
        }
        OutputFormat::Json => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                output_manager.add_handler(Arc::new(json::JsonOutput::to_file(file)));
                tracing::info!("Writing JSON output to: {}", path);
            } else {
                output_manager.add_handler(Arc::new(json::JsonOutput::new()));
            }
        }
        OutputFormat::Csv => {
            if let Some(ref path) = cli.output {
                let file = std::fs::File::create(path)?;
                output_manager.add_handler(Arc::new(csv::CsvOutput::to_file(file)));
                tracing::info!("Writing CSV output to: {}", path);
            } else {
                output_manager.add_handler(Arc::new(csv::CsvOutput::new()));
            }
        }
    }

    let mut domains = Vec::new();
    let mut seen = HashSet::new();
    for input in &cli.domains {
        match normalize_domain(input) {
            Ok(domain) => {
                if seen.insert(domain.clone()) {
                    domains.push(domain);
                }
            }
            Err(e) => tracing::warn!("Skipping {:?}: {}", input, e),
        }
    }

    let progress = ProgressIndicator::new(domains.len() as u64, cli.should_show_progress());

    let mut reports = stream::iter(domains)
        .map(|domain| {
            let lookup = Arc::clone(&lookup);
            async move {
                let result = lookup.lookup(&domain).await;
                LookupReport::new(domain, result)
            }
        })
        .buffered(LOOKUP_CONCURRENCY);

    while let Some(report) = reports.next().await {
        stats.record_lookup(report.result.programs.len());
        progress.set_message(report.domain.clone());
        progress.advance();

        output_manager.emit(&report).await?;
    }

    progress.finish();
    output_manager.flush().await?;
    Ok(())
}

/// Bare domains become https URLs so they can stand in for tabs
fn as_url(input: &str) -> String {
    let has_scheme = input.contains("://")
        || input
            .split_once(':')
            .is_some_and(|(scheme, _)| INTERNAL_SCHEMES.contains(&scheme));

    if has_scheme {
        input.to_string()
    } else {
        format!("https://{}", input)
    }
}
