//! benchtab — Benchmark agreement tables from a local catalog.
//! Entry point for the command-line binary.

use std::path::PathBuf;

use anyhow::Context;
use benchtab::{Benchmark, Config};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("benchtab=debug,info")),
        )
        .init();

    info!("benchtab starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match Config::load() {
        Ok(c) => {
            info!(
                "Configuration loaded. Catalog: {}, aggregates: {}",
                c.catalog.dir.display(),
                c.aggregates.len()
            );
            c
        }
        Err(e) => {
            warn!("Could not load benchtab.toml: {e}");
            warn!("Copy benchtab.example.toml to benchtab.toml and edit it.");
            return Ok(());
        }
    };
    let specs = config.aggregate_specs().context("Invalid [[aggregates]] section")?;

    let mut bench = Benchmark::from_config(&config).context("Failed to load registries")?;

    let reports = bench
        .load_local_catalog(&config.catalog.dir)
        .with_context(|| format!("Failed to ingest catalog {}", config.catalog.dir.display()))?;
    for report in &reports {
        for warning in &report.warnings {
            warn!(source = %report.source, "{warning}");
        }
    }
    info!(
        files = reports.len(),
        rows = bench.records().len(),
        models = bench.models().len(),
        scenarios = bench.scenarios().len(),
        "Catalog ingested"
    );

    if config.dedup.enabled {
        let dedup = bench.clear_repeated_scenarios(config.dedup.preferred_source.as_deref());
        info!(resolved = dedup.resolutions.len(), rows_removed = dedup.rows_removed, "Repeated scenarios cleared");
    }

    for spec in &specs {
        bench
            .add_aggregate(spec)
            .with_context(|| format!("Failed to add aggregate '{}'", spec.name))?;
    }

    println!("Scenarios per model:");
    for (model, n) in bench.model_coverage() {
        println!("  {model:<40} {n}");
    }
    println!("Models per scenario:");
    for (scenario, n) in bench.scenario_coverage() {
        println!("  {scenario:<40} {n}");
    }

    for spec in &specs {
        println!("Top {} by {} ({}):", config.report.top_n, spec.name, spec.mode);
        for (rank, record) in bench.leaderboard(&spec.name, config.report.top_n).iter().enumerate() {
            println!("  {:>3}. {:<40} {:.4}", rank + 1, record.model, record.score);
        }
    }

    if let Ok(out) = std::env::var("BENCHTAB_EXPORT") {
        bench.save_csv(&PathBuf::from(out)).context("Failed to export table")?;
    }

    Ok(())
}
