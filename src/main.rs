use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use regionsim::config_loader::{self, CliOverrides};
use regionsim::engine::HeartbeatEngine;
use regionsim::network::AddressRegistry;
use regionsim::scenario::{ExecutionCountTermination, Scenario};
use regionsim::topology::{self, BasicNetworkFactory};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Run a region-aware resource management network on localhost
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Override the number of cycles every node must complete
    #[arg(short = 'n', long)]
    max_executions: Option<u64>,

    /// Override the log level from the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Write region summaries as JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = config_loader::load_config(&args.config)?;
    config_loader::apply_overrides(
        &mut config,
        &CliOverrides {
            max_executions: args.max_executions,
            log_level: args.log_level.clone(),
        },
    )?;

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Starting regionsim");
    info!("Configuration file: {:?}", args.config);
    info!("Topology: {:?}", config.topology_path());

    let registry = Arc::new(AddressRegistry::new());
    let factory = BasicNetworkFactory::new(registry, HeartbeatEngine::factory())
        .with_cycle_interval(config.cycle_interval)
        .with_estimation_window(config.estimation_window);

    let graph = topology::parse_file(&config.topology_path(), &config.node_data_path(), &factory)
        .wrap_err_with(|| format!("Failed to load topology '{}'", config.topology))?;
    info!(
        "Loaded {} nodes, {} clients and {} links in {} regions",
        graph.nodes().len(),
        graph.clients().len(),
        graph.links().len(),
        graph.regions().len()
    );

    let name = config
        .topology_path()
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "regionsim".to_string());

    let scenario = Scenario::new(name, graph)
        .with_termination(ExecutionCountTermination::new(config.max_executions))
        .with_estimation_window(config.estimation_window);

    let outcome = scenario.run()?;
    info!("Simulation finished in {:?}", outcome.elapsed);
    if !outcome.failed_nodes.is_empty() {
        warn!("{} nodes stopped with an error", outcome.failed_nodes.len());
    }

    let summaries = scenario
        .region_summaries()
        .wrap_err("Failed to summarize regions")?;
    let json = serde_json::to_string_pretty(&summaries).wrap_err("Failed to serialize summaries")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .wrap_err_with(|| format!("Failed to write summaries to '{}'", path.display()))?;
            info!("Wrote {} region summaries to {:?}", summaries.len(), path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
