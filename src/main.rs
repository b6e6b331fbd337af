//! saio-provision - Main entry point
//!
//! Builds the provision plan from the cluster configuration and applies it
//! to this machine, strictly in order, fail-fast.

use log::{debug, error, info};
use std::path::Path;

use saio_provision::cli::{Cli, Commands};
use saio_provision::{build_provision_plan, sanity, ClusterConfig, RealHost, StepExecutor};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    info!("saio-provision starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Some(Commands::Validate { config }) => {
            info!("Validating configuration file: {:?}", config);
            match ClusterConfig::load_from_file(&config) {
                Ok(loaded) => match loaded.validate() {
                    Ok(_) => {
                        info!("Configuration validation successful");
                        println!("✓ Configuration file is valid: {:?}", config);
                    }
                    Err(e) => {
                        error!("Configuration validation failed: {}", e);
                        eprintln!("✗ Configuration validation failed: {}", e);
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Failed to load configuration file: {}", e);
                    eprintln!("✗ Failed to load configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Init { path }) => {
            let config = ClusterConfig::default();
            config.save_to_file(&path)?;
            println!("Wrote default configuration to {:?}", path);
        }
        Some(Commands::Plan { config }) => {
            let config = load_config(config.as_deref())?;
            let plan = build_provision_plan(&config)?;
            println!("{}", plan.summary());
        }
        Some(Commands::Provision { config }) => {
            run_provision(config.as_deref(), cli.dry_run)?;
        }
        None => {
            info!("No command specified, provisioning with defaults");
            run_provision(None, cli.dry_run)?;
        }
    }

    Ok(())
}

/// Load the cluster config from a file, or fall back to the stock topology.
fn load_config(path: Option<&Path>) -> Result<ClusterConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            info!("Loading cluster configuration from {:?}", path);
            ClusterConfig::load_from_file(path)?
        }
        None => {
            debug!("No configuration file given, using stock SAIO defaults");
            ClusterConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Build the plan and execute it against this machine.
fn run_provision(path: Option<&Path>, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;

    // Dry runs only preview; no point requiring root for them
    if !dry_run {
        sanity::run_preflight_checks();
    }

    let plan = build_provision_plan(&config)?;
    info!(
        "Plan built: {} steps for {} node(s) / {} disk(s)",
        plan.steps.len(),
        plan.nodes,
        plan.disks
    );

    let mut host = RealHost::new();
    let report = StepExecutor::new(dry_run).execute(&plan, &mut host)?;

    println!(
        "{}: {} step(s) executed, {} already satisfied",
        if dry_run { "Dry run complete" } else { "Provisioning complete" },
        report.executed_count(),
        report.skipped_count()
    );

    Ok(())
}
