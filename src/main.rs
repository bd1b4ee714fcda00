//! mqmetric - command line entry point
//!
//! Validates collector configuration and prints the attribute tables the
//! collector maintains for each object class.

use mqmetric::config::CollectorConfig;
use mqmetric::observability::{init_default_logging, init_logging, logging::parse_level, LogFormat};
use mqmetric::protocol::constants::{MQPL_UNIX, MQPL_WINDOWS_NT, MQPL_ZOS};
use mqmetric::status::{attribute_table, ObjectClass};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// MQ queue manager metrics collector
#[derive(Parser)]
#[command(name = "mqmetric")]
#[command(about = "Status and statistics collection for MQ queue managers")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
    /// List the attributes collected for an object class
    Attributes {
        /// Object class, e.g. queue, channel, queue_manager
        class: ObjectClass,
        /// Platform family: unix, windows or zos
        #[arg(long, default_value = "unix")]
        platform: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.verbose {
        0 => init_default_logging(),
        1 => init_logging(parse_level("DEBUG"), LogFormat::Compact, false),
        _ => init_logging(parse_level("TRACE"), LogFormat::Compact, true),
    }

    let result = match cli.command {
        Commands::Config { show } => handle_config_command(&cli.config, show),
        Commands::Attributes {
            class,
            platform,
            json,
        } => handle_attributes_command(class, &platform, json),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<CollectorConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(CollectorConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["mqmetric.toml", "config/mqmetric.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(CollectorConfig::load_from_file(&path)?);
                }
            }

            Err("No configuration file found. Provide one with -c/--config or create mqmetric.toml".into())
        }
    }
}

fn handle_config_command(config_path: &Option<PathBuf>, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(config_path)?;
    config.connect_options()?;
    info!("Configuration is valid");

    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

fn parse_platform(name: &str) -> Result<i32, Box<dyn std::error::Error>> {
    match name.to_lowercase().as_str() {
        "unix" | "linux" => Ok(MQPL_UNIX),
        "windows" => Ok(MQPL_WINDOWS_NT),
        "zos" | "z/os" => Ok(MQPL_ZOS),
        other => Err(format!("unknown platform '{other}'").into()),
    }
}

fn handle_attributes_command(class: ObjectClass, platform: &str, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let platform = parse_platform(platform)?;
    if !class.supported_on(platform) {
        return Err(format!("{class} is not collected on this platform").into());
    }

    let table = attribute_table(class, platform);
    if as_json {
        let rows: Vec<_> = table
            .iter()
            .map(|(name, attr)| {
                json!({
                    "name": name,
                    "description": attr.description,
                    "code": attr.code,
                    "index": attr.index,
                    "delta": attr.delta,
                    "special": attr.special,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (name, attr) in &table {
        let code = attr.code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        let mut flags = Vec::new();
        if attr.delta {
            flags.push("delta");
        }
        if attr.squash.is_some() {
            flags.push("squash");
        }
        if attr.index >= 0 {
            flags.push("indexed");
        }
        println!("{name:<32} {code:>6}  {:<40} {}", attr.description, flags.join(","));
    }
    Ok(())
}
