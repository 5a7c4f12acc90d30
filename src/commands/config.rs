use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use pktelog::config::{Config, TransportConfig};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "pktelog Configuration".bold());
            println!();

            println!("  enabled: {}", config.enabled);
            println!("  device_id: {}", config.device_id);
            println!("  log_level: {}", config.log_level.as_filter());
            println!("  event logging compiled in: {}", pktelog::ENABLED);
            println!();

            println!("{}:", "transport".cyan());
            match &config.transport {
                TransportConfig::Dummy => println!("  kind: dummy"),
                TransportConfig::Udp { address } => {
                    println!("  kind: udp");
                    println!("  address: {}", address);
                }
            }
            println!();

            println!("{}:", "tap".cyan());
            println!("  listen: {}", config.tap.listen);
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "enabled" => Some(config.enabled.to_string()),
        "device_id" | "device-id" => Some(config.device_id.to_string()),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        "transport.kind" => Some(
            match config.transport {
                TransportConfig::Dummy => "dummy",
                TransportConfig::Udp { .. } => "udp",
            }
            .to_string(),
        ),
        "transport.address" => match &config.transport {
            TransportConfig::Udp { address } => Some(address.clone()),
            TransportConfig::Dummy => None,
        },
        "tap.listen" => Some(config.tap.listen.clone()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => {
            eprintln!("{} Unknown config key: {}", "✗".red(), key);
            std::process::exit(1);
        }
    }

    Ok(())
}
