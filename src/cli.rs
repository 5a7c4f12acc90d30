use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "pktelog",
    about = "Packet pipeline event logger - tap and probe the event stream",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/pktelog/logs/pktelog.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to pktelog.yaml config file")]
    pub config: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Subscribe to the event stream and print every event
    Tap {
        /// Address to listen on (defaults to tap.listen from config)
        #[arg(long, short = 'l')]
        listen: Option<String>,

        /// Only show events whose kind contains this text (e.g. "table", "parser_done")
        #[arg(long, short = 'f')]
        filter: Option<String>,

        /// Only show events from this device id
        #[arg(long, short = 'd')]
        device: Option<u64>,

        /// Exit after printing this many events
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Publish a synthetic packet trace through the configured transport
    Probe {
        /// Collector address (overrides the configured transport)
        #[arg(long)]
        to: Option<String>,

        /// Number of packets to trace
        #[arg(long, short = 'p', default_value_t = 1)]
        packets: u64,

        /// Device id to tag events with (overrides config)
        #[arg(long, short = 'd')]
        device: Option<u64>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (dot notation)
        key: String,
    },
}
