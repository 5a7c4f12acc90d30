//! Live event tap
//!
//! Binds the collector socket and prints every decoded event, similar to `tail -f`.

use chrono::Local;
use colored::*;
use eyre::{Context, Result};
use std::net::UdpSocket;

use crate::cli::OutputFormat;
use pktelog::{EventKind, Message};

pub struct TapOptions {
    pub listen: String,
    pub filter: Option<String>,
    pub device: Option<u64>,
    pub count: Option<usize>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Run the tap command
pub fn run(opts: &TapOptions) -> Result<()> {
    let socket = UdpSocket::bind(&opts.listen).context(format!("Failed to bind {}", opts.listen))?;

    if !opts.quiet && opts.format == OutputFormat::Text {
        println!("{} Tapping events on {} (Ctrl+C to stop)...", "👁".blue(), opts.listen.cyan());
        if let Some(ref f) = opts.filter {
            println!("  Filter: {}", f.cyan());
        }
        println!();
    }

    let mut buf = [0u8; 2048];
    let mut shown = 0usize;
    let mut malformed = 0u64;

    loop {
        let (n, from) = socket.recv_from(&mut buf).context("Failed to receive datagram")?;

        let msg = match Message::decode(&buf[..n]) {
            Ok(msg) => msg,
            Err(e) => {
                malformed += 1;
                log::warn!("Undecodable datagram from {}: {} ({} so far)", from, e, malformed);
                continue;
            }
        };

        if !matches(&msg, opts.filter.as_deref(), opts.device) {
            continue;
        }

        print_message(&msg, opts.format)?;
        shown += 1;

        if opts.count.is_some_and(|limit| shown >= limit) {
            break;
        }
    }

    Ok(())
}

/// Apply the kind substring filter and device filter
fn matches(msg: &Message, filter: Option<&str>, device: Option<u64>) -> bool {
    if let Some(d) = device
        && msg.device_id != d
    {
        return false;
    }
    match filter {
        Some(f) => msg.kind().as_str().contains(&f.to_lowercase()),
        None => true,
    }
}

fn print_message(msg: &Message, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let local_time = Local::now().format("%H:%M:%S%.3f").to_string();
            println!("{}", format_display(msg, &local_time));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(msg)?),
        OutputFormat::Yaml => print!("---\n{}", serde_yaml::to_string(msg)?),
    }
    Ok(())
}

/// Format one event for the terminal
fn format_display(msg: &Message, local_time: &str) -> String {
    let kind = msg.kind();
    let name = kind.as_str();
    let kind_colored = match kind {
        EventKind::PacketIn => name.green(),
        EventKind::PacketOut => name.red(),
        EventKind::ParserStart | EventKind::ParserDone | EventKind::ParserExtract => name.cyan(),
        EventKind::DeparserStart | EventKind::DeparserDone | EventKind::DeparserEmit => name.blue(),
        EventKind::TableHit => name.yellow(),
        EventKind::TableMiss => name.magenta(),
        EventKind::ConfigChange => name.bold(),
        _ => name.normal(),
    };

    let mut parts = vec![
        local_time.dimmed().to_string(),
        format!("[dev {}]", msg.device_id).dimmed().to_string(),
        format!("#{}", msg.sequence).dimmed().to_string(),
    ];

    if kind != EventKind::ConfigChange {
        parts.push(format!("pkt {}", msg.packet_id).bold().to_string());
    }
    parts.push(kind_colored.to_string());

    let fields = msg.event.fields();
    if !fields.is_empty() {
        parts.push(fields);
    }

    parts.join(" ")
}
