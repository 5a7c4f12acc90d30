//! Synthetic packet trace
//!
//! Walks fake packets through the same call sites a real pipeline would hit,
//! so a collector can be checked end to end without a switch.

#![cfg_attr(not(feature = "elog"), allow(dead_code, unused_variables))]

use colored::*;
use eyre::{Context, Result};

use pktelog::config::{Config, TransportConfig};
use pktelog::{EventLogger, ObjectId, Packet, PacketId, PortId, elog};

const PARSER: ObjectId = 0;
const INGRESS: ObjectId = 0;
const EGRESS: ObjectId = 1;
const IS_VALID: ObjectId = 0;
const FORWARD_TABLE: ObjectId = 0;
const SET_PORT: ObjectId = 0;
const IPV4_CSUM: ObjectId = 0;
const DEPARSER: ObjectId = 0;
const ETHERNET: u32 = 0;
const IPV4: u32 = 1;

/// Events published per traced packet
pub const EVENTS_PER_PACKET: u64 = 18;

struct ProbePacket {
    id: PacketId,
    ingress: PortId,
}

impl Packet for ProbePacket {
    fn packet_id(&self) -> PacketId {
        self.id
    }

    fn ingress_port(&self) -> PortId {
        self.ingress
    }

    fn egress_port(&self) -> PortId {
        self.ingress ^ 1
    }
}

pub fn run(to: Option<&str>, packets: u64, device: Option<u64>, quiet: bool, config: &Config) -> Result<()> {
    if !pktelog::ENABLED {
        eprintln!(
            "{} pktelog was built without the `elog` feature; nothing will be published",
            "⚠".yellow()
        );
        return Ok(());
    }

    let mut config = config.clone();
    config.enabled = true;
    if let Some(address) = to {
        config.transport = TransportConfig::Udp {
            address: address.to_string(),
        };
    }
    if let Some(d) = device {
        config.device_id = d;
    }

    EventLogger::init_from_config(&config).context("Failed to attach transport")?;
    let logger = EventLogger::get();
    log::info!("Probing {} packets via {} transport", packets, logger.transport_name());

    elog!(config_change);
    for id in 0..packets {
        trace_packet(&ProbePacket {
            id,
            ingress: (id % 4) as PortId,
        });
    }

    if !quiet {
        let (published, dropped) = publish_counts(packets, logger.dropped());
        println!(
            "{} Published {} events for {} packets (device {}, {} dropped)",
            "✓".green(),
            published,
            packets,
            logger.device_id(),
            dropped
        );
    }

    Ok(())
}

/// Events handed to the transport and events it refused, for `packets` traced packets
fn publish_counts(packets: u64, dropped: u64) -> (u64, u64) {
    let attempted = packets * EVENTS_PER_PACKET + 1;
    let dropped = dropped.min(attempted);
    (attempted - dropped, dropped)
}

fn trace_packet(packet: &ProbePacket) {
    elog!(packet_in, packet);

    elog!(parser_start, packet, &PARSER);
    elog!(parser_extract, packet, ETHERNET);
    elog!(parser_extract, packet, IPV4);
    elog!(parser_done, packet, &PARSER);

    elog!(pipeline_start, packet, &INGRESS);
    elog!(condition_eval, packet, &IS_VALID, true);
    if packet.id % 2 == 0 {
        elog!(table_hit, packet, &FORWARD_TABLE, packet.id as u32);
    } else {
        elog!(table_miss, packet, &FORWARD_TABLE);
    }
    elog!(action_execute, packet, &SET_PORT, &u64::from(packet.egress_port()));
    elog!(pipeline_done, packet, &INGRESS);

    elog!(pipeline_start, packet, &EGRESS);
    elog!(checksum_update, packet, &IPV4_CSUM);
    elog!(pipeline_done, packet, &EGRESS);

    elog!(deparser_start, packet, &DEPARSER);
    elog!(deparser_emit, packet, ETHERNET);
    elog!(deparser_emit, packet, IPV4);
    elog!(deparser_done, packet, &DEPARSER);

    elog!(packet_out, packet);
}
