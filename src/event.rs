//! Event taxonomy and the narrow views the logger takes of pipeline objects
//!
//! The logger never depends on concrete parser/table/action types. Each
//! pipeline object only has to expose its pre-assigned identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device (switch instance) identifier carried by every message
pub type DeviceId = u64;
/// Unique identifier of one in-flight packet
pub type PacketId = u64;
/// Identifier of a parser, deparser, table, action, conditional, checksum or pipeline
pub type ObjectId = u32;
/// Header instance identifier
pub type HeaderId = u32;
/// Port number from packet metadata
pub type PortId = u32;
/// Opaque match-table entry handle
pub type EntryHandle = u32;

/// The packet currently being processed
pub trait Packet {
    fn packet_id(&self) -> PacketId;
    fn ingress_port(&self) -> PortId;
    fn egress_port(&self) -> PortId;
}

/// Any pipeline object that can appear in an event
pub trait PipelineObject {
    fn id(&self) -> ObjectId;
}

/// Action parameter values, reduced to an opaque reference.
///
/// How that reference maps back to the actual parameters is up to the
/// implementor.
pub trait ActionDataRef {
    fn data_ref(&self) -> u64;
}

impl<T: PipelineObject + ?Sized> PipelineObject for &T {
    fn id(&self) -> ObjectId {
        (**self).id()
    }
}

impl PipelineObject for ObjectId {
    fn id(&self) -> ObjectId {
        *self
    }
}

impl ActionDataRef for u64 {
    fn data_ref(&self) -> u64 {
        *self
    }
}

/// Kind of pipeline transition; the discriminant is part of the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventKind {
    PacketIn = 0,
    PacketOut = 1,
    ParserStart = 2,
    ParserDone = 3,
    ParserExtract = 4,
    DeparserStart = 5,
    DeparserDone = 6,
    DeparserEmit = 7,
    ChecksumUpdate = 8,
    PipelineStart = 9,
    PipelineDone = 10,
    ConditionEval = 11,
    TableHit = 12,
    TableMiss = 13,
    ActionExecute = 14,
    ConfigChange = 999,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::PacketIn,
        EventKind::PacketOut,
        EventKind::ParserStart,
        EventKind::ParserDone,
        EventKind::ParserExtract,
        EventKind::DeparserStart,
        EventKind::DeparserDone,
        EventKind::DeparserEmit,
        EventKind::ChecksumUpdate,
        EventKind::PipelineStart,
        EventKind::PipelineDone,
        EventKind::ConditionEval,
        EventKind::TableHit,
        EventKind::TableMiss,
        EventKind::ActionExecute,
        EventKind::ConfigChange,
    ];

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Length of the variant-specific suffix in bytes
    pub fn suffix_len(self) -> usize {
        match self {
            EventKind::ConfigChange => 0,
            EventKind::ConditionEval => 5,
            EventKind::TableHit => 8,
            EventKind::ActionExecute => 12,
            _ => 4,
        }
    }

    /// snake_case name, matching the logger method that emits it
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PacketIn => "packet_in",
            EventKind::PacketOut => "packet_out",
            EventKind::ParserStart => "parser_start",
            EventKind::ParserDone => "parser_done",
            EventKind::ParserExtract => "parser_extract",
            EventKind::DeparserStart => "deparser_start",
            EventKind::DeparserDone => "deparser_done",
            EventKind::DeparserEmit => "deparser_emit",
            EventKind::ChecksumUpdate => "checksum_update",
            EventKind::PipelineStart => "pipeline_start",
            EventKind::PipelineDone => "pipeline_done",
            EventKind::ConditionEval => "condition_eval",
            EventKind::TableHit => "table_hit",
            EventKind::TableMiss => "table_miss",
            EventKind::ActionExecute => "action_execute",
            EventKind::ConfigChange => "config_change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
