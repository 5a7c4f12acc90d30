//! Message layout shared by the logger and every subscriber
//!
//! A message is a densely packed little-endian record:
//!
//! ```text
//! | device_id u64 | kind u32 | packet_id u64 | sequence u64 | suffix ... |
//! ```
//!
//! Subscribers must parse the 28-byte header as written above: the logger's
//! `sequence` clock always follows the packet id, and the kind-specific
//! suffix starts only after it (see [`EventKind::suffix_len`]). Every kind
//! shares this header, so one parser handles all messages.
//!
//! Encoding happens in a fixed stack buffer so the packet path never
//! allocates. Only the per-kind emitters in the logger append suffix fields,
//! which keeps every frame within [`MAX_MESSAGE_LEN`].

use serde::Serialize;

use crate::error::DecodeError;
use crate::event::{DeviceId, EntryHandle, EventKind, HeaderId, ObjectId, PacketId, PortId};

pub const HEADER_LEN: usize = 8 + 4 + 8 + 8;
pub const MAX_MESSAGE_LEN: usize = HEADER_LEN + 12;

/// An encoded message, ready to hand to a transport
#[derive(Clone, Copy)]
pub struct Frame {
    buf: [u8; MAX_MESSAGE_LEN],
    len: usize,
}

impl Frame {
    /// Start a frame with the common header
    pub fn new(device_id: DeviceId, kind: EventKind, packet_id: PacketId, sequence: u64) -> Self {
        let mut frame = Self {
            buf: [0; MAX_MESSAGE_LEN],
            len: 0,
        };
        frame.put_u64(device_id);
        frame.put_u32(kind.code());
        frame.put_u64(packet_id);
        frame.put_u64(sequence);
        frame
    }

    pub(crate) fn u32(mut self, value: u32) -> Self {
        self.put_u32(value);
        self
    }

    pub(crate) fn u64(mut self, value: u64) -> Self {
        self.put_u64(value);
        self
    }

    pub(crate) fn bool(mut self, value: bool) -> Self {
        self.put(&[u8::from(value)]);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn put_u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.put(&value.to_le_bytes());
    }

    // Callers append exactly `kind.suffix_len()` bytes, which fits MAX_MESSAGE_LEN.
    fn put(&mut self, bytes: &[u8]) {
        let end = self.len + bytes.len();
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("bytes", &self.as_bytes()).finish()
    }
}

/// Variant-specific part of a decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    PacketIn { port: PortId },
    PacketOut { port: PortId },
    ParserStart { parser_id: ObjectId },
    ParserDone { parser_id: ObjectId },
    ParserExtract { header_id: HeaderId },
    DeparserStart { deparser_id: ObjectId },
    DeparserDone { deparser_id: ObjectId },
    DeparserEmit { header_id: HeaderId },
    ChecksumUpdate { checksum_id: ObjectId },
    PipelineStart { pipeline_id: ObjectId },
    PipelineDone { pipeline_id: ObjectId },
    ConditionEval { cond_id: ObjectId, result: bool },
    TableHit { table_id: ObjectId, handle: EntryHandle },
    TableMiss { table_id: ObjectId },
    ActionExecute { action_id: ObjectId, action_data: u64 },
    ConfigChange,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PacketIn { .. } => EventKind::PacketIn,
            Event::PacketOut { .. } => EventKind::PacketOut,
            Event::ParserStart { .. } => EventKind::ParserStart,
            Event::ParserDone { .. } => EventKind::ParserDone,
            Event::ParserExtract { .. } => EventKind::ParserExtract,
            Event::DeparserStart { .. } => EventKind::DeparserStart,
            Event::DeparserDone { .. } => EventKind::DeparserDone,
            Event::DeparserEmit { .. } => EventKind::DeparserEmit,
            Event::ChecksumUpdate { .. } => EventKind::ChecksumUpdate,
            Event::PipelineStart { .. } => EventKind::PipelineStart,
            Event::PipelineDone { .. } => EventKind::PipelineDone,
            Event::ConditionEval { .. } => EventKind::ConditionEval,
            Event::TableHit { .. } => EventKind::TableHit,
            Event::TableMiss { .. } => EventKind::TableMiss,
            Event::ActionExecute { .. } => EventKind::ActionExecute,
            Event::ConfigChange => EventKind::ConfigChange,
        }
    }

    /// Human-readable `name=value` list of the suffix fields
    pub fn fields(&self) -> String {
        match *self {
            Event::PacketIn { port } | Event::PacketOut { port } => format!("port={port}"),
            Event::ParserStart { parser_id } | Event::ParserDone { parser_id } => format!("parser={parser_id}"),
            Event::ParserExtract { header_id } | Event::DeparserEmit { header_id } => format!("header={header_id}"),
            Event::DeparserStart { deparser_id } | Event::DeparserDone { deparser_id } => {
                format!("deparser={deparser_id}")
            }
            Event::ChecksumUpdate { checksum_id } => format!("checksum={checksum_id}"),
            Event::PipelineStart { pipeline_id } | Event::PipelineDone { pipeline_id } => {
                format!("pipeline={pipeline_id}")
            }
            Event::ConditionEval { cond_id, result } => format!("cond={cond_id} result={result}"),
            Event::TableHit { table_id, handle } => format!("table={table_id} handle={handle}"),
            Event::TableMiss { table_id } => format!("table={table_id}"),
            Event::ActionExecute { action_id, action_data } => {
                format!("action={action_id} data={action_data:#x}")
            }
            Event::ConfigChange => String::new(),
        }
    }
}

/// A fully decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Message {
    pub device_id: DeviceId,
    pub packet_id: PacketId,
    pub sequence: u64,
    #[serde(flatten)]
    pub event: Event,
}

impl Message {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Parse one message; the buffer must hold exactly one record
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        r.need(HEADER_LEN)?;

        let device_id = r.u64();
        let code = r.u32();
        let kind = EventKind::from_code(code).ok_or(DecodeError::UnknownKind(code))?;
        let packet_id = r.u64();
        let sequence = r.u64();

        r.need(kind.suffix_len())?;
        let event = match kind {
            EventKind::PacketIn => Event::PacketIn { port: r.u32() },
            EventKind::PacketOut => Event::PacketOut { port: r.u32() },
            EventKind::ParserStart => Event::ParserStart { parser_id: r.u32() },
            EventKind::ParserDone => Event::ParserDone { parser_id: r.u32() },
            EventKind::ParserExtract => Event::ParserExtract { header_id: r.u32() },
            EventKind::DeparserStart => Event::DeparserStart { deparser_id: r.u32() },
            EventKind::DeparserDone => Event::DeparserDone { deparser_id: r.u32() },
            EventKind::DeparserEmit => Event::DeparserEmit { header_id: r.u32() },
            EventKind::ChecksumUpdate => Event::ChecksumUpdate { checksum_id: r.u32() },
            EventKind::PipelineStart => Event::PipelineStart { pipeline_id: r.u32() },
            EventKind::PipelineDone => Event::PipelineDone { pipeline_id: r.u32() },
            EventKind::ConditionEval => Event::ConditionEval {
                cond_id: r.u32(),
                result: r.bool()?,
            },
            EventKind::TableHit => Event::TableHit {
                table_id: r.u32(),
                handle: r.u32(),
            },
            EventKind::TableMiss => Event::TableMiss { table_id: r.u32() },
            EventKind::ActionExecute => Event::ActionExecute {
                action_id: r.u32(),
                action_data: r.u64(),
            },
            EventKind::ConfigChange => Event::ConfigChange,
        };

        match r.remaining() {
            0 => Ok(Self {
                device_id,
                packet_id,
                sequence,
                event,
            }),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

/// Cursor over a message; callers check lengths with `need` before reading
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn need(&self, n: usize) -> Result<(), DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                need: self.pos + n,
                got: self.bytes.len(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn bool(&mut self) -> Result<bool, DecodeError> {
        match self.take::<1>()[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }
}
