//! Event notifications for a packet-processing pipeline
//!
//! At each significant transition (packet in/out, parser, deparser, tables,
//! conditionals, actions, checksums) the pipeline calls the matching
//! [`EventLogger`] method. The logger encodes a small fixed-width record and
//! publishes it on a lossy [`Transport`] so that external tools can rebuild
//! per-packet traces. Publishing never fails and never blocks the caller.
//!
//! Hot-path call sites go through [`elog!`], which compiles to nothing unless
//! the `elog` cargo feature is enabled:
//!
//! ```ignore
//! pktelog::elog!(packet_in, &packet);
//! // packet processing
//! pktelog::elog!(packet_out, &packet);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod logger;
pub mod transport;
pub mod wire;

pub use config::{Config, TransportConfig};
pub use error::{DecodeError, Error, PublishError, Result};
pub use event::{ActionDataRef, DeviceId, EntryHandle, EventKind, HeaderId, ObjectId, Packet, PacketId, PipelineObject, PortId};
pub use logger::EventLogger;
pub use transport::{ChannelTransport, DummyTransport, Transport, UdpTransport};
pub use wire::{Event, Frame, Message};

/// Whether `elog!` call sites were compiled in
pub const ENABLED: bool = cfg!(feature = "elog");

/// Log an event with the process-wide [`EventLogger`].
///
/// Without the `elog` feature the invocation expands to nothing and its
/// arguments are never evaluated.
#[cfg(feature = "elog")]
#[macro_export]
macro_rules! elog {
    ($method:ident $(, $arg:expr)* $(,)?) => {
        $crate::EventLogger::get().$method($($arg),*)
    };
}

/// Log an event with the process-wide [`EventLogger`].
///
/// Without the `elog` feature the invocation expands to nothing and its
/// arguments are never evaluated.
#[cfg(not(feature = "elog"))]
#[macro_export]
macro_rules! elog {
    ($method:ident $(, $arg:expr)* $(,)?) => {};
}
