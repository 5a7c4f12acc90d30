//! The event logger and its process-wide instance
//!
//! Pipeline code calls one method per transition. Each call reads the
//! identifying fields right away, encodes them into a [`Frame`] and publishes
//! it. Nothing is queued or retried and nothing is returned to the caller.
//!
//! The transport and device id live together behind one lock as an
//! `Arc<Binding>`. A publisher clones the `Arc` and works from that snapshot,
//! so a concurrent [`EventLogger::init`] is seen either entirely or not at all.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::error::Result;
use crate::event::{ActionDataRef, DeviceId, EntryHandle, EventKind, HeaderId, Packet, PacketId, PipelineObject};
use crate::transport::{self, DummyTransport, Transport};
use crate::wire::Frame;

static GLOBAL: Lazy<EventLogger> = Lazy::new(EventLogger::dummy);

struct Binding {
    transport: Box<dyn Transport>,
    device_id: DeviceId,
}

/// Publishes packet-processing events on a transport
pub struct EventLogger {
    binding: RwLock<Arc<Binding>>,
    sequence: AtomicU64,
    dropped: AtomicU64,
}

impl EventLogger {
    pub fn new(transport: Box<dyn Transport>, device_id: DeviceId) -> Self {
        Self {
            binding: RwLock::new(Arc::new(Binding { transport, device_id })),
            sequence: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// A logger bound to [`DummyTransport`] with device id 0
    pub fn dummy() -> Self {
        Self::new(Box::new(DummyTransport), 0)
    }

    /// The process-wide logger, bound to the dummy transport until [`init`](Self::init)
    pub fn get() -> &'static EventLogger {
        &GLOBAL
    }

    /// Replace the transport and device id of the process-wide logger
    pub fn init(transport: Box<dyn Transport>, device_id: DeviceId) {
        Self::get().rebind(transport, device_id);
    }

    /// Initialise the process-wide logger from configuration.
    ///
    /// With `enabled: false` the dummy transport is (re)installed.
    pub fn init_from_config(config: &Config) -> Result<()> {
        let transport = if config.enabled {
            transport::from_config(&config.transport)?
        } else {
            Box::new(DummyTransport)
        };
        Self::init(transport, config.device_id);
        Ok(())
    }

    /// Swap transport and device id as a single unit
    pub fn rebind(&self, transport: Box<dyn Transport>, device_id: DeviceId) {
        log::debug!("event logger bound to {} transport, device {}", transport.name(), device_id);
        let binding = Arc::new(Binding { transport, device_id });
        // the previous transport is dropped once the last in-flight publish releases it
        let _previous = std::mem::replace(&mut *self.binding.write(), binding);
    }

    pub fn device_id(&self) -> DeviceId {
        self.binding.read().device_id
    }

    /// Name of the currently bound transport
    pub fn transport_name(&self) -> &'static str {
        self.binding.read().transport.name()
    }

    /// Number of publishes the transport refused since construction
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Signal that a packet was received by the switch
    pub fn packet_in(&self, packet: &(impl Packet + ?Sized)) {
        self.emit(EventKind::PacketIn, packet.packet_id(), |f| f.u32(packet.ingress_port()));
    }

    /// Signal that a packet was transmitted by the switch
    pub fn packet_out(&self, packet: &(impl Packet + ?Sized)) {
        self.emit(EventKind::PacketOut, packet.packet_id(), |f| f.u32(packet.egress_port()));
    }

    pub fn parser_start(&self, packet: &(impl Packet + ?Sized), parser: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::ParserStart, packet, parser);
    }

    pub fn parser_done(&self, packet: &(impl Packet + ?Sized), parser: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::ParserDone, packet, parser);
    }

    pub fn parser_extract(&self, packet: &(impl Packet + ?Sized), header: HeaderId) {
        self.emit(EventKind::ParserExtract, packet.packet_id(), |f| f.u32(header));
    }

    pub fn deparser_start(&self, packet: &(impl Packet + ?Sized), deparser: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::DeparserStart, packet, deparser);
    }

    pub fn deparser_done(&self, packet: &(impl Packet + ?Sized), deparser: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::DeparserDone, packet, deparser);
    }

    pub fn deparser_emit(&self, packet: &(impl Packet + ?Sized), header: HeaderId) {
        self.emit(EventKind::DeparserEmit, packet.packet_id(), |f| f.u32(header));
    }

    pub fn checksum_update(&self, packet: &(impl Packet + ?Sized), checksum: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::ChecksumUpdate, packet, checksum);
    }

    pub fn pipeline_start(&self, packet: &(impl Packet + ?Sized), pipeline: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::PipelineStart, packet, pipeline);
    }

    pub fn pipeline_done(&self, packet: &(impl Packet + ?Sized), pipeline: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::PipelineDone, packet, pipeline);
    }

    pub fn condition_eval(&self, packet: &(impl Packet + ?Sized), cond: &(impl PipelineObject + ?Sized), result: bool) {
        self.emit(EventKind::ConditionEval, packet.packet_id(), |f| f.u32(cond.id()).bool(result));
    }

    pub fn table_hit(
        &self,
        packet: &(impl Packet + ?Sized),
        table: &(impl PipelineObject + ?Sized),
        handle: EntryHandle,
    ) {
        self.emit(EventKind::TableHit, packet.packet_id(), |f| f.u32(table.id()).u32(handle));
    }

    pub fn table_miss(&self, packet: &(impl Packet + ?Sized), table: &(impl PipelineObject + ?Sized)) {
        self.emit_object(EventKind::TableMiss, packet, table);
    }

    pub fn action_execute(
        &self,
        packet: &(impl Packet + ?Sized),
        action: &(impl PipelineObject + ?Sized),
        action_data: &(impl ActionDataRef + ?Sized),
    ) {
        self.emit(EventKind::ActionExecute, packet.packet_id(), |f| {
            f.u32(action.id()).u64(action_data.data_ref())
        });
    }

    /// Signal a global configuration change; carries packet id 0
    pub fn config_change(&self) {
        self.emit(EventKind::ConfigChange, 0, |f| f);
    }

    fn emit_object(&self, kind: EventKind, packet: &(impl Packet + ?Sized), object: &(impl PipelineObject + ?Sized)) {
        self.emit(kind, packet.packet_id(), |f| f.u32(object.id()));
    }

    fn emit(&self, kind: EventKind, packet_id: PacketId, suffix: impl FnOnce(Frame) -> Frame) {
        let binding = Arc::clone(&self.binding.read());
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let frame = suffix(Frame::new(binding.device_id, kind, packet_id, sequence));

        if let Err(e) = binding.transport.publish(frame.as_bytes()) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("dropped {} event for packet {}: {}", kind, packet_id, e);
        }
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::dummy()
    }
}

impl std::fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let binding = self.binding.read();
        f.debug_struct("EventLogger")
            .field("transport", &binding.transport.name())
            .field("device_id", &binding.device_id)
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::event::{ObjectId, PortId};
    use crate::transport::ChannelTransport;
    use crate::wire::{Event, Message};
    use parking_lot::Mutex;
    use std::sync::mpsc::Receiver;

    struct TestPacket {
        id: PacketId,
        ingress: PortId,
        egress: PortId,
    }

    impl Packet for TestPacket {
        fn packet_id(&self) -> PacketId {
            self.id
        }
        fn ingress_port(&self) -> PortId {
            self.ingress
        }
        fn egress_port(&self) -> PortId {
            self.egress
        }
    }

    fn pkt(id: PacketId) -> TestPacket {
        TestPacket {
            id,
            ingress: 1,
            egress: 2,
        }
    }

    struct Table {
        id: ObjectId,
    }

    impl PipelineObject for Table {
        fn id(&self) -> ObjectId {
            self.id
        }
    }

    /// Keeps every message, shared across rebinds
    #[derive(Clone, Default)]
    struct Recorder {
        messages: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Transport for Recorder {
        fn publish(&self, msg: &[u8]) -> std::result::Result<(), PublishError> {
            self.messages.lock().push(msg.to_vec());
            Ok(())
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    impl Recorder {
        fn decoded(&self) -> Vec<Message> {
            self.messages
                .lock()
                .iter()
                .map(|m| Message::decode(m).expect("valid message"))
                .collect()
        }
    }

    fn channel_logger(device_id: DeviceId) -> (EventLogger, Receiver<Vec<u8>>) {
        let (t, rx) = ChannelTransport::bounded(64);
        (EventLogger::new(Box::new(t), device_id), rx)
    }

    fn next(rx: &Receiver<Vec<u8>>) -> Message {
        Message::decode(&rx.try_recv().expect("a message was published")).expect("valid message")
    }

    #[test]
    fn test_table_hit_scenario() {
        let (logger, rx) = channel_logger(4);
        logger.table_hit(&pkt(42), &Table { id: 3 }, 99);

        let msg = next(&rx);
        assert_eq!(msg.device_id, 4);
        assert_eq!(msg.kind(), EventKind::TableHit);
        assert_eq!(msg.packet_id, 42);
        assert_eq!(msg.event, Event::TableHit { table_id: 3, handle: 99 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_condition_eval_scenario() {
        let (logger, rx) = channel_logger(0);
        logger.condition_eval(&pkt(5), &1u32, false);

        let msg = next(&rx);
        assert_eq!(msg.kind(), EventKind::ConditionEval);
        assert_eq!(msg.packet_id, 5);
        assert_eq!(msg.event, Event::ConditionEval { cond_id: 1, result: false });
    }

    #[test]
    fn test_every_kind_publishes_one_message() {
        let (logger, rx) = channel_logger(9);
        let p = TestPacket {
            id: 77,
            ingress: 11,
            egress: 12,
        };
        let obj = Table { id: 5 };

        logger.packet_in(&p);
        logger.parser_start(&p, &obj);
        logger.parser_extract(&p, 21);
        logger.parser_done(&p, &obj);
        logger.pipeline_start(&p, &obj);
        logger.condition_eval(&p, &obj, true);
        logger.table_hit(&p, &obj, 1234);
        logger.table_miss(&p, &obj);
        logger.action_execute(&p, &obj, &0xdead_beefu64);
        logger.pipeline_done(&p, &obj);
        logger.checksum_update(&p, &obj);
        logger.deparser_start(&p, &obj);
        logger.deparser_emit(&p, 22);
        logger.deparser_done(&p, &obj);
        logger.packet_out(&p);
        logger.config_change();

        let expected = [
            Event::PacketIn { port: 11 },
            Event::ParserStart { parser_id: 5 },
            Event::ParserExtract { header_id: 21 },
            Event::ParserDone { parser_id: 5 },
            Event::PipelineStart { pipeline_id: 5 },
            Event::ConditionEval { cond_id: 5, result: true },
            Event::TableHit { table_id: 5, handle: 1234 },
            Event::TableMiss { table_id: 5 },
            Event::ActionExecute {
                action_id: 5,
                action_data: 0xdead_beef,
            },
            Event::PipelineDone { pipeline_id: 5 },
            Event::ChecksumUpdate { checksum_id: 5 },
            Event::DeparserStart { deparser_id: 5 },
            Event::DeparserEmit { header_id: 22 },
            Event::DeparserDone { deparser_id: 5 },
            Event::PacketOut { port: 12 },
            Event::ConfigChange,
        ];

        for (i, event) in expected.into_iter().enumerate() {
            let msg = next(&rx);
            assert_eq!(msg.device_id, 9);
            assert_eq!(msg.event, event);
            assert_eq!(msg.sequence, i as u64);
            let want_packet = if event == Event::ConfigChange { 0 } else { 77 };
            assert_eq!(msg.packet_id, want_packet);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_handle_is_captured_at_call_time() {
        let (logger, rx) = channel_logger(0);
        let mut handle = 10;
        logger.table_hit(&pkt(1), &Table { id: 2 }, handle);
        handle += 1;
        logger.table_hit(&pkt(1), &Table { id: 2 }, handle);

        assert_eq!(next(&rx).event, Event::TableHit { table_id: 2, handle: 10 });
        assert_eq!(next(&rx).event, Event::TableHit { table_id: 2, handle: 11 });
    }

    #[test]
    fn test_dyn_packet() {
        let (logger, rx) = channel_logger(0);
        let p: &dyn Packet = &pkt(8);
        logger.packet_in(p);
        assert_eq!(next(&rx).packet_id, 8);
    }

    #[test]
    fn test_drops_are_counted_not_surfaced() {
        let (t, rx) = ChannelTransport::bounded(1);
        let logger = EventLogger::new(Box::new(t), 0);

        for _ in 0..5 {
            logger.packet_in(&pkt(1));
        }
        assert_eq!(logger.dropped(), 4);

        drop(rx);
        logger.config_change();
        assert_eq!(logger.dropped(), 5);
    }

    #[test]
    fn test_dummy_logger_accepts_events() {
        let logger = EventLogger::dummy();
        for i in 0..10_000 {
            logger.table_hit(&pkt(i), &Table { id: 1 }, i as u32);
        }
        assert_eq!(logger.dropped(), 0);
        assert_eq!(logger.transport_name(), "dummy");
        assert_eq!(logger.device_id(), 0);
    }

    #[test]
    fn test_rebind_switches_device_and_transport() {
        let first = Recorder::default();
        let second = Recorder::default();
        let logger = EventLogger::new(Box::new(first.clone()), 1);

        logger.packet_in(&pkt(1));
        logger.rebind(Box::new(second.clone()), 7);
        logger.packet_in(&pkt(2));
        logger.packet_out(&pkt(2));

        assert_eq!(logger.device_id(), 7);
        let a = first.decoded();
        let b = second.decoded();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].device_id, 1);
        assert_eq!(b.len(), 2);
        assert!(b.iter().all(|m| m.device_id == 7));
        // clock keeps running across rebinds
        assert_eq!(b[0].sequence, 1);
    }

    #[test]
    fn test_concurrent_publishers() {
        const THREADS: u64 = 8;
        const EVENTS: u64 = 1_000;

        let recorder = Recorder::default();
        let logger = EventLogger::new(Box::new(recorder.clone()), 3);

        std::thread::scope(|s| {
            for t in 0..THREADS {
                let logger = &logger;
                s.spawn(move || {
                    let p = pkt(t);
                    for i in 0..EVENTS {
                        logger.table_hit(&p, &Table { id: t as u32 }, i as u32);
                    }
                });
            }
        });

        let messages = recorder.decoded();
        assert_eq!(messages.len() as u64, THREADS * EVENTS);

        for t in 0..THREADS {
            let mine: Vec<_> = messages.iter().filter(|m| m.packet_id == t).collect();
            assert_eq!(mine.len() as u64, EVENTS);
            assert!(mine.windows(2).all(|w| w[0].sequence < w[1].sequence));
            for (i, m) in mine.iter().enumerate() {
                assert_eq!(
                    m.event,
                    Event::TableHit {
                        table_id: t as u32,
                        handle: i as u32
                    }
                );
            }
        }
    }

    #[test]
    fn test_rebind_races_never_mix_device_ids() {
        let recorder = Recorder::default();
        let logger = EventLogger::new(Box::new(recorder.clone()), 1);

        std::thread::scope(|s| {
            for t in 0..4 {
                let logger = &logger;
                s.spawn(move || {
                    for _ in 0..2_000 {
                        logger.packet_in(&pkt(t));
                    }
                });
            }
            let logger = &logger;
            let recorder = recorder.clone();
            s.spawn(move || {
                for i in 0..200 {
                    let device = if i % 2 == 0 { 2 } else { 1 };
                    logger.rebind(Box::new(recorder.clone()), device);
                }
            });
        });

        let messages = recorder.decoded();
        assert_eq!(messages.len(), 8_000);
        assert!(messages.iter().all(|m| m.device_id == 1 || m.device_id == 2));
    }
}
