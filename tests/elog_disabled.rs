//! Without the `elog` feature call sites vanish, arguments included.
//!
//! Run with `cargo test --no-default-features`.
#![cfg(not(feature = "elog"))]
#![allow(unused_variables, dead_code)]

use std::cell::Cell;

use pktelog::{ChannelTransport, EventLogger, ObjectId, Packet, PacketId, PortId, elog};

struct Pkt {
    id: PacketId,
    reads: Cell<u32>,
}

impl Packet for Pkt {
    fn packet_id(&self) -> PacketId {
        self.reads.set(self.reads.get() + 1);
        self.id
    }
    fn ingress_port(&self) -> PortId {
        self.reads.set(self.reads.get() + 1);
        0
    }
    fn egress_port(&self) -> PortId {
        self.reads.set(self.reads.get() + 1);
        0
    }
}

const TABLE: ObjectId = 3;

#[test]
fn test_macro_is_a_no_op_when_disabled() {
    assert!(!pktelog::ENABLED);

    let (t, rx) = ChannelTransport::bounded(64);
    EventLogger::init(Box::new(t), 7);

    let packet = Pkt {
        id: 1,
        reads: Cell::new(0),
    };
    let evaluated = Cell::new(0);

    for _ in 0..1_000 {
        elog!(packet_in, &packet);
        elog!(table_hit, &packet, &TABLE, {
            evaluated.set(evaluated.get() + 1);
            99
        });
        elog!(config_change);
    }

    assert_eq!(packet.reads.get(), 0);
    assert_eq!(evaluated.get(), 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(EventLogger::get().dropped(), 0);
}
