//! Outbound transports the logger publishes into
//!
//! Every transport is best-effort: a publish either hands the message off or
//! reports it as dropped. None of them block the caller.
//! - [`DummyTransport`] discards everything (the default before `init`)
//! - [`ChannelTransport`] feeds a bounded in-process queue
//! - [`UdpTransport`] sends one datagram per message to a collector

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::config::TransportConfig;
use crate::error::{Error, PublishError, Result};

/// A publish-capable channel shared by every worker thread
pub trait Transport: Send + Sync {
    /// Hand one message to the channel without blocking
    fn publish(&self, msg: &[u8]) -> std::result::Result<(), PublishError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Accepts and discards every message
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyTransport;

impl Transport for DummyTransport {
    fn publish(&self, _msg: &[u8]) -> std::result::Result<(), PublishError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}

/// Bounded in-process queue; a full queue drops the message
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: SyncSender<Vec<u8>>,
}

impl ChannelTransport {
    /// Create the transport together with the receiving end
    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn publish(&self, msg: &[u8]) -> std::result::Result<(), PublishError> {
        self.tx.try_send(msg.to_vec()).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::Full,
            TrySendError::Disconnected(_) => PublishError::Disconnected,
        })
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Non-blocking UDP sender, one datagram per message
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Bind an ephemeral local socket and point it at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let peer = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, "no address resolved")))?;

        let local: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;

        log::debug!("udp transport bound to {} -> {}", socket.local_addr()?, peer);
        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for UdpTransport {
    fn publish(&self, msg: &[u8]) -> std::result::Result<(), PublishError> {
        match self.socket.send(msg) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(PublishError::Full),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => Err(PublishError::Disconnected),
            Err(e) => Err(PublishError::Send(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}

/// Build the transport named by the configuration
pub fn from_config(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    match config {
        TransportConfig::Dummy => Ok(Box::new(DummyTransport)),
        TransportConfig::Udp { address } => Ok(Box::new(UdpTransport::connect(address.as_str())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_dummy_accepts_everything() {
        let t = DummyTransport;
        for _ in 0..1000 {
            assert!(t.publish(&[1, 2, 3]).is_ok());
        }
        assert_eq!(t.name(), "dummy");
    }

    #[test]
    fn test_channel_delivers() {
        let (t, rx) = ChannelTransport::bounded(4);
        t.publish(&[1, 2, 3]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_channel_drops_when_full() {
        let (t, rx) = ChannelTransport::bounded(1);
        t.publish(&[1]).unwrap();
        assert_eq!(t.publish(&[2]), Err(PublishError::Full));

        assert_eq!(rx.try_recv().unwrap(), vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_reports_disconnect() {
        let (t, rx) = ChannelTransport::bounded(1);
        drop(rx);
        assert_eq!(t.publish(&[1]), Err(PublishError::Disconnected));
    }

    #[test]
    fn test_udp_sends_datagram() {
        let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
        collector.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let t = UdpTransport::connect(collector.local_addr().unwrap()).unwrap();
        t.publish(&[9, 8, 7]).unwrap();

        let mut buf = [0u8; 64];
        let n = collector.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[9, 8, 7]);
    }

    #[test]
    fn test_from_config_dummy() {
        let t = from_config(&TransportConfig::Dummy).unwrap();
        assert_eq!(t.name(), "dummy");
    }

    #[test]
    fn test_from_config_bad_address() {
        let result = from_config(&TransportConfig::Udp {
            address: "not an address".to_string(),
        });
        assert!(result.is_err());
    }
}
