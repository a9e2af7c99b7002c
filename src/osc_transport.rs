//! OSC/UDP transport
//!
//! Minimal fire-and-forget send primitive. Datagrams are encoded with
//! rosc and pushed at the target; there is no acknowledgement and no
//! retransmission.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use rosc::{OscMessage, OscPacket, OscType};
use tracing::info;

use crate::error::StreamError;

/// Send primitive the router and scheduler are written against.
///
/// Implementations must not block beyond the kernel's send path; a
/// failure is reported, never retried here.
pub trait Transport: Send {
    fn send(&self, address: &str, args: Vec<OscType>) -> Result<(), StreamError>;
}

/// UDP transport speaking OSC to a single target
pub struct OscTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscTransport {
    /// Bind an ephemeral local socket aimed at `host:port`.
    ///
    /// Construction is the one place transport is allowed to fail hard -
    /// per-message failures later are counted, not raised.
    pub fn new(host: &str, port: u16) -> Result<Self, StreamError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                StreamError::InvalidParameter(format!("cannot resolve target host '{}'", host))
            })?;
        info!("🎛️  OSC transport aimed at {}", target);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Transport for OscTransport {
    fn send(&self, address: &str, args: Vec<OscType>) -> Result<(), StreamError> {
        let packet = OscPacket::Message(OscMessage {
            addr: address.to_string(),
            args,
        });
        let buf = rosc::encoder::encode(&packet)
            .map_err(|e| StreamError::Send(format!("{}: encode failed: {:?}", address, e)))?;
        self.socket
            .send_to(&buf, self.target)
            .map_err(|e| StreamError::Send(format!("{}: {}", address, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_creation() {
        let transport = OscTransport::new("127.0.0.1", 9000);
        assert!(transport.is_ok());
    }

    #[test]
    fn test_send_reaches_a_local_receiver() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(1)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let transport = OscTransport::new("127.0.0.1", port).unwrap();
        transport
            .send("/bone/pelvis/yaw", vec![OscType::Float(12.5)])
            .unwrap();

        let mut buf = [0u8; 1024];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..size]).unwrap();

        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/bone/pelvis/yaw");
                assert_eq!(msg.args, vec![OscType::Float(12.5)]);
            }
            _ => panic!("expected a single message"),
        }
    }
}
