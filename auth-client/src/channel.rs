//! UDP channel: resolve host, connect the first usable address, send/recv with timeout.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use auth_core::DatagramChannel;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, warn};

/// Connected UDP socket. Dropping it closes the socket.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
}

impl UdpChannel {
    /// Resolve `host:port` (IPv4 or IPv6, hostname or literal) and connect to the first
    /// address that accepts a socket, in resolver order.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
        let mut last_err = None;
        for addr in addrs {
            match Self::connect_addr(addr).await {
                Ok(channel) => {
                    debug!(%addr, "socket connected");
                    return Ok(channel);
                }
                Err(e) => {
                    warn!(%addr, error = %e, "attempt at connecting socket failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address resolved for {host}:{port}"),
            )
        }))
    }

    async fn connect_addr(addr: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = match addr {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(addr).await?;
        Ok(Self { socket })
    }
}

impl DatagramChannel for UdpChannel {
    async fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.socket.send(payload).await.map(|_| ())
    }

    async fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        match tokio::time::timeout(timeout, self.socket.recv(buf)).await {
            Ok(res) => res,
            Err(_) => Err(io::Error::from(io::ErrorKind::TimedOut)),
        }
    }
}
