//! UDP transport for control packets and heartbeats

use crate::msg::{Msg, serialize};
use crate::tracker::{HeartbeatTracker, Sighting};
use crate::types::{COMMAND_PORT, HEARTBEAT_PORT};
use anyhow::{Context, Result};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;

/// Where control packets are sent to by default: the limited broadcast address
pub const DEFAULT_COMMAND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, COMMAND_PORT));
/// Where heartbeats are received on by default: all interfaces
pub const DEFAULT_HEARTBEAT_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, HEARTBEAT_PORT));

/// Size of the receive buffer. Longer datagrams are truncated, which makes them invalid anyway.
const RECV_BUF_LEN: usize = 4096;

/// Sends control packets from an ephemeral port with broadcasting enabled
#[derive(Debug)]
pub struct CommandSender {
    sock: UdpSocket,
    dest: SocketAddr,
}

impl CommandSender {
    /// Creates a sender for [DEFAULT_COMMAND_ADDR]
    pub async fn new() -> Result<Self> {
        Self::with_dest(DEFAULT_COMMAND_ADDR).await
    }

    /// Creates a sender for an arbitrary destination (e.g. a subnet broadcast address)
    pub async fn with_dest(dest: SocketAddr) -> Result<Self> {
        let bind_addr = match dest {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0)),
        };

        let sock = UdpSocket::bind(bind_addr)
            .await
            .with_context(|| format!("Binding command socket to {bind_addr} failed"))?;
        sock.set_broadcast(true)
            .context("Enabling broadcast on command socket failed")?;

        Ok(Self { sock, dest })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    /// Serializes and sends a control message
    pub async fn send<M: Msg>(&self, msg: &M) -> Result<()> {
        let buf = serialize(msg)?;
        self.send_raw(&buf)
            .await
            .with_context(|| format!("Sending {} failed", M::OPCODE))?;

        log::debug!("Sent {msg:?} to {}", self.dest);
        Ok(())
    }

    /// Sends an already encoded datagram
    pub async fn send_raw(&self, buf: &[u8]) -> Result<()> {
        self.sock
            .send_to(buf, self.dest)
            .await
            .with_context(|| format!("Sending {} bytes to {} failed", buf.len(), self.dest))?;
        Ok(())
    }
}

/// Receives heartbeats and feeds them into a [HeartbeatTracker]
#[derive(Debug)]
pub struct HeartbeatListener {
    sock: UdpSocket,
    tracker: HeartbeatTracker,
    buf: Vec<u8>,
}

impl HeartbeatListener {
    pub async fn bind(addr: SocketAddr, tracker: HeartbeatTracker) -> Result<Self> {
        let sock = UdpSocket::bind(addr)
            .await
            .with_context(|| format!("Binding heartbeat socket to {addr} failed"))?;

        log::info!("Receiving heartbeats on {}", sock.local_addr()?);

        Ok(Self {
            sock,
            tracker,
            buf: vec![0; RECV_BUF_LEN],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.sock.local_addr()?)
    }

    pub fn tracker(&self) -> &HeartbeatTracker {
        &self.tracker
    }

    pub fn into_tracker(self) -> HeartbeatTracker {
        self.tracker
    }

    /// Waits for exactly one datagram and processes it
    ///
    /// Returns `None` if the datagram was no heartbeat or not a new sighting.
    pub async fn recv_next(&mut self) -> Result<Option<Sighting>> {
        let (n, peer) = self
            .sock
            .recv_from(&mut self.buf)
            .await
            .context("Receiving from heartbeat socket failed")?;

        log::trace!("Received {n} bytes from {peer}");

        Ok(self.tracker.ingest(&self.buf[..n]))
    }

    /// Processes datagrams until receiving fails, calling `on_sighting` for every new sighting
    ///
    /// Does not return otherwise. Meant to be cancelled from the outside.
    pub async fn run(&mut self, mut on_sighting: impl FnMut(&Sighting)) -> Result<()> {
        loop {
            if let Some(sighting) = self.recv_next().await? {
                on_sighting(&sighting);
            }
        }
    }
}
