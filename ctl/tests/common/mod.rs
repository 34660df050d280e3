//! A simulated mesh node on the loopback interface

#![allow(dead_code)]

pub use ctl::config::{Command, Config, LedState, LogTarget, TargetArgs};
pub use shared::address_book::{AddressBook, Topology};
pub use shared::msg::*;
pub use shared::types::MacAddr;
use std::net::{Ipv4Addr, SocketAddr};
pub use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Receives control packets like a node would and decides whether they address it
pub struct NodeDummy {
    pub mac: MacAddr,
    sock: UdpSocket,
}

impl NodeDummy {
    pub async fn run(mac: MacAddr) -> Self {
        let sock = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        Self { mac, sock }
    }

    pub fn addr(&self) -> SocketAddr {
        self.sock.local_addr().unwrap()
    }

    /// Waits for the next control packet and decodes it. Panics if none arrives within a second.
    pub async fn recv(&self) -> (Vec<u8>, ControlCommand) {
        let mut buf = vec![0; 4096];
        let n = timeout(Duration::from_secs(1), self.sock.recv(&mut buf))
            .await
            .expect("No control packet received")
            .unwrap();
        buf.truncate(n);

        let (header, cmd) = deserialize_control(&buf).unwrap();
        assert_eq!(MacAddr::ZERO, header.origin_mac);

        (buf, cmd)
    }

    /// Sends a heartbeat with this nodes MAC as transmitting MAC
    pub async fn send_heartbeat(&self, to: SocketAddr, reported_mac: MacAddr, version: u8) {
        let buf = encode_heartbeat(&HeartbeatRecord {
            transmitting_mac: self.mac,
            reported_ip: Ipv4Addr::LOCALHOST,
            reported_mac,
            firmware_version: version,
        })
        .unwrap();

        self.sock.send_to(&buf, to).await.unwrap();
    }
}

/// A config sending all control packets to `node`
pub fn config(topology: Topology, node: &NodeDummy, command: Command) -> Config {
    Config {
        address_book: AddressBook::for_topology(topology),
        command_addr: node.addr(),
        heartbeat_addr: (Ipv4Addr::LOCALHOST, 0).into(),
        log_target: LogTarget::Std,
        log_level: log::LevelFilter::Warn,
        dfu_interval: Duration::from_millis(1),
        blink_interval: Duration::from_secs(1),
        command,
    }
}
