//! Type definitions shared by the wire format, the address book and the tracker

use crate::wire::*;
use anyhow::Result;

mod mac;
pub use mac::*;

/// Identifies a node within a topology: its position in the topology's node list
pub type NodeIndex = u16;
pub type Port = u16;
/// Firmware version as reported by the nodes heartbeat
pub type FirmwareVersion = u8;

/// UDP port the nodes listen on for control packets
pub const COMMAND_PORT: Port = 10000;
/// UDP port the nodes send their heartbeats to
pub const HEARTBEAT_PORT: Port = 10001;

/// A position in the lab floor plan, in millimeters
///
/// Only informational, the protocol does not use it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(from = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Serializable for MacAddr {
    fn serialize(&self, ser: &mut Serializer<'_>) -> Result<()> {
        ser.bytes(self.as_ref())
    }
}

impl Deserializable for MacAddr {
    fn deserialize(des: &mut Deserializer<'_>) -> Result<Self> {
        Ok(Self::new(<[u8; 6]>::deserialize(des)?))
    }
}
