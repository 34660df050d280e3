//! Defines the mesh control message header
use super::*;
use anyhow::bail;
use wire_derive::WireSerde;

/// The header in front of every control packet and heartbeat
#[derive(Clone, Debug, PartialEq, Eq, WireSerde)]
pub struct Header {
    /// Fixed value, see [Header::IDENTIFIER]
    pub identifier: u32,
    /// Determines the layout of the following body
    #[wire(as = Int<u8>)]
    pub opcode: Opcode,
    /// The MAC of the sender. Zero when sent by the operator tools.
    pub origin_mac: MacAddr,
}

impl Header {
    /// The serialized length of the header
    pub const LEN: usize = 11;
    /// Byte offset of the opcode within a datagram
    pub const OPCODE_OFFSET: usize = 4;
    /// Marks a datagram as mesh control packet. Little endian on the wire: `CE FA AD DE`.
    pub const IDENTIFIER: u32 = 0xDEADFACE;

    pub fn new(opcode: Opcode, origin_mac: MacAddr) -> Self {
        Self {
            identifier: Self::IDENTIFIER,
            opcode,
            origin_mac,
        }
    }

    /// Fails if the header announces a different opcode than `expected`
    pub fn check_opcode(&self, expected: Opcode) -> Result<()> {
        if self.opcode != expected {
            bail!(
                "Expected opcode {expected}, datagram carries {}",
                self.opcode
            );
        }

        Ok(())
    }

    /// Fails if the identifier is not [Header::IDENTIFIER]
    pub fn check_identifier(&self) -> Result<()> {
        if self.identifier != Self::IDENTIFIER {
            bail!(
                "Unexpected identifier {:#010x}, expected {:#010x}",
                self.identifier,
                Self::IDENTIFIER
            );
        }

        Ok(())
    }
}
