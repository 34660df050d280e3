//! The known mesh nodes of the lab installations
//!
//! An address book maps node indices to MAC addresses (and floor plan positions). It is read only
//! once built and every MAC appears at most once.

use crate::error::TypedError;
use crate::types::{MacAddr, NodeIndex, Position};
use anyhow::Result;
use std::collections::HashSet;

/// One known node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize)]
pub struct AddressBookEntry {
    pub index: NodeIndex,
    pub position: Position,
    pub mac: MacAddr,
}

/// The installations there are built-in address books for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum, serde::Deserialize)]
pub enum Topology {
    /// The 7 node corridor setup, nodes 0 to 6
    #[value(name = "7")]
    #[serde(rename = "7")]
    Seven,
    /// The 21 node office floor setup, nodes 1 to 21
    #[default]
    #[value(name = "21")]
    #[serde(rename = "21")]
    TwentyOne,
}

impl_enum_user_str! {Topology,
    Topology::Seven => "7",
    Topology::TwentyOne => "21",
}

const fn entry(index: NodeIndex, x: i32, y: i32, mac: [u8; 6]) -> AddressBookEntry {
    AddressBookEntry {
        index,
        position: Position { x, y },
        mac: MacAddr::new(mac),
    }
}

static TOPOLOGY_7: [AddressBookEntry; 7] = [
    entry(0, 0, 1210, [0xB0, 0x25, 0xEE, 0x73, 0xEF, 0xF4]),
    entry(1, 4870, 3000, [0xB0, 0x90, 0xD4, 0x2E, 0x18, 0x63]),
    entry(2, 4870, 0, [0xB0, 0xD9, 0x94, 0x4F, 0xD8, 0x52]),
    entry(3, 6670, 3000, [0xB0, 0x55, 0x24, 0xB3, 0x78, 0x66]),
    entry(4, 6670, 0, [0xB0, 0x25, 0x3F, 0xC1, 0xE3, 0x06]),
    entry(5, 9070, 3000, [0xB0, 0x9B, 0x4D, 0x21, 0x50, 0x83]),
    entry(6, 9070, 0, [0xB0, 0x4B, 0xD8, 0x24, 0xF3, 0x3D]),
];

static TOPOLOGY_21: [AddressBookEntry; 21] = [
    entry(1, 14951, 19779, [0xB0, 0xE6, 0xF3, 0x05, 0x8B, 0xEB]),
    entry(2, 12686, 17283, [0xB0, 0x75, 0x7F, 0x01, 0x64, 0x3B]),
    entry(3, 14951, 16776, [0xB0, 0x3A, 0x35, 0x65, 0x2E, 0x03]),
    entry(4, 14951, 13162, [0xB0, 0x73, 0x4A, 0x9E, 0xAA, 0x57]),
    entry(5, 10326, 14918, [0xB0, 0x7F, 0x8D, 0x77, 0x1E, 0x84]),
    entry(6, 7910, 12594, [0xB0, 0xC2, 0xB1, 0x4D, 0xBA, 0xF9]),
    entry(7, 11980, 8875, [0xB0, 0x94, 0x07, 0x73, 0x96, 0x1E]),
    entry(8, 16249, 8875, [0xB0, 0xEB, 0x88, 0x71, 0x90, 0xE8]),
    entry(9, 20497, 11236, [0xB0, 0xCF, 0x4E, 0x01, 0x80, 0xC1]),
    entry(10, 20415, 8875, [0xB0, 0x52, 0x1A, 0x5B, 0x65, 0x94]),
    entry(11, 22806, 8875, [0xB0, 0x46, 0x26, 0xD6, 0x60, 0x14]),
    entry(12, 26490, 11236, [0xB0, 0x74, 0x07, 0xDF, 0x98, 0x60]),
    entry(13, 25823, 8875, [0xB0, 0xB8, 0x11, 0x7D, 0x73, 0x91]),
    entry(14, 30006, 8287, [0xB0, 0xD0, 0x84, 0x8D, 0xDE, 0x7E]),
    entry(15, 17439, 20395, [0xB0, 0xEE, 0x2F, 0x91, 0x30, 0x5A]),
    entry(16, 19792, 20395, [0xB0, 0x25, 0x40, 0x3B, 0x4D, 0xEA]),
    entry(17, 20995, 17366, [0xB0, 0x0A, 0x75, 0xA2, 0xDF, 0x53]),
    entry(18, 24660, 20395, [0xB0, 0x6B, 0x11, 0x96, 0x2B, 0x1D]),
    entry(19, 27065, 20395, [0xB0, 0x32, 0x53, 0x37, 0x27, 0xC5]),
    entry(20, 26418, 17366, [0xB0, 0x0D, 0x1F, 0x3A, 0xF2, 0x01]),
    // Labelled 23 on the device
    entry(21, 24980, 14425, [0xB0, 0x27, 0x10, 0x22, 0x20, 0x0A]),
];

/// An ordered, immutable list of known nodes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressBook {
    entries: Vec<AddressBookEntry>,
}

impl AddressBook {
    /// The built-in address book of an installation
    pub fn for_topology(topology: Topology) -> Self {
        let entries = match topology {
            Topology::Seven => TOPOLOGY_7.as_slice(),
            Topology::TwentyOne => TOPOLOGY_21.as_slice(),
        };

        Self {
            entries: entries.to_vec(),
        }
    }

    /// Builds an address book from custom entries, keeping their order
    ///
    /// Fails if a MAC or an index appears more than once.
    pub fn from_entries(entries: Vec<AddressBookEntry>) -> Result<Self> {
        let mut macs = HashSet::with_capacity(entries.len());
        let mut indices = HashSet::with_capacity(entries.len());

        for e in &entries {
            if !macs.insert(e.mac) {
                return Err(TypedError::value_exists("Node MAC", e.mac).into());
            }
            if !indices.insert(e.index) {
                return Err(TypedError::value_exists("Node index", e.index).into());
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AddressBookEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry with the given node index
    pub fn get(&self, index: NodeIndex) -> Option<&AddressBookEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    /// Like [AddressBook::get], but fails with [TypedError::ValueNotFound] for unknown indices
    pub fn resolve(&self, index: NodeIndex) -> Result<&AddressBookEntry> {
        self.get(index)
            .ok_or_else(|| TypedError::value_not_found("Node index", index).into())
    }

    /// The entry with the given MAC. Scans the entries in order.
    pub fn find_by_mac(&self, mac: &MacAddr) -> Option<&AddressBookEntry> {
        self.entries.iter().find(|e| e.mac == *mac)
    }
}
