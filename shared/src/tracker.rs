//! Keeps track of the nodes that sent heartbeats and of their firmware versions

use crate::address_book::AddressBook;
use crate::msg::{HeartbeatRecord, decode_heartbeat};
use crate::types::{FirmwareVersion, MacAddr, NodeIndex};
use itertools::Itertools;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// A heartbeat that carried a previously unknown MAC or a higher firmware version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sighting {
    /// The address book index of the transmitting node, if it is known
    pub node: Option<NodeIndex>,
    /// The reported MAC of the node
    pub mac: MacAddr,
    pub version: FirmwareVersion,
    /// The event count after this sighting
    pub count: u64,
    /// All node indices seen so far, ascending
    pub seen: Vec<NodeIndex>,
}

impl Display for Sighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.node.is_some() {
            writeln!(f, "[{}]", self.seen.iter().join(", "))?;
        }
        writeln!(f, "MAC: {} Version: {}", self.mac, self.version)?;
        write!(f, "Count: {}", self.count)
    }
}

/// The heartbeat tracker state
///
/// Meant to be owned by the receive loop. All updates happen through [HeartbeatTracker::ingest]
/// or [HeartbeatTracker::record].
#[derive(Debug)]
pub struct HeartbeatTracker {
    address_book: AddressBook,
    versions: BTreeMap<MacAddr, FirmwareVersion>,
    seen: BTreeSet<NodeIndex>,
    count: u64,
}

impl HeartbeatTracker {
    pub fn new(address_book: AddressBook) -> Self {
        Self {
            address_book,
            versions: BTreeMap::new(),
            seen: BTreeSet::new(),
            count: 0,
        }
    }

    /// Processes a raw datagram
    ///
    /// Datagrams that are not valid heartbeats are dropped without a trace and leave the state
    /// untouched.
    pub fn ingest(&mut self, datagram: &[u8]) -> Option<Sighting> {
        let rec = decode_heartbeat(datagram).ok()?;
        self.record(&rec)
    }

    /// Processes a decoded heartbeat
    ///
    /// Returns a [Sighting] if the reported MAC is new or reports a higher firmware version than
    /// before. Lower or equal versions are ignored.
    pub fn record(&mut self, rec: &HeartbeatRecord) -> Option<Sighting> {
        match self.versions.entry(rec.reported_mac) {
            Entry::Vacant(e) => {
                e.insert(rec.firmware_version);
            }
            Entry::Occupied(mut e) => {
                if rec.firmware_version <= *e.get() {
                    return None;
                }
                e.insert(rec.firmware_version);
            }
        }

        let node = self
            .address_book
            .find_by_mac(&rec.transmitting_mac)
            .map(|e| e.index);
        if let Some(index) = node {
            self.seen.insert(index);
        }

        self.count += 1;

        log::debug!(
            "Heartbeat from {} (node {node:?}, ip {}): version {}",
            rec.transmitting_mac,
            rec.reported_ip,
            rec.firmware_version
        );

        Some(Sighting {
            node,
            mac: rec.reported_mac,
            version: rec.firmware_version,
            count: self.count,
            seen: self.seen.iter().copied().collect(),
        })
    }

    /// The highest firmware version reported for `mac`
    pub fn version_of(&self, mac: &MacAddr) -> Option<FirmwareVersion> {
        self.versions.get(mac).copied()
    }

    pub fn versions(&self) -> &BTreeMap<MacAddr, FirmwareVersion> {
        &self.versions
    }

    /// Node indices seen at least once, ascending
    pub fn seen_nodes(&self) -> &BTreeSet<NodeIndex> {
        &self.seen
    }

    pub fn event_count(&self) -> u64 {
        self.count
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }
}
