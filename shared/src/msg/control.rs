//! Control packets sent by the operator tools to the nodes
use super::*;
use anyhow::bail;
use std::fmt::Display;
use wire_derive::WireSerde;

/// Which nodes a control packet is meant for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Target {
    /// All nodes. The target MAC on the wire is zeroed and ignored by the nodes.
    #[default]
    Broadcast,
    /// Only the node with the given MAC
    Unicast(MacAddr),
}

impl Target {
    /// Builds a target from the raw wire representation
    pub fn new(is_broadcast: bool, target_mac: MacAddr) -> Self {
        if is_broadcast {
            Self::Broadcast
        } else {
            Self::Unicast(target_mac)
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Broadcast)
    }

    /// The MAC to be put into the target field
    pub fn mac(&self) -> MacAddr {
        match self {
            Self::Broadcast => MacAddr::ZERO,
            Self::Unicast(mac) => *mac,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Broadcast => f.write_str("all nodes"),
            Self::Unicast(mac) => write!(f, "node {mac}"),
        }
    }
}

/// Restarts the addressed nodes
#[derive(Clone, Debug, Default, PartialEq, Eq, WireSerde)]
pub struct Reset {
    pub is_broadcast: bool,
    #[wire(as = Reversed)]
    pub target_mac: MacAddr,
}

impl Reset {
    pub fn new(target: Target) -> Self {
        Self {
            is_broadcast: target.is_broadcast(),
            target_mac: target.mac(),
        }
    }
}

impl Msg for Reset {
    const OPCODE: Opcode = Opcode::Reset;
}

/// Makes the addressed nodes start a firmware update from the sender of this packet
#[derive(Clone, Debug, Default, PartialEq, Eq, WireSerde)]
pub struct DfuTrigger {
    pub is_broadcast: bool,
    #[wire(as = Reversed)]
    pub target_mac: MacAddr,
}

impl DfuTrigger {
    pub fn new(target: Target) -> Self {
        Self {
            is_broadcast: target.is_broadcast(),
            target_mac: target.mac(),
        }
    }
}

impl Msg for DfuTrigger {
    const OPCODE: Opcode = Opcode::DfuTrigger;
}

/// Switches the high power LED of the addressed nodes on or off
#[derive(Clone, Debug, Default, PartialEq, Eq, WireSerde)]
pub struct LedSet {
    pub is_broadcast: bool,
    pub on: bool,
    #[wire(as = Reversed)]
    pub target_mac: MacAddr,
}

impl LedSet {
    pub fn new(target: Target, on: bool) -> Self {
        Self {
            is_broadcast: target.is_broadcast(),
            on,
            target_mac: target.mac(),
        }
    }
}

impl Msg for LedSet {
    const OPCODE: Opcode = Opcode::LedSet;
}

/// Encodes a reset packet. 18 bytes.
pub fn encode_reset(broadcast: bool, target_mac: MacAddr) -> Result<Vec<u8>> {
    serialize(&Reset {
        is_broadcast: broadcast,
        target_mac,
    })
}

/// Encodes a DFU trigger packet. 18 bytes.
pub fn encode_dfu_trigger(broadcast: bool, target_mac: MacAddr) -> Result<Vec<u8>> {
    serialize(&DfuTrigger {
        is_broadcast: broadcast,
        target_mac,
    })
}

/// Encodes a LED set packet. 19 bytes.
pub fn encode_led_set(broadcast: bool, target_mac: MacAddr, on: bool) -> Result<Vec<u8>> {
    serialize(&LedSet {
        is_broadcast: broadcast,
        on,
        target_mac,
    })
}

/// A decoded control packet, as seen by a node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Reset(Reset),
    DfuTrigger(DfuTrigger),
    LedSet(LedSet),
}

impl ControlCommand {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Reset(_) => Opcode::Reset,
            Self::DfuTrigger(_) => Opcode::DfuTrigger,
            Self::LedSet(_) => Opcode::LedSet,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Self::Reset(m) => Target::new(m.is_broadcast, m.target_mac),
            Self::DfuTrigger(m) => Target::new(m.is_broadcast, m.target_mac),
            Self::LedSet(m) => Target::new(m.is_broadcast, m.target_mac),
        }
    }

    /// Whether a node with `own_mac` has to execute this command: either it is broadcast or the
    /// target MAC matches.
    pub fn addresses(&self, own_mac: &MacAddr) -> bool {
        match self.target() {
            Target::Broadcast => true,
            Target::Unicast(mac) => mac == *own_mac,
        }
    }
}

/// Decodes a control packet the way the nodes do
///
/// Fails on a foreign identifier, on an opcode that is not a control command and on a length
/// not matching the opcode.
pub fn deserialize_control(buf: &[u8]) -> Result<(Header, ControlCommand)> {
    let mut des = Deserializer::new(buf);
    let header = Header::deserialize(&mut des).context("Header deserialization failed")?;
    header.check_identifier()?;

    let cmd = match header.opcode {
        Opcode::Reset => ControlCommand::Reset(Reset::deserialize(&mut des)?),
        Opcode::DfuTrigger => ControlCommand::DfuTrigger(DfuTrigger::deserialize(&mut des)?),
        Opcode::LedSet => ControlCommand::LedSet(LedSet::deserialize(&mut des)?),
        Opcode::IAmAlive => bail!("Heartbeats are not control commands"),
    };
    des.finish()?;

    Ok((header, cmd))
}
