//! The "I am alive" heartbeat the nodes send periodically
use super::*;
use crate::types::FirmwareVersion;
use std::net::Ipv4Addr;
use thiserror::Error;
use wire_derive::WireSerde;

/// Exact length of a heartbeat datagram
pub const HEARTBEAT_LEN: usize = 34;
/// Trailing bytes after the body, unused
const RESERVED_LEN: usize = HEARTBEAT_LEN - Header::LEN - IAmAlive::LEN;

/// Heartbeat body. The header of a heartbeat carries the MAC of the transmitting node.
#[derive(Clone, Debug, Default, PartialEq, Eq, WireSerde)]
pub struct IAmAlive {
    pub ip: [u8; 4],
    pub mac: MacAddr,
    pub version: FirmwareVersion,
}

impl IAmAlive {
    pub const LEN: usize = 4 + 6 + 1;
}

impl Msg for IAmAlive {
    const OPCODE: Opcode = Opcode::IAmAlive;
}

/// The contents of one received heartbeat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeartbeatRecord {
    /// The MAC from the header (`own_mac` of the sending node)
    pub transmitting_mac: MacAddr,
    pub reported_ip: Ipv4Addr,
    /// The hardware MAC the node reports in the body
    pub reported_mac: MacAddr,
    pub firmware_version: FirmwareVersion,
}

/// Reasons for a datagram not being a heartbeat
///
/// Stray traffic on the heartbeat port is expected, none of these are worth reporting.
#[derive(Debug, Error)]
pub enum DatagramError {
    #[error("Datagram has {0} bytes, heartbeats have exactly {HEARTBEAT_LEN}")]
    UnexpectedLength(usize),
    #[error("Datagram carries opcode {0:#04x}, expected i-am-alive")]
    UnexpectedOpcode(u8),
    #[error("Malformed heartbeat")]
    Malformed(#[from] anyhow::Error),
}

/// Validates and decodes a heartbeat datagram
///
/// Only the length and the opcode are checked, the identifier and the reserved tail are not
/// looked at.
pub fn decode_heartbeat(buf: &[u8]) -> Result<HeartbeatRecord, DatagramError> {
    if buf.len() != HEARTBEAT_LEN {
        return Err(DatagramError::UnexpectedLength(buf.len()));
    }

    let opcode = buf[Header::OPCODE_OFFSET];
    if opcode != u8::from(Opcode::IAmAlive) {
        return Err(DatagramError::UnexpectedOpcode(opcode));
    }

    let mut des = Deserializer::new(buf);
    let header = Header::deserialize(&mut des)?;
    let body = IAmAlive::deserialize(&mut des)?;
    des.skip(RESERVED_LEN)?;
    des.finish()?;

    Ok(HeartbeatRecord {
        transmitting_mac: header.origin_mac,
        reported_ip: Ipv4Addr::from(body.ip),
        reported_mac: body.mac,
        firmware_version: body.version,
    })
}

/// Encodes a heartbeat the way a node sends it, padded with zeroes to [HEARTBEAT_LEN]
pub fn encode_heartbeat(record: &HeartbeatRecord) -> Result<Vec<u8>> {
    let mut buf = vec![0; HEARTBEAT_LEN];

    let mut ser = Serializer::new(&mut buf);
    Header::new(Opcode::IAmAlive, record.transmitting_mac).serialize(&mut ser)?;
    IAmAlive {
        ip: record.reported_ip.octets(),
        mac: record.reported_mac,
        version: record.firmware_version,
    }
    .serialize(&mut ser)?;
    ser.zeroes(RESERVED_LEN)?;

    Ok(buf)
}

#[cfg(test)]
mod test {
    use super::*;

    fn record() -> HeartbeatRecord {
        HeartbeatRecord {
            transmitting_mac: MacAddr::new([0xB0, 0x7F, 0x8D, 0x77, 0x1E, 0x84]),
            reported_ip: Ipv4Addr::new(192, 168, 1, 45),
            reported_mac: MacAddr::new([0x00, 0x08, 0xDC, 0x01, 0x02, 0x03]),
            firmware_version: 7,
        }
    }

    #[test]
    fn layout() {
        let buf = encode_heartbeat(&record()).unwrap();

        assert_eq!(HEARTBEAT_LEN, buf.len());
        assert_eq!(&buf[0..4], &[0xCE, 0xFA, 0xAD, 0xDE]);
        assert_eq!(0x02, buf[4]);
        assert_eq!(&buf[5..11], &[0xB0, 0x7F, 0x8D, 0x77, 0x1E, 0x84]);
        assert_eq!(&buf[11..15], &[192, 168, 1, 45]);
        assert_eq!(&buf[15..21], &[0x00, 0x08, 0xDC, 0x01, 0x02, 0x03]);
        assert_eq!(7, buf[21]);
        assert_eq!(&buf[22..34], &[0; 12]);

        assert_eq!(record(), decode_heartbeat(&buf).unwrap());
    }

    #[test]
    fn header_and_tail_are_not_validated() {
        let mut buf = encode_heartbeat(&record()).unwrap();
        buf[0..4].copy_from_slice(&[0x11, 0x22, 0x33, 0x44]);
        buf[22..34].copy_from_slice(&[0xAA; 12]);

        assert_eq!(record(), decode_heartbeat(&buf).unwrap());
    }

    #[test]
    fn wrong_length() {
        let buf = encode_heartbeat(&record()).unwrap();

        for len in [0, 4, 22, 33] {
            assert!(matches!(
                decode_heartbeat(&buf[..len]),
                Err(DatagramError::UnexpectedLength(l)) if l == len
            ));
        }

        let mut long = buf.clone();
        long.push(0);
        assert!(matches!(
            decode_heartbeat(&long),
            Err(DatagramError::UnexpectedLength(35))
        ));
    }

    #[test]
    fn wrong_opcode() {
        let mut buf = encode_heartbeat(&record()).unwrap();

        for opcode in [0x00, 0x01, 0x03, 0x04, 0xFF] {
            buf[4] = opcode;
            assert!(matches!(
                decode_heartbeat(&buf),
                Err(DatagramError::UnexpectedOpcode(o)) if o == opcode
            ));
        }
    }
}
