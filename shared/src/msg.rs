//! Mesh control network message definitions
//!
//! Every datagram starts with a [Header] carrying the fixed identifier, the [Opcode] and the
//! origin MAC, followed by the opcode specific body. Bodies implement [Msg].

use crate::types::MacAddr;
use crate::wire::*;
use anyhow::{Context, Result};
use std::fmt::Debug;

mod control;
mod header;
mod heartbeat;

pub use control::*;
pub use header::Header;
pub use heartbeat::*;

/// Size of the scratch buffer messages are serialized into. Bigger than any known message.
const SERIALIZE_BUF_LEN: usize = 64;

/// The command code at offset 4 of every datagram
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Reset,
    IAmAlive,
    DfuTrigger,
    LedSet,
}

impl_enum_to_int!(Opcode,
    Reset => 0x01,
    IAmAlive => 0x02,
    DfuTrigger => 0x03,
    LedSet => 0x04
);

impl_enum_user_str! {Opcode,
    Opcode::Reset => "reset",
    Opcode::IAmAlive => "i-am-alive",
    Opcode::DfuTrigger => "dfu-trigger",
    Opcode::LedSet => "led-set",
}

/// A mesh control message body
///
/// A struct that implements `Msg` is the part of a datagram following the [Header]. The opcode
/// written into the header is taken from `OPCODE`.
pub trait Msg: Serializable + Deserializable + Debug {
    const OPCODE: Opcode;
}

/// Serializes a complete datagram (header + body) with a zeroed origin MAC, as the operator
/// tools send it.
pub fn serialize<M: Msg>(msg: &M) -> Result<Vec<u8>> {
    serialize_with_origin(msg, MacAddr::ZERO)
}

/// Serializes a complete datagram (header + body) with the given origin MAC in the header.
///
/// Nodes put their own MAC there.
pub fn serialize_with_origin<M: Msg>(msg: &M, origin_mac: MacAddr) -> Result<Vec<u8>> {
    let mut buf = vec![0; SERIALIZE_BUF_LEN];

    let mut ser = Serializer::new(&mut buf);
    Header::new(M::OPCODE, origin_mac)
        .serialize(&mut ser)
        .context("Header serialization failed")?;
    msg.serialize(&mut ser)
        .with_context(|| format!("{} body serialization failed", M::OPCODE))?;

    let written = ser.bytes_written();
    buf.truncate(written);

    Ok(buf)
}

/// Deserializes the header and a body of the expected type, requiring the whole buffer to be
/// consumed.
pub fn deserialize<M: Msg>(buf: &[u8]) -> Result<(Header, M)> {
    let mut des = Deserializer::new(buf);

    let header = Header::deserialize(&mut des).context("Header deserialization failed")?;
    header.check_opcode(M::OPCODE)?;

    let msg = M::deserialize(&mut des)
        .with_context(|| format!("{} body deserialization failed", M::OPCODE))?;
    des.finish()?;

    Ok((header, msg))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opcode_conversion() {
        assert_eq!(Opcode::Reset, Opcode::try_from(0x01u8).unwrap());
        assert_eq!(Opcode::IAmAlive, Opcode::try_from(0x02u8).unwrap());
        assert_eq!(Opcode::DfuTrigger, Opcode::try_from(0x03u8).unwrap());
        assert_eq!(Opcode::LedSet, Opcode::try_from(0x04u8).unwrap());
        assert_eq!(0x04, u8::from(Opcode::LedSet));

        assert!(Opcode::try_from(0x00u8).is_err());
        assert!(Opcode::try_from(0x05u8).is_err());

        assert_eq!("dfu-trigger", Opcode::DfuTrigger.to_string());
        assert_eq!(Opcode::LedSet, "LED-SET".parse().unwrap());
    }

    #[test]
    fn deserialize_rejects_other_opcode() {
        let buf = serialize(&Reset::new(Target::Broadcast)).unwrap();
        assert!(deserialize::<DfuTrigger>(&buf).is_err());
        assert!(deserialize::<Reset>(&buf).is_ok());
    }

    #[test]
    fn deserialize_rejects_trailing_bytes() {
        let mut buf = serialize(&Reset::new(Target::Broadcast)).unwrap();
        buf.push(0);
        assert!(deserialize::<Reset>(&buf).is_err());
    }
}
