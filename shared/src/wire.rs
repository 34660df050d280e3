//! (De-)serialization of the fixed layout mesh control datagrams
//!
//! All multi byte integers are little endian, which is what the node firmware uses when it
//! copies its packed structs onto the wire. There are no length prefixes or alignment rules, a
//! message is just its fields written back to back.

use crate::types::MacAddr;
use anyhow::{Result, bail};
use std::array::TryFromSliceError;
use std::marker::PhantomData;
use std::mem::size_of;

// SERIALIZATION

/// Makes a type wire serializable
pub trait Serializable {
    fn serialize(&self, ser: &mut Serializer<'_>) -> Result<()>;
}

/// Serializes `impl Serializable` values into a target buffer
#[derive(Debug)]
pub struct Serializer<'a> {
    /// The target buffer
    target_buf: &'a mut [u8],
    /// The position of the write cursor in the buffer. This equals to the number of bytes written.
    write_pos: usize,
}

macro_rules! fn_serialize_primitive {
    ($P:ident) => {
        pub fn $P(&mut self, v: $P) -> Result<()> {
            self.bytes(&v.to_le_bytes())
        }
    };
}

impl<'a> Serializer<'a> {
    /// Creates a new Serializer writing into the given buffer. The buffer must be big enough to
    /// take all the data.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            target_buf: buf,
            write_pos: 0,
        }
    }

    fn_serialize_primitive!(u8);
    fn_serialize_primitive!(u32);

    /// Serialize a flag as one byte, `0x01` or `0x00`
    pub fn bool(&mut self, v: bool) -> Result<()> {
        self.u8(v as u8)
    }

    /// Serialize the given slice as bytes. This is also the base operation for the other ops.
    pub fn bytes(&mut self, v: &[u8]) -> Result<()> {
        match self
            .target_buf
            .get_mut(self.write_pos..(self.write_pos + v.len()))
        {
            Some(sub) => {
                sub.copy_from_slice(v);
                self.write_pos += v.len();
            }
            None => {
                bail!(
                    "Tried to write {} bytes but target buffer only has {} left",
                    v.len(),
                    self.target_buf.len() - self.write_pos
                );
            }
        }

        Ok(())
    }

    /// Fills with `n` zeroes
    pub fn zeroes(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.u8(0)?;
        }
        Ok(())
    }

    /// The amount of bytes written to the buffer
    pub fn bytes_written(&self) -> usize {
        self.write_pos
    }
}

// DESERIALIZATION

/// Makes a type wire deserializable
pub trait Deserializable {
    fn deserialize(des: &mut Deserializer<'_>) -> Result<Self>
    where
        Self: Sized;
}

/// Deserializes `impl Deserializable` values from a source buffer
#[derive(Debug)]
pub struct Deserializer<'a> {
    /// The part of the source buffer that has not been consumed yet
    source_buf: &'a [u8],
}

macro_rules! fn_deserialize_primitive {
    ($P:ident) => {
        pub fn $P(&mut self) -> Result<$P> {
            let b = self.take(size_of::<$P>())?;
            Ok($P::from_le_bytes(b.try_into()?))
        }
    };
}

impl<'a> Deserializer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { source_buf: buf }
    }

    /// Checks that the whole buffer has been consumed - meant to be called after deserialization
    /// as a sanity check.
    pub fn finish(&self) -> Result<()> {
        let len = self.source_buf.len();
        if len > 0 {
            bail!("Did not consume the whole buffer, {len} bytes are left");
        }

        Ok(())
    }

    fn_deserialize_primitive!(u8);
    fn_deserialize_primitive!(u32);

    /// Deserialize a one byte flag. Every non-zero value counts as set.
    pub fn bool(&mut self) -> Result<bool> {
        Ok(self.u8()? != 0)
    }

    /// Deserialize a block of bytes
    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.take(len)?.to_owned())
    }

    /// Skips `n` bytes
    ///
    /// The opposite of zeroes() in serialization.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n)?;
        Ok(())
    }

    /// Takes the next n bytes from the source buffer, checking that there are enough left.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        match self.source_buf.split_at_checked(n) {
            Some((taken, rest)) => {
                self.source_buf = rest;
                Ok(taken)
            }
            None => {
                bail!(
                    "Unexpected end of source buffer. Needed at least {n}, got {}",
                    self.source_buf.len()
                );
            }
        }
    }
}

// HELPERS

/// Interface for serialization helpers to be used with the `WireSerde` derive macro
///
/// A helper controls how a field is put on the wire when its own [Serializable] implementation
/// is not the right one for a specific message.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, WireSerde)]
/// pub struct ExampleMsg {
///     // Written last byte first
///     #[wire(as = Reversed)]
///     target_mac: MacAddr,
/// }
/// ```
pub trait WireHelper<In> {
    fn serialize_as(data: &In, ser: &mut Serializer<'_>) -> Result<()>;
    fn deserialize_as(des: &mut Deserializer<'_>) -> Result<In>;
}

/// Serialize a [MacAddr] in reverse declaration order
///
/// The target MAC of control packets is compared by the nodes against their own address as it is
/// stored in memory, which is the reverse of the usual notation.
pub struct Reversed;

impl WireHelper<MacAddr> for Reversed {
    fn serialize_as(data: &MacAddr, ser: &mut Serializer<'_>) -> Result<()> {
        ser.bytes(&data.reversed().octets())
    }

    fn deserialize_as(des: &mut Deserializer<'_>) -> Result<MacAddr> {
        Ok(MacAddr::deserialize(des)?.reversed())
    }
}

/// Serialize an arbitrary type as the integer `Out`
///
/// Meant for enums with a fixed numeric representation on the wire.
pub struct Int<Out>(PhantomData<Out>);

impl<In, Out> WireHelper<In> for Int<Out>
where
    In: Into<Out> + TryFrom<Out, Error = anyhow::Error> + Copy,
    Out: Serializable + Deserializable,
{
    fn serialize_as(data: &In, ser: &mut Serializer<'_>) -> Result<()> {
        let o: Out = (*data).into();
        o.serialize(ser)
    }

    fn deserialize_as(des: &mut Deserializer<'_>) -> Result<In> {
        In::try_from(Out::deserialize(des)?)
    }
}

macro_rules! impl_traits_for_primitive {
    ($t:ident) => {
        impl Serializable for $t {
            fn serialize(&self, ser: &mut Serializer<'_>) -> Result<()> {
                ser.$t(*self)
            }
        }

        impl Deserializable for $t {
            fn deserialize(des: &mut Deserializer<'_>) -> Result<Self> {
                des.$t()
            }
        }
    };
}

impl_traits_for_primitive!(u8);
impl_traits_for_primitive!(u32);
impl_traits_for_primitive!(bool);

impl<const SIZE: usize> Serializable for [u8; SIZE] {
    fn serialize(&self, ser: &mut Serializer<'_>) -> Result<()> {
        ser.bytes(self)
    }
}

impl<const SIZE: usize> Deserializable for [u8; SIZE] {
    fn deserialize(des: &mut Deserializer<'_>) -> Result<Self> {
        des.take(SIZE)
            .and_then(|e| e.try_into().map_err(TryFromSliceError::into))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut buf = vec![0; 1 + 4 + 1];

        let mut ser = Serializer::new(&mut buf);
        ser.u8(0xAB).unwrap();
        ser.u32(0xDEADFACE).unwrap();
        ser.bool(true).unwrap();
        assert_eq!(6, ser.bytes_written());

        assert_eq!(buf, [0xAB, 0xCE, 0xFA, 0xAD, 0xDE, 0x01]);

        let mut des = Deserializer::new(&buf);
        assert_eq!(0xAB, des.u8().unwrap());
        assert_eq!(0xDEADFACE, des.u32().unwrap());
        assert!(des.bool().unwrap());

        assert!(des.u8().is_err());
        des.finish().unwrap();
    }

    #[test]
    fn bool_accepts_any_non_zero_byte() {
        let buf = [0x00, 0x01, 0x7F];
        let mut des = Deserializer::new(&buf);

        assert!(!des.bool().unwrap());
        assert!(des.bool().unwrap());
        assert!(des.bool().unwrap());
    }

    #[test]
    fn reversed_mac() {
        let mac = MacAddr::new([0xB0, 0x25, 0xEE, 0x73, 0xEF, 0xF4]);
        let mut buf = vec![0; 6];

        let mut ser = Serializer::new(&mut buf);
        Reversed::serialize_as(&mac, &mut ser).unwrap();
        assert_eq!(buf, [0xF4, 0xEF, 0x73, 0xEE, 0x25, 0xB0]);

        let mut des = Deserializer::new(&buf);
        assert_eq!(mac, Reversed::deserialize_as(&mut des).unwrap());
        des.finish().unwrap();
    }

    #[test]
    fn zeroes_and_skip() {
        let mut buf = vec![0xFF; 5];

        let mut ser = Serializer::new(&mut buf);
        ser.u8(7).unwrap();
        ser.zeroes(4).unwrap();
        assert_eq!(buf, [7, 0, 0, 0, 0]);

        let mut des = Deserializer::new(&buf);
        des.skip(1).unwrap();
        assert_eq!(vec![0, 0, 0, 0], des.bytes(4).unwrap());
        des.finish().unwrap();
    }

    #[test]
    fn wrong_buffer_len() {
        let mut buf = vec![0, 1, 2, 3, 4, 5];

        let mut ser = Serializer::new(&mut buf);
        ser.u32(123).unwrap();
        // Write too much
        ser.u32(456).unwrap_err();
        assert_eq!(4, ser.bytes_written());
        ser.zeroes(3).unwrap_err();

        let mut des = Deserializer::new(&buf);
        des.bytes(5).unwrap();
        // Some buffer left
        des.finish().unwrap_err();
        // Consume too much
        des.bytes(2).unwrap_err();
        des.bytes(1).unwrap();
        // Complete buffer consumed
        des.finish().unwrap();
    }
}
