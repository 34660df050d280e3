use anyhow::{Result, anyhow};
use regex::Regex;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use std::sync::LazyLock;

/// A 6 byte hardware address, stored in the usual notation order (`B0:25:EE:73:EF:F4` is
/// `[0xB0, 0x25, 0xEE, 0x73, 0xEF, 0xF4]`).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct MacAddr([u8; 6]);

static REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-fA-F]{2})[:-]?([0-9a-fA-F]{2})[:-]?([0-9a-fA-F]{2})[:-]?([0-9a-fA-F]{2})[:-]?([0-9a-fA-F]{2})[:-]?([0-9a-fA-F]{2})$")
        .expect("Regex must be valid")
});

impl MacAddr {
    /// The all zero address. Used as placeholder in broadcast packets.
    pub const ZERO: Self = Self([0; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The same address with its byte order reversed
    pub fn reversed(&self) -> Self {
        let mut octets = self.0;
        octets.reverse();
        Self(octets)
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for MacAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Debug for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

impl FromStr for MacAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = REGEX
            .captures(s.trim())
            .ok_or_else(|| anyhow!("invalid MAC address '{s}': expected six hex octets like B0:25:EE:73:EF:F4"))?;

        let mut octets = [0u8; 6];
        for (i, o) in octets.iter_mut().enumerate() {
            // The regex guarantees exactly two hex digits per group
            *o = u8::from_str_radix(&captures[i + 1], 16)?;
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
