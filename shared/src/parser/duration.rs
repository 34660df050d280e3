//! Custom serde and clap parser for time spans (like `"500ms"` or `"2s"`)
//!
//! Meant for the intervals of the repeating commands. A plain number means seconds.

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::Deserializer;
use serde::de::{Unexpected, Visitor};
use std::sync::LazyLock;
use std::time::Duration;

static REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+) *(ms|s|m|h)?$").expect("Regex must be valid"));

const EXPECT_STR: &str = "a positive integer representing a time span in seconds or a string \
     containing a positive integer n with appended time unit in the form \"<n>[ms|s|m|h]\"";

/// Parses a time string in the form `<int>[ms|s|m|h]` into a [Duration]
pub fn parse_optional(input: &str) -> Option<Duration> {
    let captures = REGEX.captures(input.trim())?;
    let number: u64 = captures.get(1)?.as_str().parse().ok()?;

    let duration = match captures.get(2).map(|m| m.as_str()) {
        Some("ms") => Duration::from_millis(number),
        Some("s") | None => Duration::from_secs(number),
        Some("m") => Duration::from_secs(number.checked_mul(60)?),
        Some("h") => Duration::from_secs(number.checked_mul(60 * 60)?),
        Some(_) => return None,
    };

    Some(duration)
}

/// Parses a time string in the form `<int>[ms|s|m|h]` into a [Duration]
///
/// Usable as clap `value_parser`.
pub fn parse(input: &str) -> Result<Duration> {
    parse_optional(input).ok_or_else(|| anyhow!("'{input}' is not {EXPECT_STR}"))
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str(EXPECT_STR)
    }

    fn visit_str<E>(self, input: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        parse_optional(input).ok_or_else(|| E::invalid_value(Unexpected::Str(input), &self))
    }

    fn visit_u64<E>(self, input: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Duration::from_secs(input))
    }

    // TOML integers always arrive as i64
    fn visit_i64<E>(self, input: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let secs: u64 = input
            .try_into()
            .map_err(|_| E::invalid_value(Unexpected::Signed(input), &self))?;

        Ok(Duration::from_secs(secs))
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
    de.deserialize_any(DurationVisitor)
}

/// Deserialize an `Option<Duration>`, for config fields that may be left out
pub mod optional {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        super::deserialize(de).map(Some)
    }
}
