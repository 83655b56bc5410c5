//! Hardware (MAC) address type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failed to parse a textual MAC address.
#[derive(Debug, Error)]
#[error("invalid MAC address: {0}")]
pub struct MacParseError(String);

/// A 48-bit hardware address, serialized as `aa:bb:cc:dd:ee:ff`.
///
/// The zero value stands in for "no usable address"; the fabric sometimes
/// reports text that does not parse, and callers substitute [`MacAddr::ZERO`]
/// rather than fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// The all-zero address.
    pub const ZERO: MacAddr = MacAddr([0; 6]);

    /// Create an address from raw octets.
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The raw octets.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// True for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    /// Parse `aa:bb:cc:dd:ee:ff` (or `-`-separated) notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut count = 0;

        for part in s.split(sep) {
            if count == 6 {
                return Err(MacParseError(s.to_string()));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError(s.to_string()))?;
            count += 1;
        }

        if count != 6 {
            return Err(MacParseError(s.to_string()));
        }

        Ok(Self(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip() {
        let mac: MacAddr = "00:15:5d:01:02:03".parse().unwrap();
        assert_eq!(mac.octets(), [0x00, 0x15, 0x5d, 0x01, 0x02, 0x03]);
        assert_eq!(mac.to_string(), "00:15:5d:01:02:03");
    }

    #[test]
    fn test_parse_dash_separated() {
        let mac: MacAddr = "00-15-5D-01-02-03".parse().unwrap();
        assert_eq!(mac.to_string(), "00:15:5d:01:02:03");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<MacAddr>().is_err());
        assert!("00:15:5d".parse::<MacAddr>().is_err());
        assert!("00:15:5d:01:02:03:04".parse::<MacAddr>().is_err());
        assert!("zz:15:5d:01:02:03".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_zero_value() {
        assert!(MacAddr::ZERO.is_zero());
        assert_eq!(MacAddr::default(), MacAddr::ZERO);
        assert_eq!(MacAddr::ZERO.to_string(), "00:00:00:00:00:00");
    }

    #[test]
    fn test_serde_as_string() {
        let mac = MacAddr::new([0, 0x15, 0x5d, 1, 2, 3]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:15:5d:01:02:03\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
