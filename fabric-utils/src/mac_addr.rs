//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

// 48-bit hardware address of a client port or a datapath port.
//
// Serialized in its textual form so that it can appear in CSV files and JSON
// messages alike.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(DeserializeFromStr, SerializeDisplay)]
pub struct MacAddr([u8; 6]);

/// Error type for MAC address parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseMacAddrError;

// ===== impl MacAddr =====

impl MacAddr {
    pub const BROADCAST: Self = Self([0xff; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl From<MacAddr> for u64 {
    fn from(addr: MacAddr) -> u64 {
        addr.0.iter().fold(0, |acc, byte| (acc << 8) | u64::from(*byte))
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    // Accepts both colon-separated and hyphen-separated notations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(separator);
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(ParseMacAddrError)?;
            if part.is_empty() || part.len() > 2 {
                return Err(ParseMacAddrError);
            }
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| ParseMacAddrError)?;
        }
        if parts.next().is_some() {
            return Err(ParseMacAddrError);
        }

        Ok(MacAddr(bytes))
    }
}

// ===== impl ParseMacAddrError =====

impl std::fmt::Display for ParseMacAddrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid MAC address format")
    }
}

impl std::error::Error for ParseMacAddrError {}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac_addr() {
        let addr = MacAddr::new([0x12, 0xa0, 0xa0, 0x0b, 0x00, 0x01]);
        assert_eq!("12:a0:a0:0b:00:01".parse(), Ok(addr));
        assert_eq!("12-A0-A0-0B-00-01".parse(), Ok(addr));
        assert_eq!("ff:ff:ff:ff:ff:ff".parse(), Ok(MacAddr::BROADCAST));
        assert_eq!("12:a0:a0:0b:00".parse::<MacAddr>(), Err(ParseMacAddrError));
        assert_eq!(
            "12:a0:a0:0b:00:01:02".parse::<MacAddr>(),
            Err(ParseMacAddrError)
        );
        assert_eq!("12a0a00b0001".parse::<MacAddr>(), Err(ParseMacAddrError));
        assert_eq!("12:a0:a0:0b:00:1ff".parse::<MacAddr>(), Err(ParseMacAddrError));
    }

    #[test]
    fn test_display_mac_addr() {
        let addr = MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x0a, 0xff]);
        assert_eq!(addr.to_string(), "02:00:00:00:0a:ff");
        assert_eq!(u64::from(addr), 0x0200_0000_0aff);
    }
}
