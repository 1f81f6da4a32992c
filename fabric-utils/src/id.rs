//
// Copyright (c) The Fabric Coordinator Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

// Identifiers are rendered and parsed as hexadecimal strings.
macro_rules! hex_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[derive(DeserializeFromStr, SerializeDisplay)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                $name(id)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> $name {
                $name(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:#018x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex(s).map($name)
            }
        }
    };
}

hex_id!(
    /// Identifier of a virtualized routing engine (client).
    ClientId
);
hex_id!(
    /// Identifier of the controller a datapath is attached to.
    ControllerId
);
hex_id!(
    /// Identifier of a physical or virtual switch.
    DatapathId
);
hex_id!(
    /// Identifier of the forwarding plane a datapath port is mapped to.
    DataplaneId
);

/// Error type for identifier parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseIdError(String);

// ===== impl ParseIdError =====

impl std::fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid identifier: {}", self.0)
    }
}

impl std::error::Error for ParseIdError {}

// ===== helper functions =====

fn parse_hex(s: &str) -> Result<u64, ParseIdError> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|_| ParseIdError(s.to_owned()))
}

// ===== unit tests =====
