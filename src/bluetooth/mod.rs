//! Bluetooth device identity used to key per-controller state on disk.
use std::{fmt::Display, str::FromStr};

use thiserror::Error;

/// Number of bytes in a bluetooth device address
pub const ADDRESS_SIZE: usize = 6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressParseError {
    #[error("expected an address of the form `XX:XX:XX:XX:XX:XX`, got `{0}`")]
    InvalidFormat(String),
    #[error("invalid hex octet `{0}`")]
    InvalidOctet(String),
}

/// A bluetooth device address. Every connected controller is identified by
/// its address, which indexes its profile and virtual flash image.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Returns the address as 12 lowercase hex digits without separators
    /// (e.g. "a1b2c3d4e5f6"). Used to name per-controller directories.
    pub fn to_hex_string(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Two hex digits per octet plus a colon between each
        if value.len() != 3 * ADDRESS_SIZE - 1 {
            return Err(AddressParseError::InvalidFormat(value.to_string()));
        }

        let octets: Vec<&str> = value.split(':').collect();
        if octets.len() != ADDRESS_SIZE {
            return Err(AddressParseError::InvalidFormat(value.to_string()));
        }

        let mut address = [0; ADDRESS_SIZE];
        for (i, octet) in octets.into_iter().enumerate() {
            if octet.len() != 2 {
                return Err(AddressParseError::InvalidFormat(value.to_string()));
            }
            address[i] = u8::from_str_radix(octet, 16)
                .map_err(|_| AddressParseError::InvalidOctet(octet.to_string()))?;
        }

        Ok(Self(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address: Address = "98:B6:E9:0A:1b:ff".parse().unwrap();
        assert_eq!(address.0, [0x98, 0xb6, 0xe9, 0x0a, 0x1b, 0xff]);
        assert_eq!(address.to_string(), "98:b6:e9:0a:1b:ff");
        assert_eq!(address.to_hex_string(), "98b6e90a1bff");
    }

    #[test]
    fn test_parse_address_rejects_bad_separators() {
        assert!("98-B6-E9-0A-1B-FF".parse::<Address>().is_err());
        assert!("98:B6:E9:0A:1B".parse::<Address>().is_err());
        assert!("98:B6:E9:0A:1B:FG".parse::<Address>().is_err());
        assert!("98:B6:E90:A:1B:FF".parse::<Address>().is_err());
    }
}
