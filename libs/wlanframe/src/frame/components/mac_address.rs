use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// This is our representation of a MAC-address
///
/// ```
/// use wlanframe::frame::components::MacAddress;
///
/// let address = MacAddress([255, 255, 255, 255, 255, 255]);
/// println!("{}", address.is_broadcast());
/// // -> true
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Copy, Ord, PartialOrd, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn from_slice(bytes: &[u8]) -> Option<MacAddress> {
        if bytes.len() == 6 {
            let mut arr = [0u8; 6];
            arr.copy_from_slice(bytes);
            Some(MacAddress(arr))
        } else {
            None
        }
    }

    pub fn broadcast() -> Self {
        MacAddress([255, 255, 255, 255, 255, 255])
    }

    pub fn zeroed() -> Self {
        MacAddress([0, 0, 0, 0, 0, 0])
    }

    /// Generate a random unicast, globally administered address.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 6];
        rng.fill(&mut bytes);
        bytes[0] &= 0xFC;
        MacAddress(bytes)
    }

    /// Check if this is a private address (locally set bit)
    pub fn is_private(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Check if this is a multicast address
    pub fn is_mcast(&self) -> bool {
        self.0[0] % 2 == 1
    }

    /// Check whether this MAC addresses the whole network.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [255, 255, 255, 255, 255, 255]
    }

    /// An address that could belong to an actual station: neither
    /// broadcast, zeroed, nor multicast.
    pub fn is_real_device(&self) -> bool {
        !self.is_broadcast() && !self.is_mcast() && self.0 != [0, 0, 0, 0, 0, 0]
    }

    /// Colon-free representation, used in export filenames.
    pub fn to_flat_string(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl FromStr for MacAddress {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err("MAC address must have six octets");
        }
        let mut bytes = [0u8; 6];
        for (idx, part) in parts.iter().enumerate() {
            bytes[idx] = u8::from_str_radix(part, 16).map_err(|_| "Invalid hex octet")?;
        }
        Ok(MacAddress(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_broadcast() {
        let address = MacAddress([255, 255, 255, 255, 255, 255]);
        assert_eq!("FF:FF:FF:FF:FF:FF", address.to_string());
        assert!(address.is_broadcast());
        assert!(!address.is_real_device());
    }

    #[test]
    fn test_roundtrip_from_str() {
        let address: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(address.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(address.to_flat_string(), "AABBCCDDEEFF");
    }

    #[test]
    fn test_random_is_unicast() {
        for _ in 0..32 {
            assert!(!MacAddress::random().is_mcast());
        }
    }
}
