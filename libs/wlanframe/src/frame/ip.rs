use std::net::IpAddr;

/// IP protocol numbers this library cares to name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl IpProtocol {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            val => IpProtocol::Other(val),
        }
    }

    /// Transport protocols that carry port numbers.
    pub fn has_ports(&self) -> bool {
        matches!(self, IpProtocol::Tcp | IpProtocol::Udp)
    }
}

impl std::fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpProtocol::Icmp => write!(f, "ICMP"),
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Other(val) => write!(f, "IP({val})"),
        }
    }
}

/// A frame captured on a raw-IP link: no radio or MAC layer, the buffer
/// starts directly at the IP header.
#[derive(Clone, Debug)]
pub struct IpFrame {
    pub version: u8,
    pub protocol: IpProtocol,
    pub source: IpAddr,
    pub destination: IpAddr,
    pub source_port: Option<u16>,
    pub destination_port: Option<u16>,
    /// Transport payload left over after the consumed headers.
    pub payload: Vec<u8>,
}
