use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::Error;
use crate::frame::{IpFrame, IpProtocol};

/// Parse a raw IP packet: version, protocol, addresses and, for TCP/UDP,
/// the transport ports.
pub fn parse_ip_packet(input: &[u8]) -> Result<IpFrame, Error> {
    if input.is_empty() {
        return Err(Error::Incomplete("Empty IP packet".to_string()));
    }

    match input[0] >> 4 {
        4 => parse_ipv4(input),
        6 => parse_ipv6(input),
        version => Err(Error::UnhandledProtocol(format!(
            "Unknown IP version {version}"
        ))),
    }
}

fn parse_ipv4(input: &[u8]) -> Result<IpFrame, Error> {
    if input.len() < 20 {
        return Err(Error::Incomplete(
            "IPv4 header needs at least 20 bytes".to_string(),
        ));
    }

    let header_len = ((input[0] & 0x0F) as usize) * 4;
    if header_len < 20 || input.len() < header_len {
        return Err(Error::Failure(
            "IPv4 IHL is inconsistent with the buffer".to_string(),
            input.to_vec(),
        ));
    }

    let protocol = IpProtocol::from_u8(input[9]);
    let source = IpAddr::V4(Ipv4Addr::new(input[12], input[13], input[14], input[15]));
    let destination = IpAddr::V4(Ipv4Addr::new(input[16], input[17], input[18], input[19]));

    let (source_port, destination_port, payload_offset) =
        parse_ports(&input[header_len..], protocol, header_len);

    Ok(IpFrame {
        version: 4,
        protocol,
        source,
        destination,
        source_port,
        destination_port,
        payload: input[payload_offset.min(input.len())..].to_vec(),
    })
}

fn parse_ipv6(input: &[u8]) -> Result<IpFrame, Error> {
    if input.len() < 40 {
        return Err(Error::Incomplete(
            "IPv6 header needs at least 40 bytes".to_string(),
        ));
    }

    let protocol = IpProtocol::from_u8(input[6]);

    let mut src = [0u8; 16];
    src.copy_from_slice(&input[8..24]);
    let mut dst = [0u8; 16];
    dst.copy_from_slice(&input[24..40]);

    let (source_port, destination_port, payload_offset) =
        parse_ports(&input[40..], protocol, 40);

    Ok(IpFrame {
        version: 6,
        protocol,
        source: IpAddr::V6(Ipv6Addr::from(src)),
        destination: IpAddr::V6(Ipv6Addr::from(dst)),
        source_port,
        destination_port,
        payload: input[payload_offset.min(input.len())..].to_vec(),
    })
}

/// TCP and UDP both lead with source and destination port; everything
/// else leaves the ports unset and the payload at the transport offset.
fn parse_ports(
    transport: &[u8],
    protocol: IpProtocol,
    header_len: usize,
) -> (Option<u16>, Option<u16>, usize) {
    if protocol.has_ports() && transport.len() >= 4 {
        let src = u16::from_be_bytes([transport[0], transport[1]]);
        let dst = u16::from_be_bytes([transport[2], transport[3]]);
        (Some(src), Some(dst), header_len + 4)
    } else {
        (None, None, header_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp_packet() -> Vec<u8> {
        let mut buf = vec![0x45, 0x00];
        buf.extend_from_slice(&28u16.to_be_bytes()); // total length
        buf.extend_from_slice(&[0, 0, 0, 0]); // id + flags
        buf.push(64); // ttl
        buf.push(17); // protocol: UDP
        buf.extend_from_slice(&[0, 0]); // checksum
        buf.extend_from_slice(&[192, 168, 1, 10]);
        buf.extend_from_slice(&[192, 168, 1, 1]);
        buf.extend_from_slice(&4500u16.to_be_bytes());
        buf.extend_from_slice(&53u16.to_be_bytes());
        buf.extend_from_slice(&[0, 8, 0, 0]); // udp length + checksum
        buf
    }

    #[test]
    fn test_parse_udp() {
        let frame = parse_ip_packet(&udp_packet()).unwrap();
        assert_eq!(frame.version, 4);
        assert_eq!(frame.protocol, IpProtocol::Udp);
        assert_eq!(frame.source.to_string(), "192.168.1.10");
        assert_eq!(frame.source_port, Some(4500));
        assert_eq!(frame.destination_port, Some(53));
    }

    #[test]
    fn test_short_buffer_is_an_error() {
        assert!(parse_ip_packet(&[0x45, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_unknown_version_is_an_error() {
        assert!(parse_ip_packet(&[0x95; 40]).is_err());
    }
}
