/// Tag number of the RSN information element.
pub const RSN_ELEMENT_ID: u8 = 0x30;

/// The security capabilities advertised in an RSN information element,
/// reduced to what handshake scoring needs: the group cipher, the first
/// pairwise cipher, and the AKM suite list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RsnInformation {
    pub version: u16,
    pub group_cipher: RsnCipherSuite,
    pub pairwise_cipher: RsnCipherSuite,
    pub akm_suites: Vec<RsnAkmSuite>,
}

impl RsnInformation {
    /// Scan a key-data blob for an RSN element and parse it.
    ///
    /// Message 3 of the four-way exchange carries the AP's RSN element in
    /// its key data; other tagged elements may precede it.
    pub fn find_in_key_data(data: &[u8]) -> Option<RsnInformation> {
        let mut offset = 0;
        while offset + 2 <= data.len() {
            let id = data[offset];
            let len = data[offset + 1] as usize;
            let start = offset + 2;
            if start + len > data.len() {
                return None;
            }
            if id == RSN_ELEMENT_ID {
                return parse_rsn_information(&data[start..start + len]).ok();
            }
            offset = start + len;
        }
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RsnCipherSuite {
    None,
    WEP,
    TKIP,
    WRAP,
    #[default]
    CCMP,
    WEP104,
    Unknown(Vec<u8>),
}

impl std::fmt::Display for RsnCipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsnCipherSuite::None => write!(f, "None"),
            RsnCipherSuite::WEP => write!(f, "WEP"),
            RsnCipherSuite::TKIP => write!(f, "TKIP"),
            RsnCipherSuite::WRAP => write!(f, "WRAP"),
            RsnCipherSuite::CCMP => write!(f, "CCMP"),
            RsnCipherSuite::WEP104 => write!(f, "WEP104"),
            RsnCipherSuite::Unknown(_) => write!(f, "Unknown"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RsnAkmSuite {
    #[default]
    PSK,
    EAP,
    PSKFT,
    EAPFT,
    EAP256,
    PSK256,
    SAE,
    SUITEBEAP256,
    Unknown(Vec<u8>),
}

impl std::fmt::Display for RsnAkmSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsnAkmSuite::PSK => write!(f, "PSK"),
            RsnAkmSuite::EAP => write!(f, "EAP"),
            RsnAkmSuite::PSKFT => write!(f, "PSK-FT"),
            RsnAkmSuite::EAPFT => write!(f, "EAP-FT"),
            RsnAkmSuite::EAP256 => write!(f, "EAP-SHA256"),
            RsnAkmSuite::PSK256 => write!(f, "PSK-SHA256"),
            RsnAkmSuite::SAE => write!(f, "SAE"),
            RsnAkmSuite::SUITEBEAP256 => write!(f, "SuiteB-EAP-SHA256"),
            RsnAkmSuite::Unknown(_) => write!(f, "Unknown"),
        }
    }
}

pub fn parse_rsn_information(data: &[u8]) -> Result<RsnInformation, &'static str> {
    if data.len() < 10 {
        return Err("RSN Information data too short");
    }

    let version = u16::from_le_bytes([data[0], data[1]]);

    let group_cipher = parse_cipher_suite(&data[2..6]);

    let pairwise_count = u16::from_le_bytes([data[6], data[7]]) as usize;
    let mut offset = 8;
    if pairwise_count == 0 || data.len() < offset + pairwise_count * 4 + 2 {
        return Err("RSN Information pairwise suite list truncated");
    }
    // Only the first pairwise suite matters for crackability scoring.
    let pairwise_cipher = parse_cipher_suite(&data[offset..offset + 4]);
    offset += pairwise_count * 4;

    let akm_count = u16::from_le_bytes([data[offset], data[offset + 1]]) as usize;
    offset += 2;
    if data.len() < offset + akm_count * 4 {
        return Err("RSN Information AKM suite list truncated");
    }

    let mut akm_suites = Vec::with_capacity(akm_count);
    for _ in 0..akm_count {
        akm_suites.push(parse_akm_suite(&data[offset..offset + 4]));
        offset += 4;
    }

    Ok(RsnInformation {
        version,
        group_cipher,
        pairwise_cipher,
        akm_suites,
    })
}

fn parse_cipher_suite(data: &[u8]) -> RsnCipherSuite {
    match data {
        [0x00, 0x0F, 0xAC, 0x00] => RsnCipherSuite::None,
        [0x00, 0x0F, 0xAC, 0x01] => RsnCipherSuite::WEP,
        [0x00, 0x0F, 0xAC, 0x02] => RsnCipherSuite::TKIP,
        [0x00, 0x0F, 0xAC, 0x03] => RsnCipherSuite::WRAP,
        [0x00, 0x0F, 0xAC, 0x04] => RsnCipherSuite::CCMP,
        [0x00, 0x0F, 0xAC, 0x05] => RsnCipherSuite::WEP104,
        _ => RsnCipherSuite::Unknown(data.to_vec()),
    }
}

fn parse_akm_suite(data: &[u8]) -> RsnAkmSuite {
    match data {
        [0x00, 0x0F, 0xAC, 0x01] => RsnAkmSuite::EAP,
        [0x00, 0x0F, 0xAC, 0x02] => RsnAkmSuite::PSK,
        [0x00, 0x0F, 0xAC, 0x03] => RsnAkmSuite::EAPFT,
        [0x00, 0x0F, 0xAC, 0x04] => RsnAkmSuite::PSKFT,
        [0x00, 0x0F, 0xAC, 0x05] => RsnAkmSuite::EAP256,
        [0x00, 0x0F, 0xAC, 0x06] => RsnAkmSuite::PSK256,
        [0x00, 0x0F, 0xAC, 0x08] => RsnAkmSuite::SAE,
        [0x00, 0x0F, 0xAC, 0x0B] => RsnAkmSuite::SUITEBEAP256,
        _ => RsnAkmSuite::Unknown(data.to_vec()),
    }
}
