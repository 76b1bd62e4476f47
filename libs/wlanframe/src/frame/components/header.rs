use super::{FrameControl, MacAddress, SequenceControl};

/// The fixed prefix of the radio metadata header prepended to captured
/// monitor-mode frames. Only the fields needed to validate and skip the
/// header are kept; field extraction (signal, channel) is left to the
/// caller's radiotap field parser.
#[derive(Clone, Copy, Debug)]
pub struct RadioHeader {
    /// Header revision, must be 0.
    pub version: u8,
    /// Declared total header length, never larger than the buffer.
    pub length: u16,
}

/// The MAC header shared by every parsed frame.
///
/// **Address 1:** The recipient station address.
/// If `to_ds` is set, this is the AP address.
/// If `from_ds` is set then this is the station address.
///
/// **Address 2:** The transmitter station address.
/// If `from_ds` is set, this is the AP address.
/// If `to_ds` is set then this is the station address.
///
/// **Address 3:** Fills whichever role (source/destination) addresses 1
/// and 2 left open.
///
/// **Address 4:** Only present when both `to_ds` and `from_ds` are set
/// (WDS/mesh bridging).
#[derive(Clone, Debug)]
pub struct Dot11Header {
    pub frame_control: FrameControl,
    pub duration: [u8; 2],
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    pub sequence_control: SequenceControl,
    pub address_4: Option<MacAddress>,
}

impl Dot11Header {
    /// Return the mac address of the sender.
    pub fn src(&self) -> Option<&MacAddress> {
        let frame_control = &self.frame_control;
        if frame_control.to_ds() && frame_control.from_ds() {
            self.address_4.as_ref()
        } else if frame_control.to_ds() {
            Some(&self.address_2)
        } else if frame_control.from_ds() {
            Some(&self.address_3)
        } else {
            Some(&self.address_2)
        }
    }

    /// Return the mac address of the receiver.
    /// A full `ff:ff:..` usually indicates an undirected broadcast.
    pub fn dest(&self) -> &MacAddress {
        let frame_control = &self.frame_control;
        if frame_control.to_ds() {
            &self.address_3
        } else {
            &self.address_1
        }
    }

    /// The BSSID for this frame, derived from the DS bits.
    /// `None` for WDS frames, where no single address is the BSSID.
    pub fn bssid(&self) -> Option<&MacAddress> {
        let frame_control = &self.frame_control;
        if frame_control.to_ds() && frame_control.from_ds() {
            None
        } else if frame_control.to_ds() {
            Some(&self.address_1)
        } else if frame_control.from_ds() {
            Some(&self.address_2)
        } else {
            Some(&self.address_3)
        }
    }

    /// The non-AP side of the exchange: whichever of transmitter and
    /// recipient is not the BSSID.
    pub fn station(&self) -> Option<&MacAddress> {
        let bssid = self.bssid()?;
        if &self.address_1 == bssid {
            Some(&self.address_2)
        } else {
            Some(&self.address_1)
        }
    }
}
