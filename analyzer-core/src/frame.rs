//! Minimal IEEE 802.11 MAC header decoding for captured frames.

use crate::mac::MacAddr;

/// Frame control + duration + three addresses + sequence control.
pub const MAC_HEADER_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Management,
    Control,
    Data,
    Extension,
}

/// Addresses of interest from one frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: FrameKind,
    pub subtype: u8,
    /// Receiver / destination.
    pub addr1: MacAddr,
    /// Transmitter / source.
    pub addr2: MacAddr,
    /// BSSID for management frames.
    pub addr3: MacAddr,
}

impl FrameHeader {
    /// Decodes the fixed header. Returns `None` when the buffer is too short.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < MAC_HEADER_LEN {
            return None;
        }
        // Frame control is little-endian; type sits in bits 2..4, subtype in 4..8.
        let fc = u16::from_le_bytes([buf[0], buf[1]]);
        let kind = match (fc >> 2) & 0b11 {
            0 => FrameKind::Management,
            1 => FrameKind::Control,
            2 => FrameKind::Data,
            _ => FrameKind::Extension,
        };
        Some(Self {
            kind,
            subtype: ((fc >> 4) & 0b1111) as u8,
            addr1: MacAddr::from_slice(buf, 4)?,
            addr2: MacAddr::from_slice(buf, 10)?,
            addr3: MacAddr::from_slice(buf, 16)?,
        })
    }

    /// Station addresses worth tracking: receiver and transmitter, minus the BSSID.
    pub fn station_addresses(&self) -> impl Iterator<Item = MacAddr> + '_ {
        [self.addr1, self.addr2]
            .into_iter()
            .filter(move |a| *a != self.addr3)
    }
}

/// Builds a management frame header, used by the mock capture and tests.
pub fn management_frame(subtype: u8, addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Vec<u8> {
    let fc: u16 = (subtype as u16 & 0b1111) << 4;
    let mut buf = Vec::with_capacity(MAC_HEADER_LEN);
    buf.extend_from_slice(&fc.to_le_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&addr1.octets());
    buf.extend_from_slice(&addr2.octets());
    buf.extend_from_slice(&addr3.octets());
    buf.extend_from_slice(&[0, 0]);
    buf
}

/// Management subtypes used when synthesising frames.
pub mod subtype {
    pub const ASSOC_REQUEST: u8 = 0;
    pub const PROBE_REQUEST: u8 = 4;
    pub const PROBE_RESPONSE: u8 = 5;
    pub const BEACON: u8 = 8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const STA: MacAddr = MacAddr([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const AP: MacAddr = MacAddr([0x0A, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);

    #[test]
    fn decodes_probe_request() {
        let buf = management_frame(subtype::PROBE_REQUEST, MacAddr::BROADCAST, STA, MacAddr::BROADCAST);
        let hdr = FrameHeader::parse(&buf).unwrap();
        assert_eq!(hdr.kind, FrameKind::Management);
        assert_eq!(hdr.subtype, subtype::PROBE_REQUEST);
        assert_eq!(hdr.addr2, STA);
    }

    #[test]
    fn beacon_yields_no_station_besides_broadcast() {
        let buf = management_frame(subtype::BEACON, MacAddr::BROADCAST, AP, AP);
        let hdr = FrameHeader::parse(&buf).unwrap();
        let stations: Vec<_> = hdr.station_addresses().collect();
        assert_eq!(stations, vec![MacAddr::BROADCAST]);
    }

    #[test]
    fn data_frame_kind() {
        let mut buf = management_frame(0, STA, AP, AP);
        buf[0] = 0b0000_1000;
        assert_eq!(FrameHeader::parse(&buf).unwrap().kind, FrameKind::Data);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(FrameHeader::parse(&[0u8; 23]).is_none());
    }
}
