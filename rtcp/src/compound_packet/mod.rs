#[cfg(test)]
mod compound_packet_test;

use bytes::Bytes;

use crate::error::Result;
use crate::goodbye::Goodbye;
use crate::packet::{self, Packet};
use crate::reception_report::ReceptionReport;

/// A CompoundPacket is a collection of RTCP packets transmitted as a single
/// datagram. An RTCP sender always opens the compound with an SR or RR
/// (RFC 3550 section 6.1).
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct CompoundPacket(pub Vec<Packet>);

impl CompoundPacket {
    pub fn unmarshal(raw_data: &Bytes) -> Result<Self> {
        Ok(CompoundPacket(packet::unmarshal(raw_data)?))
    }

    pub fn marshal(&self) -> Result<Bytes> {
        packet::marshal(&self.0)
    }

    /// The SSRC of the sender of the leading SR or RR, if any.
    pub fn first_ssrc(&self) -> Option<u32> {
        self.0.iter().find_map(|p| match p {
            Packet::SenderReport(sr) => Some(sr.ssrc),
            Packet::ReceiverReport(rr) => Some(rr.ssrc),
            _ => None,
        })
    }

    /// All reception report blocks carried by SRs and RRs in the compound.
    pub fn report_blocks(&self) -> Vec<ReceptionReport> {
        let mut blocks = vec![];
        for p in &self.0 {
            match p {
                Packet::SenderReport(sr) => blocks.extend(sr.reports.iter().cloned()),
                Packet::ReceiverReport(rr) => blocks.extend(rr.reports.iter().cloned()),
                _ => {}
            }
        }
        blocks
    }

    /// The first BYE packet in the compound, if any.
    pub fn bye(&self) -> Option<&Goodbye> {
        self.0.iter().find_map(|p| match p {
            Packet::Goodbye(bye) => Some(bye),
            _ => None,
        })
    }

    pub fn has_bye(&self) -> bool {
        self.bye().is_some()
    }
}
