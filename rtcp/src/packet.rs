use bytes::Bytes;

use crate::error::{Error, Result};
use crate::goodbye::Goodbye;
use crate::header::{Header, PacketType};
use crate::receiver_report::ReceiverReport;
use crate::sender_report::SenderReport;
use crate::source_description::SourceDescription;

/// Packet represents a single decoded RTCP packet. Types this crate does not
/// model are preserved verbatim as Raw.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Packet {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
    SourceDescription(SourceDescription),
    Goodbye(Goodbye),
    Raw(Bytes),
}

impl Packet {
    pub fn marshal(&self) -> Result<Bytes> {
        match self {
            Packet::SenderReport(sr) => sr.marshal(),
            Packet::ReceiverReport(rr) => rr.marshal(),
            Packet::SourceDescription(sdes) => sdes.marshal(),
            Packet::Goodbye(bye) => bye.marshal(),
            Packet::Raw(raw) => Ok(raw.clone()),
        }
    }
}

/// unmarshal pulls successive RTCP packets from a datagram and returns their
/// parsed representations.
pub fn unmarshal(raw_data: &Bytes) -> Result<Vec<Packet>> {
    let mut packets = vec![];
    let mut offset = 0;

    while offset < raw_data.len() {
        let mut header_buf = raw_data.slice(offset..);
        let header = Header::unmarshal(&mut header_buf)?;

        let packet_len = (header.length as usize + 1) * 4;
        if offset + packet_len > raw_data.len() {
            return Err(Error::PacketTooShort);
        }
        let in_packet = raw_data.slice(offset..offset + packet_len);

        let packet = match header.packet_type {
            PacketType::SenderReport => Packet::SenderReport(SenderReport::unmarshal(&in_packet)?),
            PacketType::ReceiverReport => {
                Packet::ReceiverReport(ReceiverReport::unmarshal(&in_packet)?)
            }
            PacketType::SourceDescription => {
                Packet::SourceDescription(SourceDescription::unmarshal(&in_packet)?)
            }
            PacketType::Goodbye => Packet::Goodbye(Goodbye::unmarshal(&in_packet)?),
            _ => Packet::Raw(in_packet),
        };
        packets.push(packet);

        offset += packet_len;
    }

    if packets.is_empty() {
        return Err(Error::PacketTooShort);
    }

    Ok(packets)
}

/// marshal concatenates a slice of packets into a single datagram.
pub fn marshal(packets: &[Packet]) -> Result<Bytes> {
    let mut out = Vec::new();
    for packet in packets {
        out.extend_from_slice(&packet.marshal()?);
    }
    Ok(Bytes::from(out))
}
