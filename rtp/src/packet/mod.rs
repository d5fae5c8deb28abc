
use std::fmt;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::Header;

/// Packet represents an RTP Packet.
#[derive(Debug, Eq, PartialEq, Default, Clone)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "RTP PACKET:\n".to_string();

        out += format!("\tVersion: {}\n", self.header.version).as_str();
        out += format!("\tMarker: {}\n", self.header.marker).as_str();
        out += format!("\tPayload Type: {}\n", self.header.payload_type).as_str();
        out += format!("\tSequence Number: {}\n", self.header.sequence_number).as_str();
        out += format!("\tTimestamp: {}\n", self.header.timestamp).as_str();
        out += format!("\tSSRC: {} ({:x})\n", self.header.ssrc, self.header.ssrc).as_str();
        out += format!("\tPayload Length: {}\n", self.payload.len()).as_str();

        write!(f, "{out}")
    }
}

impl Packet {
    /// Unmarshal parses the passed byte slice and returns a packet.
    /// Padding octets signalled by the P bit are stripped from the payload.
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Self> {
        let mut buf = raw_packet.clone();
        let header = Header::unmarshal(&mut buf)?;

        let mut payload = raw_packet.slice(raw_packet.len() - buf.remaining()..);
        if header.padding {
            if payload.is_empty() {
                return Err(Error::ErrShortPacket);
            }
            let padding_len = payload[payload.len() - 1] as usize;
            if padding_len == 0 || padding_len > payload.len() {
                return Err(Error::ErrBadPadding);
            }
            payload = payload.slice(..payload.len() - padding_len);
        }

        Ok(Packet { header, payload })
    }

    /// MarshalSize returns the size of the packet once marshaled.
    pub fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len()
    }

    /// Marshal serializes the packet into a freshly allocated buffer.
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.marshal_size());
        self.header.marshal_to(&mut buf)?;
        buf.extend_from_slice(&self.payload);
        Ok(buf.freeze())
    }
}
