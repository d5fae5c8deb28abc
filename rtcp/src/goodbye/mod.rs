
use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, COUNT_MAX, HEADER_LENGTH, SSRC_LENGTH};
use crate::util::get_padding_size;

/// The Goodbye packet indicates that one or more sources are no longer active.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct Goodbye {
    /// The SSRC/CSRC identifiers that are no longer active.
    pub sources: Vec<u32>,
    /// Optional text indicating the reason for leaving, e.g., "camera
    /// malfunction" or "RTP loop detected".
    pub reason: String,
}

impl fmt::Display for Goodbye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "Goodbye:\n\tSources:\n".to_string();
        for s in &self.sources {
            out += format!("\t{s}\n").as_str();
        }
        out += format!("\tReason: {:?}\n", self.reason).as_str();

        write!(f, "{out}")
    }
}

impl Goodbye {
    /// Header returns the Header associated with this packet.
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.sources.len() as u8,
            packet_type: PacketType::Goodbye,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    fn raw_size(&self) -> usize {
        let mut size = HEADER_LENGTH + self.sources.len() * SSRC_LENGTH;
        if !self.reason.is_empty() {
            size += 1 + self.reason.len();
        }
        size
    }

    pub fn marshal_size(&self) -> usize {
        let raw = self.raw_size();
        raw + get_padding_size(raw)
    }

    pub fn marshal(&self) -> Result<Bytes> {
        /*
         *        0                   1                   2                   3
         *        0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         *       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         *       |V=2|P|    SC   |   PT=BYE=203  |             length            |
         *       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         *       |                           SSRC/CSRC                           |
         *       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         *       :                              ...                              :
         *       +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
         * (opt) |     length    |               reason for leaving            ...
         *       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         */
        if self.sources.len() > COUNT_MAX {
            return Err(Error::InvalidHeader);
        }
        if self.reason.len() > 255 {
            return Err(Error::SdesTextTooLong);
        }

        let mut buf = BytesMut::with_capacity(self.marshal_size());
        self.header().marshal_to(&mut buf)?;

        for source in &self.sources {
            buf.put_u32(*source);
        }

        if !self.reason.is_empty() {
            buf.put_u8(self.reason.len() as u8);
            buf.extend_from_slice(self.reason.as_bytes());
        }

        for _ in 0..get_padding_size(self.raw_size()) {
            buf.put_u8(0);
        }

        Ok(buf.freeze())
    }

    /// Unmarshal decodes a Goodbye from a single RTCP packet.
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Self> {
        let mut buf = raw_packet.clone();
        let header = Header::unmarshal(&mut buf)?;
        if header.packet_type != PacketType::Goodbye {
            return Err(Error::WrongType);
        }
        if buf.remaining() < header.count as usize * SSRC_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let mut sources = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            sources.push(buf.get_u32());
        }

        let reason = if buf.has_remaining() {
            let reason_len = buf.get_u8() as usize;
            if buf.remaining() < reason_len {
                return Err(Error::PacketTooShort);
            }
            String::from_utf8_lossy(&buf.copy_to_bytes(reason_len)).into_owned()
        } else {
            String::new()
        };

        Ok(Goodbye { sources, reason })
    }
}
