#[cfg(test)]
mod source_description_test;

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::header::{Header, PacketType, COUNT_MAX, HEADER_LENGTH, SSRC_LENGTH};
use crate::util::get_padding_size;

pub const SDES_TYPE_END: u8 = 0;
pub const SDES_TYPE_CNAME: u8 = 1;

/// A SourceDescriptionChunk associates a CNAME item with a source.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct SourceDescriptionChunk {
    pub source: u32,
    pub cname: String,
}

impl SourceDescriptionChunk {
    fn raw_size(&self) -> usize {
        // source + item type + item length + text + END octet
        SSRC_LENGTH + 2 + self.cname.len() + 1
    }

    fn marshal_size(&self) -> usize {
        let raw = self.raw_size();
        raw + get_padding_size(raw)
    }
}

/// A SourceDescription (SDES) packet describes the sources in an RTP stream.
/// Only the mandatory CNAME item is modelled.
#[derive(Debug, PartialEq, Eq, Default, Clone)]
pub struct SourceDescription {
    pub chunks: Vec<SourceDescriptionChunk>,
}

impl fmt::Display for SourceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "Source Description:\n".to_string();
        for chunk in &self.chunks {
            out += format!("\t{:x}: {}\n", chunk.source, chunk.cname).as_str();
        }
        write!(f, "{out}")
    }
}

impl SourceDescription {
    /// Header returns the Header associated with this packet.
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.chunks.len() as u8,
            packet_type: PacketType::SourceDescription,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }

    pub fn marshal_size(&self) -> usize {
        HEADER_LENGTH
            + self
                .chunks
                .iter()
                .map(|c| c.marshal_size())
                .sum::<usize>()
    }

    pub fn marshal(&self) -> Result<Bytes> {
        /*
         *  0                   1                   2                   3
         *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |V=2|P|    SC   |  PT=SDES=202  |             length            |
         * +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
         * |                          SSRC/CSRC_1                          |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |                           SDES items                          |
         * |                              ...                              |
         * +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
         */
        if self.chunks.len() > COUNT_MAX {
            return Err(Error::InvalidHeader);
        }

        let mut buf = BytesMut::with_capacity(self.marshal_size());
        self.header().marshal_to(&mut buf)?;

        for chunk in &self.chunks {
            if chunk.cname.len() > 255 {
                return Err(Error::SdesTextTooLong);
            }

            buf.put_u32(chunk.source);
            buf.put_u8(SDES_TYPE_CNAME);
            buf.put_u8(chunk.cname.len() as u8);
            buf.extend_from_slice(chunk.cname.as_bytes());
            buf.put_u8(SDES_TYPE_END);
            for _ in 0..get_padding_size(chunk.raw_size()) {
                buf.put_u8(0);
            }
        }

        Ok(buf.freeze())
    }

    /// Unmarshal decodes a SourceDescription from a single RTCP packet.
    /// Items other than CNAME are skipped.
    pub fn unmarshal(raw_packet: &Bytes) -> Result<Self> {
        let mut buf = raw_packet.clone();
        let header = Header::unmarshal(&mut buf)?;
        if header.packet_type != PacketType::SourceDescription {
            return Err(Error::WrongType);
        }

        let mut chunks = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            if buf.remaining() < SSRC_LENGTH {
                return Err(Error::PacketTooShort);
            }
            let source = buf.get_u32();
            let mut cname = String::new();
            let mut consumed = SSRC_LENGTH;

            loop {
                if !buf.has_remaining() {
                    return Err(Error::PacketTooShort);
                }
                let item_type = buf.get_u8();
                consumed += 1;
                if item_type == SDES_TYPE_END {
                    break;
                }

                if !buf.has_remaining() {
                    return Err(Error::PacketTooShort);
                }
                let text_len = buf.get_u8() as usize;
                consumed += 1;
                if buf.remaining() < text_len {
                    return Err(Error::PacketTooShort);
                }
                let text = buf.copy_to_bytes(text_len);
                consumed += text_len;
                if item_type == SDES_TYPE_CNAME {
                    cname = String::from_utf8_lossy(&text).into_owned();
                }
            }

            let padding = get_padding_size(consumed);
            if buf.remaining() < padding {
                return Err(Error::PacketTooShort);
            }
            buf.advance(padding);

            chunks.push(SourceDescriptionChunk { source, cname });
        }

        Ok(SourceDescription { chunks })
    }
}
