#[cfg(test)]
mod jpeg_test;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::packetizer::Payloader;

pub const JPEG_HEADER_SIZE: usize = 8;

/// JpegPayloader payloads JPEG scan data per RFC 2435. Only the baseline
/// main header is emitted; restart markers and quantization tables are not
/// carried in-band.
#[derive(Default, Debug, Copy, Clone)]
pub struct JpegPayloader {
    /// Q factor, 1-99 for standard tables.
    pub quality: u8,
    /// Frame width in pixels; encoded in units of 8 pixels.
    pub width: u16,
    /// Frame height in pixels; encoded in units of 8 pixels.
    pub height: u16,
}

impl Payloader for JpegPayloader {
    /// Payload fragments a JPEG frame, prefixing each fragment with the
    /// 8-byte main JPEG header carrying the fragment offset.
    fn payload(&mut self, mtu: usize, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.is_empty() || mtu == 0 {
            return Ok(vec![]);
        }

        /*
         * https://tools.ietf.org/html/rfc2435#section-3.1
         *
         *  0                   1                   2                   3
         *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * | Type-specific |              Fragment Offset                  |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |      Type     |       Q       |     Width     |     Height    |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         */
        let mut payloads = vec![];
        let mut offset = 0usize;
        while offset < payload.len() {
            let end = std::cmp::min(offset + mtu, payload.len());

            let mut out = BytesMut::with_capacity(JPEG_HEADER_SIZE + end - offset);
            out.put_u8(0); // type-specific
            out.put_u8((offset >> 16) as u8);
            out.put_u8((offset >> 8) as u8);
            out.put_u8(offset as u8);
            out.put_u8(0); // type
            out.put_u8(self.quality);
            out.put_u8((self.width / 8) as u8);
            out.put_u8((self.height / 8) as u8);
            out.extend_from_slice(&payload[offset..end]);
            payloads.push(out.freeze());

            offset = end;
        }

        Ok(payloads)
    }

    fn clone_to(&self) -> Box<dyn Payloader + Send + Sync> {
        Box::new(*self)
    }
}
