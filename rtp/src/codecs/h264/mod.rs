#[cfg(test)]
mod h264_test;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::packetizer::Payloader;

pub const FUA_HEADER_SIZE: usize = 2;

/// FU indicator octet: F=0, NRI=0, type=28 (FU-A).
pub const FU_INDICATOR: u8 = 0x1C;
/// FU header for the first fragment of a frame (S bit set).
pub const FU_HEADER_START: u8 = 0x89;
/// FU header for middle fragments.
pub const FU_HEADER_MIDDLE: u8 = 0x09;
/// FU header for the final fragment (E bit set). A frame that fits in a
/// single packet also carries this header.
pub const FU_HEADER_END: u8 = 0x49;

/// H264Payloader payloads H264 frames as FU-A fragmentation units.
#[derive(Default, Debug, Copy, Clone)]
pub struct H264Payloader;

impl Payloader for H264Payloader {
    /// Payload fragments a H264 frame across one or more byte arrays.
    fn payload(&mut self, mtu: usize, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.is_empty() || mtu == 0 {
            return Ok(vec![]);
        }

        /*
         * https://tools.ietf.org/html/rfc6184#section-5.8
         *
         *  FU indicator     FU header
         * +---------------+---------------+
         * |0|1|2|3|4|5|6|7|0|1|2|3|4|5|6|7|
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |F|NRI|  Type   |S|E|R|  Type   |
         * +---------------+---------------+
         */
        let mut payloads = vec![];
        let mut offset = 0;
        while offset < payload.len() {
            let end = std::cmp::min(offset + mtu, payload.len());

            let fu_header = if end == payload.len() {
                FU_HEADER_END
            } else if offset == 0 {
                FU_HEADER_START
            } else {
                FU_HEADER_MIDDLE
            };

            let mut out = BytesMut::with_capacity(FUA_HEADER_SIZE + end - offset);
            out.put_u8(FU_INDICATOR);
            out.put_u8(fu_header);
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
