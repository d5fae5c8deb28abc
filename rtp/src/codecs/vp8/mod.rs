#[cfg(test)]
mod vp8_test;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::packetizer::Payloader;

pub const VP8_HEADER_SIZE: usize = 1;

/// Payload descriptor for the first packet of a frame: S=1, PID=0.
pub const VP8_START_OF_PARTITION: u8 = 0x10;

/// Vp8Payloader payloads VP8 frames.
#[derive(Default, Debug, Copy, Clone)]
pub struct Vp8Payloader;

impl Payloader for Vp8Payloader {
    /// Payload fragments a VP8 frame across one or more byte arrays.
    fn payload(&mut self, mtu: usize, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.is_empty() || mtu == 0 {
            return Ok(vec![]);
        }

        /*
         * https://tools.ietf.org/html/rfc7741#section-4.2
         *
         *       0 1 2 3 4 5 6 7
         *      +-+-+-+-+-+-+-+-+
         *      |X|R|N|S|R| PID | (REQUIRED)
         *      +-+-+-+-+-+-+-+-+
         *
         *  S: Start of VP8 partition.  SHOULD be set to 1 when the first payload
         *     octet of the RTP packet is the beginning of a new VP8 partition,
         *     and MUST NOT be 1 otherwise.  The S bit MUST be set to 1 for the
         *     first packet of each encoded frame.
         */
        let mut payloads = vec![];
        let mut offset = 0;
        let mut first = true;
        while offset < payload.len() {
            let end = std::cmp::min(offset + mtu, payload.len());

            let mut out = BytesMut::with_capacity(VP8_HEADER_SIZE + end - offset);
            out.put_u8(if first { VP8_START_OF_PARTITION } else { 0x00 });
            out.extend_from_slice(&payload[offset..end]);
            payloads.push(out.freeze());

            first = false;
            offset = end;
        }

        Ok(payloads)
    }

    fn clone_to(&self) -> Box<dyn Payloader + Send + Sync> {
        Box::new(*self)
    }
}
