
use bytes::Bytes;

use crate::error::Result;
use crate::packetizer::Payloader;

/// AudioPayloader payloads sample-oriented audio codecs (PCMU, PCMA, G722
/// and friends). The codec output carries no payload-format header, so the
/// frame is simply split into mtu-sized chunks.
#[derive(Default, Debug, Copy, Clone)]
pub struct AudioPayloader;

impl Payloader for AudioPayloader {
    fn payload(&mut self, mtu: usize, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.is_empty() || mtu == 0 {
            return Ok(vec![]);
        }

        let mut payloads = vec![];
        let mut offset = 0;
        while offset < payload.len() {
            let end = std::cmp::min(offset + mtu, payload.len());
            payloads.push(payload.slice(offset..end));
            offset = end;
        }

        Ok(payloads)
    }

    fn clone_to(&self) -> Box<dyn Payloader + Send + Sync> {
        Box::new(*self)
    }
}
