use std::fmt;

use bytes::Bytes;

use crate::error::Result;

/// Payloader splits a media frame into chunks fit for RTP packet payloads,
/// prepending any payload-format header the codec requires. The `mtu`
/// argument bounds the media bytes per chunk; format headers are added on
/// top of it.
pub trait Payloader: fmt::Debug {
    fn payload(&mut self, mtu: usize, payload: &Bytes) -> Result<Vec<Bytes>>;
    fn clone_to(&self) -> Box<dyn Payloader + Send + Sync>;
}

impl Clone for Box<dyn Payloader + Send + Sync> {
    fn clone(&self) -> Box<dyn Payloader + Send + Sync> {
        self.clone_to()
    }
}
