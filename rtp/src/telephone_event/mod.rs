#[cfg(test)]
mod telephone_event_test;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Length of an RFC 2833 telephone-event payload.
pub const TELEPHONE_EVENT_LENGTH: usize = 4;

const END_SHIFT: u8 = 7;
const VOLUME_MASK: u8 = 0x3F;

/// TelephoneEvent is the RTP payload for DTMF digits and other telephony
/// events (RFC 2833 section 2.3).
#[derive(Debug, Eq, PartialEq, Default, Clone)]
pub struct TelephoneEvent {
    /// The event code, 0-15 for DTMF digits.
    pub event: u8,
    /// Set on the final packets of an event.
    pub end_of_event: bool,
    /// Power level of the tone, expressed in dBm0 after dropping the sign.
    pub volume: u8,
    /// Duration of the event so far, in timestamp units.
    pub duration: u16,
}

impl TelephoneEvent {
    /// Unmarshal parses the passed byte slice.
    pub fn unmarshal(raw: &Bytes) -> Result<Self> {
        /*
         *  0                   1                   2                   3
         *  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         * |     event     |E|R| volume    |          duration             |
         * +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
         */
        if raw.len() < TELEPHONE_EVENT_LENGTH {
            return Err(Error::ErrShortPacket);
        }

        let mut buf = raw.clone();
        let event = buf.get_u8();
        let b1 = buf.get_u8();
        let duration = buf.get_u16();

        Ok(TelephoneEvent {
            event,
            end_of_event: (b1 >> END_SHIFT) > 0,
            volume: b1 & VOLUME_MASK,
            duration,
        })
    }

    /// Marshal serializes the event into a freshly allocated buffer.
    pub fn marshal(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TELEPHONE_EVENT_LENGTH);
        buf.put_u8(self.event);

        let mut b1 = self.volume & VOLUME_MASK;
        if self.end_of_event {
            b1 |= 1 << END_SHIFT;
        }
        buf.put_u8(b1);

        buf.put_u16(self.duration);
        buf.freeze()
    }
}
