#[cfg(test)]
mod format_test;

use std::fmt;

use sdp::media_description::MediaDescription;

/// Payload type ids at or above this value are dynamically assigned
/// (RFC 3551 section 6).
pub const DYNAMIC_PAYLOAD_TYPE_START: u8 = 96;

pub const TELEPHONE_EVENT_NAME: &str = "telephone-event";

/// MediaFormat describes one entry of a track's capability list: a payload
/// type id with its rtpmap encoding and optional fmtp parameters.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MediaFormat {
    pub payload_type: u8,
    pub name: String,
    pub clock_rate: u32,
    /// Number of audio channels, 0 when unspecified.
    pub channels: u16,
    /// The fmtp parameter string, empty when absent.
    pub parameters: String,
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.payload_type, self.rtpmap())
    }
}

impl MediaFormat {
    pub fn new(payload_type: u8, name: &str, clock_rate: u32) -> Self {
        MediaFormat {
            payload_type,
            name: name.to_owned(),
            clock_rate,
            channels: 0,
            parameters: String::new(),
        }
    }

    pub fn pcmu() -> Self {
        MediaFormat::new(0, "PCMU", 8000)
    }

    pub fn pcma() -> Self {
        MediaFormat::new(8, "PCMA", 8000)
    }

    pub fn g722() -> Self {
        MediaFormat::new(9, "G722", 8000)
    }

    pub fn jpeg() -> Self {
        MediaFormat::new(26, "JPEG", 90000)
    }

    pub fn vp8(payload_type: u8) -> Self {
        MediaFormat::new(payload_type, "VP8", 90000)
    }

    pub fn h264(payload_type: u8) -> Self {
        MediaFormat::new(payload_type, "H264", 90000)
    }

    pub fn telephone_event(payload_type: u8) -> Self {
        let mut format = MediaFormat::new(payload_type, TELEPHONE_EVENT_NAME, 8000);
        format.parameters = "0-16".to_owned();
        format
    }

    /// The well known static payload type assignments of RFC 3551 that this
    /// stack can name without an rtpmap attribute.
    pub fn from_static(payload_type: u8) -> Option<Self> {
        match payload_type {
            0 => Some(MediaFormat::pcmu()),
            8 => Some(MediaFormat::pcma()),
            9 => Some(MediaFormat::g722()),
            26 => Some(MediaFormat::jpeg()),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.payload_type >= DYNAMIC_PAYLOAD_TYPE_START
    }

    pub fn is_telephone_event(&self) -> bool {
        self.name.eq_ignore_ascii_case(TELEPHONE_EVENT_NAME)
    }

    /// The rtpmap encoding, e.g. "PCMU/8000" or "opus/48000/2".
    pub fn rtpmap(&self) -> String {
        if self.channels > 1 {
            format!("{}/{}/{}", self.name, self.clock_rate, self.channels)
        } else {
            format!("{}/{}", self.name, self.clock_rate)
        }
    }

    /// Two formats match when their static ids are equal, or, for dynamic
    /// payload types, when name, clock rate and parameters agree
    /// (RFC 3264 section 6.1).
    pub fn matches(&self, other: &MediaFormat) -> bool {
        if !self.is_dynamic() && !other.is_dynamic() {
            return self.payload_type == other.payload_type;
        }

        !self.name.is_empty()
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.clock_rate == other.clock_rate
            && (self.channels == 0 || other.channels == 0 || self.channels == other.channels)
            && (self.parameters.is_empty()
                || other.parameters.is_empty()
                || self.parameters == other.parameters)
    }
}

/// Intersects a local capability list against the formats a remote party
/// announced. Local priority ordering is preserved; the remote id is adopted
/// so both sides agree on the payload type in use.
pub fn intersect(local: &[MediaFormat], remote: &[MediaFormat]) -> Vec<MediaFormat> {
    let mut compatible = vec![];
    for local_format in local {
        if let Some(remote_format) = remote.iter().find(|r| local_format.matches(r)) {
            let mut format = local_format.clone();
            format.payload_type = remote_format.payload_type;
            if format.parameters.is_empty() {
                format.parameters = remote_format.parameters.clone();
            }
            compatible.push(format);
        }
    }
    compatible
}

/// Reads the format list of a media announcement, resolving rtpmap and fmtp
/// attributes. Ids with neither an rtpmap nor a known static assignment are
/// kept by id alone.
pub fn from_media_description(media: &MediaDescription) -> Vec<MediaFormat> {
    let mut formats = vec![];
    for raw_id in &media.formats {
        let payload_type: u8 = match raw_id.parse() {
            Ok(pt) => pt,
            Err(_) => continue,
        };

        let mut format = if let Some(encoding) = media.rtpmap(payload_type) {
            let mut parts = encoding.split('/');
            let name = parts.next().unwrap_or("").to_owned();
            let clock_rate = parts.next().and_then(|c| c.parse().ok()).unwrap_or(0);
            let channels = parts.next().and_then(|c| c.parse().ok()).unwrap_or(0);
            MediaFormat {
                payload_type,
                name,
                clock_rate,
                channels,
                parameters: String::new(),
            }
        } else if let Some(mut known) = MediaFormat::from_static(payload_type) {
            known.payload_type = payload_type;
            known
        } else {
            MediaFormat {
                payload_type,
                name: String::new(),
                clock_rate: 0,
                channels: 0,
                parameters: String::new(),
            }
        };

        if let Some(parameters) = media.fmtp(payload_type) {
            format.parameters = parameters.to_owned();
        }
        formats.push(format);
    }
    formats
}
