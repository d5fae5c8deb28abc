use std::fmt;

use rtp::sequence::{new_random_sequencer, Sequencer};
use sdp::direction::Direction;

use crate::format::MediaFormat;

/// MediaKind tags a track as carrying audio or video.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        };
        write!(f, "{s}")
    }
}

impl MediaKind {
    /// Maps an SDP media token to a kind.
    pub fn from_media(raw: &str) -> Option<Self> {
        match raw {
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// StreamStatus is the negotiated transmission direction of a track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl StreamStatus {
    pub fn to_direction(self) -> Direction {
        match self {
            StreamStatus::SendRecv => Direction::SendRecv,
            StreamStatus::SendOnly => Direction::SendOnly,
            StreamStatus::RecvOnly => Direction::RecvOnly,
            StreamStatus::Inactive => Direction::Inactive,
        }
    }

    pub fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::SendOnly => StreamStatus::SendOnly,
            Direction::RecvOnly => StreamStatus::RecvOnly,
            Direction::Inactive => StreamStatus::Inactive,
            Direction::SendRecv | Direction::Unknown => StreamStatus::SendRecv,
        }
    }
}

/// Track holds the send or receive state of one media stream.
#[derive(Debug)]
pub struct Track {
    pub kind: MediaKind,
    pub is_remote: bool,
    /// For local tracks a random 31-bit value; for remote tracks 0 until the
    /// first packet or report from the peer reveals it.
    pub ssrc: u32,
    pub timestamp: u32,
    /// The SDP `mid` attribute, when used.
    pub media_id: Option<String>,
    /// Supported formats in priority order, the first entry is preferred.
    pub capabilities: Vec<MediaFormat>,
    pub stream_status: StreamStatus,
    sequencer: Box<dyn Sequencer + Send + Sync>,
}

impl Track {
    /// Creates a local (sending) track with a random SSRC, sequence number
    /// and timestamp base.
    pub fn new(kind: MediaKind, capabilities: Vec<MediaFormat>) -> Self {
        let mut ssrc = 0;
        while ssrc == 0 {
            ssrc = rand::random::<u32>() & 0x7FFF_FFFF;
        }

        Track {
            kind,
            is_remote: false,
            ssrc,
            timestamp: rand::random::<u32>(),
            media_id: None,
            capabilities,
            stream_status: StreamStatus::default(),
            sequencer: Box::new(new_random_sequencer()),
        }
    }

    /// Creates a remote (receiving) track. The SSRC stays 0 until learned.
    pub fn remote(kind: MediaKind, capabilities: Vec<MediaFormat>) -> Self {
        Track {
            kind,
            is_remote: true,
            ssrc: 0,
            timestamp: 0,
            media_id: None,
            capabilities,
            stream_status: StreamStatus::default(),
            sequencer: Box::new(new_random_sequencer()),
        }
    }

    pub fn with_media_id(mut self, media_id: &str) -> Self {
        self.media_id = Some(media_id.to_owned());
        self
    }

    /// Replaces the sequence number source, for deterministic tests.
    pub fn set_sequencer(&mut self, sequencer: Box<dyn Sequencer + Send + Sync>) {
        self.sequencer = sequencer;
    }

    pub fn next_sequence_number(&self) -> u16 {
        self.sequencer.next_sequence_number()
    }

    /// The preferred sending format, i.e. the head of the capability list.
    pub fn format(&self) -> Option<&MediaFormat> {
        self.capabilities.first()
    }

    pub fn telephone_event_format(&self) -> Option<&MediaFormat> {
        self.capabilities.iter().find(|f| f.is_telephone_event())
    }

    /// Whether the packet's payload type is one of the track's capabilities.
    pub fn has_payload_type(&self, payload_type: u8) -> bool {
        self.capabilities
            .iter()
            .any(|f| f.payload_type == payload_type)
    }
}
