use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no local tracks to include in the offer")]
    NoLocalTracks,
    #[error("no remote description has been set")]
    NoRemoteDescription,
    #[error("a track of the same kind and locality already exists")]
    DuplicateTrack,
    #[error("no sending format available for the media kind")]
    MissingSendingFormat,
    #[error("no free even port for an RTP channel")]
    NoAvailablePort,

    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Rtp(#[from] rtp::Error),
    #[error("{0}")]
    Rtcp(#[from] rtcp::Error),
    #[error("{0}")]
    Sdp(#[from] sdp::Error),

    #[error("{0}")]
    Other(String),
}
