use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("RTP header size insufficient")]
    ErrHeaderSizeInsufficient,
    #[error("buffer too small")]
    ErrBufferTooSmall,
    #[error("invalid RTP version")]
    ErrBadVersion,
    #[error("packet is not large enough")]
    ErrShortPacket,
    #[error("padding length exceeds payload")]
    ErrBadPadding,
    #[error("extension_payload must be in 32-bit words")]
    HeaderExtensionPayloadNot32BitWords,

    #[error("{0}")]
    Other(String),
}
