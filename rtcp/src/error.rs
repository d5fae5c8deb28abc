use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("packet too short to be read")]
    PacketTooShort,
    #[error("invalid header version")]
    BadVersion,
    #[error("wrong packet type")]
    WrongType,
    #[error("invalid header")]
    InvalidHeader,
    #[error("sdes must be < 255 octets long")]
    SdesTextTooLong,

    #[error("{0}")]
    Other(String),
}
