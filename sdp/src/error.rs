use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("sdp: invalid syntax `{0}`")]
    SdpInvalidSyntax(String),
    #[error("sdp: invalid value `{0}`")]
    SdpInvalidValue(String),
    #[error("sdp: empty description")]
    SdpEmpty,
}
