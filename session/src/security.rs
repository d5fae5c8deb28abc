use std::fmt;

use thiserror::Error;

/// Nonzero status code returned by a failing SRTP/SRTCP transform.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("transform failed with status {0}")]
pub struct TransformError(pub i32);

/// A packet protect/unprotect function. It receives the whole buffer (sized
/// with trailer headroom on the protect side) together with the declared
/// payload length, and returns the length of the transformed payload.
pub type TransformFn =
    Box<dyn Fn(&mut [u8], usize) -> std::result::Result<usize, TransformError> + Send + Sync>;

/// SecurityContext bundles the four transforms a secure session applies on
/// its RTP and RTCP paths. The cryptographic implementation behind the
/// functions is supplied by the caller.
pub struct SecurityContext {
    pub rtp_protect: TransformFn,
    pub rtp_unprotect: TransformFn,
    pub rtcp_protect: TransformFn,
    pub rtcp_unprotect: TransformFn,
}

impl SecurityContext {
    pub fn new(
        rtp_protect: TransformFn,
        rtp_unprotect: TransformFn,
        rtcp_protect: TransformFn,
        rtcp_unprotect: TransformFn,
    ) -> Self {
        SecurityContext {
            rtp_protect,
            rtp_unprotect,
            rtcp_protect,
            rtcp_unprotect,
        }
    }
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContext").finish_non_exhaustive()
    }
}
