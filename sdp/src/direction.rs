use std::fmt;

/// Direction is a marker for the transmission direction of an endpoint.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Direction {
    #[default]
    Unknown,
    /// Bidirectional communication.
    SendRecv,
    /// Outgoing communication only.
    SendOnly,
    /// Incoming communication only.
    RecvOnly,
    /// No communication.
    Inactive,
}

pub const DIRECTION_SEND_RECV_STR: &str = "sendrecv";
pub const DIRECTION_SEND_ONLY_STR: &str = "sendonly";
pub const DIRECTION_RECV_ONLY_STR: &str = "recvonly";
pub const DIRECTION_INACTIVE_STR: &str = "inactive";

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::SendRecv => DIRECTION_SEND_RECV_STR,
            Direction::SendOnly => DIRECTION_SEND_ONLY_STR,
            Direction::RecvOnly => DIRECTION_RECV_ONLY_STR,
            Direction::Inactive => DIRECTION_INACTIVE_STR,
            Direction::Unknown => "",
        };
        write!(f, "{s}")
    }
}

impl Direction {
    /// Creates a direction from a raw attribute key.
    pub fn new(raw: &str) -> Self {
        match raw {
            DIRECTION_SEND_RECV_STR => Direction::SendRecv,
            DIRECTION_SEND_ONLY_STR => Direction::SendOnly,
            DIRECTION_RECV_ONLY_STR => Direction::RecvOnly,
            DIRECTION_INACTIVE_STR => Direction::Inactive,
            _ => Direction::Unknown,
        }
    }
}
