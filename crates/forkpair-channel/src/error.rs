use std::fmt;

/// Which side of a channel an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Read,
    Write,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Read => f.write_str("read"),
            Endpoint::Write => f.write_str("write"),
        }
    }
}

/// Errors that can occur while creating or using a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The OS refused to create the pipe.
    #[error("failed to create pipe: {0}")]
    Create(std::io::Error),

    /// An I/O error occurred on a channel endpoint.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A send transferred fewer bytes than one full value.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// The peer closed the channel in the middle of a value.
    #[error("partial value at end of stream ({received} of {expected} bytes)")]
    Truncated { received: usize, expected: usize },

    /// The endpoint was already handed off or closed.
    #[error("{0} endpoint already taken")]
    EndpointTaken(Endpoint),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
