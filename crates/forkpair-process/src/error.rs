use forkpair_channel::ChannelError;

use crate::launcher::Role;

/// Errors that abort an orchestration run.
///
/// Failures inside a child never show up here; they are only visible through
/// that child's exit status.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Creating the channel for a pair failed. No children exist for that pair.
    #[error("pair {pair}: {source}")]
    ChannelCreate { pair: u32, source: ChannelError },

    /// Duplicating the process failed.
    #[error("pair {pair}: failed to spawn {role}: {source}")]
    Spawn {
        pair: u32,
        role: Role,
        source: std::io::Error,
    },

    /// Collecting a child's exit status failed.
    #[error("failed to wait for child {pid}: {source}")]
    Wait { pid: u32, source: std::io::Error },

    /// The requested pair count is outside `1..=max`.
    #[error("pair count {requested} out of range (1..={max})")]
    InvalidPairCount { requested: usize, max: usize },

    /// The integer range of a pair does not fit in an `i32`.
    #[error("pair {pair}: value range overflows i32")]
    RangeOverflow { pair: u32 },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
