use std::fmt;

use forkpair_process::OrchestratorError;

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CHILD_FAILED: i32 = FAILURE;
pub const SETUP_FAILED: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn orchestrator_error(context: &str, err: OrchestratorError) -> CliError {
    let code = match &err {
        OrchestratorError::InvalidPairCount { .. }
        | OrchestratorError::InvalidConfig(_)
        | OrchestratorError::RangeOverflow { .. } => USAGE,
        OrchestratorError::ChannelCreate { .. } | OrchestratorError::Spawn { .. } => SETUP_FAILED,
        OrchestratorError::Wait { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}
