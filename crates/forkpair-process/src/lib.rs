//! Producer/consumer pairs coordinated through `fork`, pipes and `waitpid`.
//!
//! Each pair is one producer child writing a contiguous run of integers into a
//! pipe and one consumer child summing them until end-of-stream. The parent
//! only creates channels, spawns children, relinquishes its endpoint copies
//! and collects exit statuses.
//!
//! Unix only: children are created with fork(2).

#[cfg(not(unix))]
compile_error!("forkpair-process requires a Unix target (fork(2))");

pub mod config;
pub mod error;
pub mod launcher;
pub mod orchestrator;
pub mod report;
pub mod routine;

pub use config::{PairConfig, DEFAULT_MAX_PAIRS, DEFAULT_SEND_DELAY, DEFAULT_VALUES_PER_PAIR};
pub use error::{OrchestratorError, Result};
pub use launcher::{
    BoundTask, ChildExit, ChildTask, ForkLauncher, ForkedChild, Launcher, ProcessHandle, Role,
};
pub use orchestrator::{run_multiple_pairs, run_single_pair, Orchestrator};
pub use report::{ChildReport, PairPlan, RunMode, RunReport};
pub use routine::{
    consume, exit_code, produce, ConsumerSummary, ProducerSummary, TaskSummary,
    CHILD_IO_FAILURE, CHILD_PROTOCOL_VIOLATION, CHILD_SUCCESS,
};
