//! Producer/consumer process pairs connected by pipes.
//!
//! # Crate Structure
//!
//! - [`channel`] — Pipe endpoints and the fixed-width integer wire codec
//! - [`process`] — Fork-based launcher, producer/consumer routines, and the
//!   single-pair and multi-pair orchestrators
//!
//! ```no_run
//! use forkpair::process::{run_multiple_pairs, PairConfig};
//!
//! let report = run_multiple_pairs(2, PairConfig::default())?;
//! assert_eq!(report.children.len(), 4);
//! # Ok::<(), forkpair::process::OrchestratorError>(())
//! ```

/// Re-export channel types.
pub mod channel {
    pub use forkpair_channel::*;
}

/// Re-export process orchestration types.
pub mod process {
    pub use forkpair_process::*;
}
