use std::fmt;
use std::ops::Range;
use std::time::Duration;

use forkpair_channel::{Channel, ChannelError, ReadEnd, WriteEnd};
use serde::Serialize;
use tracing::{error, warn};

use crate::routine::{consume, exit_code, produce, TaskSummary, CHILD_IO_FAILURE};

/// Which half of a pair a child runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ChildExit {
    /// Normal termination with an exit status in `0..=255`.
    Exited(u8),
    /// Killed by a signal.
    Signaled(i32),
    /// A wait status that is neither of the above.
    Unknown(i32),
}

impl ChildExit {
    /// Decode a raw `waitpid` status.
    pub fn from_wait_status(status: libc::c_int) -> Self {
        if libc::WIFEXITED(status) {
            // WEXITSTATUS is already masked to the low 8 bits.
            Self::Exited(libc::WEXITSTATUS(status) as u8)
        } else if libc::WIFSIGNALED(status) {
            Self::Signaled(libc::WTERMSIG(status))
        } else {
            Self::Unknown(status)
        }
    }

    /// The exit status, if the child exited normally.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Exited(code) => Some(*code),
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with status {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
            Self::Unknown(raw) => write!(f, "unknown wait status {raw:#x}"),
        }
    }
}

/// Work handed to a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildTask {
    Producer { values: Range<i32>, delay: Duration },
    Consumer { pair: u32 },
}

impl ChildTask {
    pub fn role(&self) -> Role {
        match self {
            Self::Producer { .. } => Role::Producer,
            Self::Consumer { .. } => Role::Consumer,
        }
    }

    /// Take the endpoint this task needs out of `channel`.
    ///
    /// The other endpoint is left in place for the caller to relinquish.
    pub fn bind(self, channel: &mut Channel) -> Result<BoundTask, ChannelError> {
        match self {
            Self::Producer { values, delay } => Ok(BoundTask::Producer {
                writer: channel.take_writer()?,
                values,
                delay,
            }),
            Self::Consumer { pair } => Ok(BoundTask::Consumer {
                reader: channel.take_reader()?,
                pair,
            }),
        }
    }
}

/// A task that owns its endpoint and is ready to run.
#[derive(Debug)]
pub enum BoundTask {
    Producer {
        writer: WriteEnd,
        values: Range<i32>,
        delay: Duration,
    },
    Consumer {
        reader: ReadEnd,
        pair: u32,
    },
}

impl BoundTask {
    pub fn role(&self) -> Role {
        match self {
            Self::Producer { .. } => Role::Producer,
            Self::Consumer { .. } => Role::Consumer,
        }
    }

    /// Run the routine. The endpoint is closed before this returns.
    pub fn execute(self) -> Result<TaskSummary, ChannelError> {
        match self {
            Self::Producer {
                writer,
                values,
                delay,
            } => produce(writer, values, delay).map(TaskSummary::Producer),
            Self::Consumer { reader, pair } => consume(reader, pair).map(TaskSummary::Consumer),
        }
    }

    /// Run the routine and return the child exit status.
    pub fn run(self) -> i32 {
        let role = self.role();
        let result = self.execute();
        if let Err(err) = &result {
            error!(%role, pid = std::process::id(), %err, "child routine failed");
        }
        exit_code(&result)
    }
}

/// A spawned child that can be waited on exactly once.
pub trait ProcessHandle {
    /// OS process id (or a stand-in for non-process launchers).
    fn pid(&self) -> u32;
}

/// Creates channels, spawns children and collects their exit status.
///
/// [`ForkLauncher`] is the real implementation. `wait` consumes the handle,
/// so collecting a child twice does not compile.
pub trait Launcher {
    type Handle: ProcessHandle;

    /// Create a channel for one pair.
    fn open_channel(&mut self) -> Result<Channel, ChannelError> {
        Channel::open()
    }

    /// Start `task` in a new child bound to `channel`.
    ///
    /// The caller keeps whatever endpoints remain in `channel` and must close
    /// them once every child of the pair is spawned.
    fn spawn(&mut self, task: ChildTask, channel: &mut Channel) -> std::io::Result<Self::Handle>;

    /// Block until the child terminates.
    fn wait(&mut self, handle: Self::Handle) -> std::io::Result<ChildExit>;
}

/// A child created by [`ForkLauncher`].
#[derive(Debug)]
pub struct ForkedChild {
    pid: libc::pid_t,
}

impl ProcessHandle for ForkedChild {
    fn pid(&self) -> u32 {
        self.pid as u32
    }
}

/// Spawns children with `fork(2)` and reaps them with `waitpid(2)`.
///
/// Forking is only sound while the calling process is single-threaded.
#[derive(Debug, Default)]
pub struct ForkLauncher;

impl ForkLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ForkLauncher {
    type Handle = ForkedChild;

    fn spawn(&mut self, task: ChildTask, channel: &mut Channel) -> std::io::Result<ForkedChild> {
        flush_stdio();

        // SAFETY: the orchestrator is single-threaded, so the child starts with
        // a consistent copy of the address space. The child never returns into
        // the caller; it leaves through `_exit`.
        let pid = unsafe { libc::fork() };
        match pid {
            -1 => Err(std::io::Error::last_os_error()),
            0 => {
                // A panic must never unwind into the parent's copied call stack.
                let code = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    run_in_child(task, channel)
                }))
                .unwrap_or(CHILD_IO_FAILURE);
                flush_stdio();
                // SAFETY: `_exit` terminates immediately without running the
                // parent's atexit handlers or destructors inherited by copy.
                unsafe { libc::_exit(code) }
            }
            pid => Ok(ForkedChild { pid }),
        }
    }

    fn wait(&mut self, handle: ForkedChild) -> std::io::Result<ChildExit> {
        let mut status: libc::c_int = 0;
        loop {
            // SAFETY: `status` is a valid writable `c_int` and `handle.pid` is a
            // child of this process that has not been reaped yet.
            let rc = unsafe { libc::waitpid(handle.pid, &mut status, 0) };
            if rc != -1 {
                break;
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        let exit = ChildExit::from_wait_status(status);
        if !exit.success() {
            warn!(pid = handle.pid, %exit, "child did not complete normally");
        }
        Ok(exit)
    }
}

/// Child side of a fork: claim one end, relinquish the other, run.
fn run_in_child(task: ChildTask, channel: &mut Channel) -> i32 {
    let role = task.role();
    let bound = task.bind(channel);
    channel.close_reader();
    channel.close_writer();

    match bound {
        Ok(bound) => bound.run(),
        Err(err) => {
            error!(%role, %err, "child could not claim its endpoint");
            CHILD_IO_FAILURE
        }
    }
}

fn flush_stdio() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}
