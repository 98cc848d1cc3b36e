use std::fmt;
use std::ops::Range;

use forkpair_channel::Channel;
use tracing::{debug, error, info};

use crate::config::PairConfig;
use crate::error::{OrchestratorError, Result};
use crate::launcher::{ChildTask, ForkLauncher, Launcher, ProcessHandle, Role};
use crate::report::{ChildReport, PairPlan, RunMode, RunReport};

/// Progress through one pair's setup and teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ChannelCreated,
    ProducerSpawned,
    ConsumerSpawned,
    CleanedUp,
    Awaiting(Role),
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ChannelCreated => f.write_str("channel_created"),
            Stage::ProducerSpawned => f.write_str("producer_spawned"),
            Stage::ConsumerSpawned => f.write_str("consumer_spawned"),
            Stage::CleanedUp => f.write_str("cleaned_up"),
            Stage::Awaiting(role) => write!(f, "awaiting_{role}"),
            Stage::Done => f.write_str("done"),
        }
    }
}

struct Spawned<H> {
    pair: u32,
    role: Role,
    handle: H,
}

/// Runs producer/consumer pairs through a [`Launcher`].
pub struct Orchestrator<L> {
    launcher: L,
    config: PairConfig,
}

impl Orchestrator<ForkLauncher> {
    /// An orchestrator that forks real child processes.
    pub fn new(config: PairConfig) -> Self {
        Self::with_launcher(ForkLauncher::new(), config)
    }
}

impl<L: Launcher> Orchestrator<L> {
    pub fn with_launcher(launcher: L, config: PairConfig) -> Self {
        Self { launcher, config }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn into_launcher(self) -> L {
        self.launcher
    }

    /// One producer sending `1..=K` and one consumer summing them.
    ///
    /// Returns an error if the channel or either child cannot be created.
    /// Child exit statuses are reported, never turned into an error.
    pub fn run_single_pair(&mut self) -> Result<RunReport> {
        self.config.validate()?;
        let values = self.config.range_for(0)?;
        let plan = PairPlan::new(0, &values);

        info!(pid = std::process::id(), "parent creating children");

        let mut spawned = Vec::with_capacity(2);
        self.spawn_pair(0, values, &mut spawned)?;
        let children = self.reap(spawned)?;

        debug!(stage = %Stage::Done, "stage");
        info!("single pair completed");

        Ok(RunReport {
            mode: RunMode::Single,
            pairs: vec![plan],
            children,
        })
    }

    /// `pairs` independent producer/consumer pairs, pair `i` covering
    /// `[i*K + 1, i*K + K]`.
    ///
    /// All children are spawned first, then waited on in spawn order. A setup
    /// failure returns immediately; pairs already running are left to finish
    /// on their own.
    pub fn run_multiple_pairs(&mut self, pairs: usize) -> Result<RunReport> {
        self.config.validate()?;
        self.config.validate_pair_count(pairs)?;
        // Ranges grow with the index; the last one overflows first.
        self.config.range_for(pairs - 1)?;
        let ranges = (0..pairs)
            .map(|index| self.config.range_for(index))
            .collect::<Result<Vec<_>>>()?;

        info!(pairs, "parent creating producer-consumer pairs");

        let mut plans = Vec::with_capacity(pairs);
        let mut spawned = Vec::with_capacity(2 * pairs);
        for (pair, values) in (1u32..).zip(ranges) {
            info!(pair, first = values.start, last = values.end - 1, "starting pair");
            plans.push(PairPlan::new(pair, &values));
            self.spawn_pair(pair, values, &mut spawned)?;
        }

        let children = self.reap(spawned)?;
        info!(pairs, children = children.len(), "all pairs completed");

        Ok(RunReport {
            mode: RunMode::Multi,
            pairs: plans,
            children,
        })
    }

    /// Create a channel, spawn both children on it, then drop the parent's
    /// copies of both ends.
    fn spawn_pair(
        &mut self,
        pair: u32,
        values: Range<i32>,
        spawned: &mut Vec<Spawned<L::Handle>>,
    ) -> Result<()> {
        let mut channel = self
            .launcher
            .open_channel()
            .map_err(|source| OrchestratorError::ChannelCreate { pair, source })?;
        debug!(pair, stage = %Stage::ChannelCreated, "stage");

        let producer = ChildTask::Producer {
            values,
            delay: self.config.send_delay,
        };
        spawned.push(self.spawn_child(pair, producer, &mut channel)?);
        debug!(pair, stage = %Stage::ProducerSpawned, "stage");

        let consumer = ChildTask::Consumer { pair };
        spawned.push(self.spawn_child(pair, consumer, &mut channel)?);
        debug!(pair, stage = %Stage::ConsumerSpawned, "stage");

        // The consumer only sees end-of-stream once this copy of the write end is gone.
        channel.close();
        debug!(pair, stage = %Stage::CleanedUp, "stage");
        Ok(())
    }

    fn spawn_child(
        &mut self,
        pair: u32,
        task: ChildTask,
        channel: &mut Channel,
    ) -> Result<Spawned<L::Handle>> {
        let role = task.role();
        let handle = self
            .launcher
            .spawn(task, channel)
            .map_err(|source| OrchestratorError::Spawn { pair, role, source })?;
        info!(pair, %role, pid = handle.pid(), "created child");
        Ok(Spawned { pair, role, handle })
    }

    /// Wait on every child in spawn order.
    ///
    /// A failed wait does not stop the loop; the first failure is returned
    /// after every other child has been collected.
    fn reap(&mut self, spawned: Vec<Spawned<L::Handle>>) -> Result<Vec<ChildReport>> {
        let mut reports = Vec::with_capacity(spawned.len());
        let mut first_error = None;

        for Spawned { pair, role, handle } in spawned {
            let pid = handle.pid();
            debug!(pair, pid, stage = %Stage::Awaiting(role), "stage");
            match self.launcher.wait(handle) {
                Ok(exit) => {
                    info!(pair, %role, pid, %exit, "child exited");
                    reports.push(ChildReport {
                        pair,
                        role,
                        pid,
                        exit,
                    });
                }
                Err(source) => {
                    error!(pair, %role, pid, %source, "wait failed");
                    if first_error.is_none() {
                        first_error = Some(OrchestratorError::Wait { pid, source });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

/// Fork one producer/consumer pair and wait for both children.
pub fn run_single_pair(config: PairConfig) -> Result<RunReport> {
    Orchestrator::new(config).run_single_pair()
}

/// Fork `pairs` producer/consumer pairs and wait for all children.
pub fn run_multiple_pairs(pairs: usize, config: PairConfig) -> Result<RunReport> {
    Orchestrator::new(config).run_multiple_pairs(pairs)
}
