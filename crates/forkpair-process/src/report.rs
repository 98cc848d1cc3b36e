use std::ops::Range;

use serde::Serialize;

use crate::launcher::{ChildExit, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Single,
    Multi,
}

/// The integer range assigned to one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairPlan {
    pub pair: u32,
    pub first: i32,
    pub last: i32,
}

impl PairPlan {
    pub(crate) fn new(pair: u32, values: &Range<i32>) -> Self {
        Self {
            pair,
            first: values.start,
            last: values.end - 1,
        }
    }

    /// The sum a consumer should report for this pair.
    pub fn expected_sum(&self) -> i64 {
        (i64::from(self.first)..=i64::from(self.last)).sum()
    }
}

/// Exit status collected for one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildReport {
    pub pair: u32,
    pub role: Role,
    pub pid: u32,
    pub exit: ChildExit,
}

/// Outcome of a completed run: every child, in spawn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub pairs: Vec<PairPlan>,
    pub children: Vec<ChildReport>,
}

impl RunReport {
    /// True if every child exited with status 0.
    pub fn all_succeeded(&self) -> bool {
        self.children.iter().all(|child| child.exit.success())
    }

    pub fn failed_children(&self) -> impl Iterator<Item = &ChildReport> {
        self.children.iter().filter(|child| !child.exit.success())
    }
}
