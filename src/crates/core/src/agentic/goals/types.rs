use datapilot_core_types::{GoalRecord, GoalStatus, RenderableTurn, RunState};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep going after a goal fails instead of halting the batch.
    pub continue_on_failure: bool,
    pub event_capacity: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            continue_on_failure: false,
            event_capacity: 256,
        }
    }
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub state: RunState,
    /// Every goal of the current list, selected or not.
    pub goals: Vec<GoalRecord>,
}

impl RunReport {
    pub fn statuses(&self) -> Vec<GoalStatus> {
        self.goals.iter().map(|goal| goal.status).collect()
    }
}

/// Result of one ad-hoc goal run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocReport {
    pub id: String,
    pub record: GoalRecord,
    pub turns: Vec<RenderableTurn>,
}

/// Indices of the goals selected for one run, consumed front to back.
#[derive(Debug, Clone)]
pub(crate) struct ExecutionQueue {
    order: Vec<usize>,
    cursor: usize,
}

impl ExecutionQueue {
    pub fn new(order: Vec<usize>) -> Self {
        Self { order, cursor: 0 }
    }

    pub fn current(&self) -> Option<usize> {
        self.order.get(self.cursor).copied()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn advance(&mut self) {
        if self.cursor < self.order.len() {
            self.cursor += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
