//! Goal event channel
//!
//! Status changes, live transcript updates and run completion are broadcast to
//! any number of subscribers. Emitting never blocks; a slow subscriber lags.

use datapilot_core_types::{GoalStatus, RenderableTurn, RunState};
use log::trace;
use serde::Serialize;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalEvent {
    GoalStateChanged {
        run_id: String,
        /// Position in the goal list; `None` for ad-hoc goals.
        goal_index: Option<usize>,
        title: String,
        status: GoalStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: i64,
    },
    TurnsUpdated {
        run_id: String,
        goal_index: Option<usize>,
        turns: Vec<RenderableTurn>,
    },
    RunFinished {
        run_id: String,
        state: RunState,
        timestamp: i64,
    },
}

impl GoalEvent {
    pub fn run_id(&self) -> &str {
        match self {
            GoalEvent::GoalStateChanged { run_id, .. }
            | GoalEvent::TurnsUpdated { run_id, .. }
            | GoalEvent::RunFinished { run_id, .. } => run_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoalEventBus {
    tx: broadcast::Sender<GoalEvent>,
}

impl GoalEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of subscribers that received the event.
    pub fn emit(&self, event: GoalEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                trace!("Goal event dropped, no subscribers: run_id={}", event.run_id());
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GoalEvent> {
        self.tx.subscribe()
    }
}

impl Default for GoalEventBus {
    fn default() -> Self {
        Self::new()
    }
}
