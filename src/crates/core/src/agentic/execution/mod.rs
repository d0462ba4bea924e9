//! Goal execution
//!
//! A [`GoalExecutor`] runs one goal to an outcome. The controller owns the
//! sequencing; executors only see a single goal and its [`GoalContext`].

pub mod stream_executor;

pub use stream_executor::StreamingGoalExecutor;

use crate::infrastructure::events::{GoalEvent, GoalEventBus};
use crate::util::errors::DataPilotResult;
use async_trait::async_trait;
use datapilot_core_types::{GoalSpec, RenderableTurn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// How a goal run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalOutcome {
    Completed { turns: Vec<RenderableTurn> },
    /// Ended early because the run was aborted.
    Stopped { turns: Vec<RenderableTurn> },
}

impl GoalOutcome {
    pub fn turns(&self) -> &[RenderableTurn] {
        match self {
            GoalOutcome::Completed { turns } | GoalOutcome::Stopped { turns } => turns,
        }
    }

    pub fn into_turns(self) -> Vec<RenderableTurn> {
        match self {
            GoalOutcome::Completed { turns } | GoalOutcome::Stopped { turns } => turns,
        }
    }

    /// Last final answer in the transcript, or the last plain bot reply.
    pub fn output_text(&self) -> String {
        self.turns()
            .iter()
            .rev()
            .find_map(|turn| match turn {
                RenderableTurn::ComplexBotTurn {
                    final_answer: Some(answer),
                    ..
                } => Some(answer.clone()),
                RenderableTurn::SimpleBotTurn { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Per-goal execution context handed to an executor.
#[derive(Debug, Clone)]
pub struct GoalContext {
    pub run_id: String,
    pub goal_index: Option<usize>,
    pub cancel: CancellationToken,
    events: GoalEventBus,
    latest_turns: Arc<Mutex<Vec<RenderableTurn>>>,
}

impl GoalContext {
    pub fn new(
        run_id: impl Into<String>,
        goal_index: Option<usize>,
        cancel: CancellationToken,
        events: GoalEventBus,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            goal_index,
            cancel,
            events,
            latest_turns: Arc::default(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Publishes the current transcript of the goal.
    pub fn publish_turns(&self, turns: Vec<RenderableTurn>) {
        *self
            .latest_turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = turns.clone();
        self.events.emit(GoalEvent::TurnsUpdated {
            run_id: self.run_id.clone(),
            goal_index: self.goal_index,
            turns,
        });
    }

    /// Last transcript published through this context.
    pub fn latest_turns(&self) -> Vec<RenderableTurn> {
        self.latest_turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Runs a single goal.
///
/// `Err` means the goal failed, unless the context was cancelled by then, in
/// which case the controller records it as stopped.
#[async_trait]
pub trait GoalExecutor: Send + Sync {
    async fn run_goal(&self, goal: &GoalSpec, ctx: &GoalContext) -> DataPilotResult<GoalOutcome>;
}
