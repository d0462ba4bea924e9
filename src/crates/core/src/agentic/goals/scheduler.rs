use super::manager::GoalController;
use super::types::ExecutionQueue;
use crate::agentic::execution::{GoalContext, GoalOutcome};
use crate::util::errors::DataPilotResult;
use datapilot_core_types::{GoalRecord, GoalStatus, RenderableTurn, RunState};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

/// Terminal result of one goal as recorded by the controller.
#[derive(Debug, Clone)]
pub(crate) struct GoalSettlement {
    pub status: GoalStatus,
    pub output_text: String,
    pub error: Option<String>,
    pub turns: Vec<RenderableTurn>,
}

impl GoalSettlement {
    pub fn apply_to(&self, record: &mut GoalRecord, now_ms: i64) {
        record.status = self.status;
        record.output_text = self.output_text.clone();
        record.error = self.error.clone();
        record.updated_at_ms = now_ms;
        record.finished_at_ms = Some(now_ms);
    }
}

/// Maps an executor result to a terminal status.
///
/// Errors observed after the abort signal fired count as stopped, not failed.
pub(crate) fn settle(
    result: DataPilotResult<GoalOutcome>,
    cancel: &CancellationToken,
    ctx: &GoalContext,
) -> GoalSettlement {
    match result {
        Ok(outcome) => {
            let status = match outcome {
                GoalOutcome::Completed { .. } => GoalStatus::Completed,
                GoalOutcome::Stopped { .. } => GoalStatus::Stopped,
            };
            GoalSettlement {
                status,
                output_text: outcome.output_text(),
                error: None,
                turns: outcome.into_turns(),
            }
        }
        Err(e) => {
            let stopped = cancel.is_cancelled();
            GoalSettlement {
                status: if stopped {
                    GoalStatus::Stopped
                } else {
                    GoalStatus::Failed
                },
                output_text: String::new(),
                error: Some(e.to_string()),
                turns: ctx.latest_turns(),
            }
        }
    }
}

/// Runs the queued goals one at a time and returns the final run state.
pub(crate) async fn run_queue(
    controller: &GoalController,
    run_id: &str,
    queue: &mut ExecutionQueue,
    cancel: &CancellationToken,
) -> RunState {
    debug!("Goal run started: run_id={}, goals={}", run_id, queue.len());

    while let Some(index) = queue.current() {
        if cancel.is_cancelled() {
            debug!(
                "Goal run cancelled before next goal: run_id={}, goal_index={}",
                run_id, index
            );
            return RunState::Cancelled;
        }

        controller.set_run_state(RunState::Running {
            cursor: queue.cursor(),
        });

        let spec = match controller.begin_goal(run_id, index) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(
                    "Skipping goal that cannot start: run_id={}, goal_index={}, error={}",
                    run_id, index, e
                );
                queue.advance();
                continue;
            }
        };

        let ctx = GoalContext::new(run_id, Some(index), cancel.clone(), controller.events());
        let result = controller.executor().run_goal(&spec, &ctx).await;
        let settlement = settle(result, cancel, &ctx);
        let status = settlement.status;
        if let Some(error) = &settlement.error {
            debug!(
                "Goal ended with error: run_id={}, goal_index={}, status={:?}, error={}",
                run_id, index, status, error
            );
        }
        controller.finish_goal(run_id, index, settlement);
        queue.advance();

        if status == GoalStatus::Failed && !controller.options().continue_on_failure {
            debug!(
                "Goal run halted on failure: run_id={}, goal_index={}",
                run_id, index
            );
            return RunState::HaltedOnFailure;
        }
    }

    if cancel.is_cancelled() {
        RunState::Cancelled
    } else {
        RunState::Completed
    }
}
