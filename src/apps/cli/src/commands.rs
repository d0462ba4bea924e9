//! Command layer
//!
//! Thin wiring between configuration, transports and the goal controller for
//! each subcommand.

use std::sync::Arc;

use anyhow::{bail, Context};
use datapilot_core::{
    load_goal_file, AdhocReport, DataPilotConfig, GoalController, GoalEvent, GoalSpec,
    GoalStatus, RunOptions, StreamingGoalExecutor,
};
use datapilot_transport::{HttpTransport, ScriptedTransport};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cli::{AskArgs, ReplayArgs, RunArgs};
use crate::render::{render_progress, render_record, render_report, render_turns};

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

pub async fn run_goals(
    config: &DataPilotConfig,
    args: RunArgs,
    output: Output,
) -> anyhow::Result<()> {
    let goals = load_goal_file(&args.goals)
        .await
        .with_context(|| format!("Failed to load goals from {}", args.goals.display()))?;
    let controller = http_controller(config, None, args.continue_on_failure)?;
    controller.load_goals(goals).context("Failed to load goals")?;

    let selection = (!args.select.is_empty()).then_some(args.select);
    let progress = (!output.json).then(|| spawn_progress(&controller));
    let interrupt = cancel_on_interrupt(controller.clone());
    let result = controller.run(selection.as_deref()).await;
    interrupt.abort();

    let report = match result {
        Ok(report) => {
            if let Some(progress) = progress {
                let _ = progress.await;
            }
            report
        }
        Err(e) => {
            if let Some(progress) = progress {
                progress.abort();
            }
            return Err(e).context("Failed to run goals");
        }
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (index, goal) in report.goals.iter().enumerate() {
            if let Some(turns) = controller.transcript(index) {
                println!("--- {} ---", goal.title);
                print!("{}", render_turns(&turns));
            }
        }
        print!("{}", render_report(&report));
    }

    let failed = report
        .goals
        .iter()
        .filter(|goal| goal.status == GoalStatus::Failed)
        .count();
    if failed > 0 {
        bail!("{} goal(s) failed", failed);
    }
    Ok(())
}

pub async fn ask(config: &DataPilotConfig, args: AskArgs, output: Output) -> anyhow::Result<()> {
    let goal = args.goal.join(" ");
    let controller = http_controller(config, args.conversation_id, false)?;
    let interrupt = cancel_on_interrupt(controller.clone());
    let report = controller
        .run_single(GoalSpec::new(goal, ""))
        .await
        .context("Failed to run goal")?;
    interrupt.abort();
    print_adhoc(&report, output)
}

pub async fn replay(args: ReplayArgs, output: Output) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read stream file {}", args.file.display()))?;
    let title = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "replay".to_string());
    let report = replay_text(&title, &text, args.chunk_size).await?;
    print_adhoc(&report, output)
}

/// Runs recorded stream text through the same decode and aggregation pipeline
/// as a live goal.
pub async fn replay_text(
    title: &str,
    text: &str,
    chunk_size: usize,
) -> anyhow::Result<AdhocReport> {
    let transport =
        ScriptedTransport::new().with_fallback(ScriptedTransport::chunked(text, chunk_size));
    let executor = StreamingGoalExecutor::new(Arc::new(transport));
    let controller = GoalController::new(Arc::new(executor), RunOptions::default());
    controller
        .run_single(GoalSpec::new(title, ""))
        .await
        .context("Failed to replay stream")
}

fn http_controller(
    config: &DataPilotConfig,
    conversation_id: Option<String>,
    continue_on_failure: bool,
) -> anyhow::Result<Arc<GoalController>> {
    let transport = HttpTransport::new(config.http_transport_config())
        .context("Failed to create HTTP transport")?;
    let mut executor =
        StreamingGoalExecutor::new(Arc::new(transport)).with_idle_timeout(config.idle_timeout());
    if let Some(conversation_id) = conversation_id {
        executor = executor.with_conversation_id(conversation_id);
    }
    let mut options = config.run_options();
    options.continue_on_failure |= continue_on_failure;
    Ok(Arc::new(GoalController::new(Arc::new(executor), options)))
}

fn print_adhoc(report: &AdhocReport, output: Output) -> anyhow::Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_turns(&report.turns));
        println!("{}", render_record(None, &report.record));
    }
    if report.record.status == GoalStatus::Failed {
        bail!(
            "Goal failed: {}",
            report.record.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn spawn_progress(controller: &GoalController) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(GoalEvent::GoalStateChanged {
                    goal_index,
                    title,
                    status,
                    ..
                }) => eprintln!("{}", render_progress(goal_index, &title, status)),
                Ok(GoalEvent::RunFinished { run_id, state, .. }) => {
                    debug!("Run finished: run_id={}, state={:?}", run_id, state);
                    break;
                }
                Ok(GoalEvent::TurnsUpdated { .. }) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Progress output skipped events: skipped={}", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn cancel_on_interrupt(controller: Arc<GoalController>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping the current goal");
            controller.cancel();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDED: &str = "event: started\ndata: Reading orders.csv\n\n\
event: thought\ndata: Thought: count rows per region\ndata: Action: GROUP BY region\n\n\
event: final\ndata: [Final Answer] North has the most orders";

    #[tokio::test]
    async fn replay_decodes_recorded_stream() {
        let report = replay_text("orders.txt", RECORDED, 3).await.unwrap();
        assert_eq!(report.record.status, GoalStatus::Completed);
        assert_eq!(report.record.output_text, "North has the most orders");
        assert_eq!(report.turns.len(), 2);
        assert_eq!(report.turns[1].thought_sequence().len(), 2);
    }

    #[tokio::test]
    async fn replay_output_is_independent_of_chunk_size() {
        let small = replay_text("a", RECORDED, 1).await.unwrap();
        let large = replay_text("a", RECORDED, 4096).await.unwrap();
        assert_eq!(small.turns, large.turns);
    }
}
