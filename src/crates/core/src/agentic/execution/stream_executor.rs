//! Stream-backed goal executor
//!
//! Opens a chunk stream for the goal, feeds every chunk through a
//! [`DecodeSession`] and a [`TurnAggregator`], and publishes the growing
//! transcript after each chunk that produced events. When the stream stops
//! early, the held-back last record is still delivered.

use super::{GoalContext, GoalExecutor, GoalOutcome};
use crate::util::errors::{DataPilotError, DataPilotResult};
use async_trait::async_trait;
use datapilot_agent_stream::{DecodeSession, TurnAggregator};
use datapilot_core_types::{EventKind, GoalSpec, ParsedEvent};
use datapilot_transport::{ChunkStream, StreamRequest, Transport};
use futures::StreamExt;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

pub struct StreamingGoalExecutor {
    transport: Arc<dyn Transport>,
    idle_timeout: Option<Duration>,
    conversation_id: Option<String>,
}

impl StreamingGoalExecutor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            idle_timeout: None,
            conversation_id: None,
        }
    }

    /// Fails the goal when no chunk arrives for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    fn request_for(&self, goal: &GoalSpec) -> StreamRequest {
        let request = StreamRequest::new(goal.prompt());
        match &self.conversation_id {
            Some(conversation_id) => request.with_conversation_id(conversation_id.clone()),
            None => request,
        }
    }
}

#[async_trait]
impl GoalExecutor for StreamingGoalExecutor {
    async fn run_goal(&self, goal: &GoalSpec, ctx: &GoalContext) -> DataPilotResult<GoalOutcome> {
        let request = self.request_for(goal);
        let mut stream = self.transport.open(&request, ctx.cancel.clone()).await?;

        let mut session = DecodeSession::new();
        let mut aggregator = TurnAggregator::new();
        let mut backend_error = BackendErrorTracker::default();
        aggregator.push(ParsedEvent::user(goal.prompt()));
        ctx.publish_turns(aggregator.render());

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    debug!(
                        "Goal stream aborted: run_id={}, goal_index={:?}, buffered_bytes={}",
                        ctx.run_id,
                        ctx.goal_index,
                        session.buffered().len()
                    );
                    aggregator.extend(session.drain());
                    let turns = aggregator.finish();
                    ctx.publish_turns(turns.clone());
                    return Ok(GoalOutcome::Stopped { turns });
                }
                next = next_chunk(&mut stream, self.idle_timeout) => next,
            };

            let chunk = match next {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    aggregator.extend(session.drain());
                    ctx.publish_turns(aggregator.finish());
                    return Err(e);
                }
            };
            let events = session.push(&chunk);
            if events.is_empty() {
                continue;
            }
            backend_error.observe(&events);
            aggregator.extend(events);
            ctx.publish_turns(aggregator.render());
        }

        let tail = session.finish();
        if !tail.is_empty() {
            backend_error.observe(&tail);
            aggregator.extend(tail);
        }
        let turns = aggregator.finish();
        ctx.publish_turns(turns.clone());

        if let Some(message) = backend_error.into_error() {
            warn!(
                "Goal stream ended with backend error: run_id={}, goal_index={:?}, error={}",
                ctx.run_id, ctx.goal_index, message
            );
            return Err(DataPilotError::Backend(message));
        }
        Ok(GoalOutcome::Completed { turns })
    }
}

async fn next_chunk(
    stream: &mut ChunkStream,
    idle_timeout: Option<Duration>,
) -> DataPilotResult<Option<String>> {
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| DataPilotError::Stalled(limit))?,
        None => stream.next().await,
    };
    next.transpose().map_err(DataPilotError::from)
}

/// Remembers the latest `error` event not followed by a final answer.
#[derive(Default)]
struct BackendErrorTracker {
    pending: Option<String>,
}

impl BackendErrorTracker {
    fn observe(&mut self, events: &[ParsedEvent]) {
        for event in events {
            if event.kind == EventKind::Error {
                let text = event.text();
                self.pending = Some(if text.is_empty() {
                    "unspecified error".to_string()
                } else {
                    text
                });
            } else if event.carries_final_answer() {
                self.pending = None;
            }
        }
    }

    fn into_error(self) -> Option<String> {
        self.pending
    }
}
