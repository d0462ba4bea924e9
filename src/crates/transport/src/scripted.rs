//! In-memory transport that plays back predefined chunks.
//!
//! Used by the CLI replay command and by tests that need deterministic chunk
//! boundaries, failures, stalls or abort reactions.

use crate::error::TransportError;
use crate::traits::{ChunkStream, StreamRequest, Transport};
use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Deliver one text chunk.
    Chunk(String),
    /// Sleep before the next step.
    Delay(Duration),
    /// Fail the stream.
    Fail(String),
    /// Block until the run is aborted, then end the stream normally.
    WaitForAbort,
    /// Block until the run is aborted, then fail the stream.
    FailOnAbort,
}

impl ScriptStep {
    pub fn chunk(text: impl Into<String>) -> Self {
        ScriptStep::Chunk(text.into())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    scripts: HashMap<String, Vec<ScriptStep>>,
    fallback: Option<Vec<ScriptStep>>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script played when the requested goal text equals `goal`.
    pub fn with_script(mut self, goal: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        self.scripts.insert(goal.into(), steps);
        self
    }

    /// Script played for goals without a dedicated script.
    pub fn with_fallback(mut self, steps: Vec<ScriptStep>) -> Self {
        self.fallback = Some(steps);
        self
    }

    /// Splits `text` into chunks of at most `chunk_size` characters.
    pub fn chunked(text: &str, chunk_size: usize) -> Vec<ScriptStep> {
        let chunk_size = chunk_size.max(1);
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(chunk_size)
            .map(|chunk| ScriptStep::Chunk(chunk.iter().collect()))
            .collect()
    }

    /// Goals opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(request.goal.clone());
        }
        let steps = self
            .scripts
            .get(&request.goal)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                TransportError::Config(format!("No script for goal: {}", request.goal))
            })?;
        debug!(
            "Playing scripted stream: goal={}, steps={}",
            request.goal,
            steps.len()
        );

        let state = (VecDeque::from(steps), cancel);
        let stream = futures::stream::unfold(state, |(mut steps, cancel)| async move {
            loop {
                match steps.pop_front()? {
                    ScriptStep::Chunk(text) => return Some((Ok(text), (steps, cancel))),
                    ScriptStep::Delay(duration) => tokio::time::sleep(duration).await,
                    ScriptStep::Fail(message) => {
                        steps.clear();
                        return Some((Err(TransportError::Stream(message)), (steps, cancel)));
                    }
                    ScriptStep::WaitForAbort => {
                        cancel.cancelled().await;
                        return None;
                    }
                    ScriptStep::FailOnAbort => {
                        cancel.cancelled().await;
                        steps.clear();
                        return Some((
                            Err(TransportError::Stream("connection aborted".to_string())),
                            (steps, cancel),
                        ));
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}
