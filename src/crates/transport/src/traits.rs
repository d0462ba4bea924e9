use crate::error::TransportError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Ordered text fragments of one task run.
pub type ChunkStream = BoxStream<'static, Result<String, TransportError>>;

/// What the backend is asked to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl StreamRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            conversation_id: None,
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Chunk transport.
///
/// `cancel` is the abort signal of the run. A transport may end its stream when
/// it fires; the consumer also stops polling on abort, which drops the stream.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError>;
}
