//! HTTP chunk transport
//!
//! Posts the goal to the backend task runner and exposes the streaming response
//! body as UTF-8 text chunks.

use crate::error::TransportError;
use crate::traits::{ChunkStream, StreamRequest, Transport};
use crate::utf8::Utf8ChunkDecoder;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::{debug, error, trace};
use reqwest::header::ACCEPT;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const EVENT_STREAM_MIME_TYPE: &str = "text/event-stream";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub stream_path: String,
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
    pub headers: HashMap<String, String>,
    pub connect_timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stream_path: "/api/task/stream".to_string(),
            auth_token: None,
            user_id: None,
            headers: HashMap::new(),
            connect_timeout: Duration::from_secs(30),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.stream_path.trim_start_matches('/')
        )
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        if config.base_url.trim().is_empty() {
            return Err(TransportError::Config("base_url is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        let url = self.config.endpoint();
        debug!(
            "Opening task stream: url={}, conversation_id={:?}",
            url, request.conversation_id
        );

        let mut body = serde_json::json!({ "goal": request.goal });
        if let Some(conversation_id) = &request.conversation_id {
            body["conversationId"] = serde_json::json!(conversation_id);
        }
        if let Some(user_id) = &self.config.user_id {
            body["userId"] = serde_json::json!(user_id);
        }

        let mut builder = self
            .client
            .post(&url)
            .header(ACCEPT, EVENT_STREAM_MIME_TYPE)
            .json(&body);
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Task stream aborted before response: url={}", url);
                return Ok(futures::stream::empty().boxed());
            }
            response = builder.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "Task stream request failed: url={}, status={}, body={}",
                url, status, body
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(text_chunks(response.bytes_stream()))
    }
}

/// Converts a byte stream into UTF-8 text chunks.
///
/// Empty chunks are skipped; the stream ends after the first error.
pub fn text_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<TransportError> + Send + 'static,
{
    let state = (Box::pin(bytes), Utf8ChunkDecoder::new(), false);
    futures::stream::unfold(state, |(mut bytes, mut decoder, done)| async move {
        if done {
            return None;
        }
        loop {
            match bytes.next().await {
                Some(Ok(chunk)) => {
                    let text = decoder.push(chunk.as_ref());
                    if text.is_empty() {
                        continue;
                    }
                    trace!("Task stream chunk: {:?}", text);
                    return Some((Ok(text), (bytes, decoder, false)));
                }
                Some(Err(e)) => {
                    let e: TransportError = e.into();
                    error!("Task stream error: {}", e);
                    return Some((Err(e), (bytes, decoder, true)));
                }
                None => {
                    let tail = decoder.finish();
                    if tail.is_empty() {
                        return None;
                    }
                    return Some((Ok(tail), (bytes, decoder, true)));
                }
            }
        }
    })
    .boxed()
}
