use super::{
    lines::{DEFAULT_MAX_LINE_BYTES, LineSplitter},
    types::GenerateRequest,
};
use crate::{Error, Result, config::UpstreamConfig};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use std::{collections::VecDeque, pin::Pin, time::Duration};
use tracing::debug;

/// Non-empty upstream lines, without their terminators, in arrival order.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait GenerateClient: Send + Sync {
    /// Opens a streamed generation. Dropping the returned stream closes the
    /// upstream connection.
    async fn generate_stream(&self, request: GenerateRequest) -> Result<LineStream>;
}

pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    max_line_bytes: usize,
}

impl OllamaClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_line_bytes: config.max_line_bytes,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GenerateClient for OllamaClient {
    async fn generate_stream(&self, request: GenerateRequest) -> Result<LineStream> {
        debug!(
            "Opening generation on {} for model {} ({} prompt bytes)",
            self.url,
            request.model,
            request.prompt.len()
        );

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(split_lines(
            Box::pin(response.bytes_stream()),
            self.max_line_bytes,
        ))
    }
}

struct SplitState<S> {
    chunks: S,
    splitter: LineSplitter,
    ready: VecDeque<Bytes>,
    finished: bool,
}

/// Reframes a stream of network chunks into a stream of lines.
///
/// A chunk error, or a line longer than `max_line_bytes`, is yielded once and
/// ends the stream. Lines completed earlier in the offending chunk are lost.
pub fn split_lines<S, E>(chunks: S, max_line_bytes: usize) -> LineStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = SplitState {
        chunks,
        splitter: LineSplitter::new(max_line_bytes),
        ready: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            if state.finished {
                return None;
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => match state.splitter.push(&chunk) {
                    Ok(lines) => state.ready.extend(lines),
                    Err(e) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                },
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.finished = true;
                    state.ready.extend(state.splitter.finish());
                }
            }
        }
    }))
}
