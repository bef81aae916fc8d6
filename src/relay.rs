//! Pumps upstream lines into a bounded channel read by the HTTP response.
//!
//! The channel is the only buffer between the two sides. When the caller reads
//! slowly the channel fills, `send` waits, and the upstream read pauses with it.

use crate::{
    Error,
    ollama::{GenerateClient, GenerateRequest},
};
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::timeout};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How a relay ended.
#[derive(Debug)]
pub enum RelayOutcome {
    /// Upstream finished the generation.
    Completed { lines: usize },
    /// The caller went away; upstream was dropped.
    ClientGone { lines: usize },
    /// Upstream could not be reached, answered with an error, broke mid-stream,
    /// or sent a line over the size limit.
    UpstreamFailed { lines: usize, error: Error },
    /// Upstream stayed silent longer than the idle timeout.
    IdleTimeout { lines: usize },
}

impl RelayOutcome {
    pub fn lines(&self) -> usize {
        match self {
            Self::Completed { lines }
            | Self::ClientGone { lines }
            | Self::UpstreamFailed { lines, .. }
            | Self::IdleTimeout { lines } => *lines,
        }
    }
}

#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn GenerateClient>,
    capacity: usize,
    idle_timeout: Duration,
}

impl Relay {
    pub fn new(client: Arc<dyn GenerateClient>, capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            client,
            capacity: capacity.max(1),
            idle_timeout,
        }
    }

    /// Starts relaying `request` on a background task.
    ///
    /// Each received item is one upstream line with a trailing `\n`. The
    /// channel closes when the relay ends for any reason. Dropping the
    /// receiver stops the task and the upstream request with it.
    pub fn start(&self, request: GenerateRequest) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let client = self.client.clone();
        let idle_timeout = self.idle_timeout;
        let request_id = Uuid::new_v4();

        tokio::spawn(async move {
            info!("Relay {} started for model {}", request_id, request.model);

            let outcome = pump(client, request, tx, idle_timeout).await;
            let lines = outcome.lines();
            match outcome {
                RelayOutcome::Completed { .. } => {
                    info!("Relay {} completed after {} lines", request_id, lines);
                }
                RelayOutcome::ClientGone { .. } => {
                    info!(
                        "Relay {} cancelled by client after {} lines",
                        request_id, lines
                    );
                }
                RelayOutcome::UpstreamFailed { error, .. } => {
                    warn!(
                        "Relay {} ended by upstream failure after {} lines: {}",
                        request_id, lines, error
                    );
                }
                RelayOutcome::IdleTimeout { .. } => {
                    warn!(
                        "Relay {} timed out waiting for upstream after {} lines",
                        request_id, lines
                    );
                }
            }
        });

        rx
    }
}

/// Runs one relay to its end. The upstream stream is owned here and dropped on
/// return, which closes the connection.
pub async fn pump(
    client: Arc<dyn GenerateClient>,
    request: GenerateRequest,
    tx: mpsc::Sender<Bytes>,
    idle_timeout: Duration,
) -> RelayOutcome {
    let opened = tokio::select! {
        _ = tx.closed() => return RelayOutcome::ClientGone { lines: 0 },
        opened = timeout(idle_timeout, client.generate_stream(request)) => opened,
    };

    let mut upstream = match opened {
        Ok(Ok(stream)) => stream,
        Ok(Err(error)) => return RelayOutcome::UpstreamFailed { lines: 0, error },
        Err(_) => return RelayOutcome::IdleTimeout { lines: 0 },
    };

    let mut lines = 0;
    loop {
        let next = tokio::select! {
            _ = tx.closed() => return RelayOutcome::ClientGone { lines },
            next = timeout(idle_timeout, upstream.next()) => next,
        };

        let line = match next {
            Ok(Some(Ok(line))) => line,
            Ok(Some(Err(error))) => return RelayOutcome::UpstreamFailed { lines, error },
            Ok(None) => return RelayOutcome::Completed { lines },
            Err(_) => return RelayOutcome::IdleTimeout { lines },
        };

        if tx.send(terminate(line)).await.is_err() {
            return RelayOutcome::ClientGone { lines };
        }
        lines += 1;
        debug!("Forwarded line {}", lines);
    }
}

fn terminate(line: Bytes) -> Bytes {
    let mut framed = BytesMut::with_capacity(line.len() + 1);
    framed.extend_from_slice(&line);
    framed.put_u8(b'\n');
    framed.freeze()
}
