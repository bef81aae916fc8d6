use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use ollama_relay::{
    Error, Result,
    ollama::{GenerateClient, GenerateRequest, LineStream},
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Upstream whose lines are released one at a time by the test.
///
/// Dropping the returned sender ends the generation. `dropped` flips once the
/// relay lets go of the upstream stream.
pub struct GatedClient {
    pub requests: Arc<Mutex<Vec<GenerateRequest>>>,
    pub dropped: Arc<AtomicBool>,
    feed: Mutex<Option<mpsc::UnboundedReceiver<Bytes>>>,
}

impl GatedClient {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicBool::new(false)),
            feed: Mutex::new(Some(rx)),
        });
        (client, tx)
    }

    pub fn was_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn get_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerateClient for GatedClient {
    async fn generate_stream(&self, request: GenerateRequest) -> Result<LineStream> {
        self.requests.lock().unwrap().push(request);

        let feed = self
            .feed
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::internal("gated client serves a single generation"))?;

        let flag = DropFlag(self.dropped.clone());
        let lines = UnboundedReceiverStream::new(feed).map(move |line| {
            let _ = &flag;
            Ok(line)
        });

        Ok(Box::pin(lines))
    }
}
