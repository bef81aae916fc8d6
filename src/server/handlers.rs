use super::types::{AskRequest, ModelResponse};
use crate::{
    config::Config,
    ollama::{GenerateClient, GenerateRequest},
    relay::Relay,
};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use futures::StreamExt;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<str>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: &Config, client: Arc<dyn GenerateClient>) -> Self {
        let relay = Relay::new(
            client,
            config.relay.channel_capacity,
            Duration::from_secs(config.upstream.idle_timeout_secs),
        );

        Self {
            model: Arc::from(config.relay.model.as_str()),
            relay,
        }
    }
}

pub async fn model(State(state): State<AppState>) -> Json<ModelResponse> {
    Json(ModelResponse {
        model: state.model.to_string(),
    })
}

pub async fn ask_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let request = AskRequest::from_body(&body);
    if request.question.is_empty() {
        debug!("Ask request without a question, forwarding empty prompt");
    }
    info!("Received question ({} bytes)", request.question.len());

    let rx = state
        .relay
        .start(GenerateRequest::streaming(state.model.to_string(), request.question));
    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response()
}
