use axum::body::Body;
use axum::http::Request;
use ollama_relay::{
    Result,
    config::{Config, LogsConfig, RelayConfig, ServerConfig, UpstreamConfig},
    ollama::OllamaClient,
    server::{self, AppState},
};
use std::{net::SocketAddr, sync::Arc};
use tempfile::TempDir;
use tokio::{fs, net::TcpListener};

pub const TEST_MODEL: &str = "gemma3:1b";

/// Create a test configuration pointing at `upstream_url`
pub fn create_test_config(upstream_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
        },
        relay: RelayConfig {
            model: TEST_MODEL.to_string(),
            channel_capacity: 4,
        },
        upstream: UpstreamConfig {
            url: upstream_url.to_string(),
            connect_timeout_secs: 2,
            idle_timeout_secs: 5,
            max_line_bytes: 4096,
        },
    }
}

/// State relaying to the Ollama endpoint named in `config`.
pub fn ollama_state(config: &Config) -> AppState {
    let client = OllamaClient::new(&config.upstream).unwrap();
    AppState::new(config, Arc::new(client))
}

/// An address nothing listens on.
pub async fn unreachable_upstream_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/generate", addr)
}

/// Serve the relay on an ephemeral local port.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(state)).await.unwrap();
    });
    addr
}

pub fn ask_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/ask_stream")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn model_request() -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/model")
        .body(Body::empty())
        .unwrap()
}

/// Write `content` as config.yaml in a fresh temp dir
pub async fn create_test_config_file(content: &str) -> Result<(TempDir, String)> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, content).await?;
    Ok((dir, config_path.to_string_lossy().to_string()))
}

pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 5005
  logs:
    level: "debug"

relay:
  model: "llama3"
  channel_capacity: 8

upstream:
  url: "http://gpu-box:11434/api/generate"
  connect_timeout_secs: 3
  idle_timeout_secs: 60
  max_line_bytes: 65536
"#;

pub const INVALID_CONFIG_YAML: &str = r#"
server:
  port: "not-a-number"
"#;
