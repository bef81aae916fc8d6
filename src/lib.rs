pub mod config;
pub mod error;
pub mod ollama;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
