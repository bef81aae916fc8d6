use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A validated `POST /ask_stream` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
}

impl AskRequest {
    /// Reads the question out of a raw request body.
    ///
    /// Never fails: anything other than a JSON object carrying a string
    /// `question` yields an empty question.
    pub fn from_body(body: &[u8]) -> Self {
        let question = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| value.get("question")?.as_str().map(str::to_owned))
            .unwrap_or_default();

        Self { question }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
}
