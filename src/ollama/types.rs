use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerateRequest {
    /// A streamed generation of `prompt` on `model`.
    pub fn streaming(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_streaming_request_wire_shape() {
        let request = GenerateRequest::streaming("gemma3:1b", "what is 2+2");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gemma3:1b",
                "prompt": "what is 2+2",
                "stream": true
            })
        );
    }
}
