//! Echoプロバイダの実装
//!
//! 実際の推論サービスを呼ばず、受け取ったプロンプトをそのまま応答にする。
//! サービスなしでの動作確認やテスト用。

use crate::error::InferenceError;
use crate::llm::provider::LlmProvider;
use serde_json::{json, Value};

/// Echoプロバイダ
pub struct EchoProvider {
    model: String,
}

impl EchoProvider {
    /// 新しいEchoプロバイダを作成
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    fn tag(&self, image_count: usize) -> String {
        match image_count {
            0 => format!("[echo {}]", self.model),
            1 => format!("[echo {}, 1 image]", self.model),
            n => format!("[echo {}, {} images]", self.model, n),
        }
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn make_request_payload(&self, prompt: &str, images: &[String]) -> Result<Value, InferenceError> {
        Ok(json!({
            "model": self.model,
            "prompt": prompt,
            "image_count": images.len(),
        }))
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, InferenceError> {
        // 実際の API 呼び出しは行わず、リクエストから応答を組み立てる
        let v: Value = serde_json::from_str(request_json)
            .map_err(|e| InferenceError::service(format!("Failed to parse request JSON: {}", e)))?;
        let prompt = v["prompt"].as_str().unwrap_or_default();
        let image_count = v["image_count"].as_u64().unwrap_or(0) as usize;
        let response = json!({ "response": format!("{} {}", self.tag(image_count), prompt) });
        Ok(response.to_string())
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, InferenceError> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| InferenceError::service(format!("Failed to parse response JSON: {}", e)))?;
        Ok(v["response"].as_str().map(|s| s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_text_only() {
        let p = EchoProvider::new("llama3.1");
        let payload = p.make_request_payload("user: hi", &[]).unwrap();
        let body = p.make_http_request(&payload.to_string()).unwrap();
        let text = p.parse_response_text(&body).unwrap();
        assert_eq!(text.as_deref(), Some("[echo llama3.1] user: hi"));
    }

    #[test]
    fn test_echo_counts_images() {
        let p = EchoProvider::new("llava:13b");
        let images = vec!["a".to_string(), "b".to_string()];
        let payload = p.make_request_payload("compare", &images).unwrap();
        assert_eq!(payload["image_count"], 2);
        let body = p.make_http_request(&payload.to_string()).unwrap();
        assert_eq!(
            p.parse_response_text(&body).unwrap().as_deref(),
            Some("[echo llava:13b, 2 images] compare")
        );
    }

    #[test]
    fn test_echo_name_and_model() {
        let p = EchoProvider::new("m");
        assert_eq!(p.name(), "echo");
        assert_eq!(p.model(), "m");
    }
}
