//! Ollama ネイティブ API (/api/generate) プロバイダ
//!
//! 画像は base64 で `images` に載せる。ストリーミングは使わず 1 回で全文を受け取る。
//! 「モデルが見つからない」応答だけは `ModelUnavailable` に分類し、呼び出し側が
//! インストールして再試行できるようにする。

use crate::error::InferenceError;
use crate::llm::provider::LlmProvider;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// ベース URL を正規化する
///
/// 末尾の `/` と OpenAI 互換形式の `/v1` を落とし、スキーム省略時（OLLAMA_HOST 形式）は http を補う。
pub fn normalize_base_url(raw: &str) -> String {
    let s = raw.trim().trim_end_matches('/');
    let s = s.strip_suffix("/v1").unwrap_or(s);
    if s.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    if s.starts_with("http://") || s.starts_with("https://") {
        s.to_string()
    } else {
        format!("http://{}", s)
    }
}

/// エラーメッセージが「モデル未インストール」を表すか
pub fn is_model_not_found(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("model") && m.contains("not found")
}

/// 非 2xx 応答を InferenceError に分類する
pub fn classify_error(model: &str, status: u16, body: &str) -> InferenceError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.trim().to_string());
    if is_model_not_found(&message) {
        InferenceError::model_unavailable(model)
    } else {
        InferenceError::service(format!("HTTP {}: {}", status, message))
    }
}

/// Ollama プロバイダ
pub struct OllamaProvider {
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaProvider {
    /// 新しいプロバイダを作成
    ///
    /// * `model` - モデル名（例: "llava:13b"）
    /// * `base_url` - サービスのベース URL（正規化される）
    /// * `timeout` - 1 リクエストあたりのタイムアウト
    pub fn new(model: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::service(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            model: model.into(),
            base_url: normalize_base_url(base_url),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn make_request_payload(&self, prompt: &str, images: &[String]) -> Result<Value, InferenceError> {
        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });
        if !images.is_empty() {
            payload["images"] = json!(images);
        }
        Ok(payload)
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(self.url())
            .header("Content-Type", "application/json")
            .body(request_json.to_string())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::service(format!("Request to {} timed out: {}", self.base_url, e))
                } else {
                    InferenceError::service(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| InferenceError::service(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_error(&self.model, status.as_u16(), &response_text));
        }
        Ok(response_text)
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, InferenceError> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| InferenceError::service(format!("Failed to parse response JSON: {}", e)))?;

        if let Some(err) = v.get("error").and_then(|e| e.as_str()) {
            if is_model_not_found(err) {
                return Err(InferenceError::model_unavailable(&self.model));
            }
            return Err(InferenceError::service(format!("API error: {}", err)));
        }

        Ok(v["response"].as_str().map(|s| s.to_string()))
    }
}
