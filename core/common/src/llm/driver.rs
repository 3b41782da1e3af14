//! LLMドライバーの実装
//!
//! プロバイダに依存しない共通処理を提供します。

use crate::error::InferenceError;
use crate::llm::provider::LlmProvider;

/// LLMドライバー
pub struct LlmDriver<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmDriver<P> {
    /// 新しいドライバーを作成
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// プロンプト（と画像）を送り、生成テキストを返す
    ///
    /// 空白だけの応答は不正レスポンスとして `Service` エラーにする。
    pub fn generate(&self, prompt: &str, images: &[String]) -> Result<String, InferenceError> {
        let payload = self.provider.make_request_payload(prompt, images)?;

        let request_json = serde_json::to_string(&payload)
            .map_err(|e| InferenceError::service(format!("Failed to serialize request: {}", e)))?;

        let response_json = self.provider.make_http_request(&request_json)?;

        let text = self
            .provider
            .parse_response_text(&response_json)?
            .ok_or_else(|| InferenceError::service("No text in response"))?;

        if text.trim().is_empty() {
            return Err(InferenceError::service(format!(
                "Empty response from model '{}'",
                self.provider.model()
            )));
        }
        Ok(text)
    }

    /// プロバイダを取得
    pub fn provider(&self) -> &P {
        &self.provider
    }
}
