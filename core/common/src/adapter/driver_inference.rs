//! LlmDriver 2 本（ビジョン用・テキスト用）で InferenceService を実装するアダプタ
//!
//! 画像は FileSystem ポートで読み、base64 にしてプロバイダへ渡す。

use crate::domain::ImageRef;
use crate::error::InferenceError;
use crate::llm::{AnyProvider, LlmDriver, LlmProvider};
use crate::ports::outbound::{FileSystem, InferenceService, Log, LogLevel, LogRecord};
use base64::Engine;
use std::sync::Arc;
use std::time::Instant;

/// ドライバー経由の推論サービス
pub struct DriverInference<P: LlmProvider = AnyProvider> {
    vision: LlmDriver<P>,
    text: LlmDriver<P>,
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn Log>,
}

impl<P: LlmProvider> DriverInference<P> {
    pub fn new(
        vision: LlmDriver<P>,
        text: LlmDriver<P>,
        fs: Arc<dyn FileSystem>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            vision,
            text,
            fs,
            log,
        }
    }

    fn encode_image(&self, image: &ImageRef) -> Result<String, InferenceError> {
        let bytes = self
            .fs
            .read(image.as_path())
            .map_err(|e| InferenceError::service(format!("Cannot read image '{}': {}", image, e)))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    fn timed(
        &self,
        driver: &LlmDriver<P>,
        op: &str,
        prompt: &str,
        images: &[String],
    ) -> Result<String, InferenceError> {
        let started = Instant::now();
        let result = driver.generate(prompt, images);
        let level = if result.is_ok() { LogLevel::Debug } else { LogLevel::Warn };
        let mut rec = LogRecord::new(level, format!("{} via {}", op, driver.provider().name()))
            .layer("adapter")
            .kind("inference")
            .field("model", driver.provider().model())
            .field("elapsed_ms", started.elapsed().as_millis() as u64);
        if let Err(ref e) = result {
            rec = rec.field("error", e.to_string());
        }
        self.log.emit(rec);
        result
    }
}

impl<P: LlmProvider> InferenceService for DriverInference<P> {
    fn describe_image(&self, image: &ImageRef, instruction: &str) -> Result<String, InferenceError> {
        let encoded = self.encode_image(image)?;
        self.timed(&self.vision, "describe_image", instruction, &[encoded])
    }

    fn complete_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.timed(&self.text, "complete_text", prompt, &[])
    }
}
