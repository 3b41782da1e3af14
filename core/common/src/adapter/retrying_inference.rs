//! ModelUnavailable のときだけ「インストールして 1 回だけ再試行」する InferenceService デコレータ
//!
//! 再試行は 1 回きり。2 回目の結果（成功でも失敗でも）をそのまま返す。
//! インストール自体が失敗した場合はそのエラーを返す。

use crate::domain::ImageRef;
use crate::error::InferenceError;
use crate::ports::outbound::{InferenceService, Log, LogLevel, LogRecord, ModelInstaller};
use std::sync::Arc;

pub struct RetryingInference {
    inner: Arc<dyn InferenceService>,
    installer: Arc<dyn ModelInstaller>,
    log: Arc<dyn Log>,
}

impl RetryingInference {
    pub fn new(
        inner: Arc<dyn InferenceService>,
        installer: Arc<dyn ModelInstaller>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            inner,
            installer,
            log,
        }
    }

    fn with_install_retry<F>(&self, call: F) -> Result<String, InferenceError>
    where
        F: Fn(&dyn InferenceService) -> Result<String, InferenceError>,
    {
        match call(self.inner.as_ref()) {
            Err(InferenceError::ModelUnavailable { model }) => {
                self.log.emit(
                    LogRecord::new(LogLevel::Info, "model not installed; pulling it")
                        .layer("adapter")
                        .kind("install")
                        .field("model", model.as_str()),
                );
                if let Err(e) = self.installer.install(&model) {
                    self.log.emit(
                        LogRecord::new(LogLevel::Error, "model install failed")
                            .layer("adapter")
                            .kind("install")
                            .field("model", model.as_str())
                            .field("error", e.to_string()),
                    );
                    return Err(e);
                }
                call(self.inner.as_ref())
            }
            other => other,
        }
    }
}

impl InferenceService for RetryingInference {
    fn describe_image(&self, image: &ImageRef, instruction: &str) -> Result<String, InferenceError> {
        self.with_install_retry(|s| s.describe_image(image, instruction))
    }

    fn complete_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.with_install_retry(|s| s.complete_text(prompt))
    }
}
