//! プロバイダファクトリー
//!
//! プロバイダタイプに基づいて適切なプロバイダを作成します。

use crate::error::InferenceError;
use crate::llm::driver::LlmDriver;
use crate::llm::echo::EchoProvider;
use crate::llm::ollama::OllamaProvider;
use crate::llm::provider::LlmProvider;
use serde_json::Value;
use std::time::Duration;

/// プロバイダタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Ollama ネイティブ API
    Ollama,
    /// Echo（サービスを呼ばずプロンプトを返すだけ）
    Echo,
}

impl ProviderType {
    /// 文字列からプロバイダタイプを解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }

    /// プロバイダタイプを文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Echo => "echo",
        }
    }

    /// 実サービス（プロセス管理・モデルのインストール）が必要か
    pub fn needs_service(&self) -> bool {
        matches!(self, Self::Ollama)
    }
}

/// プロバイダのenumラッパー
///
/// 異なるプロバイダタイプを型安全に扱うために使用します。
pub enum AnyProvider {
    Ollama(OllamaProvider),
    Echo(EchoProvider),
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Ollama(p) => p.name(),
            Self::Echo(p) => p.name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Ollama(p) => p.model(),
            Self::Echo(p) => p.model(),
        }
    }

    fn make_request_payload(&self, prompt: &str, images: &[String]) -> Result<Value, InferenceError> {
        match self {
            Self::Ollama(p) => p.make_request_payload(prompt, images),
            Self::Echo(p) => p.make_request_payload(prompt, images),
        }
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, InferenceError> {
        match self {
            Self::Ollama(p) => p.make_http_request(request_json),
            Self::Echo(p) => p.make_http_request(request_json),
        }
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, InferenceError> {
        match self {
            Self::Ollama(p) => p.parse_response_text(response_json),
            Self::Echo(p) => p.parse_response_text(response_json),
        }
    }
}

/// プロバイダを作成
pub fn create_provider(
    provider_type: ProviderType,
    model: &str,
    base_url: &str,
    timeout: Duration,
) -> Result<AnyProvider, InferenceError> {
    match provider_type {
        ProviderType::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(model, base_url, timeout)?)),
        ProviderType::Echo => Ok(AnyProvider::Echo(EchoProvider::new(model))),
    }
}

/// ドライバーを作成
pub fn create_driver(
    provider_type: ProviderType,
    model: &str,
    base_url: &str,
    timeout: Duration,
) -> Result<LlmDriver<AnyProvider>, InferenceError> {
    Ok(LlmDriver::new(create_provider(provider_type, model, base_url, timeout)?))
}
