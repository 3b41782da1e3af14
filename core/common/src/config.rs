//! 設定（config.json + 環境変数 + CLI 上書き）
//!
//! 優先順位: CLI > OLLAMA_HOST（ベース URL のみ）> config.json > 既定値。
//! ファイル読みは `load_config_file`、合成は `AppConfig::resolve` で行う。

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::ollama::{normalize_base_url, DEFAULT_BASE_URL};
use crate::llm::ProviderType;
use crate::ports::outbound::FileSystem;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_VISION_MODEL: &str = "llava:13b";
pub const DEFAULT_TEXT_MODEL: &str = "llama3.1";
pub const DEFAULT_HISTORY_FILE: &str = "history.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 10;

/// config.json の中身（すべて省略可）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    pub provider: Option<String>,
    #[serde(alias = "host")]
    pub base_url: Option<String>,
    pub vision_model: Option<String>,
    pub text_model: Option<String>,
    #[serde(alias = "persona")]
    pub system_prompt: Option<String>,
    pub history_file: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub manage_service: Option<bool>,
    pub startup_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// JSON 文字列からパース
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// config.json を読む。存在しなければ既定（全項目 None）
pub fn load_config_file(fs: &dyn FileSystem, path: &Path) -> Result<ConfigFile, Error> {
    if !fs.exists(path) {
        return Ok(ConfigFile::default());
    }
    let content = fs.read_to_string(path)?;
    ConfigFile::parse(&content)
        .map_err(|e| Error::json(format!("Invalid config '{}': {}", path.display(), e)))
}

/// CLI からの上書き
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub provider: Option<ProviderType>,
    pub base_url: Option<String>,
    pub vision_model: Option<ModelName>,
    pub text_model: Option<ModelName>,
    pub system_prompt: Option<String>,
    /// --no-system: 設定ファイルのペルソナも使わない
    pub no_system: bool,
    pub history_file: Option<PathBuf>,
    /// --no-history: 履歴を保存しない
    pub no_history: bool,
    /// --no-manage-service のとき Some(false)
    pub manage_service: Option<bool>,
}

/// 解決済みの設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderType,
    pub base_url: String,
    pub vision_model: ModelName,
    pub text_model: ModelName,
    /// ペルソナ（system 指示）。空文字は None 扱い
    pub system_prompt: Option<String>,
    /// None なら履歴を保存しない
    pub history_file: Option<PathBuf>,
    pub request_timeout: Duration,
    /// サービスが応答しないとき自分で起動するか
    pub manage_service: bool,
    pub startup_timeout: Duration,
}

impl AppConfig {
    pub fn resolve(
        file: ConfigFile,
        ollama_host: Option<String>,
        overrides: ConfigOverrides,
    ) -> Result<Self, Error> {
        let provider = match overrides.provider {
            Some(p) => p,
            None => match file.provider.as_deref() {
                Some(s) => ProviderType::parse(s)
                    .ok_or_else(|| Error::env(format!("Unknown provider '{}' in config", s)))?,
                None => ProviderType::Ollama,
            },
        };

        let base_url = overrides
            .base_url
            .or(ollama_host)
            .or(file.base_url)
            .map(|s| normalize_base_url(&s))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let vision_model = overrides
            .vision_model
            .or_else(|| file.vision_model.map(ModelName::new))
            .unwrap_or_else(|| ModelName::new(DEFAULT_VISION_MODEL));
        let text_model = overrides
            .text_model
            .or_else(|| file.text_model.map(ModelName::new))
            .unwrap_or_else(|| ModelName::new(DEFAULT_TEXT_MODEL));

        let system_prompt = if overrides.no_system {
            None
        } else {
            overrides
                .system_prompt
                .or(file.system_prompt)
                .filter(|s| !s.trim().is_empty())
        };

        let history_file = if overrides.no_history {
            None
        } else {
            Some(
                overrides
                    .history_file
                    .or_else(|| file.history_file.map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE)),
            )
        };

        let request_timeout = Duration::from_secs(
            file.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        let startup_timeout = Duration::from_secs(
            file.startup_timeout_secs
                .unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS),
        );
        let manage_service = overrides
            .manage_service
            .or(file.manage_service)
            .unwrap_or(true);

        Ok(AppConfig {
            provider,
            base_url,
            vision_model,
            text_model,
            system_prompt,
            history_file,
            request_timeout,
            manage_service,
            startup_timeout,
        })
    }
}
