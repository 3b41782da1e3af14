//! アダプター（ポートの標準実装）
//!
//! usecase はポートの trait 経由でのみファイル・ログ・推論サービス・プロセスに触れる。
//! 実装は標準実装（Std*）や Ollama 向け実装、テスト用の Noop を注入する。

pub mod driver_inference;
pub mod file_json_log;
pub mod human_log;
pub mod json_history_store;
pub mod ollama_service;
pub mod retrying_inference;
pub mod std_env_resolver;
pub mod std_fs;

pub use driver_inference::DriverInference;
pub use file_json_log::{FileJsonLog, NoopLog};
pub use human_log::{FanoutLog, StderrLog};
pub use json_history_store::{JsonHistoryStore, NoopHistoryStore};
pub use ollama_service::{OllamaModelInstaller, OllamaService};
pub use retrying_inference::RetryingInference;
pub use std_env_resolver::StdEnvResolver;
pub use std_fs::StdFileSystem;
