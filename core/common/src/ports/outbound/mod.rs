//! Outbound ポート: アプリが外界（FS・ログ・推論サービス・サービス管理・履歴保存）を使うための trait

pub mod env_resolver;
pub mod fs;
pub mod history_store;
pub mod inference;
pub mod log;
pub mod service_lifecycle;

pub use env_resolver::EnvResolver;
pub use fs::{FileMetadata, FileSystem};
pub use history_store::HistoryStore;
pub use inference::{InferenceService, ModelInstaller};
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use service_lifecycle::ServiceLifecycle;
