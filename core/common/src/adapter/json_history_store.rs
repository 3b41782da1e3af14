//! 会話履歴を JSON 配列でファイルに保存する HistoryStore 実装
//!
//! 毎回全体を `<path>.tmp` に書いてから rename する。スキーマのバージョンは持たない。

use crate::domain::History;
use crate::error::Error;
use crate::ports::outbound::{FileSystem, HistoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct JsonHistoryStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl HistoryStore for JsonHistoryStore {
    fn save(&self, history: &History) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(history)
            .map_err(|e| Error::json(format!("Failed to serialize history: {}", e)))?;
        let tmp = self.tmp_path();
        self.fs.write(&tmp, &json)?;
        self.fs.rename(&tmp, &self.path)
    }

    fn clear(&self) -> Result<(), Error> {
        if self.fs.exists(&self.path) {
            self.fs.remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// 何も保存しない HistoryStore（--no-history やテスト用）
#[derive(Debug, Clone, Default)]
pub struct NoopHistoryStore;

impl HistoryStore for NoopHistoryStore {
    fn save(&self, _history: &History) -> Result<(), Error> {
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        Ok(())
    }
}
