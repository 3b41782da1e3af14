//! 環境変数解決 Outbound ポート
//!
//! usecase / wiring はこの trait 経由でのみ環境変数にアクセスする。

use crate::domain::HomeDir;
use crate::error::Error;

/// 環境変数解決抽象（Outbound ポート）
///
/// 実装は `common::adapter::StdEnvResolver` やテスト用のモックなど。
pub trait EnvResolver: Send + Sync {
    /// ホームディレクトリを環境変数から解決する
    ///
    /// 優先順位:
    /// 1. LVCHAT_HOME（設定されていれば）
    /// 2. $XDG_CONFIG_HOME/lvchat（XDG_CONFIG_HOME が設定されていれば）
    /// 3. $HOME/.config/lvchat
    fn resolve_home_dir(&self) -> Result<HomeDir, Error>;

    /// OLLAMA_HOST（Ollama 自身と同じ変数）。未設定・空なら None
    fn ollama_host(&self) -> Option<String>;

    /// NO_COLOR が設定されているか
    fn no_color(&self) -> bool;
}
