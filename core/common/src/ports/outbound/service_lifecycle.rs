//! 推論サービスのプロセス管理 Outbound ポート
//!
//! 取得と解放の対応は `common::service::ServiceGuard` が保証する。実装側は
//! start/stop を素直に書けばよい。

use crate::error::Error;

pub trait ServiceLifecycle: Send + Sync {
    /// サービスを利用可能にする（必要なら起動して待つ）
    fn start(&self) -> Result<(), Error>;
    /// 後片付け（モデルのアンロード、自分で起動したプロセスの停止）
    fn stop(&self) -> Result<(), Error>;
}
