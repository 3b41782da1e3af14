//! 会話履歴の保存 Outbound ポート
//!
//! 保存はベストエフォート。呼び出し側は失敗をログに残してターンを続ける。

use crate::domain::History;
use crate::error::Error;

pub trait HistoryStore: Send + Sync {
    /// 履歴全体で上書き保存する
    fn save(&self, history: &History) -> Result<(), Error>;
    /// 保存先を削除する（存在しなければ何もしない）
    fn clear(&self) -> Result<(), Error>;
}
