//! 推論サービス Outbound ポート
//!
//! 会話セッションが外部のモデルサービスに依頼できるのはこの 2 操作だけ。

use crate::domain::ImageRef;
use crate::error::InferenceError;

/// 画像付き/テキストのみの生成を行う推論サービス
pub trait InferenceService: Send + Sync {
    /// 画像と指示からテキストを生成する（ビジョンモデル）
    fn describe_image(&self, image: &ImageRef, instruction: &str) -> Result<String, InferenceError>;

    /// テキストプロンプトから続きを生成する（テキストモデル）
    fn complete_text(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// モデルのインストール（ModelUnavailable からの回復用）
pub trait ModelInstaller: Send + Sync {
    fn install(&self, model: &str) -> Result<(), InferenceError>;
}
