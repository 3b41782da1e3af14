//! LLMプロバイダのトレイト定義

use crate::error::InferenceError;
use serde_json::Value;

/// LLMプロバイダのトレイト
///
/// 各プロバイダ（Ollama、Echo）はこのトレイトを実装する。
/// リクエスト生成・HTTP 実行・レスポンス解析を分けておき、組み立ては `LlmDriver` が行う。
pub trait LlmProvider: Send + Sync {
    /// プロバイダ名を返す
    fn name(&self) -> &str;

    /// このプロバイダが使うモデル名
    fn model(&self) -> &str;

    /// リクエストペイロードを生成
    ///
    /// # Arguments
    /// * `prompt` - モデルに渡すプロンプト全文
    /// * `images` - base64 エンコード済みの画像（テキストのみなら空）
    fn make_request_payload(&self, prompt: &str, images: &[String]) -> Result<Value, InferenceError>;

    /// HTTPリクエストを実行してレスポンスを取得
    ///
    /// # Returns
    /// * `Ok(String)` - レスポンスJSON文字列
    /// * `Err(InferenceError)` - モデル未インストールならば `ModelUnavailable`
    fn make_http_request(&self, request_json: &str) -> Result<String, InferenceError>;

    /// レスポンスからテキストを抽出
    ///
    /// # Returns
    /// * `Ok(Option<String>)` - 抽出したテキスト（存在しない場合はNone）
    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, InferenceError>;
}
