//! エラーハンドリング
//!
//! 全レイヤー共通の `Error` と、推論サービス由来の `InferenceError` を定義する。
//! `Error` は終了コードを持ち、main はそれをそのままプロセスの終了コードにする。

/// 推論サービス（Ollama 等）の失敗種別
///
/// `ModelUnavailable` だけはインストール後の再試行で回復し得る。それ以外はすべて `Service`。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// 指定モデルがサービスにインストールされていない
    #[error("model '{model}' is not installed")]
    ModelUnavailable { model: String },
    /// 通信失敗・不正/空レスポンス・画像が読めない等
    #[error("{0}")]
    Service(String),
}

impl InferenceError {
    pub fn model_unavailable(model: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            model: model.into(),
        }
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable { .. })
    }
}

/// エラー型
///
/// バリアントごとに終了コード（sysexits 準拠）が決まる。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 引数不正（usage を表示する）
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Json(String),
    /// 環境変数・設定の解決失敗
    #[error("{0}")]
    Env(String),
    /// サービス起動失敗など、その他のシステムエラー
    #[error("{0}")]
    System(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn io_msg(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }

    pub fn env(msg: impl Into<String>) -> Self {
        Self::Env(msg.into())
    }

    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// usage を表示すべきエラーか
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// プロセスの終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 64,
            Self::Io(_) | Self::Json(_) => 74,
            Self::Env(_) => 78,
            Self::System(_) => 70,
            Self::Inference(InferenceError::ModelUnavailable { .. }) => 69,
            Self::Inference(InferenceError::Service(_)) => 74,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
