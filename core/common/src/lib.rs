//! lvchat 共通ライブラリ
//!
//! `talk`（画像についての対話）と `describe`（指示メニューで画像を説明）で共有される機能を提供します。

/// アダプター（ポートの標準実装）
pub mod adapter;

/// 設定の解決（CLI > 環境変数 > 設定ファイル > 既定値）
pub mod config;

/// ドメイン型（会話ターン・履歴・画像参照）
pub mod domain;

/// エラーハンドリング
pub mod error;

/// LLMドライバーとプロバイダ
pub mod llm;

/// ポート（外界との境界）
pub mod ports;

/// 推論サービスのスコープ付き取得
pub mod service;

/// 会話セッション
pub mod session;
