//! LLMドライバーとプロバイダの実装
//!
//! このモジュールは、異なるプロバイダ（Ollama、Echo）で共通する処理を提供します。

pub mod driver;
pub mod echo;
pub mod factory;
pub mod ollama;
pub mod provider;

pub use driver::LlmDriver;
pub use factory::{create_driver, create_provider, AnyProvider, ProviderType};
pub use provider::LlmProvider;
