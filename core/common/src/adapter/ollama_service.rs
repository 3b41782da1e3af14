//! Ollama サービスのプロセス管理とモデルのインストール
//!
//! - `OllamaService`: 応答がなければ `ollama serve` を起動して待つ。停止時は使ったモデルを
//!   アンロードし（アクセラレータのメモリ解放）、自分で起動した場合だけプロセスを止める。
//! - `OllamaModelInstaller`: `/api/pull` でモデルを取得する。

use crate::domain::ModelName;
use crate::error::{Error, InferenceError};
use crate::llm::ollama::normalize_base_url;
use crate::ports::outbound::{Log, LogLevel, LogRecord, ModelInstaller, ServiceLifecycle};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const UNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// `ollama serve` に渡す OLLAMA_HOST（スキームなしの host:port）
pub fn host_port(base_url: &str) -> String {
    let url = normalize_base_url(base_url);
    url.trim_start_matches("http://")
        .trim_start_matches("https://")
        .to_string()
}

fn build_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, Error> {
    // None のときは無制限（pull は数 GB になり得る）
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::system(format!("Failed to build HTTP client: {}", e)))
}

/// Ollama サービスのライフサイクル管理
pub struct OllamaService {
    base_url: String,
    manage: bool,
    startup_timeout: Duration,
    models: Vec<ModelName>,
    program: PathBuf,
    client: reqwest::blocking::Client,
    child: Mutex<Option<Child>>,
    log: Arc<dyn Log>,
}

impl OllamaService {
    /// * `manage` - 応答がないとき自分で `ollama serve` を起動するか
    /// * `models` - 停止時にアンロードするモデル
    pub fn new(
        base_url: &str,
        manage: bool,
        startup_timeout: Duration,
        models: Vec<ModelName>,
        log: Arc<dyn Log>,
    ) -> Result<Self, Error> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            manage,
            startup_timeout,
            models,
            program: PathBuf::from("ollama"),
            client: build_client(Some(UNLOAD_TIMEOUT))?,
            child: Mutex::new(None),
            log,
        })
    }

    /// `/api/tags` が 2xx を返すか
    pub fn is_reachable(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// 自分でサーバープロセスを起動したか
    pub fn owns_process(&self) -> bool {
        self.child
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn spawn_server(&self) -> Result<Child, Error> {
        Command::new(&self.program)
            .arg("serve")
            .env("OLLAMA_HOST", host_port(&self.base_url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::system(format!(
                    "Failed to execute '{} serve': {}",
                    self.program.display(),
                    e
                ))
            })
    }

    fn wait_until_reachable(&self) -> bool {
        let deadline = Instant::now() + self.startup_timeout;
        loop {
            if self.is_reachable() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// keep_alive=0 でモデルをメモリから降ろす
    fn unload(&self, model: &ModelName) -> Result<(), Error> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({ "model": model.as_ref(), "keep_alive": 0 }))
            .send()
            .map_err(|e| Error::system(format!("Failed to unload '{}': {}", model, e)))?;
        if !response.status().is_success() {
            return Err(Error::system(format!(
                "Failed to unload '{}': HTTP {}",
                model,
                response.status()
            )));
        }
        Ok(())
    }

    fn record(&self, level: LogLevel, message: &str) -> LogRecord {
        LogRecord::new(level, message)
            .layer("adapter")
            .kind("service")
            .field("base_url", self.base_url.as_str())
    }
}

impl ServiceLifecycle for OllamaService {
    fn start(&self) -> Result<(), Error> {
        if self.is_reachable() {
            self.log.emit(self.record(LogLevel::Info, "service already running"));
            return Ok(());
        }
        if !self.manage {
            return Err(Error::system(format!(
                "Ollama service is not reachable at {} (start it with `ollama serve`)",
                self.base_url
            )));
        }

        let mut child = self.spawn_server()?;
        self.log.emit(
            self.record(LogLevel::Info, "spawned ollama serve")
                .field("pid", child.id()),
        );
        if !self.wait_until_reachable() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::system(format!(
                "Ollama service did not become ready within {}s",
                self.startup_timeout.as_secs()
            )));
        }
        *self.child.lock().unwrap_or_else(|e| e.into_inner()) = Some(child);
        Ok(())
    }

    fn stop(&self) -> Result<(), Error> {
        if self.is_reachable() {
            for model in &self.models {
                if let Err(e) = self.unload(model) {
                    self.log.emit(
                        self.record(LogLevel::Warn, "model unload failed")
                            .field("model", model.as_ref())
                            .field("error", e.to_string()),
                    );
                }
            }
        }

        let child = self.child.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(mut child) = child {
            child
                .kill()
                .map_err(|e| Error::system(format!("Failed to stop ollama serve: {}", e)))?;
            let _ = child.wait();
            self.log.emit(self.record(LogLevel::Info, "stopped ollama serve"));
        }
        Ok(())
    }
}

/// `/api/pull` でモデルを取得する ModelInstaller
pub struct OllamaModelInstaller {
    base_url: String,
    client: reqwest::blocking::Client,
    log: Arc<dyn Log>,
}

impl OllamaModelInstaller {
    pub fn new(base_url: &str, log: Arc<dyn Log>) -> Result<Self, Error> {
        Ok(Self {
            base_url: normalize_base_url(base_url),
            client: build_client(None)?,
            log,
        })
    }

    fn pull(&self, model: &str) -> Result<(), InferenceError> {
        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&json!({ "model": model, "stream": false }))
            .send()
            .map_err(|e| InferenceError::service(format!("Failed to pull model '{}': {}", model, e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| InferenceError::service(format!("Failed to read pull response: {}", e)))?;
        check_pull_response(model, status, &body)
    }
}

/// pull の応答本文を検査する（{"status":"success"} 以外は失敗）
pub fn check_pull_response(model: &str, status: u16, body: &str) -> Result<(), InferenceError> {
    let v: Option<Value> = serde_json::from_str(body).ok();
    if let Some(err) = v.as_ref().and_then(|v| v["error"].as_str()) {
        return Err(InferenceError::service(format!(
            "Failed to pull model '{}': {}",
            model, err
        )));
    }
    if !(200..300).contains(&status) {
        return Err(InferenceError::service(format!(
            "Failed to pull model '{}': HTTP {}: {}",
            model,
            status,
            body.trim()
        )));
    }
    match v.as_ref().and_then(|v| v["status"].as_str()) {
        Some("success") => Ok(()),
        other => Err(InferenceError::service(format!(
            "Failed to pull model '{}': unexpected status {:?}",
            model, other
        ))),
    }
}

impl ModelInstaller for OllamaModelInstaller {
    fn install(&self, model: &str) -> Result<(), InferenceError> {
        let record = |level, message: &str| {
            LogRecord::new(level, message)
                .layer("adapter")
                .kind("install")
                .field("model", model)
                .field("base_url", self.base_url.as_str())
        };
        self.log.emit(record(LogLevel::Info, "pulling model"));
        let started = Instant::now();
        let result = self.pull(model);
        match &result {
            Ok(()) => self.log.emit(
                record(LogLevel::Info, "model pulled").field("duration_ms", started.elapsed().as_millis() as u64),
            ),
            Err(e) => self
                .log
                .emit(record(LogLevel::Warn, "model pull failed").field("error", e.to_string())),
        }
        result
    }
}
