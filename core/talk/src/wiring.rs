//! 配線: 標準アダプタで UseCase を組み立てる

use std::io::IsTerminal;
use std::sync::Arc;

use common::adapter::{
    DriverInference, FanoutLog, FileJsonLog, JsonHistoryStore, NoopHistoryStore, OllamaModelInstaller,
    OllamaService, RetryingInference, StderrLog, StdEnvResolver, StdFileSystem,
};
use common::config::{load_config_file, AppConfig};
use common::error::Error;
use common::llm::create_driver;
use common::ports::outbound::{
    EnvResolver, FileSystem, HistoryStore, InferenceService, Log, LogLevel, LogRecord, ServiceLifecycle,
};

use crate::cli::Config;
use crate::usecase::app::TalkUseCase;

/// 組み立て済みのアプリケーション
pub struct App {
    pub config: AppConfig,
    pub logger: Arc<dyn Log>,
    /// echo プロバイダのときは None（管理するサービスがない）
    pub service: Option<Arc<dyn ServiceLifecycle>>,
    pub talk_use_case: TalkUseCase,
}

/// 配線: 標準アダプタで App を組み立てる
pub fn wire_talk(cli: &Config) -> Result<App, Error> {
    wire_talk_with(&StdEnvResolver, cli, std::io::stdout().is_terminal())
}

/// 環境と端末判定を差し替えられる配線（テスト用の入口も兼ねる）
pub fn wire_talk_with(env: &dyn EnvResolver, cli: &Config, stdout_is_tty: bool) -> Result<App, Error> {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let home = env.resolve_home_dir()?;

    let file_log: Arc<dyn Log> = Arc::new(FileJsonLog::new(Arc::clone(&fs), home.logs_dir().join("talk.jsonl")));
    let logger: Arc<dyn Log> = if cli.verbose {
        let stderr: Arc<dyn Log> = Arc::new(StderrLog);
        Arc::new(FanoutLog::new(vec![file_log, stderr]))
    } else {
        file_log
    };

    let file = load_config_file(fs.as_ref(), &home.config_file())?;
    let config = AppConfig::resolve(file, env.ollama_host(), cli.overrides()?)?;
    logger.emit(
        LogRecord::new(LogLevel::Debug, "config resolved")
            .layer("wiring")
            .kind("config")
            .field("provider", config.provider.as_str())
            .field("base_url", config.base_url.as_str())
            .field("vision_model", config.vision_model.as_ref())
            .field("text_model", config.text_model.as_ref())
            .field("history", config.history_file.as_ref().map(|p| p.display().to_string())),
    );

    let vision = create_driver(config.provider, &config.vision_model, &config.base_url, config.request_timeout)?;
    let text = create_driver(config.provider, &config.text_model, &config.base_url, config.request_timeout)?;
    let drivers: Arc<dyn InferenceService> = Arc::new(DriverInference::new(
        vision,
        text,
        Arc::clone(&fs),
        Arc::clone(&logger),
    ));

    let (inference, service): (Arc<dyn InferenceService>, Option<Arc<dyn ServiceLifecycle>>) =
        if config.provider.needs_service() {
            let installer = Arc::new(OllamaModelInstaller::new(&config.base_url, Arc::clone(&logger))?);
            let service: Arc<dyn ServiceLifecycle> = Arc::new(OllamaService::new(
                &config.base_url,
                config.manage_service,
                config.startup_timeout,
                vec![config.vision_model.clone(), config.text_model.clone()],
                Arc::clone(&logger),
            )?);
            let retrying: Arc<dyn InferenceService> =
                Arc::new(RetryingInference::new(drivers, installer, Arc::clone(&logger)));
            (retrying, Some(service))
        } else {
            (drivers, None)
        };

    let history_store: Arc<dyn HistoryStore> = match &config.history_file {
        Some(path) => Arc::new(JsonHistoryStore::new(Arc::clone(&fs), path)),
        None => Arc::new(NoopHistoryStore),
    };

    let color = stdout_is_tty && !env.no_color();
    let talk_use_case = TalkUseCase::new(
        inference,
        fs,
        history_store,
        Arc::clone(&logger),
        config.system_prompt.clone(),
        color,
    );

    Ok(App {
        config,
        logger,
        service,
        talk_use_case,
    })
}
