//! 配線: 標準アダプタで UseCase を組み立てる

use std::sync::Arc;

use common::adapter::{
    DriverInference, FanoutLog, FileJsonLog, OllamaModelInstaller, OllamaService, RetryingInference,
    StderrLog, StdEnvResolver, StdFileSystem,
};
use common::config::{load_config_file, AppConfig};
use common::error::Error;
use common::llm::create_driver;
use common::ports::outbound::{EnvResolver, FileSystem, InferenceService, Log, LogLevel, LogRecord, ServiceLifecycle};

use crate::cli::Config;
use crate::usecase::app::DescribeUseCase;

pub struct App {
    pub config: AppConfig,
    pub logger: Arc<dyn Log>,
    pub service: Option<Arc<dyn ServiceLifecycle>>,
    pub describe_use_case: DescribeUseCase,
}

pub fn wire_describe(cli: &Config) -> Result<App, Error> {
    wire_describe_with(&StdEnvResolver, cli)
}

pub fn wire_describe_with(env: &dyn EnvResolver, cli: &Config) -> Result<App, Error> {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let home = env.resolve_home_dir()?;

    let file_log: Arc<dyn Log> = Arc::new(FileJsonLog::new(
        Arc::clone(&fs),
        home.logs_dir().join("describe.jsonl"),
    ));
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
            .field("vision_model", config.vision_model.as_ref()),
    );

    // describe はテキストモデルを使わないのでビジョンモデルで両方を埋める
    let vision = create_driver(config.provider, &config.vision_model, &config.base_url, config.request_timeout)?;
    let text = create_driver(config.provider, &config.vision_model, &config.base_url, config.request_timeout)?;
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
                vec![config.vision_model.clone()],
                Arc::clone(&logger),
            )?);
            let retrying: Arc<dyn InferenceService> =
                Arc::new(RetryingInference::new(drivers, installer, Arc::clone(&logger)));
            (retrying, Some(service))
        } else {
            (drivers, None)
        };

    let describe_use_case = DescribeUseCase::new(inference, fs, Arc::clone(&logger), cli.instructions.clone());

    Ok(App {
        config,
        logger,
        service,
        describe_use_case,
    })
}
