mod run_app_tests;
mod talk_loop_tests;

use common::domain::HomeDir;
use common::error::Error;
use common::ports::outbound::EnvResolver;
use std::path::PathBuf;

/// テスト用の環境: ホームを一時ディレクトリに固定し、OLLAMA_HOST / NO_COLOR を指定できる
pub struct FakeEnv {
    pub home: PathBuf,
    pub ollama_host: Option<String>,
    pub no_color: bool,
}

impl FakeEnv {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ollama_host: None,
            no_color: false,
        }
    }
}

impl EnvResolver for FakeEnv {
    fn resolve_home_dir(&self) -> Result<HomeDir, Error> {
        Ok(HomeDir::new(self.home.clone()))
    }

    fn ollama_host(&self) -> Option<String> {
        self.ollama_host.clone()
    }

    fn no_color(&self) -> bool {
        self.no_color
    }
}
