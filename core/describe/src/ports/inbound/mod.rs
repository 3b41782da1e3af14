//! Inbound ポート: ドライバ（CLI）がアプリを呼び出すインターフェース

use crate::cli::Config;
use common::error::Error;
use std::io::{BufRead, Write};

/// describe アプリケーションを実行する Inbound ポート
pub trait UseCaseRunner {
    fn run(&self, config: Config, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error>;
}
