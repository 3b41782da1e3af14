//! Inbound ポート: ドライバ（CLI）がアプリを呼び出すインターフェース

use crate::cli::Config;
use common::error::Error;
use std::io::{BufRead, Write};

/// talk アプリケーションを実行する Inbound ポート
///
/// main はこの trait を実装した Runner の run を呼び出す。入出力を差し替えられるので
/// テストでは台本の stdin と Vec<u8> の stdout で回す。
pub trait UseCaseRunner {
    fn run(&self, config: Config, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error>;
}
