//! 画像についての対話ループ
//!
//! 会話の状態遷移は `common::session::Session` に任せ、ここでは入出力・履歴の保存・ログを扱う。

use common::domain::{History, ImageRef};
use common::error::Error;
use common::ports::outbound::{FileSystem, HistoryStore, InferenceService, Log, LogLevel, LogRecord};
use common::session::{Reply, Session};
use std::io::{BufRead, Write};
use std::sync::Arc;

pub const PROMPT: &str = "Ask a clarifying question (or type 'exit' to end): ";
const RESET_NOTICE: &str = "Detected image file in input. Resetting conversation and re-ingesting new image.";
const BANNER: &str = "====================";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

/// talk のユースケース
pub struct TalkUseCase {
    inference: Arc<dyn InferenceService>,
    fs: Arc<dyn FileSystem>,
    history_store: Arc<dyn HistoryStore>,
    log: Arc<dyn Log>,
    persona: Option<String>,
    color: bool,
}

impl TalkUseCase {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        fs: Arc<dyn FileSystem>,
        history_store: Arc<dyn HistoryStore>,
        log: Arc<dyn Log>,
        persona: Option<String>,
        color: bool,
    ) -> Self {
        Self {
            inference,
            fs,
            history_store,
            log,
            persona,
            color,
        }
    }

    fn record(&self, level: LogLevel, message: &str, kind: &str) -> LogRecord {
        LogRecord::new(level, message).layer("usecase").kind(kind)
    }

    /// 前回の履歴ファイルを消す（失敗しても続行）
    fn clear_history(&self) {
        if let Err(e) = self.history_store.clear() {
            self.log.emit(
                self.record(LogLevel::Warn, "failed to clear history", "persist")
                    .field("error", e.to_string()),
            );
        }
    }

    fn persist(&self, history: &History) {
        if let Err(e) = self.history_store.save(history) {
            self.log.emit(
                self.record(LogLevel::Warn, "failed to save history", "persist")
                    .field("turns", history.len())
                    .field("error", e.to_string()),
            );
        }
    }

    fn print_exchange(&self, out: &mut dyn Write, input: &str, response: &str) -> Result<(), Error> {
        writeln!(out, "\n{}\nYou:\n{}", BANNER, BANNER)?;
        writeln!(out, "{}", input)?;
        writeln!(out, "\n{}\nBot:\n{}", BANNER, BANNER)?;
        if self.color {
            writeln!(out, "{}{}{}", YELLOW, response, RESET)?;
        } else {
            writeln!(out, "{}", response)?;
        }
        Ok(())
    }

    /// 画像で会話を始め、`exit` か EOF まで質問を受け付ける
    ///
    /// 初回の説明に失敗したときはメッセージを出して非 0 の終了コードを返す。
    /// 途中のターンの失敗はそのターンだけを諦める。
    pub fn run(&self, image: ImageRef, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error> {
        self.clear_history();

        let mut session = match Session::bootstrap(self.inference.as_ref(), image.clone(), self.persona.as_deref()) {
            Ok(s) => s,
            Err(e) => {
                writeln!(out, "Failed to initialize the conversation: {}", e)?;
                self.log.emit(
                    self.record(LogLevel::Error, "bootstrap failed", "session")
                        .field("image", image.as_str())
                        .field("error", e.to_string()),
                );
                return Ok(Error::from(e).exit_code());
            }
        };
        self.log.emit(
            self.record(LogLevel::Info, "conversation started", "session")
                .field("image", image.as_str())
                .field("persona", session.persona().is_some()),
        );
        self.persist(session.history());
        writeln!(out, "Initial description of the image: {}", session.initial_description())?;

        let mut turns = 0usize;
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let line = line.trim();
            if line.eq_ignore_ascii_case("exit") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match session.continue_conversation(self.inference.as_ref(), self.fs.as_ref(), line) {
                Ok(reply) => {
                    turns += 1;
                    if let Reply::Reset { image, .. } = &reply {
                        writeln!(out, "{}", RESET_NOTICE)?;
                        self.log.emit(
                            self.record(LogLevel::Info, "conversation reset", "session")
                                .field("image", image.as_str()),
                        );
                    }
                    self.persist(session.history());
                    self.print_exchange(out, line, reply.response())?;
                }
                Err(e) => {
                    writeln!(out, "Failed to continue the conversation: {}", e)?;
                    self.log.emit(
                        self.record(LogLevel::Warn, "turn failed", "session")
                            .field("error", e.to_string()),
                    );
                }
            }
        }

        self.log.emit(
            self.record(LogLevel::Info, "conversation finished", "session")
                .field("turns", turns)
                .field("history_len", session.history().len()),
        );
        Ok(0)
    }
}
