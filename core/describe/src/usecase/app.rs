//! 番号付きの指示メニューから選んで画像について尋ねるループ

use common::domain::ImageRef;
use common::error::Error;
use common::ports::outbound::{FileSystem, InferenceService, Log, LogLevel, LogRecord};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// -i 未指定時のメニュー
pub const DEFAULT_INSTRUCTIONS: [&str; 5] = [
    "Describe this image",
    "Reply yes or no. Is this man wearing a hat",
    "What color are this man's eyes",
    "Estimate this man's age within 5 years, you must pick a number",
    "Rate this man's looks from 1-10 where 10 is the most attractive human on the planet and 1 is ugly. Use any opinions you want, but you must pick a number, respond with only a number",
];

pub const PROMPT: &str = "Select an instruction by number (or type 'exit' to leave): ";
const INVALID_INPUT: &str = "Invalid input. Please enter a number or 'exit'.";
const INVALID_CHOICE: &str = "Invalid choice. Please select a valid instruction number.";

/// 入力 1 行の解釈
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Exit,
    /// 0 始まりの添字
    Instruction(usize),
    NotANumber,
    OutOfRange,
}

/// メニューの選択を解釈する（1 始まりの番号）
pub fn parse_selection(line: &str, menu_len: usize) -> Selection {
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        return Selection::Exit;
    }
    match line.parse::<i64>() {
        Ok(n) if n >= 1 && (n as u64) <= menu_len as u64 => Selection::Instruction(n as usize - 1),
        Ok(_) => Selection::OutOfRange,
        Err(_) => Selection::NotANumber,
    }
}

pub struct DescribeUseCase {
    inference: Arc<dyn InferenceService>,
    fs: Arc<dyn FileSystem>,
    log: Arc<dyn Log>,
    instructions: Vec<String>,
}

impl DescribeUseCase {
    /// `instructions` が空なら既定のメニューを使う
    pub fn new(
        inference: Arc<dyn InferenceService>,
        fs: Arc<dyn FileSystem>,
        log: Arc<dyn Log>,
        instructions: Vec<String>,
    ) -> Self {
        let instructions = if instructions.is_empty() {
            DEFAULT_INSTRUCTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            instructions
        };
        Self {
            inference,
            fs,
            log,
            instructions,
        }
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    fn print_menu(&self, out: &mut dyn Write) -> Result<(), Error> {
        writeln!(out, "\nAvailable Instructions:")?;
        for (idx, instruction) in self.instructions.iter().enumerate() {
            writeln!(out, "{}: {}", idx + 1, instruction)?;
        }
        Ok(())
    }

    /// `exit` か EOF までメニューを出し続ける
    pub fn run(&self, image: ImageRef, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error> {
        if !self.fs.is_file(image.as_path()) {
            return Err(Error::io_msg(format!("Image file not found: '{}'", image)));
        }

        loop {
            self.print_menu(out)?;
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let index = match parse_selection(&line, self.instructions.len()) {
                Selection::Exit => break,
                Selection::NotANumber => {
                    writeln!(out, "{}", INVALID_INPUT)?;
                    continue;
                }
                Selection::OutOfRange => {
                    writeln!(out, "{}", INVALID_CHOICE)?;
                    continue;
                }
                Selection::Instruction(i) => i,
            };

            let instruction = &self.instructions[index];
            match self.inference.describe_image(&image, instruction) {
                Ok(description) => {
                    writeln!(out, "\nDescription of the image: {}", description)?;
                }
                Err(e) => {
                    writeln!(out, "Error generating image description: {}", e)?;
                    self.log.emit(
                        LogRecord::new(LogLevel::Warn, "describe failed")
                            .layer("usecase")
                            .kind("inference")
                            .field("choice", index + 1)
                            .field("error", e.to_string()),
                    );
                }
            }
        }
        Ok(0)
    }
}
