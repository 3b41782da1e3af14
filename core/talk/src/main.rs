mod cli;
mod ports;
mod usecase;
mod wiring;

#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};
use std::process;

use cli::{parse_args, print_completion, Config, ParseOutcome};
use common::error::Error;
use common::ports::outbound::{LogLevel, LogRecord};
use common::service::ServiceGuard;
use ports::inbound::UseCaseRunner;
use wiring::{wire_talk, App};

/// Ctrl-C で終了したときの終了コード（128 + SIGINT）
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// 配線済みの App で対話ループを回す Runner
struct Runner {
    app: App,
}

impl Runner {
    /// サービスを確保する。Ctrl-C でも解放してから終了するようハンドラを登録する
    fn acquire_service(&self) -> Result<Option<ServiceGuard>, Error> {
        let Some(service) = self.app.service.as_ref() else {
            return Ok(None);
        };
        let guard = ServiceGuard::acquire(service.clone(), self.app.logger.clone())?;
        let handle = guard.handle();
        ctrlc::set_handler(move || {
            handle.release();
            process::exit(INTERRUPTED_EXIT_CODE);
        })
        .map_err(|e| Error::system(format!("Failed to install Ctrl-C handler: {}", e)))?;
        Ok(Some(guard))
    }

    fn log(&self, level: LogLevel, message: &str) -> LogRecord {
        LogRecord::new(level, message).layer("cli").kind("lifecycle")
    }
}

impl UseCaseRunner for Runner {
    fn run(&self, config: Config, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error> {
        let image = config
            .image
            .clone()
            .ok_or_else(|| Error::invalid_argument("No image provided."))?;
        self.app.logger.emit(
            self.log(LogLevel::Info, "command started")
                .field("command", "talk")
                .field("provider", self.app.config.provider.as_str()),
        );

        // guard はこの関数を抜けるまで生かす（drop で停止）
        let result = self
            .acquire_service()
            .and_then(|_guard| self.app.talk_use_case.run(image, input, out));

        let code = match &result {
            Ok(code) => *code,
            Err(e) => e.exit_code(),
        };
        self.app.logger.emit(
            self.log(LogLevel::Info, "command finished")
                .field("command", "talk")
                .field("exit_code", code),
        );
        if let Err(ref e) = result {
            self.app
                .logger
                .emit(LogRecord::new(LogLevel::Error, e.to_string()).layer("cli").kind("error"));
        }
        result
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("talk: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

pub fn run() -> Result<i32, Error> {
    let config = match parse_args()? {
        ParseOutcome::Config(c) => c,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
    };
    if config.help {
        print_help();
        return Ok(0);
    }
    if config.image.is_none() {
        return Err(Error::invalid_argument("No image provided."));
    }
    let app = wire_talk(&config)?;
    let runner = Runner { app };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    runner.run(config, &mut stdin.lock(), &mut stdout.lock())
}

fn print_usage() {
    eprintln!("Usage: talk [options] <IMAGE>");
}

fn print_help() {
    println!("Usage: talk [options] <IMAGE>");
    println!("Options:");
    println!("  -h, --help                    Show this help message");
    println!("  -p, --provider <provider>     Inference provider: ollama (default) or echo (offline, returns the prompt)");
    println!("  -m, --vision-model <model>    Vision model for image descriptions. Default: llava:13b");
    println!("  -t, --text-model <model>      Text model for follow-up questions. Default: llama3.1");
    println!("  -S, --system <persona>        Persona kept as the system turn and prepended to image instructions");
    println!("      --no-system               Ignore the persona from config.json");
    println!("      --history <path>          Save the conversation history here. Default: history.json");
    println!("      --no-history              Do not save the conversation history");
    println!("      --base-url <url>          Ollama base URL. Default: OLLAMA_HOST or http://localhost:11434");
    println!("      --no-manage-service       Do not start `ollama serve` when the service is not reachable");
    println!("  -v, --verbose                 Emit human-readable logs to stderr");
    println!("      --generate <shell>        Generate shell completion script (bash, zsh, fish, ...)");
    println!();
    println!("Environment:");
    println!("  LVCHAT_HOME     Home directory (config.json, logs/). If unset, $XDG_CONFIG_HOME/lvchat or ~/.config/lvchat.");
    println!("  OLLAMA_HOST     Ollama base URL (overridden by --base-url).");
    println!("  NO_COLOR        Disable colored responses.");
    println!();
    println!("Description:");
    println!("  Describe IMAGE with a local vision model, then answer follow-up questions.");
    println!("  Mention another existing image file (.png/.jpg/.jpeg) in a question to start over with it.");
    println!("  Type 'exit' or press Ctrl-D to end.");
    println!();
    println!("Examples:");
    println!("  talk car.png");
    println!("  talk -S 'You are a pirate.' --no-history photo.jpg");
}
