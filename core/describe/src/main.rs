mod cli;
mod ports;
mod usecase;
mod wiring;


use std::io::{BufRead, Write};
use std::process;

use cli::{parse_args, print_completion, Config, ParseOutcome};
use common::error::Error;
use common::ports::outbound::{LogLevel, LogRecord};
use common::service::ServiceGuard;
use ports::inbound::UseCaseRunner;
use wiring::{wire_describe, App};

const INTERRUPTED_EXIT_CODE: i32 = 130;

struct Runner {
    app: App,
}

impl Runner {
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
}

impl UseCaseRunner for Runner {
    fn run(&self, config: Config, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<i32, Error> {
        let image = config
            .image
            .clone()
            .ok_or_else(|| Error::invalid_argument("No image provided."))?;
        self.app.logger.emit(
            LogRecord::new(LogLevel::Info, "command started")
                .layer("cli")
                .kind("lifecycle")
                .field("command", "describe")
                .field("provider", self.app.config.provider.as_str())
                .field("menu_len", self.app.describe_use_case.instructions().len()),
        );

        let result = self
            .acquire_service()
            .and_then(|_guard| self.app.describe_use_case.run(image, input, out));

        let code = result.as_ref().map_or_else(Error::exit_code, |c| *c);
        self.app.logger.emit(
            LogRecord::new(LogLevel::Info, "command finished")
                .layer("cli")
                .kind("lifecycle")
                .field("command", "describe")
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
            eprintln!("describe: {}", e);
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
    let app = wire_describe(&config)?;
    let runner = Runner { app };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    runner.run(config, &mut stdin.lock(), &mut stdout.lock())
}

fn print_usage() {
    eprintln!("Usage: describe [options] <IMAGE>");
}

fn print_help() {
    println!("Usage: describe [options] <IMAGE>");
    println!("Options:");
    println!("  -h, --help                    Show this help message");
    println!("  -i, --instruction <text>      Menu entry; repeat to build your own menu (replaces the default one)");
    println!("  -p, --provider <provider>     Inference provider: ollama (default) or echo");
    println!("  -m, --vision-model <model>    Vision model. Default: llava:13b");
    println!("      --base-url <url>          Ollama base URL. Default: OLLAMA_HOST or http://localhost:11434");
    println!("      --no-manage-service       Do not start `ollama serve` when the service is not reachable");
    println!("  -v, --verbose                 Emit human-readable logs to stderr");
    println!("      --generate <shell>        Generate shell completion script");
    println!();
    println!("Description:");
    println!("  Pick an instruction by number and print the model's answer about IMAGE.");
    println!("  Type 'exit' or press Ctrl-D to leave.");
    println!();
    println!("Examples:");
    println!("  describe andy.jpg");
    println!("  describe -i 'How many people are there?' -i 'Is it daytime?' street.png");
}
