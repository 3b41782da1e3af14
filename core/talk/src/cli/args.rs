use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::config::ConfigOverrides;
use common::domain::{ImageRef, ModelName};
use common::error::Error;
use common::llm::ProviderType;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub help: bool,
    /// -v / --verbose: 人間向けログを stderr にも出す
    pub verbose: bool,
    pub image: Option<ImageRef>,
    pub provider: Option<String>,
    pub vision_model: Option<ModelName>,
    pub text_model: Option<ModelName>,
    /// -S / --system: ペルソナ
    pub system: Option<String>,
    pub no_system: bool,
    pub history: Option<PathBuf>,
    pub no_history: bool,
    pub base_url: Option<String>,
    pub no_manage_service: bool,
}

impl Config {
    /// 設定ファイル・環境変数より優先される上書き値
    pub fn overrides(&self) -> Result<ConfigOverrides, Error> {
        let provider = match self.provider.as_deref() {
            Some(s) => Some(ProviderType::parse(s).ok_or_else(|| {
                Error::invalid_argument(format!("Unknown provider '{}' (expected ollama or echo)", s))
            })?),
            None => None,
        };
        Ok(ConfigOverrides {
            provider,
            base_url: self.base_url.clone(),
            vision_model: self.vision_model.clone(),
            text_model: self.text_model.clone(),
            system_prompt: self.system.clone(),
            no_system: self.no_system,
            history_file: self.history.clone(),
            no_history: self.no_history,
            manage_service: self.no_manage_service.then_some(false),
        })
    }
}

/// 解析結果: 通常の Config / 補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn build_clap_command() -> clap::Command {
    clap::Command::new("talk")
        .about("Talk with a local vision model about an image")
        .disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Show this help message")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Emit human-readable logs to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("provider")
                .short('p')
                .long("provider")
                .value_name("provider")
                .help("Inference provider (ollama, echo)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("vision-model")
                .short('m')
                .long("vision-model")
                .value_name("model")
                .help("Vision model used for image descriptions (default: llava:13b)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("text-model")
                .short('t')
                .long("text-model")
                .value_name("model")
                .help("Text model used for follow-up questions (default: llama3.1)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("system")
                .short('S')
                .long("system")
                .value_name("persona")
                .help("Persona prepended to image instructions and kept as the system turn")
                .num_args(1)
                .conflicts_with("no-system"),
        )
        .arg(
            clap::Arg::new("no-system")
                .long("no-system")
                .help("Ignore the persona from config.json")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("history")
                .long("history")
                .value_name("path")
                .help("Where to save the conversation history (default: history.json)")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
                .conflicts_with("no-history"),
        )
        .arg(
            clap::Arg::new("no-history")
                .long("no-history")
                .help("Do not save the conversation history")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("base-url")
                .long("base-url")
                .value_name("url")
                .help("Ollama base URL (default: OLLAMA_HOST or http://localhost:11434)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("no-manage-service")
                .long("no-manage-service")
                .help("Do not start `ollama serve` when the service is not reachable")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
        .arg(
            clap::Arg::new("image")
                .index(1)
                .value_name("IMAGE")
                .help("Image to start the conversation with")
                .num_args(1),
        )
}

fn matches_to_config(matches: &clap::ArgMatches) -> Config {
    Config {
        help: matches.get_flag("help"),
        verbose: matches.get_flag("verbose"),
        image: matches.get_one::<String>("image").map(|s| ImageRef::new(s.clone())),
        provider: matches.get_one::<String>("provider").cloned(),
        vision_model: matches
            .get_one::<String>("vision-model")
            .map(|s| ModelName::new(s.clone())),
        text_model: matches
            .get_one::<String>("text-model")
            .map(|s| ModelName::new(s.clone())),
        system: matches.get_one::<String>("system").cloned(),
        no_system: matches.get_flag("no-system"),
        history: matches.get_one::<PathBuf>("history").cloned(),
        no_history: matches.get_flag("no-history"),
        base_url: matches.get_one::<String>("base-url").cloned(),
        no_manage_service: matches.get_flag("no-manage-service"),
    }
}

/// コマンドラインを解析する。補完生成が要求された場合は ParseOutcome::GenerateCompletion を返す。
pub fn parse_args() -> Result<ParseOutcome, Error> {
    let matches = build_clap_command()
        .try_get_matches()
        .map_err(|e| Error::invalid_argument(e.to_string()))?;

    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Config(matches_to_config(&matches)))
}

/// テスト用: 引数スライスから解析する
#[cfg(test)]
pub fn parse_args_from(args: &[&str]) -> Result<Config, Error> {
    let matches = build_clap_command()
        .try_get_matches_from(args)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;
    Ok(matches_to_config(&matches))
}

/// 補完スクリプトを標準出力に出力する。
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "talk", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.help);
        assert!(config.image.is_none());
        assert_eq!(config.overrides().unwrap(), ConfigOverrides::default());
    }

    #[test]
    fn test_parse_image_only() {
        let config = parse_args_from(&["talk", "photo.jpg"]).unwrap();
        assert_eq!(config.image, Some(ImageRef::new("photo.jpg")));
        assert!(!config.verbose);
    }

    #[test]
    fn test_parse_all_options() {
        let config = parse_args_from(&[
            "talk",
            "-p",
            "echo",
            "-m",
            "bakllava",
            "-t",
            "mistral",
            "-S",
            "you are a pirate",
            "--history",
            "/tmp/h.json",
            "--base-url",
            "gpu:11434",
            "--no-manage-service",
            "-v",
            "a.png",
        ])
        .unwrap();
        assert_eq!(config.vision_model, Some(ModelName::new("bakllava")));
        assert_eq!(config.text_model, Some(ModelName::new("mistral")));
        assert!(config.verbose);

        let o = config.overrides().unwrap();
        assert_eq!(o.provider, Some(ProviderType::Echo));
        assert_eq!(o.system_prompt.as_deref(), Some("you are a pirate"));
        assert_eq!(o.history_file, Some(PathBuf::from("/tmp/h.json")));
        assert_eq!(o.base_url.as_deref(), Some("gpu:11434"));
        assert_eq!(o.manage_service, Some(false));
    }

    #[test]
    fn test_no_flags() {
        let config = parse_args_from(&["talk", "--no-system", "--no-history", "a.png"]).unwrap();
        let o = config.overrides().unwrap();
        assert!(o.no_system);
        assert!(o.no_history);
        assert_eq!(o.manage_service, None);
    }

    #[test]
    fn test_conflicting_flags_are_usage_errors() {
        let err = parse_args_from(&["talk", "-S", "x", "--no-system", "a.png"]).unwrap_err();
        assert!(err.is_usage());
        let err = parse_args_from(&["talk", "--history", "h.json", "--no-history"]).unwrap_err();
        assert_eq!(err.exit_code(), 64);
    }

    #[test]
    fn test_unknown_provider() {
        let config = parse_args_from(&["talk", "-p", "gemini", "a.png"]).unwrap();
        let err = config.overrides().unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'gemini'"));
        assert!(err.is_usage());
    }

    #[test]
    fn test_extra_positional_is_rejected() {
        assert!(parse_args_from(&["talk", "a.png", "b.png"]).is_err());
    }
}
