use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::config::ConfigOverrides;
use common::domain::{ImageRef, ModelName};
use common::error::Error;
use common::llm::ProviderType;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub help: bool,
    pub verbose: bool,
    pub image: Option<ImageRef>,
    /// -i / --instruction（複数可）。空なら既定のメニュー
    pub instructions: Vec<String>,
    pub provider: Option<String>,
    pub vision_model: Option<ModelName>,
    pub base_url: Option<String>,
    pub no_manage_service: bool,
}

impl Config {
    /// 設定ファイル・環境変数より優先される上書き値
    ///
    /// describe はペルソナも履歴も使わない。
    pub fn overrides(&self) -> Result<ConfigOverrides, Error> {
        let provider = self
            .provider
            .as_deref()
            .map(|s| {
                ProviderType::parse(s).ok_or_else(|| {
                    Error::invalid_argument(format!("Unknown provider '{}' (expected ollama or echo)", s))
                })
            })
            .transpose()?;
        Ok(ConfigOverrides {
            provider,
            base_url: self.base_url.clone(),
            vision_model: self.vision_model.clone(),
            no_system: true,
            no_history: true,
            manage_service: self.no_manage_service.then_some(false),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn build_clap_command() -> clap::Command {
    clap::Command::new("describe")
        .about("Ask a local vision model about an image from a menu of instructions")
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
            clap::Arg::new("instruction")
                .short('i')
                .long("instruction")
                .value_name("text")
                .help("Menu entry (repeatable; replaces the default menu)")
                .action(ArgAction::Append),
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
                .help("Vision model (default: llava:13b)")
                .num_args(1),
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
                .help("Image to ask about")
                .num_args(1),
        )
}

fn matches_to_config(matches: &clap::ArgMatches) -> Config {
    Config {
        help: matches.get_flag("help"),
        verbose: matches.get_flag("verbose"),
        image: matches.get_one::<String>("image").map(|s| ImageRef::new(s.clone())),
        instructions: matches
            .get_many::<String>("instruction")
            .map(|i| i.cloned().collect())
            .unwrap_or_default(),
        provider: matches.get_one::<String>("provider").cloned(),
        vision_model: matches
            .get_one::<String>("vision-model")
            .map(|s| ModelName::new(s.clone())),
        base_url: matches.get_one::<String>("base-url").cloned(),
        no_manage_service: matches.get_flag("no-manage-service"),
    }
}

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

pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "describe", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repeated_instructions() {
        let config = parse_args_from(&["describe", "-i", "Count the cats", "--instruction", "Is it night?", "a.png"]).unwrap();
        assert_eq!(config.instructions, vec!["Count the cats", "Is it night?"]);
        assert_eq!(config.image, Some(ImageRef::new("a.png")));
    }

    #[test]
    fn test_overrides_disable_persona_and_history() {
        let config = parse_args_from(&["describe", "-p", "echo", "-m", "bakllava", "--no-manage-service", "a.png"]).unwrap();
        let o = config.overrides().unwrap();
        assert_eq!(o.provider, Some(ProviderType::Echo));
        assert_eq!(o.vision_model, Some(ModelName::new("bakllava")));
        assert!(o.no_system);
        assert!(o.no_history);
        assert_eq!(o.manage_service, Some(false));
    }

    #[test]
    fn test_unknown_option_is_usage_error() {
        let err = parse_args_from(&["describe", "--history", "h.json", "a.png"]).unwrap_err();
        assert!(err.is_usage());
    }
}
