use super::FakeEnv;
use crate::cli::{parse_args_from, Config};
use crate::ports::inbound::UseCaseRunner;
use crate::wiring;
use common::domain::{History, Role};
use common::error::Error;
use std::io::Cursor;
use std::path::Path;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("home")).unwrap();
        std::fs::write(dir.path().join("car.png"), b"png").unwrap();
        std::fs::write(dir.path().join("face.jpg"), b"jpg").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    fn home(&self) -> &Path {
        self.dir.path()
    }

    fn env(&self) -> FakeEnv {
        FakeEnv::new(self.dir.path().join("home"))
    }

    /// echo プロバイダ + 一時ディレクトリの履歴ファイル
    fn config(&self, extra: &[&str], image: &str) -> Config {
        let history = self.path("history.json");
        let mut args = vec!["talk", "-p", "echo", "--history", history.as_str()];
        args.extend_from_slice(extra);
        args.push(image);
        parse_args_from(&args).unwrap()
    }

    fn history(&self) -> History {
        let content = std::fs::read_to_string(self.dir.path().join("history.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}

/// 配線して台本の stdin で回す（テスト用の入口）
fn run_app(env: &FakeEnv, config: Config, tty: bool, stdin: &str) -> (Result<i32, Error>, String) {
    let app = wiring::wire_talk_with(env, &config, tty).unwrap();
    let runner = crate::Runner { app };
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut out = Vec::new();
    let result = runner.run(config, &mut input, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_question_then_exit() {
    let fx = Fixture::new();
    let config = fx.config(&[], &fx.path("car.png"));
    let (result, out) = run_app(&fx.env(), config, false, "what color is the car\n\nexit\n");

    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("Initial description of the image: [echo llava:13b, 1 image] Describe this image"));
    assert!(out.contains("====================\nYou:\n====================\nwhat color is the car\n"));
    assert!(out.contains("Bot:\n====================\n[echo llama3.1] user: Describe this image\n"));
    assert!(!out.contains("\x1b[93m"));

    let history = fx.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history.turns()[2].content, "what color is the car");
    assert_eq!(history.turns()[3].role, Role::Assistant);
}

#[test]
fn test_eof_ends_loop() {
    let fx = Fixture::new();
    let config = fx.config(&[], &fx.path("car.png"));
    let (result, out) = run_app(&fx.env(), config, false, "");
    assert_eq!(result.unwrap(), 0);
    assert!(out.ends_with("Ask a clarifying question (or type 'exit' to end): \n"));
    assert_eq!(fx.history().len(), 2);
}

#[test]
fn test_image_mention_resets_history() {
    let fx = Fixture::new();
    let config = fx.config(&[], &fx.path("car.png"));
    let stdin = format!("first question\nsecond question\nlook at {} now, who is this\nEXIT\n", fx.path("face.jpg"));
    let (result, out) = run_app(&fx.env(), config, false, &stdin);

    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("Detected image file in input. Resetting conversation and re-ingesting new image."));
    assert!(out.contains("[echo llava:13b, 1 image] look at now, who is this"));

    let history = fx.history();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history.turns()[1].content,
        "[echo llava:13b, 1 image] Describe this image in intricate detail."
    );
    assert_eq!(history.turns()[2].content, "look at now, who is this");
}

#[test]
fn test_persona_from_config_file() {
    let fx = Fixture::new();
    std::fs::write(
        fx.home().join("home/config.json"),
        r#"{ "system_prompt": "You are a pirate.", "vision_model": "bakllava" }"#,
    )
    .unwrap();
    let config = fx.config(&[], &fx.path("car.png"));
    let (result, out) = run_app(&fx.env(), config, false, "exit\n");

    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("[echo bakllava, 1 image] You are a pirate.\n\nDescribe this image"));
    let history = fx.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history.turns()[0].role, Role::System);

    let log = std::fs::read_to_string(fx.home().join("home/logs/talk.jsonl")).unwrap();
    let started = log.lines().find(|l| l.contains("\"conversation started\"")).unwrap();
    assert!(started.contains("\"persona\":true"));
}

#[test]
fn test_no_system_and_no_history() {
    let fx = Fixture::new();
    std::fs::write(fx.home().join("home/config.json"), r#"{ "system_prompt": "pirate" }"#).unwrap();
    let config = parse_args_from(&["talk", "-p", "echo", "--no-system", "--no-history", fx.path("car.png").as_str()]).unwrap();
    let (result, out) = run_app(&fx.env(), config, false, "hello\nexit\n");

    assert_eq!(result.unwrap(), 0);
    assert!(!out.contains("pirate"));
    assert!(!fx.home().join("history.json").exists());
}

#[test]
fn test_previous_history_is_cleared_at_start() {
    let fx = Fixture::new();
    std::fs::write(fx.home().join("history.json"), "[not json").unwrap();
    let config = fx.config(&[], &fx.path("car.png"));
    let (result, _) = run_app(&fx.env(), config, false, "exit\n");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(fx.history().len(), 2);
}

#[test]
fn test_color_only_on_terminal_without_no_color() {
    let fx = Fixture::new();
    let (_, out) = run_app(&fx.env(), fx.config(&[], &fx.path("car.png")), true, "hi\nexit\n");
    assert!(out.contains("\x1b[93m[echo llama3.1]"));
    assert!(out.contains("\x1b[0m\n"));

    let mut env = fx.env();
    env.no_color = true;
    let (_, out) = run_app(&env, fx.config(&[], &fx.path("car.png")), true, "hi\nexit\n");
    assert!(!out.contains("\x1b[93m"));
}

#[test]
fn test_unreadable_image_fails_initialization() {
    let fx = Fixture::new();
    let config = fx.config(&[], &fx.path("missing.png"));
    let (result, out) = run_app(&fx.env(), config, false, "exit\n");

    assert_eq!(result.unwrap(), 74);
    assert!(out.starts_with("Failed to initialize the conversation: Cannot read image"));
    assert!(!out.contains("Ask a clarifying question"));
}

#[test]
fn test_missing_image_argument() {
    let fx = Fixture::new();
    let config = parse_args_from(&["talk", "-p", "echo", "--no-history"]).unwrap();
    let (result, _) = run_app(&fx.env(), config, false, "");
    let err = result.unwrap_err();
    assert!(err.is_usage());
    assert!(err.to_string().contains("No image provided"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let fx = Fixture::new();
    std::fs::write(fx.home().join("home/config.json"), "{ oops").unwrap();
    let config = fx.config(&[], &fx.path("car.png"));
    let err = wiring::wire_talk_with(&fx.env(), &config, false).err().unwrap();
    assert_eq!(err.exit_code(), 74);
    assert!(err.to_string().contains("Invalid config"));
}

#[test]
fn test_run_writes_jsonl_log() {
    let fx = Fixture::new();
    let config = fx.config(&[], &fx.path("car.png"));
    let (result, _) = run_app(&fx.env(), config, false, "exit\n");
    assert_eq!(result.unwrap(), 0);

    let log = std::fs::read_to_string(fx.home().join("home/logs/talk.jsonl")).unwrap();
    let messages: Vec<String> = log
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["message"].as_str().unwrap().to_string())
        .collect();
    assert!(messages.iter().any(|m| m == "command started"));
    assert!(messages.iter().any(|m| m == "conversation started"));
    assert!(messages.iter().any(|m| m == "command finished"));
}

#[test]
fn test_ollama_host_and_cli_base_url_precedence() {
    let fx = Fixture::new();
    let mut env = fx.env();
    env.ollama_host = Some("gpu-box:11434".to_string());

    let app = wiring::wire_talk_with(&env, &fx.config(&[], &fx.path("car.png")), false).unwrap();
    assert_eq!(app.config.base_url, "http://gpu-box:11434");
    assert!(app.service.is_none());

    let config = fx.config(&["--base-url", "http://other:1234/"], &fx.path("car.png"));
    let app = wiring::wire_talk_with(&env, &config, false).unwrap();
    assert_eq!(app.config.base_url, "http://other:1234");
}

#[test]
fn test_ollama_provider_wires_service() {
    let fx = Fixture::new();
    let config = parse_args_from(&["talk", "--no-manage-service", fx.path("car.png").as_str()]).unwrap();
    let app = wiring::wire_talk_with(&fx.env(), &config, false).unwrap();
    assert!(app.service.is_some());
    assert!(!app.config.manage_service);
}
