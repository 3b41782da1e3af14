use crate::usecase::app::{TalkUseCase, PROMPT};
use common::adapter::{NoopLog, StdFileSystem};
use common::domain::{History, ImageRef};
use common::error::{Error, InferenceError};
use common::ports::outbound::{HistoryStore, InferenceService};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// 台本どおりに応答する推論サービス
struct ScriptedInference {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    fn new(replies: Vec<Result<&str, InferenceError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn next(&self, prompt: &str) -> Result<String, InferenceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::service("script exhausted")))
    }
}

impl InferenceService for ScriptedInference {
    fn describe_image(&self, _image: &ImageRef, instruction: &str) -> Result<String, InferenceError> {
        self.next(instruction)
    }

    fn complete_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.next(prompt)
    }
}

/// 保存された履歴を記録する。fail_save で保存失敗を模擬する
#[derive(Default)]
struct RecordingStore {
    saved: Mutex<Vec<History>>,
    cleared: Mutex<usize>,
    fail_save: bool,
}

impl HistoryStore for RecordingStore {
    fn save(&self, history: &History) -> Result<(), Error> {
        if self.fail_save {
            return Err(Error::io_msg("disk full"));
        }
        self.saved.lock().unwrap().push(history.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.cleared.lock().unwrap() += 1;
        Ok(())
    }
}

fn use_case(inference: Arc<ScriptedInference>, store: Arc<RecordingStore>, persona: Option<&str>) -> TalkUseCase {
    TalkUseCase::new(
        inference,
        Arc::new(StdFileSystem),
        store,
        Arc::new(NoopLog),
        persona.map(str::to_string),
        false,
    )
}

fn run(uc: &TalkUseCase, stdin: &str) -> (Result<i32, Error>, String) {
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut out = Vec::new();
    let result = uc.run(ImageRef::new("car.png"), &mut input, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_history_is_saved_after_each_mutation() {
    let inference = Arc::new(ScriptedInference::new(vec![Ok("A red car."), Ok("Red."), Ok("Two.")]));
    let store = Arc::new(RecordingStore::default());
    let uc = use_case(inference.clone(), store.clone(), None);

    let (result, _) = run(&uc, "what color\nhow many doors\nexit\n");
    assert_eq!(result.unwrap(), 0);

    assert_eq!(*store.cleared.lock().unwrap(), 1);
    let lens: Vec<usize> = store.saved.lock().unwrap().iter().map(History::len).collect();
    assert_eq!(lens, vec![2, 4, 6]);
    assert_eq!(
        inference.prompts.lock().unwrap()[2],
        "user: Describe this image\nassistant: A red car.\nuser: what color\nassistant: Red.\nuser: how many doors"
    );
}

#[test]
fn test_failed_turn_is_reported_and_loop_continues() {
    let inference = Arc::new(ScriptedInference::new(vec![
        Ok("A red car."),
        Err(InferenceError::service("connection refused")),
        Ok("Red."),
    ]));
    let store = Arc::new(RecordingStore::default());
    let uc = use_case(inference, store.clone(), None);

    let (result, out) = run(&uc, "what color\nwhat color\nexit\n");
    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("Failed to continue the conversation: connection refused\n"));
    assert!(out.contains("Bot:\n====================\nRed.\n"));

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[1].len(), 4);
}

#[test]
fn test_bootstrap_failure_returns_exit_code() {
    let inference = Arc::new(ScriptedInference::new(vec![Err(InferenceError::model_unavailable("llava:13b"))]));
    let store = Arc::new(RecordingStore::default());
    let uc = use_case(inference, store.clone(), None);

    let (result, out) = run(&uc, "exit\n");
    assert_eq!(result.unwrap(), 69);
    assert_eq!(out, "Failed to initialize the conversation: model 'llava:13b' is not installed\n");
    assert!(store.saved.lock().unwrap().is_empty());
}

#[test]
fn test_save_failure_does_not_abort() {
    let inference = Arc::new(ScriptedInference::new(vec![Ok("A red car."), Ok("Red.")]));
    let store = Arc::new(RecordingStore {
        fail_save: true,
        ..Default::default()
    });
    let uc = use_case(inference, store, Some("be brief"));

    let (result, out) = run(&uc, "what color\n");
    assert_eq!(result.unwrap(), 0);
    assert!(out.contains("Red."));
}

#[test]
fn test_blank_lines_are_skipped() {
    let inference = Arc::new(ScriptedInference::new(vec![Ok("A red car.")]));
    let uc = use_case(inference.clone(), Arc::new(RecordingStore::default()), None);

    let (result, out) = run(&uc, "\n   \n\texit\n");
    assert_eq!(result.unwrap(), 0);
    assert_eq!(out.matches(PROMPT).count(), 3);
    assert_eq!(inference.prompts.lock().unwrap().len(), 1);
}

#[test]
fn test_persona_prefixes_initial_instruction() {
    let inference = Arc::new(ScriptedInference::new(vec![Ok("Arr, a red car.")]));
    let store = Arc::new(RecordingStore::default());
    let uc = use_case(inference.clone(), store.clone(), Some("You are a pirate."));

    let (result, out) = run(&uc, "exit\n");
    assert_eq!(result.unwrap(), 0);
    assert!(out.starts_with("Initial description of the image: Arr, a red car.\n"));
    assert_eq!(
        inference.prompts.lock().unwrap()[0],
        "You are a pirate.\n\nDescribe this image"
    );
    assert_eq!(store.saved.lock().unwrap()[0].len(), 3);
}
