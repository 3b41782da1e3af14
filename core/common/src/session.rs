//! 会話セッション
//!
//! 1 枚の画像を軸にした会話履歴を管理する。入力に実在する画像ファイル名が含まれていれば
//! その画像で履歴を作り直し（リセット）、なければ履歴に追記してテキストモデルに続きを頼む。
//!
//! 推論が全部成功するまで履歴には触らない。保存は呼び出し側（HistoryStore）の仕事。

use crate::domain::image::image_candidates;
use crate::domain::{residual_instruction, History, ImageRef, Turn};
use crate::error::InferenceError;
use crate::ports::outbound::{FileSystem, InferenceService};
use std::path::Path;

/// 会話開始時の説明依頼
pub const INITIAL_INSTRUCTION: &str = "Describe this image";

/// 画像を切り替えたときの説明依頼
pub const RESET_INSTRUCTION: &str = "Describe this image in intricate detail.";

/// 入力から画像参照を探す
///
/// 空白区切りで左から見て、画像拡張子を持ち、かつ通常ファイルとして存在する最初のトークン。
/// ファイルの中身は読まない。
pub fn detect_image_reference(input: &str, fs: &dyn FileSystem) -> Option<ImageRef> {
    image_candidates(input)
        .find(|token| fs.is_file(Path::new(token)))
        .map(ImageRef::from)
}

/// ペルソナがあれば指示の前に付ける
fn with_persona(persona: Option<&str>, instruction: &str) -> String {
    match persona {
        Some(p) => format!("{}\n\n{}", p, instruction),
        None => instruction.to_string(),
    }
}

/// 1 ターンの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 履歴に追記して続けた
    Continued { response: String },
    /// 新しい画像で履歴を作り直した
    Reset {
        image: ImageRef,
        description: String,
        response: String,
    },
}

impl Reply {
    /// ユーザーに見せる応答
    pub fn response(&self) -> &str {
        match self {
            Self::Continued { response } | Self::Reset { response, .. } => response,
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset { .. })
    }
}

/// 会話セッション
#[derive(Debug, Clone)]
pub struct Session {
    history: History,
    initial_description: String,
    image: ImageRef,
    persona: Option<String>,
}

impl Session {
    /// 画像の説明を 1 回依頼して会話を始める
    ///
    /// 履歴は `[system?, user: "Describe this image", assistant: 説明]`。
    pub fn bootstrap(
        inference: &dyn InferenceService,
        image: ImageRef,
        persona: Option<&str>,
    ) -> Result<Self, InferenceError> {
        let description =
            inference.describe_image(&image, &with_persona(persona, INITIAL_INSTRUCTION))?;
        let persona = persona.map(str::to_string);
        let history = Self::base_history(persona.as_deref(), &description);
        Ok(Self {
            history,
            initial_description: description,
            image,
            persona,
        })
    }

    fn base_history(persona: Option<&str>, description: &str) -> History {
        let mut history = History::new();
        if let Some(p) = persona {
            history.push(Turn::system(p));
        }
        history.push_user(INITIAL_INSTRUCTION);
        history.push_assistant(description);
        history
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn initial_description(&self) -> &str {
        &self.initial_description
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn persona(&self) -> Option<&str> {
        self.persona.as_deref()
    }

    /// ユーザー入力で会話を 1 ターン進める
    ///
    /// 入力に画像参照があれば、今の画像と同じでも必ずリセットする。
    pub fn continue_conversation(
        &mut self,
        inference: &dyn InferenceService,
        fs: &dyn FileSystem,
        input: &str,
    ) -> Result<Reply, InferenceError> {
        match detect_image_reference(input, fs) {
            Some(image) => self.reset(inference, image, input),
            None => self.append(inference, input),
        }
    }

    fn append(&mut self, inference: &dyn InferenceService, input: &str) -> Result<Reply, InferenceError> {
        let mut next = self.history.clone();
        next.push_user(input);
        let response = inference.complete_text(&next.render_prompt())?;
        next.push_assistant(response.as_str());
        self.history = next;
        Ok(Reply::Continued { response })
    }

    fn reset(
        &mut self,
        inference: &dyn InferenceService,
        image: ImageRef,
        input: &str,
    ) -> Result<Reply, InferenceError> {
        let persona = self.persona.as_deref();
        let residual = residual_instruction(input, image.as_str());
        let description = inference.describe_image(&image, &with_persona(persona, RESET_INSTRUCTION))?;
        let response = inference.describe_image(&image, &with_persona(persona, &residual))?;

        let mut history = Self::base_history(persona, &description);
        history.push_user(residual);
        history.push_assistant(response.as_str());

        self.history = history;
        self.initial_description = description.clone();
        self.image = image.clone();
        Ok(Reply::Reset {
            image,
            description,
            response,
        })
    }
}
