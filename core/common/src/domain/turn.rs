//! 会話の 1 ターン（ロール付きメッセージ）

use serde::{Deserialize, Serialize};

/// 発話者のロール（閉じた列挙。任意文字列は受け付けない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ロール付きメッセージ 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// フラット化プロンプト用の 1 行表現（"role: content"）
    pub fn render(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        assert_eq!(Turn::system("s").role, Role::System);
        assert_eq!(Turn::user("u").role, Role::User);
        let t = Turn::assistant("a");
        assert_eq!(t.role, Role::Assistant);
        assert_eq!(t.content, "a");
    }

    #[test]
    fn test_turn_render() {
        assert_eq!(Turn::user("what color is the car").render(), "user: what color is the car");
        assert_eq!(Turn::assistant("").render(), "assistant: ");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let r: Result<Turn, _> = serde_json::from_str(r#"{"role":"function","content":"x"}"#);
        assert!(r.is_err());
    }
}
