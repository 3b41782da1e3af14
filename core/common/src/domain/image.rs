//! ユーザー入力中の画像トークンの扱い（純粋関数のみ）
//!
//! 実在確認は FileSystem ポートが要るため session 側で行う。ここでは拡張子判定と
//! 残りの指示文の抽出だけを扱う。

use regex::Regex;
use std::sync::OnceLock;

/// 画像トークンを取り除いた結果が空だったときの指示
pub const DEFAULT_RESIDUAL_INSTRUCTION: &str = "Describe this image in detail";

fn image_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(?:png|jpe?g)$").expect("image suffix pattern is valid"))
}

/// トークンが画像ファイルの拡張子で終わるか（大文字小文字は区別しない）
pub fn has_image_suffix(token: &str) -> bool {
    image_suffix().is_match(token)
}

/// 入力を空白で分割し、画像拡張子を持つトークンを左から順に返す
pub fn image_candidates(input: &str) -> impl Iterator<Item = &str> {
    input.split_whitespace().filter(|t| has_image_suffix(t))
}

/// 入力から参照トークンを除いた指示文
///
/// 参照と一致するトークンをすべて取り除き、残りを半角スペース 1 つで連結する。
/// 何も残らなければ `DEFAULT_RESIDUAL_INSTRUCTION`。
pub fn residual_instruction(input: &str, reference: &str) -> String {
    let rest = input
        .split_whitespace()
        .filter(|t| *t != reference)
        .collect::<Vec<_>>()
        .join(" ");
    if rest.is_empty() {
        DEFAULT_RESIDUAL_INSTRUCTION.to_string()
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_image_suffix() {
        assert!(has_image_suffix("test.png"));
        assert!(has_image_suffix("dir/Photo.JPG"));
        assert!(has_image_suffix("a.jpeg"));
        assert!(!has_image_suffix("notes.txt"));
        assert!(!has_image_suffix("png"));
        assert!(!has_image_suffix("test.png,"));
    }

    #[test]
    fn test_image_candidates_left_to_right() {
        let c: Vec<&str> = image_candidates("compare a.png with b.jpg please").collect();
        assert_eq!(c, vec!["a.png", "b.jpg"]);
        assert_eq!(image_candidates("no images here").count(), 0);
    }

    #[test]
    fn test_residual_collapses_spacing() {
        assert_eq!(
            residual_instruction("describe test.png in detail", "test.png"),
            "describe in detail"
        );
        assert_eq!(
            residual_instruction("  look at   B.png now,  who is this ", "B.png"),
            "look at now, who is this"
        );
    }

    #[test]
    fn test_residual_removes_every_occurrence() {
        assert_eq!(
            residual_instruction("x.png vs x.png again", "x.png"),
            "vs again"
        );
    }

    #[test]
    fn test_residual_empty_falls_back() {
        assert_eq!(residual_instruction("cat.jpg", "cat.jpg"), DEFAULT_RESIDUAL_INSTRUCTION);
        assert_eq!(residual_instruction("   cat.jpg  ", "cat.jpg"), DEFAULT_RESIDUAL_INSTRUCTION);
    }
}
