//! 短语列表展开
//!
//! 参考译文中常见的缩写写法：
//! - `god(t)` → `god`, `godt`
//! - `nat, -ten` → `nat`, `natten`
//! - `vaskemiddel, -midlen` → `vaskemiddel`, `vaskemidlen`

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// 复数标记
pub const PLURAL_MARKER: &str = " (pl.)";

/// `base(suffix)`，括号紧跟在字母之后，括号内只有字母
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.*\p{Letter})\((?P<suffix>\p{Letter}+)\)$").expect("括号正则无效")
});

/// 去掉末尾的复数标记
pub fn strip_plural_marker(text: &str) -> &str {
    text.strip_suffix(PLURAL_MARKER).map(str::trim_end).unwrap_or(text)
}

/// 展开后的短语集合（无序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseSet {
    phrases: BTreeSet<String>,
}

impl PhraseSet {
    /// 从参考译文构建展开后的集合
    ///
    /// 按 `,` 或 `/` 切分，去空白，再展开括号和连字符后缀写法。
    pub fn from_reference(reference: &str) -> Self {
        let text = strip_plural_marker(reference.trim());
        let mut phrases = BTreeSet::new();
        // 最近一个非后缀条目的词干，后缀条目拼接到它上面
        let mut last_base: Option<String> = None;

        for piece in text.split([',', '/']).map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(suffix) = piece.strip_prefix('-') {
                let suffix = suffix.trim_start();
                match last_base.as_deref() {
                    Some(base) if !suffix.is_empty() => {
                        phrases.insert(join_suffix(base, suffix));
                    }
                    // 没有词干可拼接，保留原文
                    _ => {
                        phrases.insert(piece.to_string());
                    }
                }
                continue;
            }

            if let Some(caps) = PARENTHETICAL.captures(piece) {
                let base = caps["base"].trim_end();
                phrases.insert(base.to_string());
                phrases.insert(format!("{}{}", base, &caps["suffix"]));
                last_base = Some(base.to_string());
            } else {
                phrases.insert(piece.to_string());
                last_base = Some(piece.to_string());
            }
        }

        Self { phrases }
    }

    /// 从用户输入构建集合，只按逗号切分
    pub fn from_candidate(candidate: &str) -> Self {
        let phrases = candidate
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    /// 是否为 `other` 的子集
    pub fn is_subset(&self, other: &PhraseSet) -> bool {
        self.phrases.is_subset(&other.phrases)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }
}

/// 词干 + 后缀
///
/// 唯一的拼写例外：以 `ddel` 结尾的词干遇到以 `dlen` 结尾的后缀时去掉重复的 d，
/// 例如 `vaskemiddel` + `-midlen` → `vaskemidlen`。
fn join_suffix(base: &str, suffix: &str) -> String {
    match base.strip_suffix("ddel") {
        Some(stem) if suffix.ends_with("dlen") => format!("{}dlen", stem),
        _ => format!("{}{}", base, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(reference: &str) -> Vec<String> {
        PhraseSet::from_reference(reference)
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_split_on_comma_and_slash() {
        assert_eq!(phrases("at lege / at spille"), ["at lege", "at spille"]);
        assert_eq!(phrases("enkel,simpel"), ["enkel", "simpel"]);
    }

    #[test]
    fn test_parenthetical_alternative() {
        assert_eq!(phrases("god(t)"), ["god", "godt"]);
        assert_eq!(phrases("gammel(t), gamle (pl.)"), ["gamle", "gammel", "gammelt"]);
    }

    #[test]
    fn test_hyphen_suffix() {
        assert_eq!(phrases("nat, -ten"), ["nat", "natten"]);
        assert_eq!(
            phrases("frokost, - en, middag, -en"),
            ["frokost", "frokosten", "middag", "middagen"]
        );
    }

    #[test]
    fn test_ddel_dlen_exception() {
        assert_eq!(phrases("pengeseddel, -sedlen"), ["pengeseddel", "pengesedlen"]);
        assert_eq!(phrases("vaskemiddel, -midlen"), ["vaskemiddel", "vaskemidlen"]);
    }

    #[test]
    fn test_suffix_after_parenthetical_uses_base() {
        assert_eq!(phrases("gammel(t), -e"), ["gammel", "gammele", "gammelt"]);
    }

    #[test]
    fn test_orphan_suffix_kept_literally() {
        assert_eq!(phrases("-en"), ["-en"]);
    }

    #[test]
    fn test_candidate_splits_on_comma_only() {
        let set = PhraseSet::from_candidate("at lege / at spille, ,foo");
        assert_eq!(set.len(), 2);
        assert!(set.contains("at lege / at spille"));
        assert!(set.contains("foo"));
    }

    #[test]
    fn test_strip_plural_marker() {
        assert_eq!(strip_plural_marker("de her (pl.)"), "de her");
        assert_eq!(strip_plural_marker("(pl.)"), "(pl.)");
    }
}
