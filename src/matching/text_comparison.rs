//! 文本比对
//!
//! 用户输入 vs 参考译文。规则按参考译文的形态区分：
//! - 单词：只有完全一致才算对
//! - 句子：容忍首字母大小写和句末标点
//! - 短语列表：按集合比较，顺序和分隔符无关

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

use super::phrase_set::{strip_plural_marker, PhraseSet};
use super::result::ComparisonResult;
use super::shape::ReferenceShape;

/// 句末的标点和空白
static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Punctuation}\s]+$").expect("句末标点正则无效"));

/// 比较用户输入与参考译文
///
/// # 参数
/// - `candidate`: 用户输入
/// - `reference`: 参考译文
///
/// # 返回
/// 任一参数去空白后为空时返回 `Indeterminate`
///
/// # 示例
/// ```
/// use sl24_augment::matching::{compare, ComparisonResult};
///
/// assert_eq!(compare("dag, -en", "dag, -en"), ComparisonResult::Identical);
/// assert_eq!(compare("fooäöü", "fooäöübar"), ComparisonResult::NoMatch);
/// assert_eq!(
///     compare("lovely day, isn't it", "Lovely day, isn't it?"),
///     ComparisonResult::PartialMatch
/// );
/// ```
pub fn compare(candidate: &str, reference: &str) -> ComparisonResult {
    let candidate = candidate.trim();
    let reference = strip_plural_marker(reference.trim());

    if candidate.is_empty() || reference.is_empty() {
        return ComparisonResult::Indeterminate;
    }

    if candidate == reference {
        return ComparisonResult::Identical;
    }

    match ReferenceShape::classify(reference) {
        ReferenceShape::Empty => ComparisonResult::Indeterminate,
        // 单词没有部分匹配，完全一致的情况上面已经处理
        ReferenceShape::SingleWord => ComparisonResult::NoMatch,
        ReferenceShape::Sentence => compare_sentences(candidate, reference),
        ReferenceShape::PhraseList => compare_phrase_lists(candidate, reference),
    }
}

/// 比较页面读回来的值，非字符串一律返回 `Indeterminate`
pub fn compare_values(candidate: &JsonValue, reference: &JsonValue) -> ComparisonResult {
    match (candidate.as_str(), reference.as_str()) {
        (Some(candidate), Some(reference)) => compare(candidate, reference),
        _ => ComparisonResult::Indeterminate,
    }
}

/// 只忽略首字母大小写和句末标点，句中任何差异都算不匹配
fn compare_sentences(candidate: &str, reference: &str) -> ComparisonResult {
    if lenient_sentence(candidate) == lenient_sentence(reference) {
        ComparisonResult::PartialMatch
    } else {
        ComparisonResult::NoMatch
    }
}

fn lenient_sentence(text: &str) -> String {
    let mut chars = text.chars();
    let folded = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    TRAILING_PUNCTUATION.replace(&folded, "").into_owned()
}

fn compare_phrase_lists(candidate: &str, reference: &str) -> ComparisonResult {
    let typed = PhraseSet::from_candidate(candidate);
    let expected = PhraseSet::from_reference(reference);

    if typed.is_empty() || typed.len() > expected.len() {
        // 只有分隔符，或者多写了条目
        ComparisonResult::NoMatch
    } else if typed == expected {
        ComparisonResult::Identical
    } else if typed.is_subset(&expected) {
        ComparisonResult::PartialMatch
    } else {
        ComparisonResult::NoMatch
    }
}
