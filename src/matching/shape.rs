//! 参考译文形态分类

use regex::Regex;
use std::sync::LazyLock;

/// 整段都是字母（任意文字），不含空格和标点
static SINGLE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{Letter}+$").expect("单词正则无效"));

/// 大写字母开头、标点结尾，可以是多句话
static SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\p{Uppercase_Letter}.*\p{Punctuation}$").expect("句子正则无效")
});

/// 参考译文的形态
///
/// 按优先级依次判断，先命中的规则不会被后面的规则覆盖。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    /// 空文本
    Empty,
    /// 单个单词
    SingleWord,
    /// 一句或多句话
    Sentence,
    /// 逗号或斜杠分隔的短语列表
    PhraseList,
}

impl ReferenceShape {
    /// 对参考译文分类
    ///
    /// 调用方负责先去掉首尾空白和复数标记。
    pub fn classify(reference: &str) -> Self {
        let text = reference.trim();
        if text.is_empty() {
            ReferenceShape::Empty
        } else if SINGLE_WORD.is_match(text) {
            ReferenceShape::SingleWord
        } else if SENTENCE.is_match(text) {
            ReferenceShape::Sentence
        } else {
            ReferenceShape::PhraseList
        }
    }
}
