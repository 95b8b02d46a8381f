use serde::{Deserialize, Serialize};

/// 比对结果
///
/// `Indeterminate` 表示"没有可评判的内容"（输入为空或不是字符串），
/// 与 `NoMatch`（答错了）必须区分开。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonResult {
    /// 完全一致
    Identical,
    /// 部分匹配（可接受）
    PartialMatch,
    /// 不匹配
    NoMatch,
    /// 无法评判
    Indeterminate,
}

impl ComparisonResult {
    /// 结果代码
    pub fn code(self) -> &'static str {
        match self {
            ComparisonResult::Identical => "identical",
            ComparisonResult::PartialMatch => "partialMatch",
            ComparisonResult::NoMatch => "noMatch",
            ComparisonResult::Indeterminate => "indeterminate",
        }
    }

    /// 是否给出了评判
    pub fn is_verdict(self) -> bool {
        !matches!(self, ComparisonResult::Indeterminate)
    }

    /// 输入框上使用的样式类
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            ComparisonResult::Identical => Some("correct"),
            ComparisonResult::PartialMatch => Some("partially-correct"),
            ComparisonResult::NoMatch => Some("incorrect"),
            ComparisonResult::Indeterminate => None,
        }
    }
}

impl std::fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
