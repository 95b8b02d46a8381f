//! 结束页清理
//!
//! 每日训练结束页上有很多和学习无关的区块（排名、徽章、广告），按规则隐藏掉。

use std::path::Path;

use futures::future::{FutureExt, LocalBoxFuture};
use serde::Deserialize;
use tracing::debug;

use crate::dom::HostDom;
use crate::error::{AppError, AppResult, ConfigError};
use crate::scheduler::Evaluator;

/// 已处理元素上的标记
pub const MARKER: &str = "end-screen";

const SECTION: &str = ".endseitenbox";
const HIDE_CLASS: &str = "hide-end-screen-section";

const EMBEDDED_RULES: &str = include_str!("end_screen_rules.toml");

/// 区块匹配规则
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionRule {
    Contains(String),
    /// 忽略区块开头的空白
    StartsWith(String),
}

impl SectionRule {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            SectionRule::Contains(needle) => text.contains(needle.as_str()),
            SectionRule::StartsWith(prefix) => text.trim_start().starts_with(prefix.as_str()),
        }
    }
}

/// 积分兑换区块中要清空的文本
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RedeemRule {
    pub section_contains: String,
    pub container: String,
    pub blank_containing: String,
}

/// 结束页规则
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndScreenRules {
    pub hide: Vec<SectionRule>,
    pub redeem: Option<RedeemRule>,
}

impl EndScreenRules {
    /// 内置规则
    pub fn embedded() -> AppResult<Self> {
        toml::from_str(EMBEDDED_RULES)
            .map_err(|source| AppError::toml_parse_failed("end_screen_rules.toml", source))
    }

    /// 从 TOML 文件加载规则
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            AppError::Config(ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })
        })?;
        toml::from_str(&content)
            .map_err(|source| AppError::toml_parse_failed(path.display().to_string(), source))
    }

    /// 区块是否应该隐藏
    pub fn should_hide(&self, text: &str) -> bool {
        self.hide.iter().any(|rule| rule.matches(text))
    }
}

/// 结束页清理求值器
pub struct EndScreenCleanup {
    rules: EndScreenRules,
}

impl EndScreenCleanup {
    pub fn new(rules: EndScreenRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EndScreenRules {
        &self.rules
    }

    async fn run<D: HostDom>(&self, dom: &D) -> anyhow::Result<()> {
        let mut hidden = 0;
        for section in dom.query_all(SECTION).await? {
            if dom.has_marker(section, MARKER).await? {
                continue;
            }
            let Some(text) = dom.text_content(section).await?.filter(|t| !t.is_empty()) else {
                continue;
            };

            if self.rules.should_hide(&text) {
                dom.add_class(section, HIDE_CLASS).await?;
                hidden += 1;
            }

            if let Some(redeem) = &self.rules.redeem {
                if text.contains(redeem.section_contains.as_str()) {
                    if let Some(container) = dom.query_within(section, &redeem.container).await? {
                        dom.blank_text_nodes(container, &redeem.blank_containing).await?;
                    }
                }
            }

            dom.set_marker(section, MARKER).await?;
        }

        if hidden > 0 {
            debug!("🧹 隐藏了 {} 个结束页区块", hidden);
        }
        Ok(())
    }
}

impl<D: HostDom> Evaluator<D> for EndScreenCleanup {
    fn name(&self) -> &'static str {
        "end-screen-cleanup"
    }

    fn evaluate<'a>(&'a mut self, dom: &'a D) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        self.run(dom).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_rules_parse() {
        let rules = EndScreenRules::embedded().unwrap();
        assert_eq!(rules.hide.len(), 13);
        assert!(rules.redeem.is_some());
    }

    #[test]
    fn test_rule_matching() {
        let rules = EndScreenRules::embedded().unwrap();
        assert!(rules.should_hide("\n  Dein Wissensverlauf der letzten Tage"));
        assert!(!rules.should_hide("Hier ist Dein Wissensverlauf"));
        assert!(rules.should_hide("Das Buch zum Sprachkurs: Dänisch"));
        assert!(!rules.should_hide("Du hast heute 40 Vokabeln gelernt."));
    }

    #[test]
    fn test_custom_rules_without_redeem() {
        let rules: EndScreenRules = toml::from_str(r#"hide = [{ contains = "Werbung" }]"#).unwrap();
        assert!(rules.redeem.is_none());
        assert_eq!(rules.hide, vec![SectionRule::Contains("Werbung".to_string())]);
    }
}
