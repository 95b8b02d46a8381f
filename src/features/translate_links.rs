//! 翻译链接
//!
//! 在课程页面和双语故事页面的外语文本旁边插入 Google / Bing 翻译链接。
//! 要翻译的文本每个周期都重新解析：宿主页面原地换掉文本时，已有链接的 `href` 跟着更新；
//! 链接被宿主页面连同内容一起清掉时，重新插入。

use anyhow::Context;
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::debug;

use crate::dom::{HostDom, NodeId, PageLocation};
use crate::scheduler::Evaluator;

use super::markup;
use super::translator::{detect_source_language, TranslatorService};

const LINK_WRAP_SELECTOR: &str = ".translate-link-wrap";

const ONLINE_COURSE_HOST: &str = "sprachenlernen24-onlinekurs";
const BILINGUAL_STORIES_PATH: &str = "zweisprachige-geschichten";

/// 翻译链接的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPlacement {
    /// 动词训练器的外语单元格
    VerbTrainer,
    /// 每日训练中单条对话训练的答案
    DailySingleConvoTrainer,
    /// 每日训练表格中的每一行
    DailySiebenTrainer,
    /// 每日训练表格的整段文本，链接放在表格后面新建的容器里
    DailySiebenTrainerEntireText,
    /// 双语故事的单句
    BilingualStoriesSingleItem,
    /// 双语故事的标题（连同整篇故事）
    BilingualStoriesStoryHeadingItem,
}

const ONLINE_COURSE_PLACEMENTS: [LinkPlacement; 4] = [
    LinkPlacement::VerbTrainer,
    LinkPlacement::DailySingleConvoTrainer,
    LinkPlacement::DailySiebenTrainer,
    LinkPlacement::DailySiebenTrainerEntireText,
];

const BILINGUAL_STORIES_PLACEMENTS: [LinkPlacement; 2] = [
    LinkPlacement::BilingualStoriesSingleItem,
    LinkPlacement::BilingualStoriesStoryHeadingItem,
];

impl LinkPlacement {
    /// 当前页面上可能出现的放置位置
    pub fn for_location(location: &PageLocation) -> &'static [LinkPlacement] {
        if location.host.contains(ONLINE_COURSE_HOST) {
            &ONLINE_COURSE_PLACEMENTS
        } else if location.href.contains(BILINGUAL_STORIES_PATH) {
            &BILINGUAL_STORIES_PLACEMENTS
        } else {
            &[]
        }
    }

    pub fn selector(self) -> &'static str {
        match self {
            LinkPlacement::VerbTrainer => ".verbzelletd:nth-child(2)",
            LinkPlacement::DailySingleConvoTrainer => ".Konvcontainer #KonvLoesung2",
            LinkPlacement::DailySiebenTrainer => "#Blitzwdh3_Mitte tr td.siebentd ~ td:not(.siebentd)",
            LinkPlacement::DailySiebenTrainerEntireText => "#Blitzwdh3_Mitte table:has(td.siebentd)",
            LinkPlacement::BilingualStoriesSingleItem => ".LANG1",
            LinkPlacement::BilingualStoriesStoryHeadingItem => ".TITLES .TITLESINNER",
        }
    }

    /// 加在每个链接上的 class
    pub fn class_name(self) -> &'static str {
        match self {
            LinkPlacement::VerbTrainer => "verb-trainer",
            LinkPlacement::DailySingleConvoTrainer => "daily-single-convo-trainer",
            LinkPlacement::DailySiebenTrainer => "daily-sieben-trainer",
            LinkPlacement::DailySiebenTrainerEntireText => "daily-sieben-trainer-entire-text",
            LinkPlacement::BilingualStoriesSingleItem => "bilingual-stories-single-item",
            LinkPlacement::BilingualStoriesStoryHeadingItem => "bilingual-stories-story-heading-item",
        }
    }

    /// 链接是否放在目标之后新建的容器里，而不是目标内部
    pub fn inserts_wrapper(self) -> bool {
        matches!(self, LinkPlacement::DailySiebenTrainerEntireText)
    }

    /// 放链接组的元素；需要新建容器但还没有时返回 `None`
    async fn link_holder<D: HostDom>(self, dom: &D, target: NodeId) -> anyhow::Result<Option<NodeId>> {
        if !self.inserts_wrapper() {
            return Ok(Some(target));
        }
        match dom.next_sibling(target).await? {
            Some(next) if dom.has_class(next, markup::NEW_ELEM_WRAP_CLASS).await? => Ok(Some(next)),
            _ => Ok(None),
        }
    }

    /// 解析目标元素对应的外语文本
    pub async fn resolve_text<D: HostDom>(self, dom: &D, target: NodeId) -> anyhow::Result<Option<String>> {
        let text = match self {
            LinkPlacement::VerbTrainer => dom.text_content(target).await?,
            LinkPlacement::DailySingleConvoTrainer => dom.leading_text(target).await?,
            LinkPlacement::DailySiebenTrainer => match dom.previous_sibling(target).await? {
                Some(cell) => dom.text_content(cell).await?,
                None => None,
            },
            LinkPlacement::DailySiebenTrainerEntireText => {
                let cells = dom
                    .query_all_within(target, "td.siebentd:has(+ td:not(.siebentd))")
                    .await?;
                let mut sentences = Vec::new();
                for cell in cells {
                    if let Some(text) = trimmed(dom.text_content(cell).await?) {
                        sentences.push(text);
                    }
                }
                Some(sentences.join(" "))
            }
            LinkPlacement::BilingualStoriesSingleItem => second_cell_text(dom, target).await?,
            LinkPlacement::BilingualStoriesStoryHeadingItem => story_text(dom, target).await?,
        };
        Ok(trimmed(text))
    }
}

fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// 双语条目中外语所在的第二个单元格
async fn second_cell_text<D: HostDom>(dom: &D, item: NodeId) -> anyhow::Result<Option<String>> {
    match dom.query_within(item, ".div_td:nth-child(2)").await? {
        Some(cell) => Ok(trimmed(dom.text_content(cell).await?)),
        None => Ok(None),
    }
}

/// 故事标题加上紧随其后的所有外语句子
///
/// 标题所在的 `.TITLES` 之后依次是 `LANG1`（外语）/ `LANG2`（德语）交替的句子，
/// 遇到其他元素即故事结束。
async fn story_text<D: HostDom>(dom: &D, heading: NodeId) -> anyhow::Result<Option<String>> {
    let mut sentences = Vec::new();

    if let Some(title) = dom.query_within(heading, ".LANGX1").await? {
        if let Some(text) = trimmed(dom.text_content(title).await?) {
            sentences.push(format!("{}.", text));
        }
    }

    let mut current = dom.closest(heading, ".TITLES").await?;
    while let Some(node) = current {
        let Some(next) = dom.next_sibling(node).await? else {
            break;
        };
        if dom.has_class(next, "LANG1").await? {
            if let Some(text) = second_cell_text(dom, next).await? {
                sentences.push(text);
            }
        } else if !dom.has_class(next, "LANG2").await? {
            break;
        }
        current = Some(next);
    }

    Ok(Some(sentences.join(" ")))
}

/// 翻译链接求值器
pub struct TranslateLinks {
    target_language: String,
}

impl TranslateLinks {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
        }
    }

    async fn run<D: HostDom>(&self, dom: &D) -> anyhow::Result<()> {
        let location = dom.location().await?;
        let placements = LinkPlacement::for_location(&location);
        if placements.is_empty() {
            return Ok(());
        }
        let source = detect_source_language(&location);

        let mut inserted = 0;
        let mut refreshed = 0;
        for &placement in placements {
            for target in dom.query_all(placement.selector()).await? {
                let text = placement.resolve_text(dom, target).await?;

                let holder = match placement.link_holder(dom, target).await? {
                    Some(holder) => holder,
                    None => dom.insert_after(target, &markup::new_elem_wrap()).await?,
                };
                let existing = dom.query_within(holder, LINK_WRAP_SELECTOR).await?;

                match existing {
                    Some(wrap) => {
                        if self.refresh_links(dom, wrap, source, text.as_deref()).await? {
                            refreshed += 1;
                        }
                    }
                    None => {
                        let links = markup::translate_links(
                            placement.class_name(),
                            source,
                            &self.target_language,
                            text.as_deref(),
                        );
                        dom.append(holder, &links)
                            .await
                            .with_context(|| format!("插入 {} 链接失败", placement.class_name()))?;
                        inserted += 1;
                    }
                }
            }
        }

        if inserted > 0 || refreshed > 0 {
            debug!(
                "🔗 插入了 {} 组、更新了 {} 组翻译链接 (源语言: {})",
                inserted, refreshed, source
            );
        }
        Ok(())
    }

    /// 文本变了时更新链接组的 `href`，返回是否有改动
    async fn refresh_links<D: HostDom>(
        &self,
        dom: &D,
        wrap: NodeId,
        source: &str,
        text: Option<&str>,
    ) -> anyhow::Result<bool> {
        let mut changed = false;
        for service in TranslatorService::ALL {
            let selector = format!(".{}", service.link_class());
            let Some(link) = dom.query_within(wrap, &selector).await? else {
                continue;
            };
            let href = markup::link_href(service, source, &self.target_language, text);
            if dom.attribute(link, "href").await? != href {
                dom.replace_attribute(link, "href", href.as_deref()).await?;
                changed = true;
            }
        }
        Ok(changed)
    }
}

impl<D: HostDom> Evaluator<D> for TranslateLinks {
    fn name(&self) -> &'static str {
        "translate-links"
    }

    fn runs_at_startup(&self) -> bool {
        true
    }

    fn evaluate<'a>(&'a mut self, dom: &'a D) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        self.run(dom).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placements_by_location() {
        let course = PageLocation::from_href("https://www.sprachenlernen24-onlinekurs.de/login/?kurs=Daenisch");
        assert_eq!(LinkPlacement::for_location(&course).len(), 4);

        let stories = PageLocation::from_href("https://www.sprachenlernen24.de/zweisprachige-geschichten/daenisch/");
        assert_eq!(
            LinkPlacement::for_location(&stories),
            &BILINGUAL_STORIES_PLACEMENTS
        );

        let other = PageLocation::from_href("https://www.sprachenlernen24.de/");
        assert!(LinkPlacement::for_location(&other).is_empty());
    }

    #[test]
    fn test_only_table_placement_uses_wrapper() {
        let wrapped: Vec<_> = ONLINE_COURSE_PLACEMENTS
            .iter()
            .chain(BILINGUAL_STORIES_PLACEMENTS.iter())
            .filter(|p| p.inserts_wrapper())
            .collect();
        assert_eq!(wrapped, vec![&LinkPlacement::DailySiebenTrainerEntireText]);
    }
}
