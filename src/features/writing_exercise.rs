//! 听写练习
//!
//! 每日"闪电"词汇训练只显示德语，点灯泡才显示外语。这里在德语下面加一个输入框，
//! 答案显示出来时用比对引擎给输入打分。
//!
//! 页面显示答案时会重建整个词汇区域，用户输入的输入框也随之消失，
//! 所以输入在失去焦点时就先存进 `typed_text`，等新输入框出现后再填回去评判。
//! 页面有时只重建卡片内部的词汇，卡片本身保留，所以按卡片里有没有练习来判断是否已插入。

use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{debug, info};

use crate::dom::HostDom;
use crate::matching::compare;
use crate::scheduler::Evaluator;

use super::markup;

const VOCAB_CONTAINER: &str = "#containerblitz .DivAutopilotText";
const GERMAN_TEXT: &str = ".DivAutopilotWort1";
const FOREIGN_TEXT: &str = ".DivAutopilotWort2";
/// 页面自带的"显示答案"灯泡按钮
const REVEAL_BUTTON: &str = "a:has(> i.fa-stack > svg.svg-inline--fa.fa-lightbulb-on)";
const HIDE_CLASS: &str = "hide";
const EXERCISE: &str = ".writing-exercise";

/// 听写练习求值器
#[derive(Debug, Default)]
pub struct WritingExercise {
    /// 用户最近一次提交的输入
    typed_text: String,
}

impl WritingExercise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    async fn run<D: HostDom>(&mut self, dom: &D) -> anyhow::Result<()> {
        let containers = dom.query_all(VOCAB_CONTAINER).await?;
        let mut cta_href: Option<Option<String>> = None;

        for container in containers {
            if dom.query_within(container, EXERCISE).await?.is_some() {
                continue;
            }
            let Some(german) = dom.query_within(container, GERMAN_TEXT).await? else {
                continue;
            };

            let href = match &cta_href {
                Some(href) => href.clone(),
                None => {
                    let href = reveal_button_href(dom).await?;
                    cta_href = Some(href.clone());
                    href
                }
            };
            let exercise = dom.append(german, &markup::writing_exercise(href)).await?;

            let Some(input) = dom.query_within(exercise, "input").await? else {
                continue;
            };

            let reference = match dom.query_within(container, FOREIGN_TEXT).await? {
                Some(node) => dom.text_content(node).await?.map(|t| t.trim().to_string()),
                None => None,
            }
            .filter(|t| !t.is_empty());

            match reference {
                Some(reference) => {
                    dom.set_value(input, &self.typed_text).await?;
                    if let Some(button) = dom.query_within(exercise, "a").await? {
                        dom.add_class(button, HIDE_CLASS).await?;
                    }
                    let result = compare(&self.typed_text, &reference);
                    if let Some(class) = result.css_class() {
                        dom.add_class(input, class).await?;
                    }
                    info!("✍️ 听写评判: '{}' / '{}' → {}", self.typed_text, reference, result);
                }
                None => {
                    // 答案还没显示，之前的输入属于上一个词
                    self.typed_text.clear();
                    dom.listen_text_committed(input).await?;
                    debug!("✍️ 插入听写输入框");
                }
            }
        }
        Ok(())
    }
}

async fn reveal_button_href<D: HostDom>(dom: &D) -> anyhow::Result<Option<String>> {
    match dom.query_all(REVEAL_BUTTON).await?.first() {
        Some(&button) => Ok(dom.attribute(button, "href").await?),
        None => Ok(None),
    }
}

impl<D: HostDom> Evaluator<D> for WritingExercise {
    fn name(&self) -> &'static str {
        "writing-exercise"
    }

    fn evaluate<'a>(&'a mut self, dom: &'a D) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        self.run(dom).boxed_local()
    }

    fn on_text_committed(&mut self, value: &str) {
        self.typed_text = value.to_string();
    }
}
