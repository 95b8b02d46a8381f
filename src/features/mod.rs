//! 页面功能 - 业务层
//!
//! 每个功能都是一个 `Evaluator`，由调度器在页面变化后调用：
//! - `TranslateLinks` - 外语文本旁的翻译链接
//! - `WritingExercise` - 词汇训练中的听写输入框
//! - `EndScreenCleanup` - 隐藏结束页上的无关区块

pub mod end_screen;
pub mod markup;
pub mod translate_links;
pub mod translator;
pub mod writing_exercise;

pub use end_screen::{EndScreenCleanup, EndScreenRules, SectionRule};
pub use translate_links::{LinkPlacement, TranslateLinks};
pub use translator::{detect_source_language, TranslatorService};
pub use writing_exercise::WritingExercise;

use tracing::info;

use crate::config::Config;
use crate::dom::HostDom;
use crate::error::AppResult;
use crate::scheduler::Evaluator;

/// 按配置创建功能求值器
///
/// 顺序固定：翻译链接、听写练习、结束页清理
///
/// # 参数
/// - `config`: 应用配置（功能开关、目标语言、规则文件）
///
/// # 返回
/// 启用的求值器；规则文件无法读取时返回错误
pub fn default_evaluators<D: HostDom + 'static>(config: &Config) -> AppResult<Vec<Box<dyn Evaluator<D>>>> {
    let mut evaluators: Vec<Box<dyn Evaluator<D>>> = Vec::new();

    if config.features.translate_links {
        evaluators.push(Box::new(TranslateLinks::new(config.target_language.clone())));
    }
    if config.features.writing_exercise {
        evaluators.push(Box::new(WritingExercise::new()));
    }
    if config.features.end_screen_cleanup {
        let rules = match &config.end_screen_rules_file {
            Some(path) => {
                info!("📋 从 {} 加载结束页规则", path);
                EndScreenRules::from_file(path)?
            }
            None => EndScreenRules::embedded()?,
        };
        evaluators.push(Box::new(EndScreenCleanup::new(rules)));
    }

    Ok(evaluators)
}
