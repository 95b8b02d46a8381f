//! # sl24 Augment
//!
//! 为 sprachenlernen24 学习页面补充功能的 Rust 应用程序：
//! 翻译链接、带评分的听写练习、清理每日训练结束页。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `dom/` - `HostDom` 页面能力；`PageDom` 走桥接脚本，`MemoryDom` 用于测试
//!
//! ### ② 比对引擎（Matching）
//! - `matching/` - 纯函数，判断输入与参考答案是否一致 / 部分一致 / 不一致
//!
//! ### ③ 业务层（Features）
//! - `features/` - 每个页面功能一个求值器，只负责"补上缺失的内容"
//!
//! ### ④ 调度层（Scheduler）
//! - `scheduler/` - 监听页面变更，断开监听后执行求值器，页面稳定后再恢复
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 浏览器连接、事件循环和统计
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod features;
pub mod infrastructure;
pub mod logger;
pub mod matching;
pub mod orchestrator;
pub mod scheduler;
pub mod utils;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_browser_and_page};
pub use config::Config;
pub use dom::{HostDom, MemoryDom, PageDom};
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use matching::{compare, ComparisonResult};
pub use orchestrator::App;
pub use scheduler::{CycleOutcome, Evaluator, HostEvent, MutationScheduler, SchedulerState};
