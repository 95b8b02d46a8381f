//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有浏览器资源，把页面事件交给调度器，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (浏览器、事件循环)
//!     ↓
//! scheduler::MutationScheduler (断开 → 求值 → 等待渲染 → 重新监听)
//!     ↓
//! features (翻译链接 / 听写练习 / 结束页清理)
//!     ↓                ↘
//! dom::HostDom        matching (答案比对)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 Browser
//! 2. **向下依赖**：编排层 → 调度 → 功能 → DOM 能力 → 基础设施
//! 3. **无业务逻辑**：只做事件转发和统计

pub mod app;

// 重新导出主要类型
pub use app::App;
