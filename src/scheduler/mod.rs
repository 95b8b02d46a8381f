//! 变更调度器 - 调度层
//!
//! 页面自己会不断重建 DOM，功能模块需要在每次变化后重新打补丁；
//! 但补丁本身也是 DOM 变化，处理不好就会无限循环。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──start──▶ Observing ──mutation──▶ Suspended ──evaluators done──▶ PendingResume
//!                     ▲                                                        │
//!                     └──────────────── settle (两帧) + 重新监听 ───────────────┘
//! ```
//!
//! - 进入 `Suspended` 之前先断开监听，求值器的写入不会再触发自己
//! - 恢复监听推迟到当前帧和下一帧渲染之后，求值器排队中的写入落地后才重新监听
//! - 每次重新监听代号加一，旧代号的通知直接合并掉，不会排出多余的周期
//! - 恢复监听失败时按退避重试；仍然失败则停在 `PendingResume`，下一个事件到来时再试

mod evaluator;
mod events;

use std::time::Duration;

pub use evaluator::Evaluator;
pub use events::HostEvent;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::dom::{HostDom, ObserverConfig};
use crate::error::AppResult;

/// 恢复监听的最大尝试次数
const ARM_ATTEMPTS: u32 = 3;
/// 第一次重试前的等待，之后每次翻倍
const ARM_RETRY_DELAY: Duration = Duration::from_millis(50);

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// 尚未启动，或页面重新加载后等待重新启动
    Idle,
    /// 正在监听变更
    Observing,
    /// 监听已断开，求值器正在执行
    Suspended,
    /// 求值器已执行完，等待页面稳定后恢复监听
    PendingResume,
}

/// 一次变更通知的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 所有求值器都执行完毕
    Completed { evaluators: usize },
    /// 某个求值器失败，本周期剩余的求值器被跳过
    Aborted {
        evaluator: &'static str,
        error: String,
    },
    /// 通知已过期或调度器不在监听状态，未执行周期
    Coalesced,
}

/// 调度统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// 执行过的周期数
    pub cycles: usize,
    /// 中途失败的周期数
    pub aborted_cycles: usize,
    /// 被合并的通知数
    pub coalesced: usize,
    /// 启动时预先执行的求值器次数
    pub startup_runs: usize,
}

/// 变更调度器
pub struct MutationScheduler<D: HostDom + 'static> {
    dom: D,
    evaluators: Vec<Box<dyn Evaluator<D>>>,
    config: ObserverConfig,
    state: SchedulerState,
    generation: u64,
    stats: SchedulerStats,
}

impl<D: HostDom + 'static> MutationScheduler<D> {
    /// 创建调度器，监听子节点增删（含子树），不监听属性
    pub fn new(dom: D) -> Self {
        Self {
            dom,
            evaluators: Vec::new(),
            config: ObserverConfig::CHILD_LIST_SUBTREE,
            state: SchedulerState::Idle,
            generation: 0,
            stats: SchedulerStats::default(),
        }
    }

    /// 注册求值器，执行顺序即注册顺序
    pub fn register(&mut self, evaluator: impl Evaluator<D> + 'static) -> &mut Self {
        self.register_boxed(Box::new(evaluator))
    }

    pub fn register_boxed(&mut self, evaluator: Box<dyn Evaluator<D>>) -> &mut Self {
        debug!("注册功能: {}", evaluator.name());
        self.evaluators.push(evaluator);
        self
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// 当前监听代号
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn evaluator_names(&self) -> Vec<&'static str> {
        self.evaluators.iter().map(|e| e.name()).collect()
    }

    /// 启动：准备页面，执行需要预先运行的求值器，然后开始监听
    pub async fn start(&mut self) -> AppResult<()> {
        self.dom.prepare().await?;

        for evaluator in self.evaluators.iter_mut().filter(|e| e.runs_at_startup()) {
            self.stats.startup_runs += 1;
            if let Err(e) = evaluator.evaluate(&self.dom).await {
                warn!("⚠️ [{}] 启动时执行失败: {:#}", evaluator.name(), e);
            }
        }

        self.arm().await?;
        info!("👀 开始监听页面变更 (代号 {})", self.generation);
        Ok(())
    }

    /// 处理一个页面事件
    ///
    /// 变更通知返回周期结果，其余事件返回 `None`
    pub async fn handle(&mut self, event: HostEvent) -> AppResult<Option<CycleOutcome>> {
        if self.state == SchedulerState::PendingResume && !matches!(event, HostEvent::DocumentReloaded) {
            warn!("⚠️ 监听仍未恢复，先重新监听");
            self.arm().await?;
        }

        match event {
            HostEvent::Mutation { generation } => self.on_mutation(generation).await.map(Some),
            HostEvent::TextCommitted { value } => {
                debug!("收到输入内容 ({} 字符)", value.chars().count());
                for evaluator in self.evaluators.iter_mut() {
                    evaluator.on_text_committed(&value);
                }
                Ok(None)
            }
            HostEvent::DocumentReloaded => {
                info!("🔄 页面已重新加载，重新启动调度");
                self.state = SchedulerState::Idle;
                self.start().await?;
                Ok(None)
            }
        }
    }

    /// 处理一次变更通知
    pub async fn on_mutation(&mut self, generation: u64) -> AppResult<CycleOutcome> {
        if self.state != SchedulerState::Observing || generation != self.generation {
            self.stats.coalesced += 1;
            debug!(
                "合并变更通知 (通知代号 {}, 当前代号 {}, 状态 {:?})",
                generation, self.generation, self.state
            );
            return Ok(CycleOutcome::Coalesced);
        }
        self.run_cycle().await
    }

    async fn run_cycle(&mut self) -> AppResult<CycleOutcome> {
        self.dom.disconnect().await?;
        self.state = SchedulerState::Suspended;
        self.stats.cycles += 1;

        let outcome = self.run_evaluators().await;

        // 无论求值器是否失败，都必须恢复监听
        self.state = SchedulerState::PendingResume;
        if let Err(e) = self.dom.settle().await {
            warn!("⚠️ 等待页面稳定失败，直接恢复监听: {}", e);
        }
        self.arm().await?;

        debug!("周期 {} 完成: {:?}", self.stats.cycles, outcome);
        Ok(outcome)
    }

    /// 按注册顺序执行求值器，第一个失败即停止
    async fn run_evaluators(&mut self) -> CycleOutcome {
        for evaluator in self.evaluators.iter_mut() {
            if let Err(e) = evaluator.evaluate(&self.dom).await {
                let name = evaluator.name();
                warn!("⚠️ [{}] 执行失败，跳过本周期剩余功能: {:#}", name, e);
                self.stats.aborted_cycles += 1;
                return CycleOutcome::Aborted {
                    evaluator: name,
                    error: format!("{:#}", e),
                };
            }
        }
        CycleOutcome::Completed {
            evaluators: self.evaluators.len(),
        }
    }

    async fn arm(&mut self) -> AppResult<()> {
        self.generation += 1;
        let mut attempt = 1;
        let mut delay = ARM_RETRY_DELAY;
        loop {
            match self.dom.observe(self.config, self.generation).await {
                Ok(()) => {
                    self.state = SchedulerState::Observing;
                    return Ok(());
                }
                Err(e) if attempt >= ARM_ATTEMPTS => return Err(e),
                Err(e) => {
                    warn!(
                        "⚠️ 恢复监听失败 (尝试 {}/{}), {:?} 后重试: {}",
                        attempt, ARM_ATTEMPTS, delay, e
                    );
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
            }
        }
    }
}
