//! 应用主循环 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接或启动浏览器、创建 JsExecutor、接管页面 DOM
//! 2. **注册功能**：按配置创建求值器交给调度器
//! 3. **事件循环**：把页面通知、页面加载和退出信号转交给调度器
//! 4. **全局统计**：退出时输出调度统计
//!
//! 唯一持有 Browser 的模块；Browser 被丢弃时连接随之关闭。

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::page::EventLoadEventFired;
use chromiumoxide::cdp::js_protocol::runtime::EventBindingCalled;
use chromiumoxide::Browser;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::dom::page_dom::BINDING_NAME;
use crate::dom::PageDom;
use crate::features;
use crate::infrastructure::JsExecutor;
use crate::scheduler::{CycleOutcome, HostEvent, MutationScheduler};
use crate::utils::logging::{log_startup, print_final_stats, truncate_text};

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    scheduler: MutationScheduler<PageDom>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let (browser, page) = if config.launch_browser {
            browser::launch_browser_and_page(&config.target_url, config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                &config.target_url,
                config.target_title.as_deref(),
            )
            .await?
        };

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);
        let dom = PageDom::attach(executor, config.settle_timeout())
            .await
            .context("无法接管页面")?;

        let mut scheduler = MutationScheduler::new(dom);
        for evaluator in features::default_evaluators::<PageDom>(&config)? {
            scheduler.register_boxed(evaluator);
        }

        log_startup(&config, &scheduler.evaluator_names());

        Ok(Self {
            config,
            _browser: browser,
            scheduler,
        })
    }

    /// 运行应用主逻辑，直到收到 Ctrl+C
    pub async fn run(mut self) -> Result<()> {
        let page = self.scheduler.dom().executor().page().clone();
        let mut bindings = page.event_listener::<EventBindingCalled>().await?;
        let mut loads = page.event_listener::<EventLoadEventFired>().await?;

        self.scheduler.start().await.context("启动调度失败")?;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let event = tokio::select! {
                Some(call) = bindings.next() => {
                    if call.name != BINDING_NAME {
                        continue;
                    }
                    match HostEvent::from_binding_payload(&call.payload) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("⚠️ 忽略页面通知 {}: {}", truncate_text(&call.payload, 80), e);
                            continue;
                        }
                    }
                }
                Some(_) = loads.next() => HostEvent::DocumentReloaded,
                _ = &mut shutdown => {
                    info!("🛑 收到退出信号");
                    break;
                }
            };

            match self.scheduler.handle(event).await {
                Ok(Some(CycleOutcome::Aborted { evaluator, error })) => {
                    debug!("周期在 [{}] 中止: {}", evaluator, error);
                }
                Ok(_) => {}
                // 多半是页面正在跳转，加载完成后会重新启动
                Err(e) => error!("❌ 处理页面事件失败: {}", e),
            }
        }

        print_final_stats(&self.scheduler.stats(), &self.config.output_log_file);
        Ok(())
    }
}
