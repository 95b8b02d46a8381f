/// 日志工具模块
///
/// 启动信息、最终统计等多行日志的格式
use tracing::info;

use crate::config::Config;
use crate::scheduler::SchedulerStats;

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 应用配置
/// - `evaluators`: 已注册的功能
pub fn log_startup(config: &Config, evaluators: &[&str]) {
    info!("{}", "=".repeat(60));
    info!("🚀 页面增强启动");
    info!("🌐 目标页面: {}", truncate_text(&config.target_url, 80));
    info!("🗣️ 翻译目标语言: {}", config.target_language);
    info!("🧩 已启用功能: {}", evaluators.join(", "));
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 调度统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(stats: &SchedulerStats, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行统计");
    info!(
        "结束时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔁 执行周期: {}", stats.cycles);
    info!("❌ 中途失败: {}", stats.aborted_cycles);
    info!("🧮 合并的通知: {}", stats.coalesced);
    info!("⚡ 启动时执行: {}", stats.startup_runs);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
