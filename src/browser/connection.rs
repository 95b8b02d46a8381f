use chromiumoxide::{Browser, Page};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};

/// 连接到浏览器并找到要增强的页面
///
/// 先按标题在已打开的标签页中查找；找不到时新开标签页并导航到 `target_url`。
///
/// # 参数
/// - `port`: 浏览器远程调试端口
/// - `target_url`: 找不到页面时打开的地址
/// - `target_title`: 标题中包含该文本的标签页
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: &str,
    target_title: Option<&str>,
) -> AppResult<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔌 正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::browser_connection_failed(port, e)
    })?;
    super::spawn_handler(handler);

    // 等待浏览器把已有标签页同步过来
    sleep(tokio::time::Duration::from_millis(300)).await;

    if let Some(title) = target_title {
        let pages = browser.pages().await?;
        debug!("正在 {} 个标签页中查找标题包含 '{}' 的页面", pages.len(), title);
        for page in pages {
            if let Ok(Some(page_title)) = page.get_title().await {
                if page_title.contains(title) {
                    info!("✓ 找到目标页面: {}", page_title);
                    return Ok((browser, page));
                }
            }
        }
        debug!("未找到匹配的页面，将新开标签页");
    }

    let page = browser.new_page(target_url).await.map_err(|e| {
        error!("打开 {} 失败: {}", target_url, e);
        e
    })?;
    info!("✓ 已打开: {}", target_url);

    Ok((browser, page))
}
