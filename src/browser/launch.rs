use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppResult, BrowserError};

/// 启动浏览器并打开指定地址
///
/// 页面要给人用，所以总是带界面启动
///
/// # 参数
/// - `url`: 要打开的地址
/// - `chrome_executable`: 浏览器可执行文件，`None` 时由 chromiumoxide 自动查找
pub async fn launch_browser_and_page(url: &str, chrome_executable: Option<&str>) -> AppResult<(Browser, Page)> {
    info!("🚀 启动浏览器...");

    let mut builder = BrowserConfig::builder().with_head().viewport(None);
    if let Some(executable) = chrome_executable {
        debug!("使用浏览器: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }
    let config = builder.build().map_err(|message| {
        error!("配置浏览器失败: {}", message);
        BrowserError::ConfigurationFailed { message }
    })?;

    let (browser, handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        e
    })?;
    super::spawn_handler(handler);

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await?;
    info!("✅ 浏览器已打开: {}", url);

    Ok((browser, page))
}
