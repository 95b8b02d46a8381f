//! 浏览器连接
//!
//! - `connect_to_browser_and_page` - 连接已打开远程调试端口的浏览器
//! - `launch_browser_and_page` - 自行启动一个有界面的浏览器

pub mod connection;
pub mod launch;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser_and_page;

use chromiumoxide::Handler;
use futures::StreamExt;
use tracing::{debug, warn};

/// 在后台驱动浏览器事件循环
///
/// 不驱动 handler 的话页面上的命令永远不会返回
pub(crate) fn spawn_handler(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("浏览器连接中断: {}", e);
                break;
            }
        }
        debug!("浏览器事件循环结束");
    });
}
