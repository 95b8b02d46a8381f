//! 页面 DOM 能力 - 基础设施层
//!
//! `HostDom` 是功能模块和调度器看到的唯一页面接口：
//! - `PageDom` - 通过 DevTools 在真实页面里执行桥接脚本
//! - `MemoryDom` - 进程内的元素树，用于测试

pub mod fragment;
pub mod memory;
pub mod page_dom;

pub use fragment::Fragment;
pub use memory::MemoryDom;
pub use page_dom::PageDom;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// 页面元素句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 变更监听配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverConfig {
    pub attributes: bool,
    pub child_list: bool,
    pub subtree: bool,
}

impl ObserverConfig {
    /// 只监听子节点增删（包括整棵子树），不监听属性变化
    ///
    /// 标记元素用的是属性，所以打标记不会触发新的周期。
    pub const CHILD_LIST_SUBTREE: Self = Self {
        attributes: false,
        child_list: true,
        subtree: true,
    };
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self::CHILD_LIST_SUBTREE
    }
}

/// 页面地址
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub host: String,
    pub href: String,
    pub search: String,
}

impl PageLocation {
    /// 从完整 URL 拆出 host 和查询串
    pub fn from_href(href: &str) -> Self {
        match reqwest::Url::parse(href) {
            Ok(url) => Self {
                host: url.host_str().unwrap_or_default().to_string(),
                href: href.to_string(),
                search: url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
            },
            Err(_) => Self {
                href: href.to_string(),
                ..Self::default()
            },
        }
    }
}

/// 宿主页面 DOM 能力
///
/// 所有方法都以 `&self` 调用；找不到的元素以 `None` / 空列表表示，不是错误。
#[allow(async_fn_in_trait)]
pub trait HostDom {
    /// 启动或页面重新加载后的准备工作（例如注入桥接脚本）
    async fn prepare(&self) -> AppResult<()> {
        Ok(())
    }

    async fn location(&self) -> AppResult<PageLocation>;

    /// 在整个文档中查询
    async fn query_all(&self, selector: &str) -> AppResult<Vec<NodeId>>;

    /// 在 `root` 的后代中查询
    async fn query_all_within(&self, root: NodeId, selector: &str) -> AppResult<Vec<NodeId>>;

    async fn query_within(&self, root: NodeId, selector: &str) -> AppResult<Option<NodeId>> {
        Ok(self.query_all_within(root, selector).await?.into_iter().next())
    }

    /// 自身或最近的匹配祖先
    async fn closest(&self, node: NodeId, selector: &str) -> AppResult<Option<NodeId>>;

    /// 下一个兄弟元素
    async fn next_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>>;

    /// 上一个兄弟元素
    async fn previous_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>>;

    async fn text_content(&self, node: NodeId) -> AppResult<Option<String>>;

    /// 第一个子节点（通常是文本节点）的文本
    async fn leading_text(&self, node: NodeId) -> AppResult<Option<String>>;

    async fn attribute(&self, node: NodeId, name: &str) -> AppResult<Option<String>>;

    /// 设置属性；`value` 为 `None` 时移除
    async fn replace_attribute(&self, node: NodeId, name: &str, value: Option<&str>) -> AppResult<()>;

    async fn has_class(&self, node: NodeId, class: &str) -> AppResult<bool>;

    /// 元素是否已被某个功能处理过
    async fn has_marker(&self, node: NodeId, marker: &str) -> AppResult<bool>;

    async fn set_marker(&self, node: NodeId, marker: &str) -> AppResult<()>;

    /// 构建片段并追加为 `parent` 的最后一个子元素，返回片段根元素
    async fn append(&self, parent: NodeId, fragment: &Fragment) -> AppResult<NodeId>;

    /// 构建片段并插入到 `node` 之后
    async fn insert_after(&self, node: NodeId, fragment: &Fragment) -> AppResult<NodeId>;

    async fn add_class(&self, node: NodeId, class: &str) -> AppResult<()>;

    /// 设置输入框的值
    async fn set_value(&self, node: NodeId, value: &str) -> AppResult<()>;

    /// 输入框失去焦点时，把当前值作为 `HostEvent::TextCommitted` 发回
    async fn listen_text_committed(&self, input: NodeId) -> AppResult<()>;

    /// 清空 `node` 中包含 `needle` 的直接子节点的文本，返回清空的数量
    async fn blank_text_nodes(&self, node: NodeId, needle: &str) -> AppResult<usize>;

    /// 开始监听文档变更，之后的通知都带上 `generation`
    async fn observe(&self, config: ObserverConfig, generation: u64) -> AppResult<()>;

    async fn disconnect(&self) -> AppResult<()>;

    /// 等待当前帧和下一帧渲染完成
    async fn settle(&self) -> AppResult<()>;
}
