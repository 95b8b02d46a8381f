//! 真实页面上的 DOM 能力
//!
//! 每个 `HostDom` 调用都变成一次桥接脚本调用，参数以 JSON 传入，避免拼接字符串。
//! 页面通知通过 DevTools binding `__sl24Notify` 发回，由编排层解析成 `HostEvent`。

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use super::{Fragment, HostDom, NodeId, ObserverConfig, PageLocation};
use crate::error::{AppError, AppResult, BridgeError};
use crate::infrastructure::JsExecutor;

/// 页面调用 Rust 的 binding 名称
pub const BINDING_NAME: &str = "__sl24Notify";

/// 桥接脚本
const BRIDGE_SOURCE: &str = include_str!("page_bridge.js");

/// 真实页面 DOM
pub struct PageDom {
    executor: JsExecutor,
    settle_timeout: Duration,
}

impl PageDom {
    /// 接管页面：注册 binding，并让桥接脚本在之后每次加载时自动注入
    pub async fn attach(executor: JsExecutor, settle_timeout: Duration) -> AppResult<Self> {
        executor.add_binding(BINDING_NAME).await?;
        executor.add_script_on_new_document(BRIDGE_SOURCE).await?;
        debug!("已注册 binding {} 和桥接脚本", BINDING_NAME);
        Ok(Self {
            executor,
            settle_timeout,
        })
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: JsonValue) -> AppResult<T> {
        let js_code = format!(
            "(async () => {{ const r = await window.__sl24Bridge.{}(...{}); return r === undefined ? null : r; }})()",
            method, args
        );
        self.executor
            .eval_as(js_code)
            .await
            .map_err(|e| AppError::bridge_call_failed(method, e))
    }

    async fn call_unit(&self, method: &str, args: JsonValue) -> AppResult<()> {
        self.call::<JsonValue>(method, args).await.map(|_| ())
    }

    async fn call_node(&self, method: &str, node: NodeId, args: JsonValue) -> AppResult<NodeId> {
        let inserted: Option<NodeId> = self.call(method, args).await?;
        inserted.ok_or_else(|| BridgeError::NodeDetached { node: node.0 }.into())
    }
}

impl HostDom for PageDom {
    async fn prepare(&self) -> AppResult<()> {
        // 当前文档可能早于 add_script_on_new_document 加载
        self.executor
            .eval(BRIDGE_SOURCE)
            .await
            .map_err(|e| AppError::bridge_call_failed("install", e))?;
        Ok(())
    }

    async fn location(&self) -> AppResult<PageLocation> {
        self.call("location", json!([])).await
    }

    async fn query_all(&self, selector: &str) -> AppResult<Vec<NodeId>> {
        self.call("queryAll", json!([selector])).await
    }

    async fn query_all_within(&self, root: NodeId, selector: &str) -> AppResult<Vec<NodeId>> {
        self.call("queryAllWithin", json!([root, selector])).await
    }

    async fn closest(&self, node: NodeId, selector: &str) -> AppResult<Option<NodeId>> {
        self.call("closest", json!([node, selector])).await
    }

    async fn next_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>> {
        self.call("nextSibling", json!([node])).await
    }

    async fn previous_sibling(&self, node: NodeId) -> AppResult<Option<NodeId>> {
        self.call("previousSibling", json!([node])).await
    }

    async fn text_content(&self, node: NodeId) -> AppResult<Option<String>> {
        self.call("textContent", json!([node])).await
    }

    async fn leading_text(&self, node: NodeId) -> AppResult<Option<String>> {
        self.call("leadingText", json!([node])).await
    }

    async fn attribute(&self, node: NodeId, name: &str) -> AppResult<Option<String>> {
        self.call("attribute", json!([node, name])).await
    }

    async fn replace_attribute(&self, node: NodeId, name: &str, value: Option<&str>) -> AppResult<()> {
        self.call_unit("replaceAttribute", json!([node, name, value])).await
    }

    async fn has_class(&self, node: NodeId, class: &str) -> AppResult<bool> {
        self.call("hasClass", json!([node, class])).await
    }

    async fn has_marker(&self, node: NodeId, marker: &str) -> AppResult<bool> {
        self.call("hasMarker", json!([node, marker])).await
    }

    async fn set_marker(&self, node: NodeId, marker: &str) -> AppResult<()> {
        self.call_unit("setMarker", json!([node, marker])).await
    }

    async fn append(&self, parent: NodeId, fragment: &Fragment) -> AppResult<NodeId> {
        self.call_node("append", parent, json!([parent, fragment])).await
    }

    async fn insert_after(&self, node: NodeId, fragment: &Fragment) -> AppResult<NodeId> {
        self.call_node("insertAfter", node, json!([node, fragment])).await
    }

    async fn add_class(&self, node: NodeId, class: &str) -> AppResult<()> {
        self.call_unit("addClass", json!([node, class])).await
    }

    async fn set_value(&self, node: NodeId, value: &str) -> AppResult<()> {
        self.call_unit("setValue", json!([node, value])).await
    }

    async fn listen_text_committed(&self, input: NodeId) -> AppResult<()> {
        self.call_unit("listenTextCommitted", json!([input])).await
    }

    async fn blank_text_nodes(&self, node: NodeId, needle: &str) -> AppResult<usize> {
        self.call("blankTextNodes", json!([node, needle])).await
    }

    async fn observe(&self, config: ObserverConfig, generation: u64) -> AppResult<()> {
        self.call_unit("observe", json!([config, generation])).await
    }

    async fn disconnect(&self) -> AppResult<()> {
        self.call_unit("disconnect", json!([])).await
    }

    async fn settle(&self) -> AppResult<()> {
        // 后台标签页不会渲染新帧，超时后直接继续
        match tokio::time::timeout(self.settle_timeout, self.call_unit("settle", json!([]))).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⚠️ 等待页面渲染超时 ({:?})，继续执行", self.settle_timeout);
                Ok(())
            }
        }
    }
}
