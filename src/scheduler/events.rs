//! 页面发回的事件

use serde::Deserialize;

use crate::error::{AppResult, BridgeError};

/// 宿主页面事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// 文档子树发生变化，`generation` 是触发时的监听代号
    Mutation { generation: u64 },
    /// 用户在书写练习输入框中输入完毕（失去焦点）
    TextCommitted { value: String },
    /// 页面重新加载，桥接脚本和监听都已失效
    DocumentReloaded,
}

/// 桥接脚本通过 DevTools binding 发送的消息
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum BridgeMessage {
    Mutation { generation: u64 },
    TextCommitted { value: String },
}

impl HostEvent {
    /// 解析 binding 负载
    ///
    /// 负载是桥接脚本 `JSON.stringify` 的结果
    pub fn from_binding_payload(payload: &str) -> AppResult<Self> {
        let message: BridgeMessage = serde_json::from_str(payload).map_err(|_| {
            BridgeError::UnknownMessage {
                payload: payload.to_string(),
            }
        })?;
        Ok(match message {
            BridgeMessage::Mutation { generation } => HostEvent::Mutation { generation },
            BridgeMessage::TextCommitted { value } => HostEvent::TextCommitted { value },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mutation() {
        let event = HostEvent::from_binding_payload(r#"{"kind":"mutation","generation":7}"#).unwrap();
        assert_eq!(event, HostEvent::Mutation { generation: 7 });
    }

    #[test]
    fn test_parse_text_committed() {
        let event =
            HostEvent::from_binding_payload(r#"{"kind":"textCommitted","value":"at lege"}"#).unwrap();
        assert_eq!(
            event,
            HostEvent::TextCommitted {
                value: "at lege".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_payload_is_error() {
        assert!(HostEvent::from_binding_payload(r#"{"kind":"scroll"}"#).is_err());
        assert!(HostEvent::from_binding_payload("not json").is_err());
    }
}
