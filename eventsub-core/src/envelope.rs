//! 事件信封（EventEnvelope）
//!
//! 分发核心只读取信封的元数据（主题、类型、动作、来源）做匹配；载荷由订阅者或
//! `Typed` 适配器按需反序列化。信封一经创建即不可变。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// 事件载荷：结构化 JSON 或原始字节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventValue {
    Json(Value),
    Bytes(Vec<u8>),
}

impl EventValue {
    /// 按目标类型反序列化，字节载荷按 JSON 解析
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        match self {
            Self::Json(value) => T::deserialize(value),
            Self::Bytes(bytes) => serde_json::from_slice(bytes),
        }
    }
}

impl From<Value> for EventValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for EventValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// 事件信封
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// 事件唯一标识，未指定时生成 UUID v4
    #[builder(into, default = Uuid::new_v4().to_string())]
    id: String,
    /// 层级主题，如 `orders/created/eu`
    #[builder(into)]
    subject: Option<String>,
    /// 事件类型，如 `com.acme.order`
    #[builder(into)]
    #[serde(rename = "type")]
    event_type: Option<String>,
    /// 动作标识（叶子名称，不分段）
    #[builder(into)]
    action: Option<String>,
    /// 事件来源
    source: Option<Url>,
    /// 载荷
    #[builder(into)]
    value: Option<EventValue>,
    /// 事件发生时间
    time: Option<DateTime<Utc>>,
}

impl EventEnvelope {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn source(&self) -> Option<&Url> {
        self.source.as_ref()
    }

    pub fn value(&self) -> Option<&EventValue> {
        self.value.as_ref()
    }

    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.time.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u32,
    }

    #[test]
    fn builder_generates_id_when_missing() {
        let a = EventEnvelope::builder().subject("orders/created").build();
        let b = EventEnvelope::builder().subject("orders/created").build();
        assert!(!a.id().is_empty());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.subject(), Some("orders/created"));
        assert!(a.value().is_none());
    }

    #[test]
    fn json_and_byte_payloads_deserialize() {
        let json = EventValue::from(json!({"id": 7}));
        assert_eq!(json.deserialize::<Order>().unwrap(), Order { id: 7 });

        let bytes = EventValue::from(br#"{"id": 8}"#.to_vec());
        assert_eq!(bytes.deserialize::<Order>().unwrap(), Order { id: 8 });

        let bad = EventValue::from(json!({"name": "x"}));
        assert!(bad.deserialize::<Order>().is_err());
    }

    #[test]
    fn envelope_uses_type_on_the_wire() {
        let event = EventEnvelope::builder()
            .id("e-1")
            .event_type("com.acme.order")
            .build();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "com.acme.order");
        assert_eq!(value["id"], "e-1");
    }
}
